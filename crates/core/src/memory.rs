//! In-memory [`CurrencyStore`].
//!
//! Enforces the same uniqueness rules as the `currency` table (id and
//! case-insensitive ISO code) so key collisions surface as errors rather than
//! silently producing duplicate rows.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::currency::{
    set_default_currency, CurrencyBackend, CurrencyMatch, CurrencyStore, DefaultCurrencyChange,
    NewCurrency,
};
use crate::error::CoreError;
use crate::reference::CurrencyReference;
use crate::types::DbId;

/// A row of the in-memory `currency` table.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyRow {
    pub id: DbId,
    pub iso_code: String,
    pub factor: f64,
    pub symbol: String,
    pub decimal_precision: i32,
    pub position: i32,
}

/// A row of the in-memory `currency_translation` table.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRow {
    pub currency_id: DbId,
    pub language_id: DbId,
    pub short_name: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryCurrencyStore {
    rows: Vec<CurrencyRow>,
    translations: Vec<TranslationRow>,
}

impl MemoryCurrencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bare row. Symbol defaults to the ISO code, precision to 2.
    pub fn push(&mut self, id: DbId, iso_code: &str, factor: f64) {
        self.rows.push(CurrencyRow {
            id,
            iso_code: iso_code.to_string(),
            factor,
            symbol: iso_code.to_string(),
            decimal_precision: 2,
            position: 1,
        });
    }

    pub fn rows(&self) -> &[CurrencyRow] {
        &self.rows
    }

    pub fn translations(&self) -> &[TranslationRow] {
        &self.translations
    }

    pub fn by_iso(&self, iso_code: &str) -> Option<&CurrencyRow> {
        self.rows
            .iter()
            .find(|r| r.iso_code.eq_ignore_ascii_case(iso_code))
    }

    /// Wrap the store so it can serve as a [`CurrencyBackend`].
    pub fn into_backend(self) -> MemoryCurrencyBackend {
        MemoryCurrencyBackend {
            store: Mutex::new(self),
        }
    }
}

#[async_trait]
impl CurrencyStore for MemoryCurrencyStore {
    async fn iso_code_by_id(&mut self, id: DbId) -> Result<Option<String>, CoreError> {
        Ok(self
            .rows
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.iso_code.clone()))
    }

    async fn find_by_iso(&mut self, iso_code: &str) -> Result<Option<CurrencyMatch>, CoreError> {
        Ok(self.by_iso(iso_code).map(|r| CurrencyMatch {
            id: r.id,
            factor: r.factor,
        }))
    }

    async fn insert_currency(&mut self, currency: &NewCurrency) -> Result<(), CoreError> {
        if self.rows.iter().any(|r| r.id == currency.id) {
            return Err(CoreError::Storage(format!(
                "Duplicate entry '{}' for key 'PRIMARY'",
                currency.id
            )));
        }
        if self.by_iso(&currency.iso_code).is_some() {
            return Err(CoreError::Storage(format!(
                "Duplicate entry '{}' for key 'uniq.currency.iso_code'",
                currency.iso_code
            )));
        }

        self.rows.push(CurrencyRow {
            id: currency.id,
            iso_code: currency.iso_code.clone(),
            factor: currency.factor,
            symbol: currency.symbol.clone(),
            decimal_precision: currency.decimal_precision,
            position: currency.position,
        });
        self.translations.push(TranslationRow {
            currency_id: currency.id,
            language_id: currency.language_id,
            short_name: currency.short_name.clone(),
            name: currency.name.clone(),
        });
        Ok(())
    }

    async fn change_id(&mut self, old_id: DbId, new_id: DbId) -> Result<u64, CoreError> {
        if old_id != new_id && self.rows.iter().any(|r| r.id == new_id) {
            return Err(CoreError::Storage(format!(
                "Duplicate entry '{new_id}' for key 'PRIMARY'"
            )));
        }

        let mut changed = 0;
        for row in self.rows.iter_mut().filter(|r| r.id == old_id) {
            row.id = new_id;
            changed += 1;
        }
        // Mirrors ON UPDATE CASCADE on the translation foreign key.
        for translation in self
            .translations
            .iter_mut()
            .filter(|t| t.currency_id == old_id)
        {
            translation.currency_id = new_id;
        }
        Ok(changed)
    }

    async fn rebase_factors(
        &mut self,
        base_iso: &str,
        correction: f64,
    ) -> Result<u64, CoreError> {
        for row in &mut self.rows {
            if row.iso_code.eq_ignore_ascii_case(base_iso) {
                row.factor = 1.0;
            } else {
                row.factor *= correction;
            }
        }
        Ok(self.rows.len() as u64)
    }
}

/// [`CurrencyBackend`] over a [`MemoryCurrencyStore`].
///
/// Each reassignment runs on a copy that replaces the store only on success,
/// matching the all-or-nothing behaviour of the MySQL backend.
#[derive(Debug, Default)]
pub struct MemoryCurrencyBackend {
    store: Mutex<MemoryCurrencyStore>,
}

impl MemoryCurrencyBackend {
    /// Copy of the current table contents.
    pub async fn snapshot(&self) -> MemoryCurrencyStore {
        self.store.lock().await.clone()
    }
}

#[async_trait]
impl CurrencyBackend for MemoryCurrencyBackend {
    async fn set_default_currency(
        &self,
        reference: &CurrencyReference,
        iso_code: &str,
    ) -> Result<DefaultCurrencyChange, CoreError> {
        let mut guard = self.store.lock().await;
        let mut working = guard.clone();
        let change = set_default_currency(&mut working, reference, iso_code).await?;
        *guard = working;
        Ok(change)
    }
}
