//! Default-currency reassignment.
//!
//! The base currency is whichever `currency` row holds
//! [`DEFAULT_CURRENCY_ID`]. Changing it means moving that identifier onto
//! another row and rebasing every conversion factor so the new holder sits
//! at exactly 1.
//!
//! The algorithm is written against [`CurrencyStore`] so it runs unchanged
//! over MySQL (inside a transaction) and over the in-memory store.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::reference::CurrencyReference;
use crate::types::{random_id, storage_now, DbId, DEFAULT_CURRENCY_ID, SYSTEM_LANGUAGE_ID};

/// Display position given to currencies created by the reassigner.
pub const NEW_CURRENCY_POSITION: i32 = 1;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// The columns the reassigner needs from an existing row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrencyMatch {
    pub id: DbId,
    pub factor: f64,
}

/// A currency row plus its system-language translation, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCurrency {
    pub id: DbId,
    pub iso_code: String,
    pub factor: f64,
    pub symbol: String,
    pub position: i32,
    pub decimal_precision: i32,
    pub language_id: DbId,
    pub short_name: String,
    pub name: String,
    pub created_at: String,
}

impl NewCurrency {
    /// Seed a currency from the reference table.
    ///
    /// Fails with [`CoreError::UnknownCurrency`] if `iso` has no entry.
    pub fn from_reference(reference: &CurrencyReference, iso: &str) -> Result<Self, CoreError> {
        let iso = iso.to_uppercase();
        let info = reference
            .get(&iso)
            .ok_or_else(|| CoreError::UnknownCurrency(iso.clone()))?;

        Ok(Self {
            id: random_id(),
            iso_code: iso,
            factor: 1.0,
            symbol: info.symbol.clone(),
            position: NEW_CURRENCY_POSITION,
            decimal_precision: i32::from(info.decimal_digits),
            language_id: SYSTEM_LANGUAGE_ID,
            short_name: info.code.clone(),
            name: info.name.clone(),
            created_at: storage_now(),
        })
    }
}

/// Outcome of [`set_default_currency`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultCurrencyChange {
    /// The requested currency already was the default.
    Unchanged { iso_code: String },
    /// The reserved identifier moved to another row.
    Reassigned {
        previous_iso_code: String,
        iso_code: String,
        /// Whether the row was created from reference data.
        created: bool,
    },
}

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Row-level access to the `currency` tables.
///
/// ISO comparisons are case-insensitive in every implementation.
#[async_trait]
pub trait CurrencyStore: Send {
    /// ISO code of the row with the given id.
    async fn iso_code_by_id(&mut self, id: DbId) -> Result<Option<String>, CoreError>;

    /// The row whose ISO code matches `iso_code`.
    async fn find_by_iso(&mut self, iso_code: &str) -> Result<Option<CurrencyMatch>, CoreError>;

    /// Insert a currency and its translation.
    async fn insert_currency(&mut self, currency: &NewCurrency) -> Result<(), CoreError>;

    /// Re-key a row. Returns the number of rows changed.
    async fn change_id(&mut self, old_id: DbId, new_id: DbId) -> Result<u64, CoreError>;

    /// Set the `base_iso` row to factor 1 and multiply every other factor by
    /// `correction`.
    async fn rebase_factors(&mut self, base_iso: &str, correction: f64)
        -> Result<u64, CoreError>;
}

/// Something that can run a complete, atomic reassignment.
#[async_trait]
pub trait CurrencyBackend: Send + Sync {
    async fn set_default_currency(
        &self,
        reference: &CurrencyReference,
        iso_code: &str,
    ) -> Result<DefaultCurrencyChange, CoreError>;
}

// ---------------------------------------------------------------------------
// Algorithm
// ---------------------------------------------------------------------------

/// Make `iso_code` the default currency.
///
/// 1. Read the ISO of the row holding the reserved id (`NotFound` if none).
/// 2. Return `Unchanged` if it already matches.
/// 3. Find the target row by ISO, or create it from reference data.
/// 4. Give the current holder a fresh id, then give the target the reserved id.
/// 5. Rebase factors by `1 / target.factor`, target set to exactly 1.
///
/// Nothing is written before step 3 succeeds, so an unknown ISO code leaves
/// the store untouched.
pub async fn set_default_currency<S>(
    store: &mut S,
    reference: &CurrencyReference,
    iso_code: &str,
) -> Result<DefaultCurrencyChange, CoreError>
where
    S: CurrencyStore + ?Sized,
{
    let target_iso = iso_code.trim().to_uppercase();

    let current_iso = store
        .iso_code_by_id(DEFAULT_CURRENCY_ID)
        .await?
        .ok_or_else(|| CoreError::NotFound("Default currency not found".to_string()))?;

    if current_iso.to_uppercase() == target_iso {
        tracing::debug!(iso_code = %target_iso, "Default currency already set");
        return Ok(DefaultCurrencyChange::Unchanged {
            iso_code: current_iso,
        });
    }

    let (target, created) = match store.find_by_iso(&target_iso).await? {
        Some(existing) => (existing, false),
        None => {
            let currency = NewCurrency::from_reference(reference, &target_iso)?;
            store.insert_currency(&currency).await?;
            tracing::info!(iso_code = %target_iso, id = %currency.id, "Created currency from reference data");
            (
                CurrencyMatch {
                    id: currency.id,
                    factor: currency.factor,
                },
                true,
            )
        }
    };

    if !target.factor.is_finite() || target.factor <= 0.0 {
        return Err(CoreError::Internal(format!(
            "currency {target_iso} has invalid factor {}",
            target.factor
        )));
    }
    let correction = 1.0 / target.factor;

    let vacated_id = random_id();
    store.change_id(DEFAULT_CURRENCY_ID, vacated_id).await?;
    store.change_id(target.id, DEFAULT_CURRENCY_ID).await?;
    store.rebase_factors(&target_iso, correction).await?;

    tracing::info!(
        previous = %current_iso,
        current = %target_iso,
        correction,
        "Default currency reassigned",
    );

    Ok(DefaultCurrencyChange::Reassigned {
        previous_iso_code: current_iso,
        iso_code: target_iso,
        created,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
