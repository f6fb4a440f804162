//! Repository for the `currency` and `currency_translation` tables.
//!
//! [`MySqlCurrencyStore`] borrows a single connection (usually a
//! transaction); [`MySqlCurrencyBackend`] owns a pool and wraps each
//! reassignment in its own transaction.

use async_trait::async_trait;
use sqlx::{MySqlConnection, MySqlPool};

use shopinit_core::currency::{
    set_default_currency, CurrencyBackend, CurrencyMatch, CurrencyStore, DefaultCurrencyChange,
    NewCurrency,
};
use shopinit_core::error::CoreError;
use shopinit_core::reference::CurrencyReference;
use shopinit_core::types::DbId;

use crate::storage_error;

/// Row-level access on one connection.
pub struct MySqlCurrencyStore<'c> {
    conn: &'c mut MySqlConnection,
}

impl<'c> MySqlCurrencyStore<'c> {
    pub fn new(conn: &'c mut MySqlConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CurrencyStore for MySqlCurrencyStore<'_> {
    async fn iso_code_by_id(&mut self, id: DbId) -> Result<Option<String>, CoreError> {
        sqlx::query_scalar::<_, String>("SELECT iso_code FROM currency WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(storage_error)
    }

    async fn find_by_iso(&mut self, iso_code: &str) -> Result<Option<CurrencyMatch>, CoreError> {
        let row = sqlx::query_as::<_, (DbId, f64)>(
            "SELECT id, factor FROM currency WHERE LOWER(iso_code) = LOWER(?)",
        )
        .bind(iso_code)
        .fetch_optional(&mut *self.conn)
        .await
        .map_err(storage_error)?;

        Ok(row.map(|(id, factor)| CurrencyMatch { id, factor }))
    }

    async fn insert_currency(&mut self, currency: &NewCurrency) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO currency \
                 (id, iso_code, factor, symbol, position, decimal_precision, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(currency.id)
        .bind(&currency.iso_code)
        .bind(currency.factor)
        .bind(&currency.symbol)
        .bind(currency.position)
        .bind(currency.decimal_precision)
        .bind(&currency.created_at)
        .execute(&mut *self.conn)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            "INSERT INTO currency_translation \
                 (currency_id, language_id, short_name, name, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(currency.id)
        .bind(currency.language_id)
        .bind(&currency.short_name)
        .bind(&currency.name)
        .bind(&currency.created_at)
        .execute(&mut *self.conn)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn change_id(&mut self, old_id: DbId, new_id: DbId) -> Result<u64, CoreError> {
        let result = sqlx::query("UPDATE currency SET id = ? WHERE id = ?")
            .bind(new_id)
            .bind(old_id)
            .execute(&mut *self.conn)
            .await
            .map_err(storage_error)?;
        Ok(result.rows_affected())
    }

    async fn rebase_factors(
        &mut self,
        base_iso: &str,
        correction: f64,
    ) -> Result<u64, CoreError> {
        let result = sqlx::query(
            "UPDATE currency \
             SET factor = IF(LOWER(iso_code) = LOWER(?), 1, factor * ?)",
        )
        .bind(base_iso)
        .bind(correction)
        .execute(&mut *self.conn)
        .await
        .map_err(storage_error)?;
        Ok(result.rows_affected())
    }
}

/// Transactional [`CurrencyBackend`] over a pool.
#[derive(Debug, Clone)]
pub struct MySqlCurrencyBackend {
    pool: MySqlPool,
}

impl MySqlCurrencyBackend {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CurrencyBackend for MySqlCurrencyBackend {
    async fn set_default_currency(
        &self,
        reference: &CurrencyReference,
        iso_code: &str,
    ) -> Result<DefaultCurrencyChange, CoreError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        // Dropping `tx` on the error path rolls back.
        let change = {
            let mut store = MySqlCurrencyStore::new(&mut *tx);
            set_default_currency(&mut store, reference, iso_code).await?
        };

        tx.commit().await.map_err(storage_error)?;
        Ok(change)
    }
}
