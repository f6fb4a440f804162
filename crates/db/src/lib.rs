//! MySQL access for the installer.
//!
//! - [`provision`]: server-level connection, database create/drop/select and
//!   base schema import.
//! - [`currency_repo`]: the `currency` tables behind
//!   [`shopinit_core::currency::CurrencyStore`].

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};

use shopinit_core::dsn::DatabaseDsn;
use shopinit_core::error::CoreError;

pub mod currency_repo;
pub mod provision;

pub use currency_repo::{MySqlCurrencyBackend, MySqlCurrencyStore};

pub type DbPool = sqlx::MySqlPool;

/// Character set used for every connection and for created databases.
pub const CHARSET: &str = "utf8mb4";

/// The installer never runs queries in parallel.
const MAX_POOL_CONNECTIONS: u32 = 2;

/// Connection options without a database selected.
pub fn server_options(dsn: &DatabaseDsn) -> MySqlConnectOptions {
    let options = MySqlConnectOptions::new()
        .host(&dsn.host)
        .port(dsn.port)
        .charset(CHARSET);

    match &dsn.credentials {
        Some((user, password)) => options.username(user).password(password),
        None => options,
    }
}

/// Connection options for the named database.
pub fn database_options(dsn: &DatabaseDsn) -> MySqlConnectOptions {
    server_options(dsn).database(&dsn.database)
}

/// Create a connection pool on the configured database.
pub async fn create_pool(dsn: &DatabaseDsn) -> Result<DbPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(MAX_POOL_CONNECTIONS)
        .connect_with(database_options(dsn))
        .await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Map a driver error into the domain taxonomy.
pub fn storage_error(err: sqlx::Error) -> CoreError {
    CoreError::Storage(err.to_string())
}
