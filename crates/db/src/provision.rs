//! Database provisioning over a server-level connection.
//!
//! DDL and `USE` go through the text protocol (`raw_sql`) because MySQL does
//! not accept them as prepared statements.

use std::path::Path;

use sqlx::{ConnectOptions, Connection, MySqlConnection};

use shopinit_core::dsn::{validate_database_name, DatabaseDsn};
use shopinit_core::error::CoreError;
use shopinit_core::install::InstallOptions;
use shopinit_core::schema::{read_base_schema, MIGRATION_TABLE};

use crate::{server_options, storage_error, CHARSET};

/// Collation for created databases.
pub const COLLATION: &str = "utf8mb4_unicode_ci";

/// What [`prepare_database`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub dropped: bool,
    pub created: bool,
    pub schema_imported: bool,
}

/// Open a connection with no database selected.
pub async fn connect_server(dsn: &DatabaseDsn) -> Result<MySqlConnection, sqlx::Error> {
    server_options(dsn).connect().await
}

fn drop_database_sql(name: &str) -> Result<String, CoreError> {
    validate_database_name(name)?;
    Ok(format!("DROP DATABASE IF EXISTS `{name}`"))
}

fn create_database_sql(name: &str) -> Result<String, CoreError> {
    validate_database_name(name)?;
    Ok(format!(
        "CREATE DATABASE IF NOT EXISTS `{name}` CHARACTER SET `{CHARSET}` COLLATE `{COLLATION}`"
    ))
}

/// Base schema to import into the selected database, if any.
///
/// A database that already has a migration table is left alone, so a forced
/// re-run neither re-imports nor needs `schema.sql` to be present.
pub fn base_schema_to_import(
    has_migration_table: bool,
    project_dir: &Path,
) -> Result<Option<String>, CoreError> {
    if has_migration_table {
        tracing::debug!(table = MIGRATION_TABLE, "Migration table exists, skipping base schema");
        return Ok(None);
    }
    read_base_schema(project_dir).map(Some)
}

pub async fn drop_database(conn: &mut MySqlConnection, name: &str) -> Result<(), CoreError> {
    sqlx::raw_sql(&drop_database_sql(name)?)
        .execute(&mut *conn)
        .await
        .map_err(storage_error)?;
    Ok(())
}

/// Create the database if missing. Safe to repeat.
pub async fn create_database(conn: &mut MySqlConnection, name: &str) -> Result<(), CoreError> {
    sqlx::raw_sql(&create_database_sql(name)?)
        .execute(&mut *conn)
        .await
        .map_err(storage_error)?;
    Ok(())
}

pub async fn use_database(conn: &mut MySqlConnection, name: &str) -> Result<(), CoreError> {
    validate_database_name(name)?;
    sqlx::raw_sql(&format!("USE `{name}`"))
        .execute(&mut *conn)
        .await
        .map_err(storage_error)?;
    Ok(())
}

/// Whether the currently selected database has a table called `table`.
pub async fn has_table(conn: &mut MySqlConnection, table: &str) -> Result<bool, CoreError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables \
         WHERE table_schema = DATABASE() AND table_name = ?",
    )
    .bind(table)
    .fetch_one(&mut *conn)
    .await
    .map_err(storage_error)?;
    Ok(count > 0)
}

/// Execute a multi-statement SQL script.
pub async fn import_schema(conn: &mut MySqlConnection, sql: &str) -> Result<(), CoreError> {
    sqlx::raw_sql(sql)
        .execute(&mut *conn)
        .await
        .map_err(storage_error)?;
    Ok(())
}

/// Steps 1-3 of an install: drop/create/select the database and import the
/// base schema when there is no migration history yet.
pub async fn prepare_database(
    dsn: &DatabaseDsn,
    options: &InstallOptions,
    project_dir: &Path,
) -> Result<ProvisionReport, CoreError> {
    tracing::info!(server = %dsn.redacted_server_url(), database = %dsn.database, "Prepare installation");

    let mut conn = connect_server(dsn).await.map_err(storage_error)?;
    let mut report = ProvisionReport::default();

    if options.drop_database {
        drop_database(&mut conn, &dsn.database).await?;
        report.dropped = true;
        tracing::info!(database = %dsn.database, "Dropped database");
    }

    if options.creates_database() {
        create_database(&mut conn, &dsn.database).await?;
        report.created = true;
        tracing::info!(database = %dsn.database, "Created database");
    }

    use_database(&mut conn, &dsn.database).await?;

    let has_migrations = has_table(&mut conn, MIGRATION_TABLE).await?;
    if let Some(schema) = base_schema_to_import(has_migrations, project_dir)? {
        tracing::info!("Importing base schema.sql");
        import_schema(&mut conn, &schema).await?;
        report.schema_imported = true;
    }

    conn.close().await.map_err(storage_error)?;
    Ok(report)
}
