//! The `install` command.

use std::sync::Arc;

use shopinit_core::currency::CurrencyBackend;
use shopinit_core::install::{
    ensure_not_installed, execute_plan, plan_operations, InstallOptions, OP_CACHE_CLEAR,
    OP_SET_CURRENCY,
};
use shopinit_core::pipeline::OperationRegistry;
use shopinit_core::reference::CurrencyReference;
use shopinit_db::provision::prepare_database;
use shopinit_db::MySqlCurrencyBackend;

use crate::config::InstallerConfig;
use crate::console::ConsoleCommand;
use crate::currency_fix::{Activation, CurrencyFixCommand};
use crate::error::CliResult;

/// Handlers for every operation of the install plan.
///
/// Operations without an explicit registration go to the platform console.
pub fn build_registry(
    config: &InstallerConfig,
    currency_fix: Arc<CurrencyFixCommand>,
) -> OperationRegistry {
    let console = ConsoleCommand::new(config);

    let mut registry = OperationRegistry::new();
    registry
        .register(
            OP_CACHE_CLEAR,
            Arc::new(console.clone().preserving(config.cache_dir.clone())),
        )
        .register(OP_SET_CURRENCY, currency_fix)
        .set_fallback(Arc::new(console));
    registry
}

/// The currency handler for an install, activated only when the install
/// was asked to set a currency.
pub fn currency_command(
    options: &InstallOptions,
    backend: Arc<dyn CurrencyBackend>,
    reference: Arc<CurrencyReference>,
) -> Arc<CurrencyFixCommand> {
    let command = Arc::new(CurrencyFixCommand::new(backend, reference));
    if options.currency().is_some() {
        command.activate(Activation::issue());
    }
    command
}

/// Load the currency reference data for the configured project.
pub fn load_reference(config: &InstallerConfig) -> CliResult<Arc<CurrencyReference>> {
    let reference = CurrencyReference::for_project(
        &config.project_dir,
        config.currency_data_file.as_deref(),
    )?;
    Ok(Arc::new(reference))
}

/// Runs a complete install.
pub struct Installer {
    config: InstallerConfig,
}

impl Installer {
    pub fn new(config: InstallerConfig) -> Self {
        Self { config }
    }

    /// Returns the first non-zero subcommand status, or 0 after the lock
    /// marker was written.
    pub async fn run(&self, options: &InstallOptions) -> CliResult<i32> {
        let dsn = self.config.dsn()?;
        ensure_not_installed(&self.config.project_dir, options.force)?;

        let report = prepare_database(&dsn, options, &self.config.project_dir).await?;
        tracing::debug!(?report, "Database prepared");

        let pool = shopinit_db::create_pool(&dsn).await?;
        shopinit_db::health_check(&pool).await?;
        tracing::debug!("Database health check passed");
        let reference = load_reference(&self.config)?;

        let currency_fix = currency_command(
            options,
            Arc::new(MySqlCurrencyBackend::new(pool.clone())),
            reference,
        );

        let registry = build_registry(&self.config, currency_fix);
        let operations = plan_operations(options, &self.config.setup_settings());
        tracing::info!(steps = operations.len(), "Running install pipeline");

        let status = execute_plan(&registry, &operations, &self.config.project_dir).await;
        pool.close().await;

        let status = status?;
        if status == 0 {
            tracing::info!("Installation finished");
        }
        Ok(status)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
