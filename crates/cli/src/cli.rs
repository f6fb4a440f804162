//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use shopinit_core::install::InstallOptions;

/// Top-level arguments.
#[derive(Parser, Debug)]
#[command(name = "shopinit", author, version, about = "Install and bootstrap a shop", long_about = None)]
pub struct CliArgs {
    /// Project root containing `bin/console`, `public/` and `vendor/`.
    #[arg(long, env = "PROJECT_ROOT", global = true)]
    pub project_dir: Option<PathBuf>,

    /// Enable debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Prepare the database and run the install pipeline.
    Install(InstallArgs),

    /// Change the default currency.
    ///
    /// Only runs as part of `install --currency`; invoking it directly is
    /// always rejected.
    #[command(name = "currency-fix")]
    CurrencyFix {
        /// ISO code of the new default currency.
        currency: String,
    },

    /// List the currency reference data.
    Currencies,
}

/// Flags of `install`.
#[derive(Args, Debug, Default)]
pub struct InstallArgs {
    /// Create the database if it doesn't exist.
    #[arg(long)]
    pub create_database: bool,

    /// Drop the existing database (implies --create-database).
    #[arg(long)]
    pub drop_database: bool,

    /// Create the storefront sales channel and admin user.
    #[arg(long)]
    pub basic_setup: bool,

    /// Install even if install.lock exists.
    #[arg(short, long)]
    pub force: bool,

    /// Default locale in ISO format.
    #[arg(short, long)]
    pub locale: Option<String>,

    /// Default currency in ISO format.
    #[arg(short, long)]
    pub currency: Option<String>,
}

impl From<&InstallArgs> for InstallOptions {
    fn from(args: &InstallArgs) -> Self {
        Self {
            create_database: args.create_database,
            drop_database: args.drop_database,
            basic_setup: args.basic_setup,
            force: args.force,
            locale: args.locale.clone(),
            currency: args.currency.clone(),
        }
    }
}
