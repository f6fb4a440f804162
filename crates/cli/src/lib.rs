//! `shopinit` command-line front end.
//!
//! - `install`: prepare the database and run the install pipeline.
//! - `currency-fix`: the guarded default-currency command; always rejected
//!   when invoked on its own.
//! - `currencies`: print the currency reference data.

use std::io::Write;

use shopinit_core::install::InstallOptions;

pub mod cli;
pub mod config;
pub mod console;
pub mod currency_fix;
pub mod error;
pub mod installer;

use cli::{CliArgs, Command};
use config::InstallerConfig;
use currency_fix::not_activated;
use error::CliResult;
use installer::{load_reference, Installer};

/// Run the parsed command and return its exit status.
pub async fn run(args: CliArgs) -> CliResult<i32> {
    match args.command {
        Command::Install(install) => {
            let config = InstallerConfig::from_env(args.project_dir)?;
            Installer::new(config)
                .run(&InstallOptions::from(&install))
                .await
        }
        // Only the installer can activate the command, so a direct call is
        // rejected before any configuration is read.
        Command::CurrencyFix { currency } => {
            tracing::debug!(%currency, "Standalone currency change requested");
            Err(not_activated().into())
        }
        Command::Currencies => {
            let config = InstallerConfig::from_env(args.project_dir)?;
            let reference = load_reference(&config)?;
            print_currencies(&reference, &mut std::io::stdout().lock())?;
            Ok(0)
        }
    }
}

/// Write one line per reference entry: code, symbol, digits, name.
pub fn print_currencies(
    reference: &shopinit_core::reference::CurrencyReference,
    out: &mut impl Write,
) -> std::io::Result<()> {
    for (code, info) in reference.iter() {
        writeln!(
            out,
            "{code:<4} {:<6} {:>2}  {}",
            info.symbol, info.decimal_digits, info.name
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopinit_core::reference::CurrencyReference;

    #[test]
    fn currency_listing_has_one_line_per_entry() {
        let reference = CurrencyReference::embedded().unwrap();
        let mut out = Vec::new();

        print_currencies(&reference, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), reference.len());
        assert!(text.lines().any(|l| l.starts_with("USD ")));
    }
}
