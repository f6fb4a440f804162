use std::path::{Path, PathBuf};

use shopinit_core::dsn::DatabaseDsn;
use shopinit_core::error::CoreError;
use shopinit_core::install::{SetupSettings, DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};

/// Name of the flag subcommands read to enable blue-green deployment triggers.
pub const BLUE_GREEN_VAR: &str = "BLUE_GREEN_DEPLOYMENT";

/// Installer configuration loaded from environment variables.
///
/// All fields except the database URL have defaults suitable for a
/// standard project layout.
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Raw `DATABASE_URL`; validated by [`InstallerConfig::dsn`].
    pub database_url: Option<String>,
    /// Project root.
    pub project_dir: PathBuf,
    /// Application environment (default: `prod`).
    pub app_env: String,
    /// Public URL of the storefront (default: `http://localhost`).
    pub app_url: String,
    /// Directory recreated after cache clearing.
    pub cache_dir: PathBuf,
    /// Platform console, relative paths resolved against the project root.
    pub console_bin: PathBuf,
    /// Program that runs the console script (e.g. `php`); empty runs it directly.
    pub console_interpreter: Option<String>,
    /// Raw `BLUE_GREEN_DEPLOYMENT`; unset means enabled.
    pub blue_green_deployment: Option<String>,
    /// Password for the admin user created by `--basic-setup`.
    pub admin_password: String,
    /// Explicit currency reference file.
    pub currency_data_file: Option<PathBuf>,
}

impl InstallerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                  | Default                          |
    /// |--------------------------|----------------------------------|
    /// | `DATABASE_URL`           | required                         |
    /// | `APP_ENV`                | `prod`                           |
    /// | `APP_URL`                | `http://localhost`               |
    /// | `CACHE_DIR`              | `<project>/var/cache/<APP_ENV>`  |
    /// | `CONSOLE_BIN`            | `bin/console`                    |
    /// | `CONSOLE_INTERPRETER`    | unset                            |
    /// | `BLUE_GREEN_DEPLOYMENT`  | unset (enabled)                  |
    /// | `INSTALL_ADMIN_PASSWORD` | `shopware`                       |
    /// | `CURRENCY_DATA_FILE`     | unset                            |
    pub fn from_env(project_dir: Option<PathBuf>) -> std::io::Result<Self> {
        let project_dir = match project_dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        Ok(Self::from_lookup(project_dir, |key| std::env::var(key).ok()))
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(project_dir: PathBuf, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let app_env = var("APP_ENV").unwrap_or_else(|| "prod".into());

        let cache_dir = var("CACHE_DIR")
            .map(|dir| resolve(&project_dir, Path::new(&dir)))
            .unwrap_or_else(|| project_dir.join("var/cache").join(&app_env));

        let console_bin = resolve(
            &project_dir,
            Path::new(&var("CONSOLE_BIN").unwrap_or_else(|| "bin/console".into())),
        );

        Self {
            database_url: lookup("DATABASE_URL"),
            app_url: var("APP_URL").unwrap_or_else(|| "http://localhost".into()),
            cache_dir,
            console_bin,
            console_interpreter: var("CONSOLE_INTERPRETER"),
            blue_green_deployment: lookup(BLUE_GREEN_VAR),
            admin_password: var("INSTALL_ADMIN_PASSWORD")
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.into()),
            currency_data_file: var("CURRENCY_DATA_FILE")
                .map(|f| resolve(&project_dir, Path::new(&f))),
            app_env,
            project_dir,
        }
    }

    /// Validated DSN; a missing or placeholder URL is a configuration error.
    pub fn dsn(&self) -> Result<DatabaseDsn, CoreError> {
        DatabaseDsn::parse(self.database_url.as_deref().unwrap_or_default())
    }

    /// Extra environment handed to every subcommand.
    pub fn console_env(&self) -> Vec<(String, String)> {
        match self.blue_green_deployment {
            Some(_) => Vec::new(),
            None => vec![(BLUE_GREEN_VAR.to_string(), "1".to_string())],
        }
    }

    pub fn setup_settings(&self) -> SetupSettings {
        SetupSettings {
            app_url: self.app_url.clone(),
            admin_username: DEFAULT_ADMIN_USERNAME.to_string(),
            admin_password: self.admin_password.clone(),
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> InstallerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        InstallerConfig::from_lookup(PathBuf::from("/srv/shop"), move |key| {
            vars.get(key).cloned()
        })
    }

    #[test]
    fn defaults_follow_project_layout() {
        let config = config(&[]);

        assert_eq!(config.app_env, "prod");
        assert_eq!(config.app_url, "http://localhost");
        assert_eq!(config.cache_dir, PathBuf::from("/srv/shop/var/cache/prod"));
        assert_eq!(config.console_bin, PathBuf::from("/srv/shop/bin/console"));
        assert_eq!(config.admin_password, "shopware");
        assert!(config.console_interpreter.is_none());
        assert!(config.currency_data_file.is_none());
    }

    #[test]
    fn cache_dir_follows_app_env() {
        let config = config(&[("APP_ENV", "dev")]);
        assert_eq!(config.cache_dir, PathBuf::from("/srv/shop/var/cache/dev"));
    }

    #[test]
    fn absolute_paths_are_kept() {
        let config = config(&[("CACHE_DIR", "/tmp/cache"), ("CONSOLE_BIN", "/usr/bin/console")]);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/cache"));
        assert_eq!(config.console_bin, PathBuf::from("/usr/bin/console"));
    }

    #[test]
    fn blue_green_defaults_on_for_subcommands() {
        assert_eq!(
            config(&[]).console_env(),
            vec![(BLUE_GREEN_VAR.to_string(), "1".to_string())]
        );
        assert!(config(&[(BLUE_GREEN_VAR, "0")]).console_env().is_empty());
    }

    #[test]
    fn missing_database_url_is_a_configuration_error() {
        assert_matches!(config(&[]).dsn(), Err(CoreError::Configuration(_)));
        assert_matches!(
            config(&[("DATABASE_URL", "mysql://_placeholder.test")]).dsn(),
            Err(CoreError::Configuration(_))
        );
        assert!(config(&[("DATABASE_URL", "mysql://u:p@localhost/shop")])
            .dsn()
            .is_ok());
    }

    #[test]
    fn setup_settings_use_app_url() {
        let settings = config(&[("APP_URL", "https://shop.test")]).setup_settings();
        assert_eq!(settings.app_url, "https://shop.test");
        assert_eq!(settings.admin_username, "admin");
    }
}
