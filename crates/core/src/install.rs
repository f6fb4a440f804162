//! Install plan, lock marker and post-install finalisation.
//!
//! Database provisioning lives in `shopinit-db`; everything here is pure or
//! touches only the project directory.

use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::pipeline::{Operation, OperationRegistry, Sequencer};

// ---------------------------------------------------------------------------
// Operation names
// ---------------------------------------------------------------------------

pub const OP_MIGRATE: &str = "database:migrate";
pub const OP_MIGRATE_DESTRUCTIVE: &str = "database:migrate-destructive";
pub const OP_REFRESH_INDEX: &str = "dal:refresh:index";
pub const OP_THEME_REFRESH: &str = "theme:refresh";
pub const OP_THEME_COMPILE: &str = "theme:compile";
pub const OP_SET_LOCALE: &str = "system:locale-destructive";
pub const OP_SET_CURRENCY: &str = "system:currency-destructive";
pub const OP_CREATE_USER: &str = "user:create";
pub const OP_CREATE_STOREFRONT: &str = "sales-channel:create:storefront";
pub const OP_THEME_CHANGE: &str = "theme:change";
pub const OP_ASSETS_INSTALL: &str = "assets:install";
pub const OP_CACHE_CLEAR: &str = "cache:clear";

// ---------------------------------------------------------------------------
// Project files
// ---------------------------------------------------------------------------

/// Marker written after a successful install.
pub const LOCK_FILE: &str = "install.lock";

/// Runtime web-server configuration and its distributed template.
pub const HTACCESS_FILE: &str = "public/.htaccess";
pub const HTACCESS_TEMPLATE: &str = "public/.htaccess.dist";

/// Defaults for the basic setup.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "shopware";
pub const STOREFRONT_NAME: &str = "Storefront";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Flags of an install run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    pub create_database: bool,
    pub drop_database: bool,
    pub basic_setup: bool,
    pub force: bool,
    pub locale: Option<String>,
    pub currency: Option<String>,
}

impl InstallOptions {
    /// Dropping always recreates.
    pub fn creates_database(&self) -> bool {
        self.create_database || self.drop_database
    }

    /// Currency requested for the default slot, if any.
    pub fn currency(&self) -> Option<&str> {
        non_empty(self.currency.as_deref())
    }

    pub fn locale(&self) -> Option<&str> {
        non_empty(self.locale.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Values the basic setup feeds into its operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupSettings {
    pub app_url: String,
    pub admin_username: String,
    pub admin_password: String,
}

impl Default for SetupSettings {
    fn default() -> Self {
        Self {
            app_url: "http://localhost".to_string(),
            admin_username: DEFAULT_ADMIN_USERNAME.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Build the ordered operation list for an install.
pub fn plan_operations(options: &InstallOptions, settings: &SetupSettings) -> Vec<Operation> {
    let mut ops = vec![
        Operation::new(OP_MIGRATE)
            .value("identifier", "core")
            .flag("--all"),
        Operation::new(OP_MIGRATE_DESTRUCTIVE)
            .value("identifier", "core")
            .flag("--all"),
        Operation::new(OP_REFRESH_INDEX),
        Operation::new(OP_THEME_REFRESH),
        Operation::new(OP_THEME_COMPILE),
    ];

    if let Some(locale) = options.locale() {
        ops.push(Operation::new(OP_SET_LOCALE).value("locale", locale));
    }

    if let Some(currency) = options.currency() {
        ops.push(Operation::new(OP_SET_CURRENCY).value("currency", currency));
    }

    if options.basic_setup {
        ops.push(
            Operation::new(OP_CREATE_USER)
                .value("username", settings.admin_username.as_str())
                .flag("--admin")
                .value("--password", settings.admin_password.as_str()),
        );
        ops.push(
            Operation::new(OP_CREATE_STOREFRONT)
                .value("--name", STOREFRONT_NAME)
                .value("--url", settings.app_url.as_str()),
        );
        ops.push(
            Operation::new(OP_THEME_CHANGE)
                .flag("--all")
                .value("theme-name", STOREFRONT_NAME),
        );
    }

    ops.push(Operation::new(OP_ASSETS_INSTALL));
    ops.push(Operation::new(OP_CACHE_CLEAR));
    ops
}

// ---------------------------------------------------------------------------
// Lock marker and finalisation
// ---------------------------------------------------------------------------

pub fn lock_path(project_dir: &Path) -> PathBuf {
    project_dir.join(LOCK_FILE)
}

/// Fail with [`CoreError::AlreadyInstalled`] if the lock exists and `force`
/// is not set.
pub fn ensure_not_installed(project_dir: &Path, force: bool) -> Result<(), CoreError> {
    if !force && lock_path(project_dir).exists() {
        return Err(CoreError::AlreadyInstalled(format!(
            "{LOCK_FILE} already exists. Delete it or pass --force to do it anyway."
        )));
    }
    Ok(())
}

/// Ensure the runtime configuration exists, then touch the lock marker.
pub fn finalize_install(project_dir: &Path) -> Result<(), CoreError> {
    let htaccess = project_dir.join(HTACCESS_FILE);
    if !htaccess.exists() {
        let template = project_dir.join(HTACCESS_TEMPLATE);
        if template.is_file() {
            std::fs::copy(&template, &htaccess).map_err(|e| write_error(&htaccess, e))?;
            tracing::info!(path = %htaccess.display(), "Created runtime configuration from template");
        } else {
            tracing::warn!(
                template = %template.display(),
                "Runtime configuration template missing, skipping",
            );
        }
    }

    let lock = lock_path(project_dir);
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&lock)
        .map_err(|e| write_error(&lock, e))?;
    tracing::debug!(path = %lock.display(), "Wrote install lock");
    Ok(())
}

fn write_error(path: &Path, err: std::io::Error) -> CoreError {
    match err.kind() {
        std::io::ErrorKind::PermissionDenied => {
            CoreError::Permission(format!("Cannot write {}", path.display()))
        }
        _ => CoreError::Io(err),
    }
}

/// Run the plan and, when every operation succeeded, finalise the install.
///
/// A non-zero status is returned unchanged and leaves the lock marker
/// unwritten.
pub async fn execute_plan(
    registry: &OperationRegistry,
    operations: &[Operation],
    project_dir: &Path,
) -> Result<i32, CoreError> {
    let status = Sequencer::new(registry).run(operations).await?;
    if status != 0 {
        return Ok(status);
    }

    finalize_install(project_dir)?;
    Ok(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{OperationHandler, Parameters};
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    fn names(ops: &[Operation]) -> Vec<&str> {
        ops.iter().map(|o| o.name.as_str()).collect()
    }

    struct FailAt {
        index: usize,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl OperationHandler for FailAt {
        async fn run(&self, name: &str, _params: &Parameters) -> Result<i32, CoreError> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(name.to_string());
            Ok(if seen.len() == self.index + 1 { 1 } else { 0 })
        }
    }

    // -- Plan ---------------------------------------------------------------

    #[test]
    fn minimal_plan_has_fixed_order() {
        let ops = plan_operations(&InstallOptions::default(), &SetupSettings::default());

        assert_eq!(
            names(&ops),
            vec![
                OP_MIGRATE,
                OP_MIGRATE_DESTRUCTIVE,
                OP_REFRESH_INDEX,
                OP_THEME_REFRESH,
                OP_THEME_COMPILE,
                OP_ASSETS_INSTALL,
                OP_CACHE_CLEAR,
            ]
        );
        assert_eq!(ops[0].params.to_args(), vec!["core", "--all"]);
    }

    #[test]
    fn full_plan_inserts_optional_steps() {
        let options = InstallOptions {
            basic_setup: true,
            locale: Some("de-DE".to_string()),
            currency: Some("USD".to_string()),
            ..InstallOptions::default()
        };
        let settings = SetupSettings {
            app_url: "https://shop.test".to_string(),
            ..SetupSettings::default()
        };

        let ops = plan_operations(&options, &settings);

        assert_eq!(
            names(&ops),
            vec![
                OP_MIGRATE,
                OP_MIGRATE_DESTRUCTIVE,
                OP_REFRESH_INDEX,
                OP_THEME_REFRESH,
                OP_THEME_COMPILE,
                OP_SET_LOCALE,
                OP_SET_CURRENCY,
                OP_CREATE_USER,
                OP_CREATE_STOREFRONT,
                OP_THEME_CHANGE,
                OP_ASSETS_INSTALL,
                OP_CACHE_CLEAR,
            ]
        );
        assert_eq!(ops[6].params.get("currency"), Some("USD"));
        assert_eq!(
            ops[7].params.to_args(),
            vec!["admin", "--admin", "--password=shopware"]
        );
        assert_eq!(
            ops[8].params.to_args(),
            vec!["--name=Storefront", "--url=https://shop.test"]
        );
        assert_eq!(ops[9].params.to_args(), vec!["Storefront", "--all"]);
    }

    #[test]
    fn blank_locale_and_currency_are_ignored() {
        let options = InstallOptions {
            locale: Some(String::new()),
            currency: Some("  ".to_string()),
            ..InstallOptions::default()
        };

        let ops = plan_operations(&options, &SetupSettings::default());

        assert_eq!(ops.len(), 7);
    }

    #[test]
    fn drop_implies_create() {
        let options = InstallOptions {
            drop_database: true,
            ..InstallOptions::default()
        };
        assert!(options.creates_database());
        assert!(!InstallOptions::default().creates_database());
    }

    // -- Lock ---------------------------------------------------------------

    #[test]
    fn existing_lock_blocks_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(lock_path(dir.path()), "").unwrap();

        assert_matches!(
            ensure_not_installed(dir.path(), false),
            Err(CoreError::AlreadyInstalled(_))
        );
        assert!(ensure_not_installed(dir.path(), true).is_ok());
    }

    #[test]
    fn finalize_copies_template_and_writes_lock() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("public")).unwrap();
        std::fs::write(dir.path().join(HTACCESS_TEMPLATE), "RewriteEngine On").unwrap();

        finalize_install(dir.path()).unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join(HTACCESS_FILE)).unwrap(),
            "RewriteEngine On"
        );
        assert!(lock_path(dir.path()).exists());
    }

    #[test]
    fn finalize_keeps_existing_runtime_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("public")).unwrap();
        std::fs::write(dir.path().join(HTACCESS_FILE), "custom").unwrap();
        std::fs::write(dir.path().join(HTACCESS_TEMPLATE), "template").unwrap();

        finalize_install(dir.path()).unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join(HTACCESS_FILE)).unwrap(),
            "custom"
        );
    }

    // -- Execution ----------------------------------------------------------

    #[tokio::test]
    async fn failing_third_step_short_circuits_and_skips_lock() {
        let dir = tempfile::tempdir().unwrap();
        let handler = Arc::new(FailAt {
            index: 2,
            seen: Mutex::new(Vec::new()),
        });
        let mut registry = OperationRegistry::new();
        registry.set_fallback(handler.clone());
        let ops = plan_operations(&InstallOptions::default(), &SetupSettings::default());

        let status = execute_plan(&registry, &ops, dir.path()).await.unwrap();

        assert_eq!(status, 1);
        assert_eq!(
            *handler.seen.lock().unwrap(),
            vec![OP_MIGRATE, OP_MIGRATE_DESTRUCTIVE, OP_REFRESH_INDEX]
        );
        assert!(!lock_path(dir.path()).exists());
    }

    #[tokio::test]
    async fn successful_plan_writes_lock() {
        let dir = tempfile::tempdir().unwrap();
        let handler = Arc::new(FailAt {
            index: usize::MAX - 1,
            seen: Mutex::new(Vec::new()),
        });
        let mut registry = OperationRegistry::new();
        registry.set_fallback(handler.clone());
        let ops = plan_operations(&InstallOptions::default(), &SetupSettings::default());

        let status = execute_plan(&registry, &ops, dir.path()).await.unwrap();

        assert_eq!(status, 0);
        assert_eq!(handler.seen.lock().unwrap().len(), ops.len());
        assert!(lock_path(dir.path()).exists());
    }
}
