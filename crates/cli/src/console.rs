//! Platform console subprocess handler.
//!
//! Every operation without a dedicated handler runs as
//! `<console> <name> <args...> --no-interaction` inside the project root.
//! Output is inherited so the user sees the subcommand's progress directly.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use shopinit_core::error::CoreError;
use shopinit_core::pipeline::{OperationHandler, Parameters};

use crate::config::InstallerConfig;

/// Appended to every console invocation.
pub const NO_INTERACTION: &str = "--no-interaction";

/// Status reported when the child was killed by a signal.
const SIGNAL_STATUS: i32 = 1;

/// Runs operations through the platform console.
#[derive(Debug, Clone)]
pub struct ConsoleCommand {
    program: PathBuf,
    interpreter: Option<String>,
    project_dir: PathBuf,
    env: Vec<(String, String)>,
    preserved_dir: Option<PathBuf>,
}

impl ConsoleCommand {
    pub fn new(config: &InstallerConfig) -> Self {
        Self {
            program: config.console_bin.clone(),
            interpreter: config.console_interpreter.clone(),
            project_dir: config.project_dir.clone(),
            env: config.console_env(),
            preserved_dir: None,
        }
    }

    /// Same console, but `dir` is recreated after each run.
    pub fn preserving(mut self, dir: impl Into<PathBuf>) -> Self {
        self.preserved_dir = Some(dir.into());
        self
    }

    /// Argument vector after the program (or interpreter) name.
    pub fn arguments(&self, name: &str, params: &Parameters) -> Vec<String> {
        let mut args = Vec::with_capacity(params.iter().count() + 3);
        if self.interpreter.is_some() {
            args.push(self.program.display().to_string());
        }
        args.push(name.to_string());
        args.extend(params.to_args());
        args.push(NO_INTERACTION.to_string());
        args
    }

    fn command(&self, name: &str, params: &Parameters) -> Command {
        let mut cmd = match &self.interpreter {
            Some(interpreter) => Command::new(interpreter),
            None => Command::new(&self.program),
        };
        cmd.args(self.arguments(name, params))
            .current_dir(&self.project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

#[async_trait]
impl OperationHandler for ConsoleCommand {
    async fn run(&self, name: &str, params: &Parameters) -> Result<i32, CoreError> {
        let status = self
            .command(name, params)
            .status()
            .await
            .map_err(|e| {
                CoreError::Internal(format!(
                    "Failed to run {} {name}: {e}",
                    self.program.display()
                ))
            })?;

        let code = status.code().unwrap_or(SIGNAL_STATUS);
        if code != 0 {
            tracing::debug!(operation = name, status = code, "Console command failed");
        }
        Ok(code)
    }

    fn preserved_dir(&self) -> Option<&Path> {
        self.preserved_dir.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    /// Console that records its arguments and exits with `$EXIT_WITH`.
    const RECORDING_CONSOLE: &str = r#"
echo "$@" >> calls.log
echo "bg=$BLUE_GREEN_DEPLOYMENT" >> calls.log
exit "${EXIT_WITH:-0}"
"#;

    fn console(project: &Path, vars: &[(&str, &str)]) -> ConsoleCommand {
        std::fs::write(project.join("console.sh"), RECORDING_CONSOLE).unwrap();

        let mut vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        vars.insert("CONSOLE_BIN".into(), "console.sh".into());
        vars.insert("CONSOLE_INTERPRETER".into(), "sh".into());

        let config =
            InstallerConfig::from_lookup(project.to_path_buf(), move |k| vars.get(k).cloned());
        ConsoleCommand::new(&config)
    }

    fn calls(project: &Path) -> String {
        std::fs::read_to_string(project.join("calls.log")).unwrap_or_default()
    }

    #[test]
    fn arguments_end_with_no_interaction() {
        let dir = tempfile::tempdir().unwrap();
        let console = console(dir.path(), &[]);
        let params = Parameters::new().value("locale", "de-DE").flag("--all");

        let args = console.arguments("system:locale-destructive", &params);

        assert_eq!(args[1..], [
            "system:locale-destructive".to_string(),
            "de-DE".to_string(),
            "--all".to_string(),
            "--no-interaction".to_string(),
        ]);
        assert!(args[0].ends_with("console.sh"));
    }

    #[tokio::test]
    async fn runs_in_project_dir_with_blue_green_default() {
        let dir = tempfile::tempdir().unwrap();
        let console = console(dir.path(), &[]);

        let status = console
            .run("theme:compile", &Parameters::new())
            .await
            .unwrap();

        assert_eq!(status, 0);
        let log = calls(dir.path());
        assert!(log.contains("theme:compile --no-interaction"), "{log}");
        assert!(log.contains("bg=1"), "{log}");
    }

    #[test]
    fn explicit_blue_green_setting_is_not_overridden() {
        let dir = tempfile::tempdir().unwrap();
        let console = console(dir.path(), &[("BLUE_GREEN_DEPLOYMENT", "0")]);
        assert!(console.env.is_empty());
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported_as_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console(dir.path(), &[]);
        console.env.push(("EXIT_WITH".into(), "3".into()));

        let status = console
            .run("database:migrate", &Parameters::new().flag("--all"))
            .await
            .unwrap();

        assert_eq!(status, 3);
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut console = console(dir.path(), &[]);
        console.interpreter = Some("/nonexistent/interpreter".into());

        let result = console.run("cache:clear", &Parameters::new()).await;

        assert_matches!(result, Err(CoreError::Internal(_)));
    }

    #[test]
    fn preserving_sets_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let console = console(dir.path(), &[]).preserving(dir.path().join("var/cache/prod"));
        assert_eq!(
            console.preserved_dir(),
            Some(dir.path().join("var/cache/prod").as_path())
        );
    }
}
