use shopinit_core::error::CoreError;

/// Exit status for every failure the installer itself detects.
pub const EXIT_FAILURE: u8 = 1;

/// Application-level error type for the CLI.
///
/// Wraps [`CoreError`] for domain errors and adds driver and I/O variants.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A domain-level error from `shopinit_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for command results.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Report the error through tracing.
    ///
    /// An existing install is a notice rather than a failure of the tool.
    pub fn report(&self) {
        match self {
            CliError::Core(CoreError::AlreadyInstalled(msg)) => tracing::warn!("{msg}"),
            CliError::Core(CoreError::Storage(msg)) => {
                tracing::error!(error = %msg, "Database error")
            }
            other => tracing::error!("{other}"),
        }
    }
}
