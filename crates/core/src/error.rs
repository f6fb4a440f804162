/// Domain errors shared by the installer and the currency reassigner.
///
/// Every variant is fatal to the current run; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Already installed: {0}")]
    AlreadyInstalled(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Cannot find currency {0} in data set")]
    UnknownCurrency(String),

    #[error("schema.sql not found or readable in ({})", .candidates.join(", "))]
    SchemaNotFound { candidates: Vec<String> },

    #[error("No handler registered for operation '{0}'")]
    UnknownOperation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

