use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmartSpendError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// What kind of text the user left blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Expense,
    Query,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Empty input")]
    EmptyInput { kind: InputKind },
}

impl SessionError {
    /// Notification text shown to the user for this rejection.
    pub fn notice(&self) -> &'static str {
        match self {
            SessionError::EmptyInput {
                kind: InputKind::Expense,
            } => "Please enter an expense description.",
            SessionError::EmptyInput {
                kind: InputKind::Query,
            } => "Please enter a valid query.",
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    File(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
