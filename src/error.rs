use thiserror::Error;

#[derive(Error, Debug)]
pub enum PocketbookError {
    #[error("Not signed in. Run `pocketbook login <user>` first.")]
    NotAuthenticated,

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("No {kind} with ID {id}")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PocketbookError>;

pub(crate) fn validation(msg: impl Into<String>) -> PocketbookError {
    PocketbookError::Validation(msg.into())
}
