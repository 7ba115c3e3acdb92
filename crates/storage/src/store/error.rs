#![forbid(unsafe_code)]

use adv_core::DataAccessError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("unknown id")]
    UnknownId,

    #[error("unknown name: {0}")]
    UnknownName(String),

    #[error("name already exists")]
    NameAlreadyExists,

    #[error("store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO",
            Self::Sql(_) => "SQL",
            Self::Json(_) => "JSON",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::UnknownId => "UNKNOWN_ID",
            Self::UnknownName(_) => "UNKNOWN_NAME",
            Self::NameAlreadyExists => "NAME_EXISTS",
            Self::LockPoisoned => "LOCK_POISONED",
        }
    }
}

impl From<StoreError> for DataAccessError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Io(err) => Self::Transport(err.to_string()),
            StoreError::Sql(err) => Self::Query(err.to_string()),
            StoreError::Json(err) => Self::Query(format!("corrupt row: {err}")),
            StoreError::InvalidInput(message) => Self::Query(message.to_string()),
            StoreError::UnknownId => Self::InvalidFilter("unknown id".to_string()),
            StoreError::UnknownName(name) => Self::InvalidFilter(name),
            StoreError::NameAlreadyExists => Self::Internal("name already exists".to_string()),
            StoreError::LockPoisoned => Self::Internal("store lock poisoned".to_string()),
        }
    }
}
