// ================================================================
// File: tikplays-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported key: {0}")]
    UnsupportedKey(String),

    #[error("Key simulation error: {0}")]
    KeySimulation(String),

    #[error("Webhook error: {0}")]
    Webhook(String),

    #[error("Command error: status={status:?} detail={detail}")]
    Command { status: Option<u16>, detail: String },

    #[error("Event bus error: {0}")]
    EventBus(String),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),
}

impl Error {
    /// Machine-readable reason used in operator replies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Profile(e) => e.code(),
            Error::NotFound(_) => "NOT_FOUND",
            Error::Parse(_) | Error::Json(_) | Error::Url(_) => "BAD_REQUEST",
            Error::UnsupportedKey(_) => "UNSUPPORTED_KEY",
            _ => "INTERNAL",
        }
    }
}

/// Failures of explicit profile operations. These are surfaced to the
/// operator, unlike live-event failures which are only logged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("profile not found: {0}")]
    NotFound(String),

    #[error("profile id already exists: {0}")]
    IdExists(String),

    #[error("the default profile cannot be deleted")]
    CantDeleteDefault,

    #[error("invalid profile id: {0:?}")]
    InvalidId(String),

    #[error("profile storage error: {0}")]
    Io(String),
}

impl ProfileError {
    pub fn code(&self) -> &'static str {
        match self {
            ProfileError::NotFound(_) => "PROFILE_NOT_FOUND",
            ProfileError::IdExists(_) => "PROFILE_ID_EXISTS",
            ProfileError::CantDeleteDefault => "CANT_DELETE_DEFAULT",
            ProfileError::InvalidId(_) => "INVALID_PROFILE_ID",
            ProfileError::Io(_) => "PROFILE_IO",
        }
    }
}
