use thiserror::Error;

use crate::validation::ValidationError;

/// Why a single submission ended in the failed state.
///
/// `Display` is the message shown to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Local rule violation; no request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Network failure or a non-2xx response.
    #[error("{message}")]
    Transport { status: Option<u16>, message: String },

    /// Well-formed JSON with an unexpected shape or a non-success status.
    #[error("{0}")]
    Protocol(String),

    /// Anything else raised while performing the request or reading the body.
    #[error("{0}")]
    Unknown(String),
}

impl GenerationError {
    /// Stable machine-readable kind for agent output.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Validation(_) => "validation",
            GenerationError::Transport { .. } => "transport",
            GenerationError::Protocol(_) => "protocol",
            GenerationError::Unknown(_) => "unknown",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("a QRIS request is already in flight")]
    Busy,

    #[error("submission rejected: {0}")]
    Rejected(ValidationError),

    #[error("no QRIS request is in flight")]
    NotInFlight,
}

#[derive(Debug, Error)]
pub enum QrisError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, QrisError>;
