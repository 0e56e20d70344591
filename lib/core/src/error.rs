use thiserror::Error;

use crate::catalog::ContentType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No {} available in catalog", .0.plural())]
    NotFound(ContentType),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Unknown embedding model: {0}")]
    UnknownModel(String),

    #[error("Inconsistent artifacts: {0}")]
    Inconsistent(String),

    #[error("Malformed artifact {path}: {reason}")]
    MalformedArtifact { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether this error can only arise while loading artifacts at startup.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownModel(_)
                | Error::Inconsistent(_)
                | Error::MalformedArtifact { .. }
                | Error::Io(_)
                | Error::Serialization(_)
                | Error::InvalidConfig(_)
        )
    }
}
