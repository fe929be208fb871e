use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pipeline stage an error or degradation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Expansion,
    Retrieval,
    Rerank,
    Summary,
    Generation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Expansion => "expansion",
            Stage::Retrieval => "retrieval",
            Stage::Rerank => "rerank",
            Stage::Summary => "summary",
            Stage::Generation => "generation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Index store error: {0}")]
    Store(String),

    #[error("{stage} model failed: {message}")]
    Model { stage: Stage, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn model(stage: Stage, err: impl fmt::Display) -> Self {
        Error::Model { stage, message: err.to_string() }
    }

    pub fn store(err: impl fmt::Display) -> Self { Error::Store(err.to_string()) }

    /// Startup-class failures that must keep the service from serving.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::InvalidConfig(_) | Error::NotFound(_) | Error::IndexUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
