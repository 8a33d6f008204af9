//! Error types.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = FolioError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum FolioError {
    /// A typewriter needs at least one string to have a first state.
    #[error("typewriter sequence must contain at least one string")]
    EmptySequence,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FolioError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// Validation failures of the contact form. Shown to the visitor, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please fill all required fields.")]
    MissingFields(Vec<&'static str>),

    #[error("Please enter a valid email address.")]
    InvalidEmail,
}
