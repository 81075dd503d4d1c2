//! Error types for registry and transport operations
//!
//! The manifest-info tracker itself never fails; these errors come from the
//! collaborators around it (HTTP transport, repository, configuration).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Error, Debug)]
pub enum RegistryError {
    /// Network related errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Registry answered with a non-success status
    #[error("Registry error: {0}")]
    Registry(String),
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
    /// URL parse errors
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Config(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(err: std::io::Error) -> Self {
        RegistryError::Config(format!("IO error: {}", err))
    }
}
