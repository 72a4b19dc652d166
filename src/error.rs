//! Error types for portainer-deploy

use thiserror::Error;

/// Result type for deploy operations
pub type Result<T> = std::result::Result<T, DeployError>;

/// Normalized failure of a Portainer API call.
///
/// `status` is 0 when no HTTP response was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct PortainerError {
    /// HTTP status, or 0 for transport failures
    pub status: u16,
    /// Human readable message
    pub message: String,
    /// Server supplied details, or a serialized description of the failure
    pub details: String,
}

impl PortainerError {
    pub fn new(status: u16, message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: details.into(),
        }
    }

    /// Failure where no response was obtained from the server
    pub fn transport(err: &reqwest::Error) -> Self {
        let text = err.to_string();
        Self::new(0, text.clone(), text)
    }

    /// True if the server never answered
    pub fn is_transport(&self) -> bool {
        self.status == 0
    }
}

/// Deploy error types
#[derive(Error, Debug)]
pub enum DeployError {
    #[error(transparent)]
    Portainer(#[from] PortainerError),

    #[error("Stack {0} not found!")]
    StackNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
