//! Result and error types for Roamer.

use thiserror::Error;

/// Result type for Roamer operations
pub type RoamerResult<T> = Result<T, RoamerError>;

/// Errors that can occur in Roamer
#[derive(Debug, Error)]
pub enum RoamerError {
    /// No resolution strategy produced a displayable element
    #[error("Element not found for {action}: {target}")]
    ElementNotFound {
        /// Action that required the element
        action: String,
        /// Target description as given by the caller
        target: String,
    },

    /// A bounded wait elapsed
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// The device driver reported a failure
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Finalize or analysis requested with nothing recorded
    #[error("No page data to finalize")]
    NoPageData,

    /// Gesture kind not understood
    #[error("Unknown gesture: {name}")]
    UnknownGesture {
        /// Gesture name as given
        name: String,
    },

    /// Tool name not understood
    #[error("Unknown tool: {name}")]
    UnknownTool {
        /// Tool name as given
        name: String,
    },

    /// Malformed tool arguments
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Neither the webview nor the native login form could be located
    #[error("Could not find auth elements")]
    AuthElementsNotFound,

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl RoamerError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create an element-not-found error
    #[must_use]
    pub fn element_not_found(action: impl Into<String>, target: impl Into<String>) -> Self {
        Self::ElementNotFound {
            action: action.into(),
            target: target.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
