//! Provider error types

use thiserror::Error;

/// HTTP status codes the reconciler cares about
pub mod status {
    pub const OK: u16 = 200;
    /// Returned while a long-running operation is still in progress
    pub const ACCEPTED: u16 = 202;
    /// Returned by `GetProperties` for a storage account that no longer exists
    pub const NO_CONTENT: u16 = 204;
    pub const NOT_FOUND: u16 = 404;
}

/// Failure reported by the remote API
///
/// `status` is `None` for transport failures where no response was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// The operation has not finished yet
    pub fn is_in_progress(&self) -> bool {
        self.status == Some(status::ACCEPTED)
    }

    /// The resource does not exist (anymore)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.status,
            Some(status::NO_CONTENT) | Some(status::NOT_FOUND)
        )
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(code) => write!(f, "StatusCode={}: {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Validation failed: {}", .errors.join("; "))]
    Validation { errors: Vec<String> },

    #[error("Error creating {resource} {name:?}: {source}")]
    Creation {
        resource: &'static str,
        name: String,
        #[source]
        source: RemoteError,
    },

    #[error("Error reading the state of {resource} {name:?}: {source}")]
    Read {
        resource: &'static str,
        name: String,
        #[source]
        source: RemoteError,
    },

    #[error("Error issuing delete request for {resource} {name:?}: {source}")]
    Deletion {
        resource: &'static str,
        name: String,
        #[source]
        source: RemoteError,
    },

    /// The resource exists remotely under `id` but its state could not be read back
    #[error("{resource} {name:?} was created as {id} but reading it back failed: {source}")]
    Tainted {
        resource: &'static str,
        name: String,
        id: String,
        #[source]
        source: Box<CloudError>,
    },

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid resource ID {id:?}: {reason}")]
    InvalidResourceId { id: String, reason: String },

    #[error("State file error: {0}")]
    State(String),

    #[error("Lock acquisition failed: {0}")]
    Lock(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn validation(errors: Vec<String>) -> Self {
        Self::Validation { errors }
    }

    /// Id of a resource that was created even though the operation failed
    pub fn created_id(&self) -> Option<&str> {
        match self {
            Self::Tainted { id, .. } => Some(id.as_str()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
