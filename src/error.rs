//! Error types for transport and tree operations.

use crate::types::FolderId;
use thiserror::Error;

/// Failure talking to the content service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// Server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Server answered 404 for the requested resource.
    #[error("resource not found")]
    NotFound,

    /// Response body did not match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::NotFound)
    }
}

/// Failure of a tree-level operation.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("failed to fetch folder {folder}")]
    FetchFailed {
        folder: FolderId,
        source: TransportError,
    },

    /// Remote mutation rejected; local state was rolled back.
    #[error("{operation} failed")]
    MutationFailed {
        operation: &'static str,
        source: TransportError,
    },

    #[error("failed to fetch master folder: {0}")]
    MasterFetchFailed(TransportError),

    #[error("failed to initialize master folder: {0}")]
    MasterInitFailed(TransportError),

    /// Operation referenced a folder the cache has never seen.
    #[error("unknown folder {0}")]
    UnknownFolder(FolderId),

    /// Folder has no cached parent to anchor the operation on.
    #[error("no cached parent for folder {0}")]
    MissingParent(FolderId),

    #[error("invalid ordering for folder {folder}: {reason}")]
    InvalidOrdering { folder: FolderId, reason: String },

    /// Every batch of a move was rejected by the server.
    #[error("move failed entirely: files {files:?}, folders {folders:?}")]
    MoveFailed {
        files: Option<TransportError>,
        folders: Option<TransportError>,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl TreeError {
    /// Id of the file or folder the error is anchored on, when it has one.
    pub fn subject(&self) -> Option<&str> {
        match self {
            TreeError::FetchFailed { folder, .. } => Some(folder.as_str()),
            TreeError::UnknownFolder(folder) => Some(folder.as_str()),
            TreeError::MissingParent(folder) => Some(folder.as_str()),
            TreeError::InvalidOrdering { folder, .. } => Some(folder.as_str()),
            _ => None,
        }
    }
}
