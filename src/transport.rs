//! Transport layer for the content service.
//!
//! [`ContentTransport`] is the seam between tree logic and the network: one
//! method per remote operation, speaking the domain model rather than HTTP.
//! The shipped implementation is [`HttpTransport`]; tests substitute their
//! own backends.

pub mod http;
pub mod wire;

pub use http::HttpTransport;
pub use wire::{FilePatch, FolderPatch, FolderPayload, MoveResult, SubfolderPayload};

use crate::error::TransportError;
use crate::types::{FileId, FolderId};
use async_trait::async_trait;

/// Remote operations on the content service.
///
/// Implementations return [`TransportError::NotFound`] for a missing
/// resource; callers that care (master bootstrap) branch on it, everyone
/// else treats it as any other failure.
#[async_trait]
pub trait ContentTransport: Send + Sync {
    /// Fetch one folder's full listing.
    async fn get_folder(&self, id: &FolderId) -> Result<FolderPayload, TransportError>;

    /// Create a subfolder under `parent`, returning the created folder.
    async fn add_subfolder(
        &self,
        parent: &FolderId,
        name: &str,
    ) -> Result<FolderPayload, TransportError>;

    /// Apply a partial update to a folder's own metadata.
    async fn update_folder(
        &self,
        id: &FolderId,
        patch: &FolderPatch,
    ) -> Result<(), TransportError>;

    /// Delete a folder and its subtree. `source` is the parent the folder
    /// is being removed from.
    async fn delete_folder(
        &self,
        id: &FolderId,
        source: &FolderId,
    ) -> Result<(), TransportError>;

    /// Delete a single file from the folder that lists it.
    async fn delete_file(&self, folder: &FolderId, file: &FileId) -> Result<(), TransportError>;

    /// Apply a partial update to a file's metadata.
    async fn update_file(
        &self,
        folder: &FolderId,
        file: &FileId,
        patch: &FilePatch,
    ) -> Result<(), TransportError>;

    /// Persist a complete display order for the files of one folder.
    async fn update_order(
        &self,
        folder: &FolderId,
        file_ids: &[FileId],
    ) -> Result<(), TransportError>;

    /// Move files into `destination`.
    async fn move_files(
        &self,
        files: &[FileId],
        destination: &FolderId,
    ) -> Result<MoveResult, TransportError>;

    /// Move folders (with their subtrees) into `destination`.
    async fn move_folders(
        &self,
        folders: &[FolderId],
        destination: &FolderId,
    ) -> Result<MoveResult, TransportError>;

    /// Fetch the master folder's listing from the hierarchy endpoint.
    async fn master_hierarchy(&self) -> Result<FolderPayload, TransportError>;

    /// Create the account's master folder. Called once, when
    /// [`ContentTransport::master_hierarchy`] reports it missing.
    async fn initialize_master(&self) -> Result<(), TransportError>;
}
