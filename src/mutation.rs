//! Optimistic mutations with rollback.
//!
//! Every mutation follows one pattern: snapshot the affected cache entries,
//! apply a local patch for instant feedback, call the remote operation, then
//! either re-fetch the folders whose canonical state changed or restore the
//! snapshot. The optimistic patch is a responsiveness aid, never a
//! substitute for the post-success re-fetch.
//!
//! Mutations are not serialized against each other. Two mutations touching
//! the same folder issued without awaiting the first are raced by the
//! server; the cache ends up reflecting whichever resolves last, not
//! whichever was issued last. Callers that need ordering must await each
//! mutation before issuing the next.

use crate::cache::ContentCache;
use crate::error::{TransportError, TreeError};
use crate::loader::TreeLoader;
use crate::node::FolderNode;
use crate::transport::{ContentTransport, FilePatch, FolderPatch};
use crate::types::{FileId, FolderId};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of a move: two batches, each succeeding or failing on its own.
///
/// The file and folder batches are independent remote calls; one succeeding
/// while the other fails leaves the move partially applied with no
/// compensating rollback. The report carries per-batch counts and failures
/// so callers can tell the user exactly what happened.
#[derive(Debug, Default)]
pub struct MoveReport {
    pub moved_files: usize,
    pub moved_folders: usize,
    pub file_failure: Option<TransportError>,
    pub folder_failure: Option<TransportError>,
}

impl MoveReport {
    /// Whether one batch succeeded while another failed.
    pub fn is_partial(&self) -> bool {
        self.file_failure.is_some() || self.folder_failure.is_some()
    }
}

/// Executes create, rename, delete, move, and metadata mutations.
pub struct MutationCoordinator {
    cache: Arc<ContentCache>,
    loader: Arc<TreeLoader>,
    transport: Arc<dyn ContentTransport>,
    pending_counter: AtomicU64,
}

impl MutationCoordinator {
    pub fn new(
        cache: Arc<ContentCache>,
        loader: Arc<TreeLoader>,
        transport: Arc<dyn ContentTransport>,
    ) -> Self {
        MutationCoordinator {
            cache,
            loader,
            transport,
            pending_counter: AtomicU64::new(0),
        }
    }

    /// Create a subfolder under `parent`, returning the server-issued id.
    ///
    /// The optimistic entry uses a `pending-` placeholder id until the
    /// server answers; the placeholder is covered by the snapshot, so both
    /// commit and rollback clean it up.
    pub async fn create_subfolder(
        &self,
        parent: &FolderId,
        name: &str,
    ) -> Result<FolderId, TreeError> {
        let temp = FolderId::new(format!(
            "pending-{}",
            self.pending_counter.fetch_add(1, Ordering::Relaxed)
        ));
        let snapshot = self.cache.snapshot([parent.clone(), temp.clone()]);

        if let Some(parent_node) = self.cache.get(parent) {
            let mut patched = (*parent_node).clone();
            patched.subfolders.push(temp.clone());
            self.cache.put(patched);
            self.cache
                .put(FolderNode::unfetched(temp.clone(), name, Some(parent.clone())));
        }

        match self.transport.add_subfolder(parent, name).await {
            Ok(created) => {
                let created_id = created.id.clone();
                self.cache.invalidate(&temp);
                if let Some(parent_node) = self.cache.get(parent) {
                    let mut patched = (*parent_node).clone();
                    for slot in patched.subfolders.iter_mut() {
                        if *slot == temp {
                            *slot = created_id.clone();
                        }
                    }
                    self.cache.put(patched);
                }
                self.loader.commit(created);
                info!(parent = %parent, folder = %created_id, "subfolder created");
                self.refresh(std::slice::from_ref(parent)).await?;
                Ok(created_id)
            }
            Err(source) => {
                warn!(parent = %parent, error = %source, "create subfolder failed, rolled back");
                self.cache.restore(snapshot);
                Err(TreeError::MutationFailed {
                    operation: "create subfolder",
                    source,
                })
            }
        }
    }

    /// Rename a folder.
    pub async fn rename_folder(&self, id: &FolderId, name: &str) -> Result<(), TreeError> {
        self.update_folder(id, FolderPatch::rename(name)).await
    }

    /// Apply a partial metadata update to a folder.
    ///
    /// On success the folder's parent is re-fetched so sibling ordering and
    /// metadata reflect server truth; a parentless root re-fetches itself.
    pub async fn update_folder(&self, id: &FolderId, patch: FolderPatch) -> Result<(), TreeError> {
        let snapshot = self.cache.snapshot([id.clone()]);

        if let Some(node) = self.cache.get(id) {
            let mut patched = (*node).clone();
            if let Some(name) = &patch.name {
                patched.name = name.clone();
            }
            if let Some(is_visible) = patch.is_visible {
                patched.is_visible = Some(is_visible);
            }
            self.cache.put(patched);
        }

        match self.transport.update_folder(id, &patch).await {
            Ok(()) => {
                info!(folder = %id, "folder updated");
                let target = self
                    .cache
                    .get(id)
                    .and_then(|n| n.parent_id.clone())
                    .unwrap_or_else(|| id.clone());
                self.refresh(&[target]).await
            }
            Err(source) => {
                warn!(folder = %id, error = %source, "update folder failed, rolled back");
                self.cache.restore(snapshot);
                Err(TreeError::MutationFailed {
                    operation: "update folder",
                    source,
                })
            }
        }
    }

    /// Delete a folder and drop its cached subtree.
    ///
    /// The folder must be cached with a parent link; the parent is the
    /// deletion request's source folder and is re-fetched on success.
    pub async fn delete_folder(&self, id: &FolderId) -> Result<(), TreeError> {
        let node = self
            .cache
            .get(id)
            .ok_or_else(|| TreeError::UnknownFolder(id.clone()))?;
        let parent = node
            .parent_id
            .clone()
            .ok_or_else(|| TreeError::MissingParent(id.clone()))?;

        let subtree = self.cache.subtree_ids(id);
        let snapshot = self
            .cache
            .snapshot(std::iter::once(parent.clone()).chain(subtree.iter().cloned()));

        if let Some(parent_node) = self.cache.get(&parent) {
            let mut patched = (*parent_node).clone();
            patched.subfolders.retain(|s| s != id);
            self.cache.put(patched);
        }
        for folder in &subtree {
            self.cache.invalidate(folder);
        }

        match self.transport.delete_folder(id, &parent).await {
            Ok(()) => {
                info!(folder = %id, parent = %parent, dropped = subtree.len(), "folder deleted");
                self.refresh(&[parent]).await
            }
            Err(source) => {
                warn!(folder = %id, error = %source, "delete folder failed, rolled back");
                self.cache.restore(snapshot);
                Err(TreeError::MutationFailed {
                    operation: "delete folder",
                    source,
                })
            }
        }
    }

    /// Delete one file. The local removal already matches server state, so
    /// no re-fetch is needed on success.
    pub async fn delete_file(&self, folder: &FolderId, file: &FileId) -> Result<(), TreeError> {
        let snapshot = self.cache.snapshot([folder.clone()]);

        if let Some(node) = self.cache.get(folder) {
            let mut patched = (*node).clone();
            patched.files.retain(|f| &f.id != file);
            self.cache.put(patched);
        }

        match self.transport.delete_file(folder, file).await {
            Ok(()) => {
                info!(folder = %folder, file = %file, "file deleted");
                Ok(())
            }
            Err(source) => {
                warn!(file = %file, error = %source, "delete file failed, rolled back");
                self.cache.restore(snapshot);
                Err(TreeError::MutationFailed {
                    operation: "delete file",
                    source,
                })
            }
        }
    }

    /// Apply a partial metadata update to a file. No re-fetch on success.
    pub async fn update_file(
        &self,
        folder: &FolderId,
        file: &FileId,
        patch: FilePatch,
    ) -> Result<(), TreeError> {
        let snapshot = self.cache.snapshot([folder.clone()]);

        if let Some(node) = self.cache.get(folder) {
            let mut patched = (*node).clone();
            if let Some(target) = patched.files.iter_mut().find(|f| &f.id == file) {
                if let Some(name) = &patch.name {
                    target.name = name.clone();
                }
                if let Some(url) = &patch.url {
                    target.url = url.clone();
                }
                if let Some(description) = &patch.description {
                    target.description = Some(description.clone());
                }
                if let Some(is_downloadable) = patch.is_downloadable {
                    target.is_downloadable = is_downloadable;
                }
                if let Some(is_viewable) = patch.is_viewable {
                    target.is_viewable = is_viewable;
                }
            }
            self.cache.put(patched);
        }

        match self.transport.update_file(folder, file, &patch).await {
            Ok(()) => {
                info!(folder = %folder, file = %file, "file updated");
                Ok(())
            }
            Err(source) => {
                warn!(file = %file, error = %source, "update file failed, rolled back");
                self.cache.restore(snapshot);
                Err(TreeError::MutationFailed {
                    operation: "update file",
                    source,
                })
            }
        }
    }

    /// Move files and folders into `destination`, as up to two batched
    /// calls (files first, then folders).
    ///
    /// Each batch snapshots and patches its own source folders and rolls
    /// only itself back on failure. The call returns an error when every
    /// requested batch failed; otherwise it returns a [`MoveReport`], which
    /// may record a partial outcome. Source folders of successful batches
    /// and the destination are re-fetched afterward; a re-fetch failure is
    /// logged rather than surfaced, since the move itself already happened.
    pub async fn move_nodes(
        &self,
        files: &[FileId],
        folders: &[FolderId],
        destination: &FolderId,
    ) -> Result<MoveReport, TreeError> {
        if files.is_empty() && folders.is_empty() {
            return Ok(MoveReport::default());
        }

        let mut report = MoveReport::default();
        let mut refresh: Vec<FolderId> = Vec::new();

        if !files.is_empty() {
            let mut by_source: HashMap<FolderId, Vec<FileId>> = HashMap::new();
            for file in files {
                if let Some(folder) = self.cache.containing_folder(file) {
                    by_source.entry(folder.id.clone()).or_default().push(file.clone());
                }
            }
            let snapshot = self.cache.snapshot(by_source.keys().cloned());

            for (source, moved) in &by_source {
                if let Some(node) = self.cache.get(source) {
                    let mut patched = (*node).clone();
                    patched.files.retain(|f| !moved.contains(&f.id));
                    self.cache.put(patched);
                }
            }

            match self.transport.move_files(files, destination).await {
                Ok(result) => {
                    report.moved_files = result.moved_count;
                    refresh.extend(by_source.into_keys());
                }
                Err(source) => {
                    warn!(error = %source, "file move batch failed, rolled back");
                    self.cache.restore(snapshot);
                    report.file_failure = Some(source);
                }
            }
        }

        if !folders.is_empty() {
            let mut by_parent: HashMap<FolderId, Vec<FolderId>> = HashMap::new();
            for folder in folders {
                if let Some(parent) = self.cache.get(folder).and_then(|n| n.parent_id.clone()) {
                    by_parent.entry(parent).or_default().push(folder.clone());
                }
            }
            let snapshot = self.cache.snapshot(by_parent.keys().cloned());

            for (parent, moved) in &by_parent {
                if let Some(node) = self.cache.get(parent) {
                    let mut patched = (*node).clone();
                    patched.subfolders.retain(|s| !moved.contains(s));
                    self.cache.put(patched);
                }
            }

            match self.transport.move_folders(folders, destination).await {
                Ok(result) => {
                    report.moved_folders = result.moved_count;
                    refresh.extend(by_parent.into_keys());
                }
                Err(source) => {
                    warn!(error = %source, "folder move batch failed, rolled back");
                    self.cache.restore(snapshot);
                    report.folder_failure = Some(source);
                }
            }
        }

        let files_failed = files.is_empty() || report.file_failure.is_some();
        let folders_failed = folders.is_empty() || report.folder_failure.is_some();
        if files_failed && folders_failed {
            return Err(TreeError::MoveFailed {
                files: report.file_failure,
                folders: report.folder_failure,
            });
        }

        if report.is_partial() {
            warn!(
                moved_files = report.moved_files,
                moved_folders = report.moved_folders,
                "move completed partially"
            );
        } else {
            info!(
                moved_files = report.moved_files,
                moved_folders = report.moved_folders,
                destination = %destination,
                "move completed"
            );
        }

        refresh.push(destination.clone());
        refresh.sort();
        refresh.dedup();
        let results = join_all(refresh.iter().map(|id| self.loader.fetch_folder(id))).await;
        for result in results {
            if let Err(e) = result {
                warn!(error = %e, "post-move re-fetch failed, cache may be stale");
            }
        }

        Ok(report)
    }

    /// Re-fetch canonical state for the given folders concurrently. All
    /// fetches run to completion; the first failure is surfaced.
    async fn refresh(&self, folders: &[FolderId]) -> Result<(), TreeError> {
        let results = join_all(folders.iter().map(|id| self.loader.fetch_folder(id))).await;
        for result in results {
            result?;
        }
        Ok(())
    }
}
