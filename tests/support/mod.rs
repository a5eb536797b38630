//! Shared test support: an in-memory content service.
//!
//! [`InMemoryBackend`] implements [`ContentTransport`] against a mutable
//! folder table, with per-operation failure injection and hold gates for
//! exercising in-flight interleavings.

use async_trait::async_trait;
use grove::error::TransportError;
use grove::node::FileRef;
use grove::transport::{
    ContentTransport, FilePatch, FolderPatch, FolderPayload, MoveResult, SubfolderPayload,
};
use grove::types::{FileId, FolderId};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Clone)]
struct ServerFolder {
    id: FolderId,
    name: String,
    parent: Option<FolderId>,
    subfolders: Vec<FolderId>,
    files: Vec<FileRef>,
    is_visible: Option<bool>,
}

#[derive(Default)]
struct ServerState {
    folders: HashMap<FolderId, ServerFolder>,
    master: Option<FolderId>,
    next_id: u64,
}

/// In-memory stand-in for the content service.
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<ServerState>,
    failures: Mutex<HashMap<&'static str, VecDeque<TransportError>>>,
    holds: Mutex<HashMap<&'static str, VecDeque<Arc<Notify>>>>,
    master_missing: AtomicBool,
    heal_on_initialize: AtomicBool,
    initialize_calls: AtomicUsize,
    get_calls: Mutex<HashMap<FolderId, usize>>,
}

impl InMemoryBackend {
    pub fn new() -> Arc<Self> {
        let backend = InMemoryBackend::default();
        backend.heal_on_initialize.store(true, Ordering::SeqCst);
        Arc::new(backend)
    }

    /// Add a top-level folder (no parent).
    pub fn add_root(&self, id: &str, name: &str) {
        let mut state = self.state.lock();
        state.folders.insert(
            FolderId::new(id),
            ServerFolder {
                id: FolderId::new(id),
                name: name.to_string(),
                parent: None,
                subfolders: Vec::new(),
                files: Vec::new(),
                is_visible: Some(true),
            },
        );
    }

    /// Add a top-level folder and mark it as the account's master folder.
    pub fn add_master(&self, id: &str, name: &str) {
        self.add_root(id, name);
        self.state.lock().master = Some(FolderId::new(id));
    }

    /// Add a folder under an existing parent.
    pub fn add_folder(&self, id: &str, name: &str, parent: &str) {
        let mut state = self.state.lock();
        let parent_id = FolderId::new(parent);
        state.folders.insert(
            FolderId::new(id),
            ServerFolder {
                id: FolderId::new(id),
                name: name.to_string(),
                parent: Some(parent_id.clone()),
                subfolders: Vec::new(),
                files: Vec::new(),
                is_visible: Some(true),
            },
        );
        if let Some(parent) = state.folders.get_mut(&parent_id) {
            parent.subfolders.push(FolderId::new(id));
        }
    }

    pub fn add_file(&self, folder: &str, file: FileRef) {
        let mut state = self.state.lock();
        if let Some(folder) = state.folders.get_mut(&FolderId::new(folder)) {
            folder.files.push(file);
        }
    }

    /// Make the master hierarchy endpoint answer not-found until
    /// initialization. When `heal_on_initialize` is false the endpoint keeps
    /// answering not-found even after a successful initialize call.
    pub fn set_master_missing(&self, heal_on_initialize: bool) {
        self.master_missing.store(true, Ordering::SeqCst);
        self.heal_on_initialize
            .store(heal_on_initialize, Ordering::SeqCst);
    }

    /// Queue a failure for the next call to `op`.
    pub fn fail_next(&self, op: &'static str, error: TransportError) {
        self.failures.lock().entry(op).or_default().push_back(error);
    }

    /// Park the next call to `op` until the returned gate is notified.
    pub fn hold_next(&self, op: &'static str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.holds
            .lock()
            .entry(op)
            .or_default()
            .push_back(Arc::clone(&gate));
        gate
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn get_folder_calls(&self, id: &str) -> usize {
        self.get_calls
            .lock()
            .get(&FolderId::new(id))
            .copied()
            .unwrap_or(0)
    }

    pub fn server_name(&self, id: &str) -> Option<String> {
        self.state
            .lock()
            .folders
            .get(&FolderId::new(id))
            .map(|f| f.name.clone())
    }

    pub fn server_file_ids(&self, folder: &str) -> Vec<FileId> {
        self.state
            .lock()
            .folders
            .get(&FolderId::new(folder))
            .map(|f| f.files.iter().map(|file| file.id.clone()).collect())
            .unwrap_or_default()
    }

    pub fn server_subfolders(&self, folder: &str) -> Vec<FolderId> {
        self.state
            .lock()
            .folders
            .get(&FolderId::new(folder))
            .map(|f| f.subfolders.clone())
            .unwrap_or_default()
    }

    pub fn server_has_folder(&self, id: &str) -> bool {
        self.state.lock().folders.contains_key(&FolderId::new(id))
    }

    /// Await any hold gate queued for `op`, then pop any queued failure.
    async fn checkpoint(&self, op: &'static str) -> Result<(), TransportError> {
        let gate = { self.holds.lock().entry(op).or_default().pop_front() };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let failure = { self.failures.lock().entry(op).or_default().pop_front() };
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn payload(state: &ServerState, id: &FolderId) -> Option<FolderPayload> {
        let folder = state.folders.get(id)?;
        Some(FolderPayload {
            id: folder.id.clone(),
            name: folder.name.clone(),
            parent_id: folder.parent.clone(),
            folders: folder
                .subfolders
                .iter()
                .filter_map(|sid| state.folders.get(sid))
                .map(|sub| SubfolderPayload {
                    id: sub.id.clone(),
                    name: sub.name.clone(),
                })
                .collect(),
            files: folder.files.clone(),
            is_visible: folder.is_visible,
            allow_download: None,
        })
    }

    fn collect_subtree(state: &ServerState, root: &FolderId, out: &mut Vec<FolderId>) {
        out.push(root.clone());
        if let Some(folder) = state.folders.get(root) {
            for child in folder.subfolders.clone() {
                Self::collect_subtree(state, &child, out);
            }
        }
    }
}

#[async_trait]
impl ContentTransport for InMemoryBackend {
    async fn get_folder(&self, id: &FolderId) -> Result<FolderPayload, TransportError> {
        self.checkpoint("get_folder").await?;
        *self.get_calls.lock().entry(id.clone()).or_insert(0) += 1;
        let state = self.state.lock();
        Self::payload(&state, id).ok_or(TransportError::NotFound)
    }

    async fn add_subfolder(
        &self,
        parent: &FolderId,
        name: &str,
    ) -> Result<FolderPayload, TransportError> {
        self.checkpoint("add_subfolder").await?;
        let mut state = self.state.lock();
        if !state.folders.contains_key(parent) {
            return Err(TransportError::NotFound);
        }
        let id = FolderId::new(format!("srv-{}", state.next_id));
        state.next_id += 1;
        state.folders.insert(
            id.clone(),
            ServerFolder {
                id: id.clone(),
                name: name.to_string(),
                parent: Some(parent.clone()),
                subfolders: Vec::new(),
                files: Vec::new(),
                is_visible: Some(true),
            },
        );
        if let Some(parent) = state.folders.get_mut(parent) {
            parent.subfolders.push(id.clone());
        }
        Ok(Self::payload(&state, &id).unwrap())
    }

    async fn update_folder(
        &self,
        id: &FolderId,
        patch: &FolderPatch,
    ) -> Result<(), TransportError> {
        self.checkpoint("update_folder").await?;
        let mut state = self.state.lock();
        let folder = state.folders.get_mut(id).ok_or(TransportError::NotFound)?;
        if let Some(name) = &patch.name {
            folder.name = name.clone();
        }
        if let Some(is_visible) = patch.is_visible {
            folder.is_visible = Some(is_visible);
        }
        Ok(())
    }

    async fn delete_folder(
        &self,
        id: &FolderId,
        source: &FolderId,
    ) -> Result<(), TransportError> {
        self.checkpoint("delete_folder").await?;
        let mut state = self.state.lock();
        if !state.folders.contains_key(id) {
            return Err(TransportError::NotFound);
        }
        let mut subtree = Vec::new();
        Self::collect_subtree(&state, id, &mut subtree);
        for folder in subtree {
            state.folders.remove(&folder);
        }
        if let Some(parent) = state.folders.get_mut(source) {
            parent.subfolders.retain(|s| s != id);
        }
        Ok(())
    }

    async fn delete_file(&self, folder: &FolderId, file: &FileId) -> Result<(), TransportError> {
        self.checkpoint("delete_file").await?;
        let mut state = self.state.lock();
        let folder = state
            .folders
            .get_mut(folder)
            .ok_or(TransportError::NotFound)?;
        let before = folder.files.len();
        folder.files.retain(|f| &f.id != file);
        if folder.files.len() == before {
            return Err(TransportError::NotFound);
        }
        Ok(())
    }

    async fn update_file(
        &self,
        folder: &FolderId,
        file: &FileId,
        patch: &FilePatch,
    ) -> Result<(), TransportError> {
        self.checkpoint("update_file").await?;
        let mut state = self.state.lock();
        let folder = state
            .folders
            .get_mut(folder)
            .ok_or(TransportError::NotFound)?;
        let target = folder
            .files
            .iter_mut()
            .find(|f| &f.id == file)
            .ok_or(TransportError::NotFound)?;
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
        Ok(())
    }

    async fn update_order(
        &self,
        folder: &FolderId,
        file_ids: &[FileId],
    ) -> Result<(), TransportError> {
        self.checkpoint("update_order").await?;
        let mut state = self.state.lock();
        let folder = state
            .folders
            .get_mut(folder)
            .ok_or(TransportError::NotFound)?;
        let mut remaining = folder.files.clone();
        let mut reordered = Vec::with_capacity(file_ids.len());
        for id in file_ids {
            match remaining.iter().position(|f| &f.id == id) {
                Some(pos) => reordered.push(remaining.remove(pos)),
                None => {
                    return Err(TransportError::Status {
                        status: 400,
                        message: format!("unknown file {}", id),
                    })
                }
            }
        }
        reordered.extend(remaining);
        folder.files = reordered;
        Ok(())
    }

    async fn move_files(
        &self,
        files: &[FileId],
        destination: &FolderId,
    ) -> Result<MoveResult, TransportError> {
        self.checkpoint("move_files").await?;
        let mut state = self.state.lock();
        if !state.folders.contains_key(destination) {
            return Err(TransportError::NotFound);
        }
        let mut moved = Vec::new();
        for id in files {
            let source = state
                .folders
                .values_mut()
                .find(|f| f.files.iter().any(|file| &file.id == id));
            if let Some(source) = source {
                let pos = source.files.iter().position(|f| &f.id == id).unwrap();
                moved.push(source.files.remove(pos));
            }
        }
        let count = moved.len();
        if let Some(dest) = state.folders.get_mut(destination) {
            dest.files.extend(moved);
        }
        Ok(MoveResult { moved_count: count })
    }

    async fn move_folders(
        &self,
        folders: &[FolderId],
        destination: &FolderId,
    ) -> Result<MoveResult, TransportError> {
        self.checkpoint("move_folders").await?;
        let mut state = self.state.lock();
        if !state.folders.contains_key(destination) {
            return Err(TransportError::NotFound);
        }
        let mut count = 0;
        for id in folders {
            let old_parent = match state.folders.get(id) {
                Some(folder) => folder.parent.clone(),
                None => continue,
            };
            if let Some(parent) = old_parent.and_then(|p| state.folders.get_mut(&p)) {
                parent.subfolders.retain(|s| s != id);
            }
            if let Some(folder) = state.folders.get_mut(id) {
                folder.parent = Some(destination.clone());
            }
            if let Some(dest) = state.folders.get_mut(destination) {
                dest.subfolders.push(id.clone());
            }
            count += 1;
        }
        Ok(MoveResult { moved_count: count })
    }

    async fn master_hierarchy(&self) -> Result<FolderPayload, TransportError> {
        self.checkpoint("master_hierarchy").await?;
        if self.master_missing.load(Ordering::SeqCst) {
            return Err(TransportError::NotFound);
        }
        let state = self.state.lock();
        let master = state.master.clone().ok_or(TransportError::NotFound)?;
        Self::payload(&state, &master).ok_or(TransportError::NotFound)
    }

    async fn initialize_master(&self) -> Result<(), TransportError> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        self.checkpoint("initialize_master").await?;
        if self.heal_on_initialize.load(Ordering::SeqCst) {
            self.master_missing.store(false, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// A video file served from the CDN.
pub fn video(id: &str, name: &str) -> FileRef {
    FileRef {
        id: FileId::new(id),
        name: name.to_string(),
        file_type: "video".to_string(),
        url: format!("https://cdn.example.com/{}.mp4", id),
        description: None,
        is_downloadable: false,
        is_viewable: true,
    }
}

/// A document file; never classifies as video.
pub fn pdf(id: &str, name: &str) -> FileRef {
    FileRef {
        id: FileId::new(id),
        name: name.to_string(),
        file_type: "document".to_string(),
        url: format!("https://cdn.example.com/{}.pdf", id),
        description: None,
        is_downloadable: true,
        is_viewable: true,
    }
}
