//! Cross-tree selection and the import move flow.
//!
//! The selector presents a read-only forest view over the cache, tracks a
//! selection of typed node references across arbitrarily many trees, derives
//! the effective move set from a selection, and hands that set to the
//! mutation coordinator.

use crate::cache::ContentCache;
use crate::error::TreeError;
use crate::media::is_video;
use crate::mutation::{MoveReport, MutationCoordinator};
use crate::node::Forest;
use crate::types::{FileId, FolderId, NodeRef};
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Multi-tree selection, in selection order.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    nodes: IndexSet<NodeRef>,
}

impl Selection {
    pub fn new() -> Self {
        Selection::default()
    }

    /// Add a node. Returns false if it was already selected.
    pub fn insert(&mut self, node: NodeRef) -> bool {
        self.nodes.insert(node)
    }

    /// Remove a node, keeping the order of the rest.
    pub fn remove(&mut self, node: &NodeRef) -> bool {
        self.nodes.shift_remove(node)
    }

    /// Flip a node's membership.
    pub fn toggle(&mut self, node: NodeRef) {
        if !self.nodes.insert(node.clone()) {
            self.nodes.shift_remove(&node);
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn contains(&self, node: &NodeRef) -> bool {
        self.nodes.contains(node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeRef> {
        self.nodes.iter()
    }

    pub fn selected_files(&self) -> Vec<FileId> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                NodeRef::File(id) => Some(id.clone()),
                NodeRef::Folder(_) => None,
            })
            .collect()
    }

    pub fn selected_folders(&self) -> Vec<FolderId> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                NodeRef::Folder(id) => Some(id.clone()),
                NodeRef::File(_) => None,
            })
            .collect()
    }
}

/// Classify a bare id handed in by an external caller.
///
/// An id is a file id exactly when some cached folder lists it among its
/// files; otherwise it is taken to be a folder id. This scan exists only
/// for the trust boundary: internal code passes [`NodeRef`] values around
/// and never re-derives the kind.
pub fn classify_key(cache: &ContentCache, raw: &str) -> NodeRef {
    let file_id = FileId::new(raw);
    if cache.containing_folder(&file_id).is_some() {
        NodeRef::File(file_id)
    } else {
        NodeRef::folder(raw)
    }
}

/// What the cached portion of a subtree says about its file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtreeMedia {
    /// Fully fetched subtree, every file a video. An empty fetched folder
    /// counts vacuously.
    AllVideos,
    /// At least one cached non-video file.
    MixedContent,
    /// No non-video file seen, but parts of the subtree are unfetched, so
    /// no claim can be made.
    Indeterminate,
}

/// Verdict for the subtree rooted at `folder`.
///
/// The verdict is only as complete as the cache: a folder with unexpanded
/// children can prove mixed content but never prove all-videos.
pub fn subtree_media(cache: &ContentCache, folder: &FolderId) -> SubtreeMedia {
    let mut seen: HashSet<FolderId> = HashSet::new();
    let mut queue: VecDeque<FolderId> = VecDeque::new();
    let mut unfetched_remainder = false;
    queue.push_back(folder.clone());
    seen.insert(folder.clone());

    while let Some(id) = queue.pop_front() {
        let node = match cache.get(&id) {
            Some(node) if node.children_fetched => node,
            _ => {
                unfetched_remainder = true;
                continue;
            }
        };
        if node.files.iter().any(|f| !is_video(f)) {
            return SubtreeMedia::MixedContent;
        }
        for child in &node.subfolders {
            if seen.insert(child.clone()) {
                queue.push_back(child.clone());
            }
        }
    }

    if unfetched_remainder {
        SubtreeMedia::Indeterminate
    } else {
        SubtreeMedia::AllVideos
    }
}

/// The id lists actually sent to the move operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveSet {
    pub files: Vec<FileId>,
    pub folders: Vec<FolderId>,
}

impl MoveSet {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.folders.is_empty()
    }
}

/// Result of an import request.
#[derive(Debug)]
pub enum ImportOutcome {
    Moved(MoveReport),
    /// Derivation emptied the move set; nothing was sent.
    NothingEligible,
}

/// Reduce a selection to the id lists worth sending.
///
/// When files and folders are both selected, a folder that is the direct
/// parent of any selected file is dropped as redundant (the file-level move
/// already covers it). Only direct parents are dropped; an ancestor further
/// up stays in the set.
///
/// With `video_only`, files must classify as video and folders must have an
/// all-videos cached subtree; an indeterminate subtree is excluded rather
/// than assumed.
pub fn derive_move_set(cache: &ContentCache, selection: &Selection, video_only: bool) -> MoveSet {
    let mut files = selection.selected_files();
    let mut folders = selection.selected_folders();

    if !files.is_empty() && !folders.is_empty() {
        let parent_folders: HashSet<FolderId> = files
            .iter()
            .filter_map(|f| cache.containing_folder(f).map(|n| n.id.clone()))
            .collect();
        folders.retain(|d| !parent_folders.contains(d));
    }

    if video_only {
        files.retain(|f| {
            cache
                .find_file(f)
                .map(|file| is_video(&file))
                .unwrap_or(false)
        });
        folders.retain(|d| {
            let verdict = subtree_media(cache, d);
            if verdict != SubtreeMedia::AllVideos {
                debug!(folder = %d, ?verdict, "folder excluded from video-only move");
            }
            verdict == SubtreeMedia::AllVideos
        });
    }

    MoveSet { files, folders }
}

/// Runs the import flow: derive the move set, then move it.
pub struct ImportSelector {
    cache: Arc<ContentCache>,
    coordinator: Arc<MutationCoordinator>,
}

impl ImportSelector {
    pub fn new(cache: Arc<ContentCache>, coordinator: Arc<MutationCoordinator>) -> Self {
        ImportSelector { cache, coordinator }
    }

    /// See [`derive_move_set`].
    pub fn derive_move_set(&self, selection: &Selection, video_only: bool) -> MoveSet {
        derive_move_set(&self.cache, selection, video_only)
    }

    /// Derive the move set for `selection` and move it into `destination`.
    ///
    /// An empty derived set aborts with a warning before any network call.
    pub async fn import(
        &self,
        selection: &Selection,
        destination: &FolderId,
        video_only: bool,
    ) -> Result<ImportOutcome, TreeError> {
        let move_set = derive_move_set(&self.cache, selection, video_only);
        if move_set.is_empty() {
            warn!(
                selected = selection.len(),
                video_only, "selection contains no eligible items, nothing sent"
            );
            return Ok(ImportOutcome::NothingEligible);
        }

        info!(
            files = move_set.files.len(),
            folders = move_set.folders.len(),
            destination = %destination,
            "importing selection"
        );
        let report = self
            .coordinator
            .move_nodes(&move_set.files, &move_set.folders, destination)
            .await?;
        Ok(ImportOutcome::Moved(report))
    }
}

/// Render-ready snapshot of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileView {
    pub id: FileId,
    pub name: String,
    pub selected: bool,
}

/// Render-ready snapshot of one folder subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderView {
    pub id: FolderId,
    pub name: String,
    pub fetched: bool,
    pub selected: bool,
    pub subfolders: Vec<FolderView>,
    pub files: Vec<FileView>,
}

/// Render-ready snapshot of the whole forest, master tree first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForestView {
    pub roots: Vec<FolderView>,
}

/// Build a view of everything fetched so far.
///
/// Unfetched folders render collapsed; a root the cache has never seen
/// falls back to its id as the display name.
pub fn forest_view(cache: &ContentCache, forest: &Forest, selection: &Selection) -> ForestView {
    ForestView {
        roots: forest
            .roots()
            .map(|root| folder_view(cache, selection, root))
            .collect(),
    }
}

/// Build a view of one folder's cached subtree.
pub fn folder_view(cache: &ContentCache, selection: &Selection, id: &FolderId) -> FolderView {
    let selected = selection.contains(&NodeRef::Folder(id.clone()));
    match cache.get(id) {
        Some(node) => FolderView {
            id: id.clone(),
            name: node.name.clone(),
            fetched: node.children_fetched,
            selected,
            subfolders: node
                .subfolders
                .iter()
                .map(|child| folder_view(cache, selection, child))
                .collect(),
            files: node
                .files
                .iter()
                .map(|f| FileView {
                    id: f.id.clone(),
                    name: f.name.clone(),
                    selected: selection.contains(&NodeRef::File(f.id.clone())),
                })
                .collect(),
        },
        None => FolderView {
            id: id.clone(),
            name: id.to_string(),
            fetched: false,
            selected,
            subfolders: Vec::new(),
            files: Vec::new(),
        },
    }
}
