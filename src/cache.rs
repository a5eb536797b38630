//! Flat, versioned cache of folder nodes.
//!
//! The cache is the single source of truth for everything the client knows
//! about the forest. Nodes are stored behind `Arc` and keyed by folder id;
//! tree shape is implicit in each node's `subfolders` list.
//!
//! Writes are equality-guarded: storing a node equal to the cached one keeps
//! the existing allocation and revision, so observers comparing `Arc`
//! pointers or revisions see no change. Each entry carries the value of a
//! cache-wide monotonic counter taken at its last real change, which gives
//! observers a cheap "did anything move" check without comparing node
//! content themselves.

use crate::node::{FileRef, FolderNode};
use crate::types::{FileId, FolderId};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::trace;

struct CacheEntry {
    node: Arc<FolderNode>,
    revision: u64,
}

struct CacheInner {
    entries: HashMap<FolderId, CacheEntry>,
    counter: u64,
}

/// Shared cache of folder nodes.
pub struct ContentCache {
    inner: RwLock<CacheInner>,
}

/// Saved cache state for a set of folder ids, taken before an optimistic
/// mutation and applied back verbatim if the remote call fails.
///
/// An id can be captured as absent; restoring then removes whatever entry
/// a failed operation left behind under that id.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    entries: Vec<(FolderId, Option<Arc<FolderNode>>)>,
}

impl CacheSnapshot {
    pub fn folder_ids(&self) -> impl Iterator<Item = &FolderId> {
        self.entries.iter().map(|(id, _)| id)
    }
}

impl ContentCache {
    pub fn new() -> Self {
        ContentCache {
            inner: RwLock::new(CacheInner {
                entries: HashMap::new(),
                counter: 0,
            }),
        }
    }

    /// Store a node, keeping the existing entry when nothing changed.
    ///
    /// Returns the `Arc` now held by the cache: the previous allocation when
    /// the new node is equal to it, a fresh one otherwise.
    pub fn put(&self, node: FolderNode) -> Arc<FolderNode> {
        let mut inner = self.inner.write();
        if let Some(entry) = inner.entries.get(&node.id) {
            if *entry.node == node {
                trace!(folder = %node.id, revision = entry.revision, "cache put unchanged");
                return Arc::clone(&entry.node);
            }
        }
        inner.counter += 1;
        let revision = inner.counter;
        let arc = Arc::new(node);
        trace!(folder = %arc.id, revision, "cache put");
        inner.entries.insert(
            arc.id.clone(),
            CacheEntry {
                node: Arc::clone(&arc),
                revision,
            },
        );
        arc
    }

    pub fn get(&self, id: &FolderId) -> Option<Arc<FolderNode>> {
        self.inner.read().entries.get(id).map(|e| Arc::clone(&e.node))
    }

    /// Revision of the entry's last real change, if cached.
    pub fn revision(&self, id: &FolderId) -> Option<u64> {
        self.inner.read().entries.get(id).map(|e| e.revision)
    }

    pub fn contains(&self, id: &FolderId) -> bool {
        self.inner.read().entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Drop an entry. Returns whether anything was removed.
    pub fn invalidate(&self, id: &FolderId) -> bool {
        let removed = self.inner.write().entries.remove(id).is_some();
        if removed {
            trace!(folder = %id, "cache invalidate");
        }
        removed
    }

    /// Capture current state for the given ids, absent entries included.
    pub fn snapshot(&self, ids: impl IntoIterator<Item = FolderId>) -> CacheSnapshot {
        let inner = self.inner.read();
        let entries = ids
            .into_iter()
            .map(|id| {
                let node = inner.entries.get(&id).map(|e| Arc::clone(&e.node));
                (id, node)
            })
            .collect();
        CacheSnapshot { entries }
    }

    /// Put back a snapshot taken by [`ContentCache::snapshot`].
    ///
    /// Entries equal to the current state keep their revision; ids captured
    /// as absent are removed.
    pub fn restore(&self, snapshot: CacheSnapshot) {
        let mut inner = self.inner.write();
        for (id, saved) in snapshot.entries {
            match saved {
                Some(node) => {
                    if let Some(entry) = inner.entries.get(&id) {
                        if Arc::ptr_eq(&entry.node, &node) || *entry.node == *node {
                            continue;
                        }
                    }
                    inner.counter += 1;
                    let revision = inner.counter;
                    trace!(folder = %id, revision, "cache restore");
                    inner.entries.insert(id, CacheEntry { node, revision });
                }
                None => {
                    if inner.entries.remove(&id).is_some() {
                        trace!(folder = %id, "cache restore removed");
                    }
                }
            }
        }
    }

    /// Ids of a folder and every descendant reachable through cached nodes.
    ///
    /// Subfolder ids whose own nodes are not cached are still included; they
    /// just cannot be expanded further.
    pub fn subtree_ids(&self, root: &FolderId) -> Vec<FolderId> {
        let inner = self.inner.read();
        let mut seen: HashSet<FolderId> = HashSet::new();
        let mut queue: VecDeque<FolderId> = VecDeque::new();
        let mut out = Vec::new();
        queue.push_back(root.clone());
        seen.insert(root.clone());
        while let Some(id) = queue.pop_front() {
            if let Some(entry) = inner.entries.get(&id) {
                for child in &entry.node.subfolders {
                    if seen.insert(child.clone()) {
                        queue.push_back(child.clone());
                    }
                }
            }
            out.push(id);
        }
        out
    }

    /// The cached folder whose listing contains the given file.
    pub fn containing_folder(&self, file: &FileId) -> Option<Arc<FolderNode>> {
        let inner = self.inner.read();
        inner
            .entries
            .values()
            .find(|e| e.node.contains_file(file))
            .map(|e| Arc::clone(&e.node))
    }

    /// Look a file up across every cached folder.
    pub fn find_file(&self, file: &FileId) -> Option<FileRef> {
        let inner = self.inner.read();
        inner
            .entries
            .values()
            .find_map(|e| e.node.file(file).cloned())
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        ContentCache::new()
    }
}
