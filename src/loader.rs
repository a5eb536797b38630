//! Lazy tree loading.
//!
//! The loader pulls folder listings on demand and commits them to the
//! cache. Expansion is strictly lazy: a folder's contents are fetched the
//! first time it is opened and never re-fetched just because it is rendered
//! again. Failed fetches leave the cache untouched.

use crate::cache::ContentCache;
use crate::error::TreeError;
use crate::node::{FolderNode, Forest};
use crate::transport::{ContentTransport, FolderPayload};
use crate::types::FolderId;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info};

pub struct TreeLoader {
    cache: Arc<ContentCache>,
    transport: Arc<dyn ContentTransport>,
}

impl TreeLoader {
    pub fn new(cache: Arc<ContentCache>, transport: Arc<dyn ContentTransport>) -> Self {
        TreeLoader { cache, transport }
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    /// Fetch one folder's listing and commit it.
    pub async fn fetch_folder(&self, id: &FolderId) -> Result<Arc<FolderNode>, TreeError> {
        let payload = self
            .transport
            .get_folder(id)
            .await
            .map_err(|source| TreeError::FetchFailed {
                folder: id.clone(),
                source,
            })?;
        Ok(self.commit(payload))
    }

    /// Fetch a folder only if its contents are not already cached.
    pub async fn expand(&self, id: &FolderId) -> Result<Arc<FolderNode>, TreeError> {
        if let Some(node) = self.cache.get(id) {
            if node.children_fetched {
                debug!(folder = %id, "expand served from cache");
                return Ok(node);
            }
        }
        self.fetch_folder(id).await
    }

    /// Expand a folder and, level by level, every descendant under it.
    ///
    /// This is the explicit opposite of lazy rendering, for flows that need
    /// the whole subtree in cache up front (a video-restricted import can
    /// only admit folders whose subtrees are fully fetched). Fetches within
    /// one level run concurrently. `max_depth` of `Some(0)` expands just the
    /// folder itself.
    pub async fn expand_deep(
        &self,
        root: &FolderId,
        max_depth: Option<usize>,
    ) -> Result<Arc<FolderNode>, TreeError> {
        let node = self.expand(root).await?;
        let mut frontier: Vec<FolderId> = node.subfolders.clone();
        let mut depth = 1usize;
        while !frontier.is_empty() {
            if max_depth.map(|m| depth > m).unwrap_or(false) {
                break;
            }
            let results = join_all(frontier.iter().map(|id| self.expand(id))).await;
            let mut next = Vec::new();
            for res in results {
                next.extend(res?.subfolders.iter().cloned());
            }
            frontier = next;
            depth += 1;
        }
        Ok(node)
    }

    /// Fetch the master folder and every course root concurrently.
    ///
    /// Roots fail independently: every successful listing is committed even
    /// when a sibling fails. The first error is surfaced, master before
    /// course roots.
    pub async fn fetch_forest_roots(
        &self,
        course_roots: &[FolderId],
    ) -> Result<Forest, TreeError> {
        let master_fut = self.fetch_master();
        let roots_fut = join_all(course_roots.iter().map(|id| self.fetch_folder(id)));
        let (master_res, roots_res) = futures::join!(master_fut, roots_fut);

        let master = master_res?;
        let mut roots = Vec::with_capacity(course_roots.len());
        for res in roots_res {
            roots.push(res?.id.clone());
        }
        Ok(Forest::new(master.id.clone(), roots))
    }

    /// Fetch the master folder, creating it when the service has none.
    ///
    /// A not-found answer triggers one initialize call followed by one
    /// retried fetch; any further failure is surfaced.
    async fn fetch_master(&self) -> Result<Arc<FolderNode>, TreeError> {
        match self.transport.master_hierarchy().await {
            Ok(payload) => Ok(self.commit(payload)),
            Err(e) if e.is_not_found() => {
                info!("master folder missing, initializing");
                self.transport
                    .initialize_master()
                    .await
                    .map_err(TreeError::MasterInitFailed)?;
                let payload = self
                    .transport
                    .master_hierarchy()
                    .await
                    .map_err(TreeError::MasterFetchFailed)?;
                Ok(self.commit(payload))
            }
            Err(e) => Err(TreeError::MasterFetchFailed(e)),
        }
    }

    /// Commit a listing to the cache.
    ///
    /// Each subfolder the listing names is seeded as an unfetched stub so
    /// the tree can render collapsed children immediately. A child that has
    /// already been fetched keeps its own contents; only its name and parent
    /// link are refreshed from the listing.
    pub(crate) fn commit(&self, payload: FolderPayload) -> Arc<FolderNode> {
        for sub in &payload.folders {
            match self.cache.get(&sub.id) {
                Some(existing) => {
                    if existing.name != sub.name
                        || existing.parent_id.as_ref() != Some(&payload.id)
                    {
                        let mut refreshed = (*existing).clone();
                        refreshed.name = sub.name.clone();
                        refreshed.parent_id = Some(payload.id.clone());
                        self.cache.put(refreshed);
                    }
                }
                None => {
                    self.cache.put(FolderNode::unfetched(
                        sub.id.clone(),
                        sub.name.clone(),
                        Some(payload.id.clone()),
                    ));
                }
            }
        }
        let node = self.cache.put(payload.into_node());
        debug!(
            folder = %node.id,
            files = node.files.len(),
            subfolders = node.subfolders.len(),
            "committed folder listing"
        );
        node
    }
}
