//! File ordering within one folder.
//!
//! A drag-reorder produces a complete new id sequence for the folder. The
//! engine validates that the sequence is an exact permutation of the
//! folder's files before touching cache or network, applies the new order
//! locally, then persists the whole ordered id list. Failures revert to the
//! pre-reorder array; there is no partial retry.

use crate::cache::ContentCache;
use crate::error::TreeError;
use crate::node::FileRef;
use crate::transport::ContentTransport;
use crate::types::{FileId, FolderId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

pub struct OrderingEngine {
    cache: Arc<ContentCache>,
    transport: Arc<dyn ContentTransport>,
}

impl OrderingEngine {
    pub fn new(cache: Arc<ContentCache>, transport: Arc<dyn ContentTransport>) -> Self {
        OrderingEngine { cache, transport }
    }

    /// Apply and persist a new display order for the folder's files.
    pub async fn reorder(&self, folder: &FolderId, order: &[FileId]) -> Result<(), TreeError> {
        let node = self
            .cache
            .get(folder)
            .ok_or_else(|| TreeError::UnknownFolder(folder.clone()))?;
        if !node.children_fetched {
            return Err(TreeError::InvalidOrdering {
                folder: folder.clone(),
                reason: "folder contents not fetched".to_string(),
            });
        }
        let files = resequence(&node.files, order).map_err(|reason| TreeError::InvalidOrdering {
            folder: folder.clone(),
            reason,
        })?;

        let snapshot = self.cache.snapshot([folder.clone()]);
        let mut patched = (*node).clone();
        patched.files = files;
        self.cache.put(patched);

        match self.transport.update_order(folder, order).await {
            Ok(()) => {
                info!(folder = %folder, files = order.len(), "file order persisted");
                Ok(())
            }
            Err(source) => {
                warn!(folder = %folder, error = %source, "reorder failed, rolled back");
                self.cache.restore(snapshot);
                Err(TreeError::MutationFailed {
                    operation: "reorder files",
                    source,
                })
            }
        }
    }
}

/// The same file records in the requested sequence.
///
/// `order` must name each file of `files` exactly once; anything else
/// (missing, unknown, or repeated ids) is rejected.
fn resequence(files: &[FileRef], order: &[FileId]) -> Result<Vec<FileRef>, String> {
    if files.len() != order.len() {
        return Err(format!(
            "order lists {} ids but the folder has {} files",
            order.len(),
            files.len()
        ));
    }
    let mut by_id: HashMap<&FileId, &FileRef> = files.iter().map(|f| (&f.id, f)).collect();
    let mut out = Vec::with_capacity(order.len());
    for id in order {
        match by_id.remove(id) {
            Some(file) => out.push(file.clone()),
            None => return Err(format!("id {} is not a file of this folder", id)),
        }
    }
    Ok(out)
}
