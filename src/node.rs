//! Folder and file node model.
//!
//! A [`FolderNode`] is the client's picture of one remote folder: its own
//! metadata, the ids of its subfolders, and full [`FileRef`] records for the
//! files it directly contains. Child folder content lives in separate nodes,
//! so a tree is always held as a flat id-indexed collection and a node can
//! exist before its children have ever been fetched.

use crate::types::{FileId, FolderId};
use serde::{Deserialize, Serialize};

/// One file as listed inside its containing folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub id: FileId,
    pub name: String,
    /// Content type tag assigned by the server, e.g. `"video"` or `"document"`.
    #[serde(rename = "type")]
    pub file_type: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_downloadable: bool,
    #[serde(default)]
    pub is_viewable: bool,
}

/// One folder in the forest.
///
/// `children_fetched` records whether this node's own listing has been
/// retrieved. A node created as a placeholder from its parent's listing has
/// `children_fetched == false` and empty child collections; such a node says
/// nothing about what the folder actually contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    pub id: FolderId,
    pub name: String,
    /// `None` for forest roots (the master folder and course roots).
    pub parent_id: Option<FolderId>,
    pub subfolders: Vec<FolderId>,
    pub files: Vec<FileRef>,
    pub children_fetched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_download: Option<bool>,
}

impl FolderNode {
    /// Placeholder for a folder known only from its parent's listing.
    pub fn unfetched(id: FolderId, name: impl Into<String>, parent_id: Option<FolderId>) -> Self {
        FolderNode {
            id,
            name: name.into(),
            parent_id,
            subfolders: Vec::new(),
            files: Vec::new(),
            children_fetched: false,
            is_visible: None,
            allow_download: None,
        }
    }

    pub fn file(&self, id: &FileId) -> Option<&FileRef> {
        self.files.iter().find(|f| &f.id == id)
    }

    pub fn contains_file(&self, id: &FileId) -> bool {
        self.file(id).is_some()
    }

    /// Position of a file in this folder's display order.
    pub fn file_order(&self, id: &FileId) -> Option<usize> {
        self.files.iter().position(|f| &f.id == id)
    }

    pub fn contains_subfolder(&self, id: &FolderId) -> bool {
        self.subfolders.iter().any(|s| s == id)
    }
}

/// Root ids of the trees shown side by side for one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forest {
    /// Shared master folder, common to every course.
    pub master: FolderId,
    /// Course-specific roots, in display order.
    pub course_roots: Vec<FolderId>,
}

impl Forest {
    pub fn new(master: FolderId, course_roots: Vec<FolderId>) -> Self {
        Forest {
            master,
            course_roots,
        }
    }

    /// All root ids, master first.
    pub fn roots(&self) -> impl Iterator<Item = &FolderId> {
        std::iter::once(&self.master).chain(self.course_roots.iter())
    }
}
