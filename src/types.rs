//! Shared identifier types for the content forest.
//!
//! File and folder ids are drawn from one server-issued identifier space;
//! the newtypes and the [`NodeRef`] tagged union keep the two kinds apart in
//! client code instead of guessing from untyped strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a folder node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(String);

impl FolderId {
    pub fn new(id: impl Into<String>) -> Self {
        FolderId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FolderId {
    fn from(id: &str) -> Self {
        FolderId::new(id)
    }
}

impl From<String> for FolderId {
    fn from(id: String) -> Self {
        FolderId(id)
    }
}

/// Identifier of a file inside a folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        FileId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(id: &str) -> Self {
        FileId::new(id)
    }
}

impl From<String> for FileId {
    fn from(id: String) -> Self {
        FileId(id)
    }
}

/// Typed reference distinguishing a file id from a folder id.
///
/// Everything below the trust boundary works with `NodeRef` (or the
/// newtypes directly); bare strings handed in by external callers are
/// classified once, on entry, via [`crate::selector::classify_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum NodeRef {
    File(FileId),
    Folder(FolderId),
}

impl NodeRef {
    pub fn file(id: impl Into<String>) -> Self {
        NodeRef::File(FileId::new(id))
    }

    pub fn folder(id: impl Into<String>) -> Self {
        NodeRef::Folder(FolderId::new(id))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, NodeRef::File(_))
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, NodeRef::Folder(_))
    }

    /// The raw id regardless of kind.
    pub fn id_str(&self) -> &str {
        match self {
            NodeRef::File(id) => id.as_str(),
            NodeRef::Folder(id) => id.as_str(),
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::File(id) => write!(f, "file:{}", id),
            NodeRef::Folder(id) => write!(f, "folder:{}", id),
        }
    }
}
