//! JSON shapes spoken on the wire.
//!
//! The service uses camelCase keys throughout. Folder listings arrive
//! wrapped in an envelope; [`FolderPayload::into_node`] converts a listing
//! into the cache's [`FolderNode`] form.

use crate::node::{FileRef, FolderNode};
use crate::types::{FileId, FolderId};
use serde::{Deserialize, Serialize};

/// Subfolder reference inside a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubfolderPayload {
    pub id: FolderId,
    pub name: String,
}

/// One folder listing as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPayload {
    pub id: FolderId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<FolderId>,
    #[serde(default)]
    pub folders: Vec<SubfolderPayload>,
    #[serde(default)]
    pub files: Vec<FileRef>,
    #[serde(default)]
    pub is_visible: Option<bool>,
    #[serde(default)]
    pub allow_download: Option<bool>,
}

impl FolderPayload {
    /// The cache node for this listing. The listing is the folder's own
    /// contents, so the node is always marked fetched.
    pub fn into_node(self) -> FolderNode {
        FolderNode {
            id: self.id,
            name: self.name,
            parent_id: self.parent_id,
            subfolders: self.folders.into_iter().map(|f| f.id).collect(),
            files: self.files,
            children_fetched: true,
            is_visible: self.is_visible,
            allow_download: self.allow_download,
        }
    }
}

/// Envelope around a single folder listing.
#[derive(Debug, Clone, Deserialize)]
pub struct FolderEnvelope {
    pub folder: FolderPayload,
}

/// Envelope around the master folder hierarchy.
#[derive(Debug, Clone, Deserialize)]
pub struct MasterEnvelope {
    #[serde(default)]
    pub success: bool,
    pub data: FolderPayload,
}

/// Partial update to a folder's metadata. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
}

impl FolderPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        FolderPatch {
            name: Some(name.into()),
            ..FolderPatch::default()
        }
    }

    pub fn visibility(is_visible: bool) -> Self {
        FolderPatch {
            is_visible: Some(is_visible),
            ..FolderPatch::default()
        }
    }
}

/// Partial update to a file's metadata. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_downloadable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_viewable: Option<bool>,
}

impl FilePatch {
    pub fn rename(name: impl Into<String>) -> Self {
        FilePatch {
            name: Some(name.into()),
            ..FilePatch::default()
        }
    }
}

/// Outcome of one move batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MoveResult {
    pub moved_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSubfolderBody<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteFolderBody<'a> {
    pub source_folder_id: &'a FolderId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateOrderBody<'a> {
    pub file_ids: &'a [FileId],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MoveFilesBody<'a> {
    pub file_ids: &'a [FileId],
    pub destination_folder_id: &'a FolderId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MoveFoldersBody<'a> {
    pub folder_ids: &'a [FolderId],
    pub destination_folder_id: &'a FolderId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_listing_parses_camel_case() {
        let json = r#"{
            "folder": {
                "id": "d1",
                "name": "Week 1",
                "parentId": "root",
                "folders": [{"id": "d2", "name": "Clips"}],
                "files": [{
                    "id": "f1",
                    "name": "Intro",
                    "type": "video",
                    "url": "https://cdn/x.mp4",
                    "isViewable": true,
                    "isDownloadable": false
                }],
                "isVisible": true
            }
        }"#;
        let env: FolderEnvelope = serde_json::from_str(json).unwrap();
        let node = env.folder.into_node();
        assert!(node.children_fetched);
        assert_eq!(node.parent_id, Some(FolderId::new("root")));
        assert_eq!(node.subfolders, vec![FolderId::new("d2")]);
        assert_eq!(node.files[0].file_type, "video");
        assert_eq!(node.is_visible, Some(true));
    }

    #[test]
    fn sparse_listing_defaults_child_lists() {
        let payload: FolderPayload =
            serde_json::from_str(r#"{"id":"d1","name":"Week 1"}"#).unwrap();
        assert!(payload.folders.is_empty());
        assert!(payload.files.is_empty());
        assert_eq!(payload.parent_id, None);
    }

    #[test]
    fn patches_skip_absent_fields() {
        let patch = FolderPatch::rename("New name");
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"name": "New name"}));

        let patch = FilePatch {
            is_downloadable: Some(true),
            ..FilePatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"isDownloadable": true}));
    }

    #[test]
    fn move_result_tolerates_missing_fields() {
        let res: MoveResult = serde_json::from_str("{}").unwrap();
        assert_eq!(res.moved_count, 0);

        let res: MoveResult = serde_json::from_str(r#"{"movedCount": 3}"#).unwrap();
        assert_eq!(res.moved_count, 3);
    }

    #[test]
    fn move_body_names_destination() {
        let files = [FileId::new("f1")];
        let dest = FolderId::new("d9");
        let body = MoveFilesBody {
            file_ids: &files,
            destination_folder_id: &dest,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"fileIds": ["f1"], "destinationFolderId": "d9"})
        );
    }
}
