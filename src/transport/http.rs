//! HTTP transport against the content service's REST surface.

use super::wire::{
    CreateSubfolderBody, DeleteFolderBody, FilePatch, FolderEnvelope, FolderPatch, FolderPayload,
    MasterEnvelope, MoveFilesBody, MoveFoldersBody, MoveResult, UpdateOrderBody,
};
use super::ContentTransport;
use crate::config::ApiConfig;
use crate::error::{TransportError, TreeError};
use crate::types::{FileId, FolderId};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// [`ContentTransport`] over HTTP with optional bearer authentication.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, TreeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| TreeError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(HttpTransport {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer_token: config.bearer_token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and map the HTTP outcome onto [`TransportError`].
    ///
    /// 404 becomes [`TransportError::NotFound`]; any other non-2xx status
    /// becomes [`TransportError::Status`] carrying the server's message.
    async fn execute(&self, builder: RequestBuilder, path: &str) -> Result<Response, TransportError> {
        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(path, "resource not found");
            return Err(TransportError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status, &body);
            warn!(path, status = status.as_u16(), message = %message, "request failed");
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    response
        .json::<T>()
        .await
        .map_err(|e| TransportError::InvalidResponse(e.to_string()))
}

/// Move endpoints may answer with an empty body; treat that as zero counts.
async fn parse_move(response: Response) -> Result<MoveResult, TransportError> {
    let body = response
        .text()
        .await
        .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
    if body.trim().is_empty() {
        return Ok(MoveResult::default());
    }
    serde_json::from_str(&body).map_err(|e| TransportError::InvalidResponse(e.to_string()))
}

/// Best server-provided message for a failed request: a JSON `error` or
/// `message` field when present, else the raw body (clipped), else the
/// status line.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.chars().take(200).collect();
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

#[async_trait]
impl ContentTransport for HttpTransport {
    async fn get_folder(&self, id: &FolderId) -> Result<FolderPayload, TransportError> {
        let path = format!("/folders/{}", id);
        debug!(folder = %id, "fetching folder listing");
        let response = self.execute(self.request(Method::GET, &path), &path).await?;
        let envelope: FolderEnvelope = parse_json(response).await?;
        Ok(envelope.folder)
    }

    async fn add_subfolder(
        &self,
        parent: &FolderId,
        name: &str,
    ) -> Result<FolderPayload, TransportError> {
        let path = format!("/folders/{}/add-subfolder", parent);
        debug!(parent = %parent, name, "creating subfolder");
        let builder = self
            .request(Method::POST, &path)
            .json(&CreateSubfolderBody { name });
        let response = self.execute(builder, &path).await?;
        let envelope: FolderEnvelope = parse_json(response).await?;
        Ok(envelope.folder)
    }

    async fn update_folder(
        &self,
        id: &FolderId,
        patch: &FolderPatch,
    ) -> Result<(), TransportError> {
        let path = format!("/folders/{}", id);
        debug!(folder = %id, "patching folder");
        self.execute(self.request(Method::PATCH, &path).json(patch), &path)
            .await?;
        Ok(())
    }

    async fn delete_folder(&self, id: &FolderId, source: &FolderId) -> Result<(), TransportError> {
        let path = format!("/folders/{}", id);
        debug!(folder = %id, source = %source, "deleting folder");
        let builder = self.request(Method::DELETE, &path).json(&DeleteFolderBody {
            source_folder_id: source,
        });
        self.execute(builder, &path).await?;
        Ok(())
    }

    async fn delete_file(&self, folder: &FolderId, file: &FileId) -> Result<(), TransportError> {
        let path = format!("/folders/{}/files/{}", folder, file);
        debug!(folder = %folder, file = %file, "deleting file");
        self.execute(self.request(Method::DELETE, &path), &path)
            .await?;
        Ok(())
    }

    async fn update_file(
        &self,
        folder: &FolderId,
        file: &FileId,
        patch: &FilePatch,
    ) -> Result<(), TransportError> {
        let path = format!("/folders/{}/files/{}", folder, file);
        debug!(folder = %folder, file = %file, "patching file");
        self.execute(self.request(Method::PATCH, &path).json(patch), &path)
            .await?;
        Ok(())
    }

    async fn update_order(
        &self,
        folder: &FolderId,
        file_ids: &[FileId],
    ) -> Result<(), TransportError> {
        let path = format!("/folders/{}/update-order", folder);
        debug!(folder = %folder, count = file_ids.len(), "persisting file order");
        let builder = self
            .request(Method::POST, &path)
            .json(&UpdateOrderBody { file_ids });
        self.execute(builder, &path).await?;
        Ok(())
    }

    async fn move_files(
        &self,
        files: &[FileId],
        destination: &FolderId,
    ) -> Result<MoveResult, TransportError> {
        let path = "/files/move";
        debug!(destination = %destination, count = files.len(), "moving files");
        let builder = self.request(Method::POST, path).json(&MoveFilesBody {
            file_ids: files,
            destination_folder_id: destination,
        });
        let response = self.execute(builder, path).await?;
        parse_move(response).await
    }

    async fn move_folders(
        &self,
        folders: &[FolderId],
        destination: &FolderId,
    ) -> Result<MoveResult, TransportError> {
        let path = "/folders/move";
        debug!(destination = %destination, count = folders.len(), "moving folders");
        let builder = self.request(Method::POST, path).json(&MoveFoldersBody {
            folder_ids: folders,
            destination_folder_id: destination,
        });
        let response = self.execute(builder, path).await?;
        parse_move(response).await
    }

    async fn master_hierarchy(&self) -> Result<FolderPayload, TransportError> {
        let path = "/admin/master-folder/hierarchy";
        debug!("fetching master folder hierarchy");
        let response = self.execute(self.request(Method::GET, path), path).await?;
        let envelope: MasterEnvelope = parse_json(response).await?;
        Ok(envelope.data)
    }

    async fn initialize_master(&self) -> Result<(), TransportError> {
        let path = "/admin/master-folder/initialize";
        debug!("initializing master folder");
        self.execute(self.request(Method::POST, path), path).await?;
        Ok(())
    }
}
