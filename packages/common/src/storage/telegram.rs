//! Telegram Bot API used as an opaque blob store.
//!
//! Files are posted to a channel with `sendDocument`; the returned `file_id`
//! is the blob id. Retrieval resolves the id with `getFile` and streams the
//! bytes from the file endpoint.

use std::path::Path;

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio_util::io::{ReaderStream, StreamReader};

use super::error::StorageError;
use super::traits::{BlobStore, BoxReader, UploadMeta};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct Message {
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
struct Document {
    file_id: String,
}

#[derive(Debug, Deserialize)]
struct RemoteFile {
    file_path: Option<String>,
}

/// Blob store backed by a Telegram bot posting into a channel.
pub struct TelegramBlobStore {
    client: Client,
    api_base: String,
    bot_token: String,
    channel_id: String,
}

impl TelegramBlobStore {
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            channel_id: channel_id.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_base, self.bot_token, file_path)
    }
}

/// Strip the request URL (it embeds the bot token) before surfacing an error.
fn transport(err: reqwest::Error) -> StorageError {
    StorageError::Transport(err.without_url().to_string())
}

fn into_result<T>(method: &str, response: ApiResponse<T>) -> Result<T, StorageError> {
    if !response.ok {
        let description = response
            .description
            .unwrap_or_else(|| "no description".to_string());
        return Err(StorageError::Rejected(format!("{method}: {description}")));
    }
    response
        .result
        .ok_or_else(|| StorageError::Rejected(format!("{method}: response has no result")))
}

#[async_trait]
impl BlobStore for TelegramBlobStore {
    async fn put_file(&self, path: &Path, meta: &UploadMeta) -> Result<String, StorageError> {
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();

        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let document = Part::stream_with_length(body, length)
            .file_name(meta.filename.clone())
            .mime_str(&meta.mime)
            .map_err(|e| StorageError::Rejected(format!("invalid content type: {e}")))?;

        let form = Form::new()
            .text("chat_id", self.channel_id.clone())
            .text(
                "caption",
                format!("File: {}\nSHA-256: {}", meta.filename, meta.content_hash),
            )
            .part("document", document);

        let response: ApiResponse<Message> = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;

        let message = into_result("sendDocument", response)?;
        let document = message
            .document
            .ok_or_else(|| StorageError::Rejected("sendDocument: no document in reply".into()))?;

        tracing::info!(
            filename = %meta.filename,
            content_hash = %meta.content_hash,
            size = meta.size,
            "Uploaded document to Telegram"
        );

        Ok(document.file_id)
    }

    async fn get_stream(&self, blob_id: &str) -> Result<BoxReader, StorageError> {
        let response: ApiResponse<RemoteFile> = self
            .client
            .post(self.method_url("getFile"))
            .json(&serde_json::json!({ "file_id": blob_id }))
            .send()
            .await
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;

        // The Bot API answers 400 for ids it does not know, but also for
        // files above its download limit.
        if !response.ok
            && response.error_code == Some(400)
            && !response
                .description
                .as_deref()
                .is_some_and(|d| d.contains("too big"))
        {
            return Err(StorageError::NotFound(blob_id.to_string()));
        }

        let file_path = into_result("getFile", response)?
            .file_path
            .ok_or_else(|| StorageError::NotFound(blob_id.to_string()))?;

        let download = self
            .client
            .get(self.file_url(&file_path))
            .send()
            .await
            .map_err(transport)?;

        match download.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(StorageError::NotFound(blob_id.to_string())),
            status => {
                return Err(StorageError::Transport(format!(
                    "file download responded with {status}"
                )));
            }
        }

        let stream = download.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::new(StreamReader::new(Box::pin(stream))))
    }
}
