use std::sync::Arc;

use common::storage::filesystem::FilesystemBlobStore;
use common::storage::telegram::TelegramBlobStore;
use common::storage::{BlobStore, StorageError};
use sea_orm::DbErr;
use thiserror::Error;
use tracing::info;

use crate::config::{AppConfig, BlobBackend, StoreBackend};
use crate::database;
use crate::relay::BlobRelay;
use crate::service::FileService;
use crate::store::{DatabaseFileStore, FileStore, MemoryFileStore};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("missing setting: {0}")]
    Config(&'static str),

    #[error("database: {0}")]
    Database(#[from] DbErr),

    #[error("blob storage: {0}")]
    Storage(#[from] StorageError),

    #[error("HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub files: FileService,
}

impl AppState {
    pub fn new(config: AppConfig, files: FileService) -> Self {
        Self {
            config: Arc::new(config),
            files,
        }
    }

    /// Construct the metadata store, blob store and relay selected by `config`.
    pub async fn from_config(config: AppConfig) -> Result<Self, StartupError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("stashbot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let store = build_file_store(&config).await?;
        let blob_store = build_blob_store(&config, http.clone()).await?;
        let relay = BlobRelay::new(
            blob_store,
            http,
            config.storage.staging_dir.clone(),
            config.storage.max_file_size,
        );

        Ok(Self::new(config, FileService::new(store, Arc::new(relay))))
    }
}

pub async fn build_file_store(config: &AppConfig) -> Result<Arc<dyn FileStore>, StartupError> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory metadata store");
            Ok(Arc::new(MemoryFileStore::new()))
        }
        StoreBackend::Database => {
            let url = config
                .database
                .url
                .as_deref()
                .ok_or(StartupError::Config("database.url"))?;
            let db = database::init_db(url).await?;
            info!("Using database metadata store");
            Ok(Arc::new(DatabaseFileStore::new(db)))
        }
    }
}

pub async fn build_blob_store(
    config: &AppConfig,
    http: reqwest::Client,
) -> Result<Arc<dyn BlobStore>, StartupError> {
    match config.storage.backend {
        BlobBackend::Telegram => {
            let token = config
                .telegram
                .bot_token
                .as_deref()
                .ok_or(StartupError::Config("telegram.bot_token"))?;
            let channel = config
                .telegram
                .channel_id
                .as_deref()
                .ok_or(StartupError::Config("telegram.channel_id"))?;
            info!(channel, api_base = %config.telegram.api_base, "Using Telegram blob store");
            Ok(Arc::new(TelegramBlobStore::new(
                http,
                config.telegram.api_base.as_str(),
                token,
                channel,
            )))
        }
        BlobBackend::Filesystem => {
            let path = config.storage.filesystem_path.clone();
            info!(path = %path.display(), "Using filesystem blob store");
            Ok(Arc::new(
                FilesystemBlobStore::new(path, config.storage.max_file_size).await?,
            ))
        }
    }
}
