use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Largest file accepted from either upload path: 2,000 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2000 * 1024 * 1024;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Empty means any origin.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

/// Where file metadata lives.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Database,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

/// Where file bytes live.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlobBackend {
    Telegram,
    Filesystem,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: BlobBackend,
    pub max_file_size: u64,
    /// Directory for transient staging files.
    pub staging_dir: PathBuf,
    /// Root directory of the filesystem blob backend.
    pub filesystem_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub channel_id: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub telegram: TelegramConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let staging_dir = std::env::temp_dir().join("stashbot");

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("store.backend", "memory")?
            .set_default("storage.backend", "telegram")?
            .set_default("storage.max_file_size", DEFAULT_MAX_FILE_SIZE as i64)?
            .set_default("storage.staging_dir", staging_dir.to_string_lossy().into_owned())?
            .set_default("storage.filesystem_path", "./data/blobs")?
            .set_default("telegram.api_base", common::storage::telegram::DEFAULT_API_BASE)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., STASHBOT__STORE__BACKEND=database)
            .add_source(
                Environment::with_prefix("STASHBOT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .set_override_option("telegram.bot_token", std::env::var("TELEGRAM_BOT_TOKEN").ok())?
            .set_override_option(
                "telegram.channel_id",
                std::env::var("TELEGRAM_CHANNEL_ID").ok(),
            )?
            .build()?;

        s.try_deserialize()
    }

    /// Reject configurations that cannot serve requests.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == BlobBackend::Telegram {
            if is_blank(self.telegram.bot_token.as_deref()) {
                return Err(ConfigError::Message(
                    "TELEGRAM_BOT_TOKEN (telegram.bot_token) is not set".into(),
                ));
            }
            if is_blank(self.telegram.channel_id.as_deref()) {
                return Err(ConfigError::Message(
                    "TELEGRAM_CHANNEL_ID (telegram.channel_id) is not set".into(),
                ));
            }
        }

        if self.store.backend == StoreBackend::Database && is_blank(self.database.url.as_deref())
        {
            return Err(ConfigError::Message(
                "database.url is required when store.backend = \"database\"".into(),
            ));
        }

        if self.storage.max_file_size == 0 {
            return Err(ConfigError::Message(
                "storage.max_file_size must be positive".into(),
            ));
        }

        Ok(())
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
