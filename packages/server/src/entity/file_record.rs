use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file_record")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub filename: String,

    /// Size in bytes.
    pub size: i64,

    pub mime: String,

    /// Opaque handle into the remote blob store.
    pub remote_blob_id: String,

    /// Lowercase hex SHA-256 of the file bytes.
    #[sea_orm(unique)]
    pub content_hash: String,

    pub uploaded_at: DateTimeUtc,

    pub downloads: i64,

    /// One of: `url`, `direct`.
    pub source: String,

    /// Set only when `source` is `url`.
    pub original_url: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
