use async_trait::async_trait;
use chrono::Utc;
use common::storage::ContentHash;
use sea_orm::prelude::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};
use tracing::debug;

use super::{FileRecord, FileSource, FileStore, Insertion, NewFileRecord, StoreError};
use crate::entity::file_record;

/// [`FileStore`] persisted through SeaORM.
///
/// Hash uniqueness and counter increments are delegated to the database.
pub struct DatabaseFileStore {
    db: DatabaseConnection,
}

impl DatabaseFileStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<FileRecord>, StoreError> {
        file_record::Entity::find()
            .filter(file_record::Column::ContentHash.eq(hash))
            .one(&self.db)
            .await?
            .map(FileRecord::try_from)
            .transpose()
    }
}

impl TryFrom<file_record::Model> for FileRecord {
    type Error = StoreError;

    fn try_from(model: file_record::Model) -> Result<Self, Self::Error> {
        let id = model.id;
        let content_hash = ContentHash::from_hex(&model.content_hash).map_err(|e| {
            StoreError::Corrupt {
                id,
                reason: e.to_string(),
            }
        })?;
        let source = FileSource::from_parts(&model.source, model.original_url).ok_or_else(|| {
            StoreError::Corrupt {
                id,
                reason: format!("inconsistent source '{}'", model.source),
            }
        })?;

        Ok(Self {
            id,
            filename: model.filename,
            size: model.size,
            mime: model.mime,
            remote_blob_id: model.remote_blob_id,
            content_hash,
            uploaded_at: model.uploaded_at,
            downloads: model.downloads,
            source,
        })
    }
}

#[async_trait]
impl FileStore for DatabaseFileStore {
    async fn create(&self, new: NewFileRecord) -> Result<Insertion, StoreError> {
        let hash = new.content_hash.to_hex();

        let model = file_record::ActiveModel {
            filename: Set(new.filename),
            size: Set(new.size),
            mime: Set(new.mime),
            remote_blob_id: Set(new.remote_blob_id),
            content_hash: Set(hash.clone()),
            uploaded_at: Set(Utc::now()),
            downloads: Set(0),
            source: Set(new.source.kind().to_string()),
            original_url: Set(new.source.original_url().map(String::from)),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(inserted) => Ok(Insertion::Created(inserted.try_into()?)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                debug!(content_hash = %hash, "Concurrent insert won the content hash, reusing it");
                let existing = self.find_by_hash(&hash).await?.ok_or_else(|| {
                    sea_orm::DbErr::Custom(
                        "UniqueConstraintViolation but existing row not found".to_string(),
                    )
                })?;
                Ok(Insertion::Existing(existing))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<FileRecord>, StoreError> {
        file_record::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(FileRecord::try_from)
            .transpose()
    }

    async fn get_by_content_hash(
        &self,
        hash: &ContentHash,
    ) -> Result<Option<FileRecord>, StoreError> {
        self.find_by_hash(&hash.to_hex()).await
    }

    async fn list(&self) -> Result<Vec<FileRecord>, StoreError> {
        file_record::Entity::find()
            .order_by_desc(file_record::Column::UploadedAt)
            .order_by_desc(file_record::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(FileRecord::try_from)
            .collect()
    }

    async fn increment_downloads(&self, id: i32) -> Result<(), StoreError> {
        file_record::Entity::update_many()
            .col_expr(
                file_record::Column::Downloads,
                Expr::cust("\"downloads\" + 1"),
            )
            .filter(file_record::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: i32) -> Result<bool, StoreError> {
        let result = file_record::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
