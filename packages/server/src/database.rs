use std::time::Duration;

use sea_orm::sea_query::{Index, PostgresQueryBuilder, SqliteQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr};
use tracing::{info, warn};

use crate::entity::file_record;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    sync_schema(&db).await?;

    Ok(db)
}

/// Create or update tables for every registered entity, then the indexes.
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.get_schema_registry("stashbot::entity::*")
        .sync(db)
        .await?;
    ensure_indexes(db).await
}

/// Ensure required database indexes exist.
///
/// The unique index on `content_hash` backs the de-duplication guarantee, so
/// failing to create it is fatal. The ordering index is best effort.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();

    let unique_hash = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_file_record_content_hash")
        .table(file_record::Entity)
        .col(file_record::Column::ContentHash)
        .to_owned();

    // SELECT ... ORDER BY uploaded_at DESC
    let by_upload_time = Index::create()
        .if_not_exists()
        .name("idx_file_record_uploaded_at")
        .table(file_record::Entity)
        .col(file_record::Column::UploadedAt)
        .to_owned();

    let (unique_hash, by_upload_time) = match backend {
        DbBackend::Postgres => (
            unique_hash.to_string(PostgresQueryBuilder),
            by_upload_time.to_string(PostgresQueryBuilder),
        ),
        DbBackend::Sqlite => (
            unique_hash.to_string(SqliteQueryBuilder),
            by_upload_time.to_string(SqliteQueryBuilder),
        ),
        other => {
            warn!("No index definitions for backend {:?}", other);
            return Ok(());
        }
    };

    db.execute_unprepared(&unique_hash).await?;
    info!("Ensured index idx_file_record_content_hash exists");

    match db.execute_unprepared(&by_upload_time).await {
        Ok(_) => info!("Ensured index idx_file_record_uploaded_at exists"),
        Err(e) => warn!("Failed to create index idx_file_record_uploaded_at: {}", e),
    }

    Ok(())
}
