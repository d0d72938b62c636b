//! Behaviour every [`FileStore`] implementation must share.

use std::sync::Arc;

use common::storage::ContentHash;

use super::{FileSource, FileStore, NewFileRecord};

pub fn new_record(content: &[u8], source: FileSource) -> NewFileRecord {
    NewFileRecord {
        filename: "notes.txt".into(),
        size: content.len() as i64,
        mime: "text/plain".into(),
        remote_blob_id: format!("blob-{}", content.len()),
        content_hash: ContentHash::compute(content),
        source,
    }
}

pub async fn create_assigns_id_and_zero_downloads(store: &dyn FileStore) {
    let created = store
        .create(new_record(b"0123456789", FileSource::Direct))
        .await
        .unwrap();

    assert!(created.is_created());
    let record = created.record();
    assert!(record.id > 0);
    assert_eq!(record.downloads, 0);
    assert_eq!(record.size, 10);
    assert_eq!(record.source, FileSource::Direct);

    let fetched = store.get_by_id(record.id).await.unwrap().unwrap();
    assert_eq!(&fetched, record);
}

pub async fn duplicate_hash_returns_existing(store: &dyn FileStore) {
    let first = store
        .create(new_record(b"same bytes", FileSource::Direct))
        .await
        .unwrap()
        .into_record();

    let url = FileSource::Url("https://example.com/same.txt".into());
    let second = store.create(new_record(b"same bytes", url)).await.unwrap();

    assert!(!second.is_created());
    assert_eq!(second.record().id, first.id);
    assert_eq!(second.record().source, FileSource::Direct);
    assert_eq!(store.list().await.unwrap().len(), 1);
}

pub async fn lookup_by_hash(store: &dyn FileStore) {
    let url = FileSource::Url("https://example.com/a.bin".into());
    let record = store
        .create(new_record(b"by hash", url.clone()))
        .await
        .unwrap()
        .into_record();

    let found = store
        .get_by_content_hash(&ContentHash::compute(b"by hash"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, record.id);
    assert_eq!(found.source, url);

    assert!(
        store
            .get_by_content_hash(&ContentHash::compute(b"never stored"))
            .await
            .unwrap()
            .is_none()
    );
}

pub async fn list_is_newest_first(store: &dyn FileStore) {
    let mut ids = Vec::new();
    for content in [b"first".as_slice(), b"second", b"third"] {
        let record = store
            .create(new_record(content, FileSource::Direct))
            .await
            .unwrap()
            .into_record();
        ids.push(record.id);
    }

    let listed = store.list().await.unwrap();
    let listed_ids: Vec<i32> = listed.iter().map(|f| f.id).collect();
    ids.reverse();
    assert_eq!(listed_ids, ids);
    assert!(
        listed
            .windows(2)
            .all(|pair| pair[0].uploaded_at >= pair[1].uploaded_at)
    );
}

pub async fn increment_counts_every_call(store: &dyn FileStore) {
    let record = store
        .create(new_record(b"popular", FileSource::Direct))
        .await
        .unwrap()
        .into_record();

    for _ in 0..5 {
        store.increment_downloads(record.id).await.unwrap();
    }

    let fetched = store.get_by_id(record.id).await.unwrap().unwrap();
    assert_eq!(fetched.downloads, 5);
}

pub async fn increment_unknown_id_is_noop(store: &dyn FileStore) {
    store.increment_downloads(9999).await.unwrap();
    assert!(store.get_by_id(9999).await.unwrap().is_none());
}

pub async fn delete_releases_hash(store: &dyn FileStore) {
    let record = store
        .create(new_record(b"short lived", FileSource::Direct))
        .await
        .unwrap()
        .into_record();

    assert!(store.delete_by_id(record.id).await.unwrap());
    assert!(store.get_by_id(record.id).await.unwrap().is_none());
    assert!(
        store
            .get_by_content_hash(&record.content_hash)
            .await
            .unwrap()
            .is_none()
    );
    assert!(!store.delete_by_id(record.id).await.unwrap());

    let again = store
        .create(new_record(b"short lived", FileSource::Direct))
        .await
        .unwrap();
    assert!(again.is_created());
    assert_ne!(again.record().id, record.id);
}

pub async fn concurrent_creates_insert_once(store: Arc<dyn FileStore>) {
    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .create(new_record(b"raced content", FileSource::Direct))
                .await
        }));
    }

    let mut created = 0;
    let mut ids = Vec::new();
    for handle in handles {
        let insertion = handle.await.unwrap().unwrap();
        if insertion.is_created() {
            created += 1;
        }
        ids.push(insertion.record().id);
    }

    assert_eq!(created, 1);
    assert!(ids.iter().all(|id| *id == ids[0]));
}
