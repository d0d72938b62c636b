use crate::common::{TestApp, routes};

mod list {
    use super::*;

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::FILES).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["files"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn newest_upload_comes_first() {
        let app = TestApp::spawn().await;
        let mut ids = Vec::new();
        for (name, bytes) in [("a.txt", b"aaa"), ("b.txt", b"bbb"), ("c.txt", b"ccc")] {
            let res = app.upload_file(name, bytes.to_vec(), "text/plain").await;
            assert_eq!(res.status, 201);
            ids.push(res.file_id());
        }

        let res = app.get(routes::FILES).await;

        let listed: Vec<i64> = res.body["files"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["id"].as_i64().unwrap())
            .collect();
        ids.reverse();
        assert_eq!(listed, ids);
    }
}

mod get {
    use super::*;

    #[tokio::test]
    async fn returns_stored_metadata() {
        let app = TestApp::spawn().await;
        let id = app
            .upload_file("doc.txt", b"document".to_vec(), "text/plain")
            .await
            .file_id();

        let res = app.get(&routes::file(id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["file"]["id"], id);
        assert_eq!(res.body["file"]["filename"], "doc.txt");
    }

    #[tokio::test]
    async fn non_numeric_id_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::file("abc")).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["success"], false);
        assert_eq!(res.body["message"], "Invalid file ID");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::file(999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert_eq!(res.body["message"], "File not found");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn deletion_is_final() {
        let app = TestApp::spawn().await;
        let id = app
            .upload_file("gone.txt", b"short lived".to_vec(), "text/plain")
            .await
            .file_id();

        let res = app.delete(&routes::file(id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["message"], "File deleted successfully");

        assert_eq!(app.get(&routes::file(id)).await.status, 404);
        assert_eq!(app.delete(&routes::file(id)).await.status, 404);
        assert_eq!(app.get_bytes(&routes::download(id)).await.0, 404);
    }

    #[tokio::test]
    async fn reupload_after_delete_creates_new_record() {
        let app = TestApp::spawn().await;
        let first = app
            .upload_file("again.txt", b"recycled".to_vec(), "text/plain")
            .await
            .file_id();
        app.delete(&routes::file(first)).await;

        let res = app
            .upload_file("again.txt", b"recycled".to_vec(), "text/plain")
            .await;

        assert_eq!(res.status, 201);
        assert_ne!(res.file_id(), first);
    }

    #[tokio::test]
    async fn non_numeric_id_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.delete(&routes::file("1.5")).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}
