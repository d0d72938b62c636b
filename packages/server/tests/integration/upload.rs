use axum::http::header;
use serde_json::json;

use crate::common::{TestApp, routes};

mod direct_upload {
    use super::*;

    #[tokio::test]
    async fn new_file_is_created() {
        let app = TestApp::spawn().await;

        let res = app
            .upload_file("hello.txt", b"0123456789".to_vec(), "text/plain")
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["message"], "File uploaded successfully");
        let file = &res.body["file"];
        assert_eq!(file["filename"], "hello.txt");
        assert_eq!(file["size"], 10);
        assert_eq!(file["mime"], "text/plain");
        assert_eq!(file["source"], "direct");
        assert_eq!(file["downloads"], 0);
        assert!(file["originalUrl"].is_null());
        assert_eq!(file["contentHash"].as_str().unwrap().len(), 64);
        assert!(file["uploadedAt"].as_str().is_some());
        assert!(file["remoteBlobId"].as_str().is_some());
        assert_eq!(app.stored_blob_count(), 1);
        assert_eq!(app.staged_file_count(), 0);
    }

    #[tokio::test]
    async fn identical_bytes_return_existing_record() {
        let app = TestApp::spawn().await;

        let first = app
            .upload_file("a.txt", b"same content".to_vec(), "text/plain")
            .await;
        let second = app
            .upload_file("b.txt", b"same content".to_vec(), "text/plain")
            .await;

        assert_eq!(first.status, 201);
        assert_eq!(second.status, 200, "{}", second.text);
        assert_eq!(second.body["message"], "File has already been uploaded");
        assert_eq!(second.file_id(), first.file_id());
        assert_eq!(second.body["file"]["filename"], "a.txt");
        assert_eq!(app.stored_blob_count(), 1);
    }

    #[tokio::test]
    async fn mime_is_guessed_when_client_sends_none() {
        let app = TestApp::spawn().await;

        let part = reqwest::multipart::Part::bytes(b"{}".to_vec()).file_name("data.json");
        let form = reqwest::multipart::Form::new().part("file", part);
        let res = app.post_multipart(form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["file"]["mime"], "application/json");
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new().text("note", "no file here");
        let res = app.post_multipart(form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["success"], false);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["message"], "No file provided");
    }

    #[tokio::test]
    async fn non_multipart_body_gets_json_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_raw(routes::UPLOAD_FILE, "text/plain", b"just text".to_vec())
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["success"], false);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.staged_file_count(), 0);
    }

    #[tokio::test]
    async fn direct_upload_of_url_bytes_returns_original() {
        let app = TestApp::spawn().await;
        let url = app.origin.serve("first.txt", b"fetched first");
        let fetched = app.upload_url(&url).await;
        assert_eq!(fetched.status, 201, "{}", fetched.text);

        let res = app
            .upload_file("second.txt", b"fetched first".to_vec(), "text/plain")
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.file_id(), fetched.file_id());
        assert_eq!(res.body["file"]["source"], "url");
        assert_eq!(res.body["file"]["originalUrl"], url.as_str());
        assert_eq!(app.stored_blob_count(), 1);
    }

    #[tokio::test]
    async fn unsafe_filename_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .upload_file(".htaccess", b"deny".to_vec(), "text/plain")
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.stored_blob_count(), 0);
    }

    #[tokio::test]
    async fn oversize_upload_stores_nothing() {
        let app = TestApp::spawn_with_max_size(16).await;

        let res = app
            .upload_file("big.bin", vec![7u8; 64], "application/octet-stream")
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "FILE_TOO_LARGE");
        assert_eq!(
            res.body["message"],
            "File exceeds the maximum allowed size (16 bytes)"
        );
        assert_eq!(app.stored_blob_count(), 0);
        assert_eq!(app.staged_file_count(), 0);

        let list = app.get(routes::FILES).await;
        assert_eq!(list.body["files"].as_array().unwrap().len(), 0);
    }
}

mod url_upload {
    use super::*;

    #[tokio::test]
    async fn url_upload_records_provenance() {
        let app = TestApp::spawn().await;
        let url = app.origin.serve("notes.txt", b"remote bytes");

        let res = app.upload_url(&url).await;

        assert_eq!(res.status, 201, "{}", res.text);
        let file = &res.body["file"];
        assert_eq!(file["filename"], "notes.txt");
        assert_eq!(file["size"], 12);
        assert_eq!(file["mime"], "text/plain");
        assert_eq!(file["source"], "url");
        assert_eq!(file["originalUrl"], url.as_str());
        assert_eq!(app.staged_file_count(), 0);
    }

    #[tokio::test]
    async fn url_upload_of_known_bytes_returns_original() {
        let app = TestApp::spawn().await;
        let direct = app
            .upload_file("hello.txt", b"0123456789".to_vec(), "text/plain")
            .await;
        assert_eq!(direct.status, 201);

        let url = app.origin.serve("copy.txt", b"0123456789");
        let res = app.upload_url(&url).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "File has already been uploaded");
        assert_eq!(res.file_id(), direct.file_id());
        assert_eq!(res.body["file"]["source"], "direct");
        assert_eq!(app.stored_blob_count(), 1);
    }

    #[tokio::test]
    async fn malformed_url_is_rejected() {
        let app = TestApp::spawn().await;

        for url in ["not a url", "ftp://example.com/a.txt", ""] {
            let res = app.upload_url(url).await;
            assert_eq!(res.status, 400, "{url}: {}", res.text);
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn missing_url_field_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.post_json(routes::UPLOAD_URL, &json!({ "link": "x" })).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn oversized_json_body_is_refused() {
        // A generous file ceiling must not widen the limit on the JSON route.
        let app = TestApp::spawn_with_max_size(64 * 1024 * 1024).await;
        let url = app.origin.serve("small.txt", b"small");

        let res = app
            .post_json(
                routes::UPLOAD_URL,
                &json!({ "url": url, "pad": "x".repeat(3 * 1024 * 1024) }),
            )
            .await;

        assert_eq!(res.status, 413, "{}", res.text);
        assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");
        assert_eq!(app.origin.get_count(), 0);
        assert_eq!(app.stored_blob_count(), 0);
    }

    #[tokio::test]
    async fn failing_source_is_reported() {
        let app = TestApp::spawn().await;

        let res = app.upload_url(&app.origin.url("absent.txt")).await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "FETCH_FAILED");
        assert!(
            res.body["message"].as_str().unwrap().contains("404"),
            "{}",
            res.text
        );
    }

    #[tokio::test]
    async fn declared_oversize_is_rejected_before_download() {
        let app = TestApp::spawn_with_max_size(16).await;
        let url = app.origin.serve("big.bin", &[1u8; 64]);

        let res = app.upload_url(&url).await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "FILE_TOO_LARGE");
        assert_eq!(app.origin.get_count(), 0);
        assert_eq!(app.stored_blob_count(), 0);
    }

    #[tokio::test]
    async fn response_is_json() {
        let app = TestApp::spawn().await;
        let url = app.origin.serve("x.txt", b"x");

        let res = app.upload_url(&url).await;

        assert!(res.header(header::CONTENT_TYPE).starts_with("application/json"));
    }
}
