//! End-to-end tests for the demo routers

use axum::http::StatusCode;
use axum_test::{
    multipart::{MultipartForm, Part},
    TestServer,
};
use serde_json::{json, Value};
use std::path::Path;
use toolkit::config::ToolkitConfig;
use toolkit_cli::commands::{download, json, upload};

fn config_in(root: &Path) -> ToolkitConfig {
    let mut config = ToolkitConfig::default();
    config.upload.dir = root.join("uploads");
    config.download.dir = root.join("files");
    config.static_files.root = root.to_path_buf();
    config
}

fn jpeg(len: usize) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.resize(len, 0x42);
    data
}

#[tokio::test]
async fn test_upload_reports_stored_files() {
    let root = tempfile::tempdir().unwrap();
    let config = config_in(root.path());
    let server = TestServer::new(upload::router(&config).unwrap()).unwrap();

    let form = MultipartForm::new()
        .add_part("files", Part::bytes(jpeg(2048)).file_name("cat.jpg"))
        .add_part("files", Part::bytes(jpeg(1024)).file_name("dog.jpg"));
    let response = server.post("/upload").multipart(form).await;

    response.assert_status_ok();
    let text = response.text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Uploaded cat.jpg to the uploads folder, renamed to "));
    assert!(lines[1].starts_with("Uploaded dog.jpg to the uploads folder, renamed to "));
    assert_eq!(std::fs::read_dir(&config.upload.dir).unwrap().count(), 2);
}

#[tokio::test]
async fn test_upload_one_reports_first_file() {
    let root = tempfile::tempdir().unwrap();
    let config = config_in(root.path());
    let server = TestServer::new(upload::router(&config).unwrap()).unwrap();

    let form = MultipartForm::new()
        .add_part("file", Part::bytes(jpeg(512)).file_name("first.jpg"))
        .add_part("file", Part::bytes(jpeg(512)).file_name("second.jpg"));
    let response = server.post("/upload-one").multipart(form).await;

    response.assert_status_ok();
    assert_eq!(response.text().lines().count(), 1);
    assert!(response.text().starts_with("Uploaded first.jpg"));
}

#[tokio::test]
async fn test_upload_rejects_disallowed_type() {
    let root = tempfile::tempdir().unwrap();
    let config = config_in(root.path());
    let server = TestServer::new(upload::router(&config).unwrap()).unwrap();

    let form = MultipartForm::new()
        .add_part("files", Part::bytes(b"%PDF-1.7 pretend".to_vec()).file_name("cat.jpg"));
    let response = server.post("/upload").multipart(form).await;

    response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("application/pdf"));
}

#[tokio::test]
async fn test_upload_rejects_oversized_file() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config_in(root.path());
    config.upload.max_file_size = 1024;
    let server = TestServer::new(upload::router(&config).unwrap()).unwrap();

    let form = MultipartForm::new().add_part("files", Part::bytes(jpeg(4096)).file_name("big.jpg"));
    let response = server.post("/upload").multipart(form).await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(std::fs::read_dir(&config.upload.dir).unwrap().count(), 0);
}

#[tokio::test]
async fn test_static_files_are_served() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("index.html"), "<h1>upload form</h1>").unwrap();
    let server = TestServer::new(upload::router(&config_in(root.path())).unwrap()).unwrap();

    let response = server.get("/").await;
    response.assert_status_ok();
    assert!(response.text().contains("upload form"));
}

#[tokio::test]
async fn test_receive_post_acknowledges() {
    let root = tempfile::tempdir().unwrap();
    let server = TestServer::new(json::router(&config_in(root.path())).unwrap()).unwrap();

    let response = server
        .post("/api/receive-post")
        .json(&json!({"action": "ping", "message": "hello"}))
        .await;

    response.assert_status(StatusCode::ACCEPTED);
    response.assert_json(&json!({
        "message": "Hit the handler okay, now sending the response - hello"
    }));
}

#[tokio::test]
async fn test_receive_post_rejects_unknown_key() {
    let root = tempfile::tempdir().unwrap();
    let server = TestServer::new(json::router(&config_in(root.path())).unwrap()).unwrap();

    let response = server
        .post("/api/receive-post")
        .json(&json!({"unexpected": true}))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "body contains unknown key \"unexpected\"");
}

#[tokio::test]
async fn test_simulated_service_replies_ok() {
    let root = tempfile::tempdir().unwrap();
    let server = TestServer::new(json::router(&config_in(root.path())).unwrap()).unwrap();

    let response = server.post("/api/simulated-service").await;

    response.assert_status_ok();
    response.assert_json(&json!({"message": "OK"}));
}

#[tokio::test]
async fn test_remote_service_relays_to_peer() {
    let root = tempfile::tempdir().unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let peer_addr = listener.local_addr().unwrap();
    let peer = json::router(&config_in(root.path())).unwrap();
    tokio::spawn(async move {
        axum::serve(listener, peer).await.unwrap();
    });

    let mut config = config_in(root.path());
    config.json.remote_url = format!("http://{peer_addr}/api/simulated-service");
    let server = TestServer::new(json::router(&config).unwrap()).unwrap();

    let response = server
        .post("/api/remote-service")
        .json(&json!({"action": "relay", "message": "over there"}))
        .await;

    response.assert_status(StatusCode::ACCEPTED);
    response.assert_json(&json!({
        "message": "Hit the handler okay, now sending the response - over there",
        "status_code": 200
    }));
}

#[tokio::test]
async fn test_remote_service_unreachable_is_bad_gateway() {
    let root = tempfile::tempdir().unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = config_in(root.path());
    config.json.remote_url = format!("http://{dead_addr}/api/simulated-service");
    let server = TestServer::new(json::router(&config).unwrap()).unwrap();

    let response = server
        .post("/api/remote-service")
        .json(&json!({"action": "relay", "message": "nobody home"}))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_download_sends_attachment() {
    let root = tempfile::tempdir().unwrap();
    let config = config_in(root.path());
    std::fs::create_dir_all(&config.download.dir).unwrap();
    std::fs::write(config.download.dir.join("img.jpg"), jpeg(300)).unwrap();
    let server = TestServer::new(download::router(&config).unwrap()).unwrap();

    let response = server.get("/download").await;

    response.assert_status_ok();
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"rowdy-cat.jpg\""
    );
    assert_eq!(response.header("content-type"), "image/jpeg");
    assert_eq!(response.as_bytes().as_ref(), jpeg(300).as_slice());
}

#[tokio::test]
async fn test_download_missing_file_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let server = TestServer::new(download::router(&config_in(root.path())).unwrap()).unwrap();

    let response = server.get("/download").await;

    response.assert_status_not_found();
}
