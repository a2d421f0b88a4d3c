use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::FixedOffset;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use vaxsurvey::app::{AppState, build_router};
use vaxsurvey::{Config, FieldSchema, RecordStore, SurveyVariant};

const USER: &str = "warden";
const PASSWORD: &str = "hunter2";

fn test_config(data_dir: &Path, static_dir: &Path) -> Config {
    Config {
        port: 0,
        survey_url: "http://localhost/survey".to_string(),
        data_dir: data_dir.to_path_buf(),
        static_dir: static_dir.to_path_buf(),
        variant: SurveyVariant::Combined,
        download_user: USER.to_string(),
        download_password: PASSWORD.to_string(),
        tz_offset: FixedOffset::east_opt(0).unwrap(),
        mirror: None,
    }
}

async fn spawn_app(data_dir: &Path, static_dir: &Path) -> SocketAddr {
    let config = test_config(data_dir, static_dir);
    let store = RecordStore::new(&config.data_dir).expect("open store");
    let schema = FieldSchema::for_variant(config.variant);
    let state = Arc::new(AppState {
        config,
        schema,
        store,
        mirror: None,
    });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });
    addr
}

async fn send(addr: SocketAddr, request: String) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect server");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    response
}

fn get_request(path: &str, addr: SocketAddr, extra_header: Option<String>) -> String {
    let extra = extra_header.map(|h| format!("{}\r\n", h)).unwrap_or_default();
    format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\n{}Connection: close\r\n\r\n",
        path, addr, extra
    )
}

fn post_form_request(path: &str, addr: SocketAddr, body: &str) -> String {
    format!(
        "POST {} HTTP/1.1\r\nHost: {}\r\nContent-Type: application/x-www-form-urlencoded\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        path,
        addr,
        body.len(),
        body
    )
}

fn basic_auth_header(user: &str, password: &str) -> String {
    format!(
        "Authorization: Basic {}",
        BASE64.encode(format!("{}:{}", user, password))
    )
}

const COMPLETE_BODY: &str = "age_group=25-34&gender=Female&education=Secondary\
&district=Westlands&vaccines_received=MMR&vaccination_place=Clinic\
&satisfaction=Satisfied&would_recommend=Yes&consent=yes\
&info_sources=Radio&info_sources=Television";

#[tokio::test]
async fn root_redirects_to_info_sheet() {
    let data = tempdir().expect("tempdir");
    let statics = tempdir().expect("tempdir");
    let addr = spawn_app(data.path(), statics.path()).await;

    let response = send(addr, get_request("/", addr, None)).await;
    assert!(response.starts_with("HTTP/1.1 303"));
    assert!(response.to_lowercase().contains("location: /info-sheet"));
}

#[tokio::test]
async fn incomplete_submission_is_rejected_and_not_persisted() {
    let data = tempdir().expect("tempdir");
    let statics = tempdir().expect("tempdir");
    let addr = spawn_app(data.path(), statics.path()).await;

    let body = "age_group=25-34&gender=&consent=yes";
    let response = send(addr, post_form_request("/survey", addr, body)).await;
    assert!(response.starts_with("HTTP/1.1 400"));
    assert!(response.contains("Missing required fields:"));
    // Missing fields come back in schema order.
    assert!(response.contains("gender, education, district"));

    let store = RecordStore::new(data.path()).expect("open store");
    assert!(store.list_date_keys().expect("list").is_empty());
}

#[tokio::test]
async fn accepted_submission_redirects_and_is_downloadable() {
    let data = tempdir().expect("tempdir");
    let statics = tempdir().expect("tempdir");
    let addr = spawn_app(data.path(), statics.path()).await;

    let response = send(addr, post_form_request("/survey", addr, COMPLETE_BODY)).await;
    assert!(response.starts_with("HTTP/1.1 303"));
    assert!(response.to_lowercase().contains("location: /thank-you"));

    let store = RecordStore::new(data.path()).expect("open store");
    let keys = store.list_date_keys().expect("list");
    assert_eq!(keys.len(), 1);
    let date = &keys[0];

    // The downloads listing shows the new date key.
    let listing = send(addr, get_request("/downloads", addr, None)).await;
    assert!(listing.contains(&format!("/download/{}", date)));

    let auth = basic_auth_header(USER, PASSWORD);
    let response = send(
        addr,
        get_request(&format!("/download/{}", date), addr, Some(auth)),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"));
    let lower = response.to_lowercase();
    assert!(lower.contains("content-type: text/csv"));
    assert!(lower.contains(&format!(
        "content-disposition: attachment; filename=responses-{}.csv",
        date
    )));

    // Header row starts with timestamp; checkbox group exported as JSON text.
    let body = response.split("\r\n\r\n").nth(1).expect("body");
    assert!(body.starts_with("timestamp,age_group,"));
    assert!(body.contains("\"25-34\""));
    assert!(body.contains("Radio"));
}

#[tokio::test]
async fn download_requires_valid_credentials() {
    let data = tempdir().expect("tempdir");
    let statics = tempdir().expect("tempdir");
    let addr = spawn_app(data.path(), statics.path()).await;

    send(addr, post_form_request("/survey", addr, COMPLETE_BODY)).await;
    let store = RecordStore::new(data.path()).expect("open store");
    let date = store.list_date_keys().expect("list")[0].clone();

    let response = send(addr, get_request(&format!("/download/{}", date), addr, None)).await;
    assert!(response.starts_with("HTTP/1.1 401"));
    assert!(response.to_lowercase().contains("www-authenticate: basic"));

    let wrong = basic_auth_header(USER, "wrong");
    let response = send(
        addr,
        get_request(&format!("/download/{}", date), addr, Some(wrong)),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 401"));
}

#[tokio::test]
async fn download_of_absent_date_is_not_found() {
    let data = tempdir().expect("tempdir");
    let statics = tempdir().expect("tempdir");
    let addr = spawn_app(data.path(), statics.path()).await;

    let auth = basic_auth_header(USER, PASSWORD);
    let response = send(
        addr,
        get_request("/download/2000-01-01", addr, Some(auth.clone())),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 404"));

    // A file that exists but holds no records is also a 404.
    let store = RecordStore::new(data.path()).expect("open store");
    std::fs::write(store.file_path("2000-01-02"), "\n").expect("write empty file");
    let response = send(
        addr,
        get_request("/download/2000-01-02", addr, Some(auth)),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 404"));
}
