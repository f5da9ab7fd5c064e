mod common;

use std::time::Duration;

use common::{MockResponse, MockServer};
use subtitlr::config::DeeplConfig;
use subtitlr::translate::translate_document;
use subtitlr::{Credential, DeeplClient, PollPolicy, SubtitlrError};
use tokio_util::sync::CancellationToken;

const HELLO: &str = "1\n00:00:00,000 --> 00:00:01,000\nHello\n";
const HANDLE: &str = r#"{
    "document_id": "04DE5AD98A02647D83285A36021911C6",
    "document_key": "0CB0054F1C132C1625B392EADDA41CB754A742822F6877173029A6C487E7F60A"
}"#;
const DOCUMENT_ID: &str = "04DE5AD98A02647D83285A36021911C6";
const DOCUMENT_KEY: &str = "0CB0054F1C132C1625B392EADDA41CB754A742822F6877173029A6C487E7F60A";

fn client_for(server: &MockServer) -> DeeplClient {
    let config = DeeplConfig {
        base_url: Some(format!("{}/v2", server.url())),
        timeout_secs: 10,
        ..DeeplConfig::default()
    };
    DeeplClient::new(&config, Credential::new("deepl-secret:fx").unwrap()).unwrap()
}

fn instant_policy() -> PollPolicy {
    PollPolicy {
        min_interval: Duration::ZERO,
        max_interval: Duration::ZERO,
        max_wait: Duration::from_secs(30),
        show_progress: false,
    }
}

fn status(state: &str) -> MockResponse {
    MockResponse::json(
        200,
        &format!(
            r#"{{"document_id":"{}","status":"{}","seconds_remaining":1}}"#,
            DOCUMENT_ID, state
        ),
    )
}

fn subtitle_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("input.srt");
    std::fs::write(&path, "1\n00:00:00,000 --> 00:00:01,000\nBonjour\n").unwrap();
    path
}

#[tokio::test]
async fn round_trip_writes_downloaded_bytes() {
    let server = MockServer::start(vec![
        MockResponse::json(200, HANDLE),
        status("done"),
        MockResponse::text(200, HELLO),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let input = subtitle_file(&dir);
    let output = dir.path().join("output.srt");

    let written = translate_document(
        &client_for(&server),
        &input,
        "en-us",
        &output,
        &instant_policy(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(written, HELLO.len() as u64);
    assert_eq!(std::fs::read(&output).unwrap(), HELLO.as_bytes());

    let requests = server.requests();
    assert_eq!(requests.len(), 3);

    let upload = &requests[0];
    assert_eq!(upload.method, "POST");
    assert_eq!(upload.path(), "/v2/document");
    assert!(upload.body_text().contains("name=\"file\"; filename=\"input.srt.txt\""));
    assert!(upload.body_text().contains("name=\"target_lang\"\r\n\r\nEN-US"));
    assert!(upload.body_text().contains("Bonjour"));

    for request in &requests {
        assert_eq!(request.header("authorization"), Some("DeepL-Auth-Key deepl-secret:fx"));
        assert_eq!(request.header("user-agent"), Some("Subtitlr"));
    }
}

#[tokio::test]
async fn polls_until_done_then_downloads_once_with_the_same_key() {
    let server = MockServer::start(vec![
        MockResponse::json(200, HANDLE),
        status("queued"),
        status("translating"),
        status("done"),
        MockResponse::text(200, HELLO),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let input = subtitle_file(&dir);
    let output = dir.path().join("output.srt");

    translate_document(
        &client_for(&server),
        &input,
        "de",
        &output,
        &instant_policy(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 5);

    let status_path = format!("/v2/document/{}", DOCUMENT_ID);
    let result_path = format!("/v2/document/{}/result", DOCUMENT_ID);
    let expected_query = format!("document_key={}", DOCUMENT_KEY);

    for poll in &requests[1..4] {
        assert_eq!(poll.method, "POST");
        assert_eq!(poll.path(), status_path);
        assert_eq!(poll.query(), expected_query);
    }

    let downloads: Vec<_> = requests.iter().filter(|r| r.path() == result_path).collect();
    assert_eq!(downloads.len(), 1);
    assert_eq!(downloads[0].query(), expected_query);
    assert_eq!(requests.last().unwrap().path(), result_path);
}

#[tokio::test]
async fn malformed_upload_response_is_not_polled() {
    let server = MockServer::start(vec![MockResponse::text(200, "<html>not json</html>")]).await;
    let dir = tempfile::tempdir().unwrap();
    let input = subtitle_file(&dir);
    let output = dir.path().join("output.srt");

    let result = translate_document(
        &client_for(&server),
        &input,
        "de",
        &output,
        &instant_policy(),
        &CancellationToken::new(),
    )
    .await;

    assert!(matches!(result, Err(SubtitlrError::Translation(_))));
    assert_eq!(server.requests().len(), 1, "no status check after an empty handle");
    assert!(!output.exists());
}

#[tokio::test]
async fn failed_job_is_reported_without_download() {
    let server = MockServer::start(vec![
        MockResponse::json(200, HANDLE),
        MockResponse::json(
            200,
            &format!(
                r#"{{"document_id":"{}","status":"error",
                    "error_message":"Source and target language are equal."}}"#,
                DOCUMENT_ID
            ),
        ),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let input = subtitle_file(&dir);
    let output = dir.path().join("output.srt");

    let result = translate_document(
        &client_for(&server),
        &input,
        "fr",
        &output,
        &instant_policy(),
        &CancellationToken::new(),
    )
    .await;

    match result {
        Err(SubtitlrError::Translation(message)) => assert!(message.contains("language are equal")),
        other => panic!("expected a translation error, got {:?}", other),
    }
    assert_eq!(server.requests().len(), 2);
    assert!(!output.exists());
}

#[tokio::test]
async fn rejected_upload_surfaces_the_status_code() {
    let forbidden = MockResponse::json(403, r#"{"message":"Forbidden"}"#);
    let server = MockServer::start(vec![forbidden]).await;
    let dir = tempfile::tempdir().unwrap();
    let input = subtitle_file(&dir);

    let result = translate_document(
        &client_for(&server),
        &input,
        "de",
        &dir.path().join("output.srt"),
        &instant_policy(),
        &CancellationToken::new(),
    )
    .await;

    match result {
        Err(SubtitlrError::Translation(message)) => assert!(message.contains("403"), "{}", message),
        other => panic!("expected a translation error, got {:?}", other),
    }
}
