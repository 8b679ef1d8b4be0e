// End-to-end tests of SkaldClient over the reqwest transport against a
// local wiremock server.

mod common;

use std::io::Write;
use std::time::Duration;

use common::{memo_json, API_KEY, HELLO_WORLD, MEMO_UUID};
use serde_json::json;
use skald::traits::HttpError;
use skald::{
    CancellationToken, ChatParams, ClientConfig, IdType, MemoData, MemoFileData, SkaldClient,
    SkaldError,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> SkaldClient {
    SkaldClient::new(ClientConfig::new(API_KEY).with_base_url(server.uri())).unwrap()
}

#[tokio::test]
async fn test_streamed_chat_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat"))
        .and(header("authorization", format!("Bearer {}", API_KEY).as_str()))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({"query": "hi", "stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(HELLO_WORLD, "text/event-stream"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let text = client_for(&mock_server)
        .streamed_chat(ChatParams::new("hi"), &CancellationToken::new())
        .collect_text()
        .await
        .unwrap();

    assert_eq!(text, "Hello world");
}

#[tokio::test]
async fn test_streamed_chat_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid API key"})),
        )
        .mount(&mock_server)
        .await;

    let mut stream =
        client_for(&mock_server).streamed_chat(ChatParams::new("hi"), &CancellationToken::new());
    assert!(stream.next_event().await.is_none());

    let err = stream.finish().await.unwrap_err();
    let api = err.as_api_error().unwrap();
    assert_eq!(api.status_code, 401);
    assert!(api.message.contains("Invalid API key"));
}

#[tokio::test]
async fn test_cancel_while_server_delays_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(HELLO_WORLD, "text/event-stream")
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    let stream = client_for(&mock_server).streamed_chat(ChatParams::new("hi"), &cancel);

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = tokio::time::timeout(Duration::from_secs(5), stream.collect_events())
        .await
        .expect("cancellation was not observed")
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_create_and_get_memo() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/memo"))
        .and(body_partial_json(json!({"title": "Notes", "metadata": {}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"memo_uuid": MEMO_UUID})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/memo/ref%2F7"))
        .and(query_param("id_type", "reference_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(memo_json(MEMO_UUID, "Notes")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let created = client
        .create_memo(MemoData::new("Notes", "Body"))
        .await
        .unwrap();
    assert_eq!(created.memo_uuid.to_string(), MEMO_UUID);

    let memo = client.get_memo("ref/7", IdType::ReferenceId).await.unwrap();
    assert_eq!(memo.title, "Notes");
}

#[tokio::test]
async fn test_upload_is_multipart() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/memo/upload"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"memo_uuid": MEMO_UUID})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    file.write_all(b"plain text document").unwrap();
    let file_name = file
        .path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();

    let data = MemoFileData {
        source: Some("tests".to_string()),
        ..Default::default()
    };
    client_for(&mock_server)
        .create_memo_from_file(file.path(), Some(&data))
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let request = &requests[0];
    let content_type = request.headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));

    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains(&format!("filename=\"{}\"", file_name)));
    assert!(body.contains("plain text document"));
    assert!(body.contains("name=\"memo_data\""));
    assert!(body.contains(r#"{"source":"tests"}"#));
}

#[tokio::test]
async fn test_user_agent_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    client_for(&mock_server)
        .delete_memo(MEMO_UUID, IdType::MemoUuid)
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let user_agent = requests[0].headers.get("user-agent").unwrap().to_str().unwrap();
    assert!(user_agent.starts_with("skald-rust/"));
}

#[tokio::test]
async fn test_request_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"results": []}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let client = SkaldClient::new(
        ClientConfig::new(API_KEY)
            .with_base_url(mock_server.uri())
            .with_timeout(Duration::from_millis(100)),
    )
    .unwrap();

    let err = client
        .search(skald::SearchRequest::new("q"))
        .await
        .unwrap_err();
    assert!(matches!(err, SkaldError::Transport(HttpError::Timeout(_))));
}

#[tokio::test]
async fn test_connection_refused() {
    let client = SkaldClient::new(ClientConfig::new(API_KEY).with_base_url("http://127.0.0.1:1"))
        .unwrap();

    let err = client
        .streamed_chat(ChatParams::new("hi"), &CancellationToken::new())
        .collect_events()
        .await
        .unwrap_err();

    assert!(matches!(err, SkaldError::Transport(HttpError::ConnectionFailed(_))));
    assert!(err.is_retryable());
}
