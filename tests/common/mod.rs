//! Common test utilities for integration tests.
//!
//! Builds clients over [`MockHttpClient`] and provides canned SSE bodies and
//! API payloads.
//!
//! # Example
//!
//! ```ignore
//! mod common;
//! use common::{mock_client, chat_url};
//!
//! let (client, transport) = mock_client();
//! transport.set_response(&chat_url(), MockResponse::sse(common::HELLO_WORLD));
//! ```

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use skald::adapters::mock::MockHttpClient;
use skald::{ClientConfig, SkaldClient};

pub const BASE_URL: &str = "http://skald.test";
pub const API_KEY: &str = "sk_test_123";
pub const MEMO_UUID: &str = "550e8400-e29b-41d4-a716-446655440000";

/// Two tokens and a done event.
pub const HELLO_WORLD: &str = concat!(
    "data: {\"type\":\"token\",\"content\":\"Hello\"}\n",
    "data: {\"type\":\"token\",\"content\":\" world\"}\n",
    "data: {\"type\":\"done\"}\n",
);

/// A client talking to a fresh mock transport.
pub fn mock_client() -> (SkaldClient, MockHttpClient) {
    let transport = MockHttpClient::new();
    let client = SkaldClient::with_transport(
        ClientConfig::new(API_KEY).with_base_url(BASE_URL),
        Arc::new(transport.clone()),
    );
    (client, transport)
}

pub fn url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

pub fn chat_url() -> String {
    url("/api/v1/chat")
}

pub fn generate_url() -> String {
    url("/api/v1/generate")
}

/// One `data:` line for the given payload.
pub fn data_line(payload: Value) -> String {
    format!("data: {}\n", payload)
}

pub fn token_line(content: &str) -> String {
    data_line(json!({"type": "token", "content": content}))
}

pub fn done_line() -> String {
    data_line(json!({"type": "done"}))
}

/// A memo as returned by `GET /api/v1/memo/{id}`.
pub fn memo_json(uuid: &str, title: &str) -> Value {
    json!({
        "uuid": uuid,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "title": title,
        "content": "Some content",
        "summary": "A summary",
        "content_length": 12,
        "metadata": {},
        "client_reference_id": null,
        "source": null,
        "type": "text",
        "expiration_date": null,
        "archived": false,
        "pending": false,
        "tags": [],
        "chunks": []
    })
}
