//! Mock HTTP client for testing.
//!
//! Provides a scripted transport that returns predefined responses, records
//! every request it sees, and tracks whether response bodies were released.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use crate::traits::{
    BodyStream, Headers, HttpClient, HttpError, HttpRequest, HttpResponse, Method, RequestBody,
};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: Method,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body, if any
    pub body: Option<RequestBody>,
}

impl RecordedRequest {
    /// The JSON body parsed as a value, if the request had one.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        match &self.body {
            Some(RequestBody::Json(bytes)) => serde_json::from_slice(bytes).ok(),
            _ => None,
        }
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Respond with a status and a single-chunk body
    Status(u16, Bytes),
    /// Respond 200 with a body delivered in the given chunks
    Stream(Vec<Bytes>),
    /// Respond 200, deliver the chunks, then fail the body read
    StreamThenError(Vec<Bytes>, HttpError),
    /// Respond 200, deliver the chunks, then never produce another byte
    Stalled(Vec<Bytes>),
    /// Fail before any response arrives
    Error(HttpError),
    /// Never return from `send`
    Hang,
}

impl MockResponse {
    /// Shorthand for a 200 response with a JSON body.
    pub fn json(value: serde_json::Value) -> Self {
        MockResponse::Status(200, Bytes::from(value.to_string()))
    }

    /// Shorthand for a 200 SSE body in a single chunk.
    pub fn sse(body: &str) -> Self {
        MockResponse::Stream(vec![Bytes::from(body.to_string())])
    }
}

/// Body stream wrapper that counts its own drop.
struct TrackedBody {
    inner: BodyStream,
    released: Arc<AtomicUsize>,
}

impl Stream for TrackedBody {
    type Item = Result<Bytes, HttpError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Mock HTTP client for testing.
///
/// Responses are matched by exact URL first, then by URL prefix, then the
/// default response.
///
/// # Example
///
/// ```ignore
/// use skald::adapters::mock::{MockHttpClient, MockResponse};
///
/// let transport = MockHttpClient::new();
/// transport.set_response(
///     "https://api.useskald.com/api/v1/chat",
///     MockResponse::sse("data: {\"type\":\"done\"}\n"),
/// );
///
/// // ... run a streamed chat against it ...
///
/// assert_eq!(transport.get_requests().len(), 1);
/// assert_eq!(transport.released_bodies(), transport.opened_bodies());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    /// Configured responses by URL pattern
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a response for a specific URL or URL prefix.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        let mut default = self.default_response.lock().unwrap();
        *default = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    /// Number of response bodies handed out.
    pub fn opened_bodies(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of response bodies that have been dropped.
    pub fn released_bodies(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// True once every body handed out has been released.
    pub fn all_bodies_released(&self) -> bool {
        self.released_bodies() == self.opened_bodies()
    }

    fn record_request(&self, request: &HttpRequest) {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            method: request.method,
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        });
    }

    /// Get the response for a URL.
    fn get_response(&self, url: &str) -> Option<MockResponse> {
        let responses = self.responses.lock().unwrap();

        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        // Longest prefix wins so "/memo/x/status" beats "/memo"
        let prefixed = responses
            .iter()
            .filter(|(pattern, _)| url.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, response)| response.clone());
        if prefixed.is_some() {
            return prefixed;
        }

        let default = self.default_response.lock().unwrap();
        default.clone()
    }

    fn respond(&self, status: u16, content_type: &str, body: BodyStream) -> HttpResponse {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let tracked = TrackedBody {
            inner: body,
            released: Arc::clone(&self.released),
        };
        let mut headers = Headers::new();
        headers.insert("content-type".to_string(), content_type.to_string());
        HttpResponse::new(status, headers, Box::pin(tracked))
    }
}

const SSE: &str = "text/event-stream";

fn chunks(chunks: Vec<Bytes>) -> impl Stream<Item = Result<Bytes, HttpError>> + Send {
    futures::stream::iter(chunks.into_iter().map(Ok))
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.record_request(&request);

        match self.get_response(&request.url) {
            Some(MockResponse::Status(status, body)) => {
                Ok(self.respond(status, "application/json", Box::pin(chunks(vec![body]))))
            }
            Some(MockResponse::Stream(parts)) => {
                Ok(self.respond(200, SSE, Box::pin(chunks(parts))))
            }
            Some(MockResponse::StreamThenError(parts, err)) => {
                let body = chunks(parts).chain(futures::stream::once(async move { Err(err) }));
                Ok(self.respond(200, SSE, Box::pin(body)))
            }
            Some(MockResponse::Stalled(parts)) => {
                let body = chunks(parts).chain(futures::stream::pending());
                Ok(self.respond(200, SSE, Box::pin(body)))
            }
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Hang) => std::future::pending().await,
            None => Err(HttpError::Other(format!(
                "No mock response for URL: {}",
                request.url
            ))),
        }
    }
}
