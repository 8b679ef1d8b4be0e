//! Skald API client.
//!
//! [`SkaldClient`] is cheap to clone and safe to share between tasks: the
//! configuration is read-only and the transport is behind an `Arc`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::adapters::ReqwestHttpClient;
use crate::config::ClientConfig;
use crate::error::{ApiError, SkaldError, SkaldResult};
use crate::models::{
    ChatParams, ChatResponse, CreateMemoResponse, GenerateDocResponse, GenerateParams, IdType,
    ListMemosParams, ListMemosResponse, Memo, MemoData, MemoFileData, MemoStatus,
    MemoStatusResponse, SearchRequest, SearchResponse, UpdateMemoData, UpdateMemoResponse,
};
use crate::stream::{spawn_stream, EventStream};
use crate::traits::{HttpClient, HttpRequest, HttpResponse, Method, MultipartField, RequestBody};

/// Largest file accepted by [`SkaldClient::create_memo_from_file`] (100 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

const MEMO_PATH: &str = "/api/v1/memo";
const UPLOAD_PATH: &str = "/api/v1/memo/upload";
const SEARCH_PATH: &str = "/api/v1/search";
const CHAT_PATH: &str = "/api/v1/chat";
const GENERATE_PATH: &str = "/api/v1/generate";

/// Client for the Skald API.
///
/// # Example
///
/// ```ignore
/// use skald::{ClientConfig, MemoData, SkaldClient};
///
/// let client = SkaldClient::new(ClientConfig::new("sk_live_..."))?;
/// let created = client.create_memo(MemoData::new("Title", "Body")).await?;
/// let memo = client.get_memo(&created.memo_uuid.to_string(), IdType::MemoUuid).await?;
/// ```
#[derive(Clone)]
pub struct SkaldClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn HttpClient>,
}

impl SkaldClient {
    /// Create a client backed by reqwest, honoring the configured timeout and
    /// user agent.
    pub fn new(config: ClientConfig) -> SkaldResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SkaldError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_transport(
            config,
            Arc::new(ReqwestHttpClient::with_client(client)),
        ))
    }

    /// Create a client over any transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpClient>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ---- memos -------------------------------------------------------------

    /// Create a text memo.
    pub async fn create_memo(&self, memo: MemoData) -> SkaldResult<CreateMemoResponse> {
        let request = self.json_request(Method::Post, self.url(MEMO_PATH, &[]), &memo)?;
        self.execute_json(request).await
    }

    /// Upload a document (PDF, DOCX, ...) as a new memo.
    ///
    /// Files larger than [`MAX_UPLOAD_BYTES`] are rejected before anything
    /// is sent.
    pub async fn create_memo_from_file(
        &self,
        path: impl AsRef<Path>,
        memo_data: Option<&MemoFileData>,
    ) -> SkaldResult<CreateMemoResponse> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(SkaldError::InvalidArgument(format!(
                "{} is not a file",
                path.display()
            )));
        }
        if metadata.len() > MAX_UPLOAD_BYTES {
            return Err(SkaldError::FileTooLarge {
                size: metadata.len(),
                limit: MAX_UPLOAD_BYTES,
            });
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                SkaldError::InvalidArgument(format!("{} has no file name", path.display()))
            })?;
        let content = tokio::fs::read(path).await?;
        tracing::debug!(file = %file_name, size = content.len(), "Uploading memo file");

        let mut fields = vec![MultipartField::File {
            name: "file".to_string(),
            file_name,
            content: Bytes::from(content),
        }];
        if let Some(data) = memo_data {
            let value = serde_json::to_string(data)
                .map_err(|e| SkaldError::RequestConstruction(e.to_string()))?;
            fields.push(MultipartField::Text {
                name: "memo_data".to_string(),
                value,
            });
        }

        let request = self
            .request(Method::Post, self.url(UPLOAD_PATH, &[]))
            .with_body(RequestBody::Multipart(fields));
        self.execute_json(request).await
    }

    /// Fetch a memo by UUID or reference id.
    pub async fn get_memo(&self, memo_id: &str, id_type: IdType) -> SkaldResult<Memo> {
        let url = self.memo_url(memo_id, "", id_type)?;
        self.execute_json(self.request(Method::Get, url)).await
    }

    /// List memos, one page at a time.
    pub async fn list_memos(
        &self,
        params: Option<ListMemosParams>,
    ) -> SkaldResult<ListMemosResponse> {
        let query = params.map(|p| p.query()).unwrap_or_default();
        let url = self.url(MEMO_PATH, &query);
        self.execute_json(self.request(Method::Get, url)).await
    }

    /// Update fields of an existing memo. Changing `content` triggers
    /// reprocessing on the server.
    pub async fn update_memo(
        &self,
        memo_id: &str,
        update: UpdateMemoData,
        id_type: IdType,
    ) -> SkaldResult<UpdateMemoResponse> {
        let url = self.memo_url(memo_id, "", id_type)?;
        let request = self.json_request(Method::Patch, url, &update)?;
        self.execute_json(request).await
    }

    /// Delete a memo and everything derived from it.
    pub async fn delete_memo(&self, memo_id: &str, id_type: IdType) -> SkaldResult<()> {
        let url = self.memo_url(memo_id, "", id_type)?;
        self.execute(self.request(Method::Delete, url)).await?;
        Ok(())
    }

    /// Current processing status of a memo.
    pub async fn check_memo_status(
        &self,
        memo_id: &str,
        id_type: IdType,
    ) -> SkaldResult<MemoStatusResponse> {
        let url = self.memo_url(memo_id, "/status", id_type)?;
        self.execute_json(self.request(Method::Get, url)).await
    }

    /// Poll a memo's status until it is processed.
    ///
    /// Returns [`SkaldError::MemoProcessingFailed`] if processing ends in
    /// `error`, and [`SkaldError::Cancelled`] if `cancel` fires first.
    pub async fn wait_for_memo_ready(
        &self,
        memo_id: &str,
        id_type: IdType,
        poll_interval: Duration,
        cancel: &CancellationToken,
    ) -> SkaldResult<()> {
        loop {
            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SkaldError::Cancelled),
                status = self.check_memo_status(memo_id, id_type) => status?,
            };

            match status.status {
                MemoStatus::Processed => return Ok(()),
                MemoStatus::Error => {
                    return Err(SkaldError::MemoProcessingFailed {
                        reason: status.error_reason,
                    })
                }
                MemoStatus::Processing => {
                    tracing::debug!(memo_id, "Memo still processing");
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SkaldError::Cancelled),
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }
    }

    // ---- search, chat, generate -------------------------------------------

    /// Search memos.
    pub async fn search(&self, search: SearchRequest) -> SkaldResult<SearchResponse> {
        let request = self.json_request(Method::Post, self.url(SEARCH_PATH, &[]), &search)?;
        self.execute_json(request).await
    }

    /// Ask a question over the knowledge base and wait for the full answer.
    pub async fn chat(&self, params: ChatParams) -> SkaldResult<ChatResponse> {
        let request = self.json_request(
            Method::Post,
            self.url(CHAT_PATH, &[]),
            &params.envelope(false),
        )?;
        self.execute_json(request).await
    }

    /// Ask a question and receive the answer as it is generated.
    ///
    /// Never fails synchronously: every failure, including a request that
    /// could not be built, is reported by the returned stream.
    pub fn streamed_chat(&self, params: ChatParams, cancel: &CancellationToken) -> EventStream {
        let request = self.json_request(
            Method::Post,
            self.url(CHAT_PATH, &[]),
            &params.envelope(true),
        );
        spawn_stream(Arc::clone(&self.transport), request, cancel)
    }

    /// Generate a document from the knowledge base.
    pub async fn generate_doc(&self, params: GenerateParams) -> SkaldResult<GenerateDocResponse> {
        let request = self.json_request(
            Method::Post,
            self.url(GENERATE_PATH, &[]),
            &params.envelope(false),
        )?;
        self.execute_json(request).await
    }

    /// Generate a document and receive it as it is written.
    pub fn streamed_generate_doc(
        &self,
        params: GenerateParams,
        cancel: &CancellationToken,
    ) -> EventStream {
        let request = self.json_request(
            Method::Post,
            self.url(GENERATE_PATH, &[]),
            &params.envelope(true),
        );
        spawn_stream(Arc::clone(&self.transport), request, cancel)
    }

    // ---- plumbing ----------------------------------------------------------

    fn url(&self, path: &str, query: &[(&str, String)]) -> String {
        let mut url = format!("{}{}", self.config.base_url, path);
        if !query.is_empty() {
            let encoded: Vec<String> = query
                .iter()
                .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
                .collect();
            url.push('?');
            url.push_str(&encoded.join("&"));
        }
        url
    }

    fn memo_url(&self, memo_id: &str, suffix: &str, id_type: IdType) -> SkaldResult<String> {
        if memo_id.is_empty() {
            return Err(SkaldError::InvalidArgument(
                "memo id must not be empty".to_string(),
            ));
        }
        let path = format!("{}/{}{}", MEMO_PATH, urlencoding::encode(memo_id), suffix);
        // The server assumes memo_uuid when id_type is absent
        let query = match id_type {
            IdType::MemoUuid => Vec::new(),
            IdType::ReferenceId => vec![("id_type", id_type.as_str().to_string())],
        };
        Ok(self.url(&path, &query))
    }

    fn request(&self, method: Method, url: String) -> HttpRequest {
        HttpRequest::new(method, url).with_header("Authorization", self.config.bearer())
    }

    fn json_request<T: Serialize + ?Sized>(
        &self,
        method: Method,
        url: String,
        body: &T,
    ) -> SkaldResult<HttpRequest> {
        let body = serde_json::to_vec(body)
            .map_err(|e| SkaldError::RequestConstruction(e.to_string()))?;
        Ok(self
            .request(method, url)
            .with_header("Content-Type", "application/json")
            .with_body(RequestBody::Json(Bytes::from(body))))
    }

    async fn execute(&self, request: HttpRequest) -> SkaldResult<HttpResponse> {
        tracing::debug!(method = %request.method, url = %request.url, "Sending request");
        let response = self.transport.send(request).await?;
        check_response(response).await
    }

    async fn execute_json<T: DeserializeOwned>(&self, request: HttpRequest) -> SkaldResult<T> {
        let body = self.execute(request).await?.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| SkaldError::Decode(e.to_string()))
    }
}

impl std::fmt::Debug for SkaldClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkaldClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Pass 2xx responses through; turn anything else into an [`ApiError`]
/// carrying the full response body.
pub(crate) async fn check_response(response: HttpResponse) -> SkaldResult<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }

    let status = response.status;
    let message = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(status, error = %e, "Failed to read error response body");
            String::new()
        }
    };
    tracing::debug!(status, "API returned error status");
    Err(ApiError::new(status, message).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use serde_json::json;

    const BASE: &str = "http://skald.test";

    fn client(mock: &MockHttpClient) -> SkaldClient {
        SkaldClient::with_transport(
            ClientConfig::new("test-key").with_base_url(BASE),
            Arc::new(mock.clone()),
        )
    }

    #[test]
    fn test_url_with_query() {
        let client = client(&MockHttpClient::new());
        assert_eq!(
            client.url("/api/v1/memo", &[("page", "1".to_string())]),
            "http://skald.test/api/v1/memo?page=1"
        );
        assert_eq!(client.url("/x", &[]), "http://skald.test/x");
    }

    #[test]
    fn test_memo_url_escapes_id() {
        let client = client(&MockHttpClient::new());
        assert_eq!(
            client
                .memo_url("doc/1 a", "/status", IdType::ReferenceId)
                .unwrap(),
            "http://skald.test/api/v1/memo/doc%2F1%20a/status?id_type=reference_id"
        );
        assert_eq!(
            client.memo_url("abc", "", IdType::MemoUuid).unwrap(),
            "http://skald.test/api/v1/memo/abc"
        );
    }

    #[test]
    fn test_empty_memo_id_rejected() {
        let client = client(&MockHttpClient::new());
        assert!(matches!(
            client.memo_url("", "", IdType::MemoUuid),
            Err(SkaldError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_json_request_headers() {
        let client = client(&MockHttpClient::new());
        let request = client
            .json_request(Method::Post, "http://skald.test/x".to_string(), &json!({"a": 1}))
            .unwrap();
        assert_eq!(request.headers["Authorization"], "Bearer test-key");
        assert_eq!(request.headers["Content-Type"], "application/json");
        assert_eq!(
            request.body,
            Some(RequestBody::Json(Bytes::from_static(b"{\"a\":1}")))
        );
    }

    #[test]
    fn test_plain_request_has_no_content_type() {
        let client = client(&MockHttpClient::new());
        let request = client.request(Method::Get, "http://skald.test/x".to_string());
        assert!(!request.headers.contains_key("Content-Type"));
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn test_check_response_maps_status() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://skald.test/api/v1/memo/missing",
            MockResponse::Status(404, Bytes::from_static(b"{\"error\":\"Not found\"}")),
        );
        let err = client(&mock)
            .get_memo("missing", IdType::MemoUuid)
            .await
            .unwrap_err();

        let api = err.as_api_error().unwrap();
        assert!(api.is_not_found());
        assert_eq!(api.message, "{\"error\":\"Not found\"}");
    }

    #[tokio::test]
    async fn test_decode_error() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Status(200, Bytes::from_static(b"<html>")));
        let err = client(&mock)
            .search(SearchRequest::new("q"))
            .await
            .unwrap_err();
        assert!(matches!(err, SkaldError::Decode(_)));
    }

    #[tokio::test]
    async fn test_wait_for_memo_ready_cancelled() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::json(json!({"status": "processing"})));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client(&mock)
            .wait_for_memo_ready("m", IdType::MemoUuid, Duration::from_millis(10), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
