//! Reqwest-based HTTP client adapter.
//!
//! This module provides the production transport, implementing the
//! [`HttpClient`] trait from `crate::traits` on top of `reqwest`.

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::traits::{
    Headers, HttpClient, HttpError, HttpRequest, HttpResponse, Method, MultipartField,
    RequestBody,
};

/// HTTP client implementation using reqwest.
///
/// Cloning is cheap; clones share reqwest's connection pool.
///
/// # Example
///
/// ```ignore
/// use skald::adapters::ReqwestHttpClient;
/// use skald::traits::{HttpClient, HttpRequest, Method};
///
/// let client = ReqwestHttpClient::new();
/// let response = client.send(HttpRequest::new(Method::Get, "https://api.useskald.com")).await?;
/// println!("Status: {}", response.status);
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a new ReqwestHttpClient with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a new ReqwestHttpClient with a custom reqwest::Client.
    ///
    /// This allows for advanced configuration like custom timeouts,
    /// connection pools, or TLS settings.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying reqwest::Client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Convert reqwest error to HttpError.
    fn convert_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else if err.is_connect() {
            HttpError::ConnectionFailed(err.to_string())
        } else if err.is_builder() {
            HttpError::InvalidUrl(err.to_string())
        } else {
            HttpError::Other(err.to_string())
        }
    }

    /// Convert a body read error. Anything that is not a timeout is an I/O failure.
    fn convert_body_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else {
            HttpError::Io(err.to_string())
        }
    }

    /// Convert reqwest headers to our Headers type.
    fn convert_headers(headers: &reqwest::header::HeaderMap) -> Headers {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    /// Apply headers to a request builder.
    fn apply_headers(
        builder: reqwest::RequestBuilder,
        headers: &Headers,
    ) -> reqwest::RequestBuilder {
        let mut builder = builder;
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder
    }

    /// Build a multipart form from transport-neutral fields.
    fn build_form(fields: Vec<MultipartField>) -> reqwest::multipart::Form {
        fields
            .into_iter()
            .fold(reqwest::multipart::Form::new(), |form, field| match field {
                MultipartField::Text { name, value } => form.text(name, value),
                MultipartField::File {
                    name,
                    file_name,
                    content,
                } => form.part(
                    name,
                    reqwest::multipart::Part::bytes(content.to_vec()).file_name(file_name),
                ),
            })
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let builder = self
            .client
            .request(Self::method(request.method), &request.url);
        let builder = Self::apply_headers(builder, &request.headers);
        let builder = match request.body {
            Some(RequestBody::Json(bytes)) => builder.body(bytes),
            // reqwest sets the multipart Content-Type with its own boundary
            Some(RequestBody::Multipart(fields)) => builder.multipart(Self::build_form(fields)),
            None => builder,
        };

        let response = builder.send().await.map_err(Self::convert_error)?;

        let status = response.status().as_u16();
        let headers = Self::convert_headers(response.headers());
        let body = response
            .bytes_stream()
            .map(|result| result.map_err(Self::convert_body_error));

        Ok(HttpResponse::new(status, headers, Box::pin(body)))
    }
}
