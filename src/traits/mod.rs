//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - the HTTP transport every Skald call goes through

pub mod http;

pub use http::{
    BodyStream, Headers, HttpClient, HttpError, HttpRequest, HttpResponse, Method,
    MultipartField, RequestBody,
};
