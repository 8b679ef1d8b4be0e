//! Mock implementations for testing.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP transport with scripted responses and body release tracking

pub mod http;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
