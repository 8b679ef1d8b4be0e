//! Skald - Rust client for the Skald knowledge base API
//!
//! Memo management, search, chat and document generation, including
//! streamed chat/generation over server-sent events.
//!
//! ```ignore
//! use skald::{ChatParams, ClientConfig, SkaldClient};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = SkaldClient::new(ClientConfig::from_env()?)?;
//! let cancel = CancellationToken::new();
//! let answer = client
//!     .streamed_chat(ChatParams::new("What did we ship last week?"), &cancel)
//!     .collect_text()
//!     .await?;
//! ```

pub mod adapters;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod sse;
pub mod stream;
pub mod traits;

pub use client::{SkaldClient, MAX_UPLOAD_BYTES};
pub use config::ClientConfig;
pub use error::{ApiError, SkaldError, SkaldResult};
pub use models::*;
pub use sse::{EventKind, StreamEvent};
pub use stream::{EventStream, StreamSummary};
pub use tokio_util::sync::CancellationToken;
