//! SSE stream decoding for streamed chat and document generation.
//!
//! The Skald API sends newline-delimited lines:
//! - `data: <json>` - one event payload
//! - empty line - ignored
//! - lines starting with `:` - keep-alive comments (ignored)
//!
//! # Module structure
//! - `events` - [`StreamEvent`] and its [`EventKind`]
//! - `decoder` - per-line classification ([`decode_line`])
//! - `reader` - body-to-channel pump ([`StreamReader`])

mod decoder;
mod events;
mod reader;

pub use decoder::{decode_line, DecodedLine, DATA_PREFIX};
pub use events::{EventKind, StreamEvent};
pub use reader::{LineReader, StreamEnd, StreamReader, MAX_LINE_BYTES};
