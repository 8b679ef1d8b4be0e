//! Line-level decoding of the SSE subset the Skald API speaks.
//!
//! Only `data: <json>` lines carry information. Empty lines, `:` keep-alive
//! comments and any other field (`event:`, `id:`, ...) are ignored.

/// Literal prefix of a payload line, including the single space.
pub const DATA_PREFIX: &str = "data: ";

/// Result of decoding one line.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedLine {
    /// Nothing to publish
    Ignore,
    /// JSON payload of a `data:` line
    Data(serde_json::Value),
}

/// Classify a single line (without its line terminator).
///
/// Malformed JSON is not an error here: the line is logged and ignored so one
/// bad event cannot abort an otherwise healthy stream.
pub fn decode_line(line: &str) -> DecodedLine {
    if line.is_empty() || line.starts_with(':') {
        return DecodedLine::Ignore;
    }

    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return DecodedLine::Ignore;
    };

    match serde_json::from_str(payload) {
        Ok(value) => DecodedLine::Data(value),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping malformed SSE data line");
            DecodedLine::Ignore
        }
    }
}
