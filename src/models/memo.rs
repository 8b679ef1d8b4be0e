//! Memo models for the /api/v1/memo endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::null_as_default;

/// Free-form memo metadata.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// How a memo id in a path should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdType {
    /// The server-assigned memo UUID
    #[default]
    MemoUuid,
    /// The caller-supplied reference id
    ReferenceId,
}

impl IdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdType::MemoUuid => "memo_uuid",
            IdType::ReferenceId => "reference_id",
        }
    }
}

/// Data for creating a new text memo.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MemoData {
    pub title: String,
    pub content: String,
    /// Always sent; an empty object when nothing was set
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
}

impl MemoData {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_reference_id(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_expiration_date(mut self, expiration_date: DateTime<Utc>) -> Self {
        self.expiration_date = Some(expiration_date);
        self
    }
}

/// Optional data accompanying a file upload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MemoFileData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Response from creating a memo (text or file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMemoResponse {
    pub memo_uuid: Uuid,
}

/// Fields that can be changed on an existing memo. Unset fields are left alone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateMemoData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_reference_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Response from updating a memo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateMemoResponse {
    pub memo_uuid: Uuid,
}

/// A tag attached to a memo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoTag {
    pub uuid: String,
    pub tag: String,
}

/// A content chunk used for semantic search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoChunk {
    pub uuid: String,
    pub chunk_content: String,
    pub chunk_index: u32,
}

/// A complete memo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memo {
    pub uuid: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_length: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub memo_type: String,
    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub archived: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pending: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<MemoTag>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chunks: Vec<MemoChunk>,
}

/// A memo as it appears in list results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoListItem {
    pub uuid: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_length: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,
    #[serde(default)]
    pub client_reference_id: Option<String>,
}

/// Page selection for listing memos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListMemosParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl ListMemosParams {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// Query pairs for the parameters that are set.
    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            query.push(("page_size", page_size.to_string()));
        }
        query
    }
}

/// One page of memos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListMemosResponse {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<MemoListItem>,
}

/// Processing status of a memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoStatus {
    Processing,
    Processed,
    Error,
}

/// Response from the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoStatusResponse {
    pub status: MemoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}
