//! Search request/response models and the shared filter type.

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Comparison operator for a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Eq,
    Neq,
    /// Case-insensitive substring match
    Contains,
    /// Case-insensitive prefix match
    #[serde(rename = "startswith")]
    StartsWith,
    /// Case-insensitive suffix match
    #[serde(rename = "endswith")]
    EndsWith,
    In,
    NotIn,
}

/// Whether a filter targets a built-in memo field or custom metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    NativeField,
    CustomMetadata,
}

/// A filter condition. Passed through to the server unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub operator: FilterOperator,
    /// A string, or an array of strings for `in` / `not_in`
    pub value: serde_json::Value,
    pub filter_type: FilterType,
}

impl Filter {
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<serde_json::Value>,
        filter_type: FilterType,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            filter_type,
        }
    }

    /// Equality on a custom metadata field.
    pub fn metadata_eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            field,
            FilterOperator::Eq,
            value.into(),
            FilterType::CustomMetadata,
        )
    }

    /// Equality on a built-in memo field such as `source` or `tags`.
    pub fn native_eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Eq, value.into(), FilterType::NativeField)
    }
}

/// Search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    /// Semantic search over memo chunks
    ChunkVectorSearch,
    TitleContains,
    TitleStartswith,
}

/// Parameters for `POST /api/v1/search`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_method: Option<SearchMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_method(mut self, method: SearchMethod) -> Self {
        self.search_method = Some(method);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub memo_uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chunk_uuid: String,
    pub memo_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub memo_summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_snippet: String,
    /// Only populated for semantic search
    #[serde(default)]
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<SearchResult>,
}
