//! Chat and document generation models.
//!
//! `ChatParams` / `GenerateParams` are what callers build. The request
//! envelopes that actually go on the wire borrow from them and add the
//! `stream` flag, which the client sets based on the method called.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::null_as_default;
use super::search::Filter;

/// LLM provider used for answer generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Openai,
    Anthropic,
    Groq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRewriteConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorSearchConfig {
    #[serde(rename = "topK")]
    pub top_k: u32,
    #[serde(rename = "similarityThreshold")]
    pub similarity_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerankingConfig {
    pub enabled: bool,
    #[serde(rename = "topK")]
    pub top_k: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencesConfig {
    pub enabled: bool,
}

/// Retrieval-augmented generation settings. Unset sections use server defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<LlmProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_rewrite: Option<QueryRewriteConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_search: Option<VectorSearchConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reranking: Option<RerankingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<ReferencesConfig>,
}

impl RagConfig {
    /// Config that only turns on citation references.
    pub fn with_references() -> Self {
        Self {
            references: Some(ReferencesConfig { enabled: true }),
            ..Default::default()
        }
    }
}

/// Source memo behind a citation marker such as `[[1]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoReference {
    pub memo_uuid: String,
    pub memo_title: String,
}

/// Citation number (as a string) to source memo.
pub type References = BTreeMap<String, MemoReference>;

/// Parameters for a chat query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatParams {
    pub query: String,
    pub filters: Vec<Filter>,
    pub system_prompt: Option<String>,
    /// Continue an earlier conversation
    pub chat_id: Option<String>,
    pub rag_config: Option<RagConfig>,
}

impl ChatParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }

    pub fn with_rag_config(mut self, rag_config: RagConfig) -> Self {
        self.rag_config = Some(rag_config);
        self
    }

    pub(crate) fn envelope(&self, stream: bool) -> ChatRequest<'_> {
        ChatRequest {
            query: &self.query,
            stream,
            system_prompt: self.system_prompt.as_deref(),
            filters: &self.filters,
            chat_id: self.chat_id.as_deref(),
            rag_config: self.rag_config.as_ref(),
        }
    }
}

/// Wire body for `POST /api/v1/chat`.
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    query: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "<[Filter]>::is_empty")]
    filters: &'a [Filter],
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rag_config: Option<&'a RagConfig>,
}

/// Response from a non-streaming chat query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ok: bool,
    pub response: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub intermediate_steps: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "References::is_empty"
    )]
    pub references: References,
}

/// Parameters for document generation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerateParams {
    pub prompt: String,
    /// Style or structure rules for the generated document
    pub rules: Option<String>,
    pub filters: Vec<Filter>,
    pub rag_config: Option<RagConfig>,
}

impl GenerateParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_rules(mut self, rules: impl Into<String>) -> Self {
        self.rules = Some(rules.into());
        self
    }

    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_rag_config(mut self, rag_config: RagConfig) -> Self {
        self.rag_config = Some(rag_config);
        self
    }

    pub(crate) fn envelope(&self, stream: bool) -> GenerateRequest<'_> {
        GenerateRequest {
            prompt: &self.prompt,
            rules: self.rules.as_deref(),
            filters: &self.filters,
            rag_config: self.rag_config.as_ref(),
            stream,
        }
    }
}

/// Wire body for `POST /api/v1/generate`.
#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rules: Option<&'a str>,
    #[serde(skip_serializing_if = "<[Filter]>::is_empty")]
    filters: &'a [Filter],
    #[serde(skip_serializing_if = "Option::is_none")]
    rag_config: Option<&'a RagConfig>,
    stream: bool,
}

/// Response from non-streaming document generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateDocResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ok: bool,
    pub response: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub intermediate_steps: Vec<serde_json::Value>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "References::is_empty"
    )]
    pub references: References,
}
