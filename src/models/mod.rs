//! Request and response types for the Skald REST API.

mod chat;
mod memo;
mod search;

pub use chat::{
    ChatParams, ChatResponse, GenerateDocResponse, GenerateParams, LlmProvider, MemoReference,
    QueryRewriteConfig, RagConfig, References, ReferencesConfig, RerankingConfig,
    VectorSearchConfig,
};
pub use memo::{
    CreateMemoResponse, IdType, ListMemosParams, ListMemosResponse, Memo, MemoChunk, MemoData,
    MemoFileData, MemoListItem, MemoStatus, MemoStatusResponse, MemoTag, Metadata,
    UpdateMemoData, UpdateMemoResponse,
};
pub use search::{
    Filter, FilterOperator, FilterType, SearchMethod, SearchRequest, SearchResponse, SearchResult,
};

use serde::{Deserialize, Deserializer};

/// Deserialize an explicit `null` the same as a missing field.
///
/// Pair with `#[serde(default)]` on non-`Option` response fields.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
