//! Search backend trait.

use async_trait::async_trait;
use cinedex_core::{BackendError, EntityId, EntityKind};
use serde::de::DeserializeOwned;

use super::query_builder::BackendQuery;

/// Anything a search backend can decode a document source into.
pub trait SourceDocument: DeserializeOwned + Send + 'static {}

impl<T> SourceDocument for T where T: DeserializeOwned + Send + 'static {}

/// Document store answering id lookups and listing queries.
///
/// Implementations decode the stored document source into the caller's
/// record type. Errors follow one convention across backends:
///
/// - [`BackendError::NotFound`]: the index exists but holds no such id.
/// - [`BackendError::IndexMissing`]: the index itself does not exist.
/// - [`BackendError::Unavailable`]: transport failure or unexpected status.
/// - [`BackendError::MalformedResponse`]: a document did not decode.
///
/// A listing that matches nothing is `Ok(vec![])`, not an error.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Fetch one document by id, restricted to `fields` (empty means all).
    async fn fetch_by_id<T: SourceDocument>(
        &self,
        kind: EntityKind,
        index: &str,
        id: EntityId,
        fields: &[&str],
    ) -> Result<T, BackendError>;

    /// Run a listing query, returning hits in backend order.
    async fn search<T: SourceDocument>(&self, query: &BackendQuery) -> Result<Vec<T>, BackendError>;
}

/// Decode one document source, attributing failures to `index`.
pub(crate) fn decode_source<T: SourceDocument>(
    index: &str,
    source: serde_json::Value,
) -> Result<T, BackendError> {
    serde_json::from_value(source).map_err(|e| BackendError::MalformedResponse {
        index: index.to_string(),
        reason: e.to_string(),
    })
}
