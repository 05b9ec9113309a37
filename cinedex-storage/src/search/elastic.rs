//! Elasticsearch search backend over the REST API.

use std::time::Duration;

use async_trait::async_trait;
use cinedex_core::{BackendError, EntityId, EntityKind};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use super::query_builder::BackendQuery;
use super::traits::{decode_source, SearchBackend, SourceDocument};

/// Connection settings for [`ElasticsearchBackend`].
#[derive(Clone)]
pub struct ElasticsearchConfig {
    /// Base URL of the cluster, e.g. `http://localhost:9200`.
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Timeout for a whole request, connection included.
    pub timeout: Duration,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            username: None,
            password: None,
            timeout: Duration::from_secs(5),
        }
    }
}

impl std::fmt::Debug for ElasticsearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// [`SearchBackend`] talking to an Elasticsearch cluster.
pub struct ElasticsearchBackend {
    client: Client,
    base_url: String,
    credentials: Option<(String, Option<String>)>,
}

impl ElasticsearchBackend {
    pub fn new(config: ElasticsearchConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Unavailable {
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            credentials: config.username.map(|user| (user, config.password)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the cluster answers at all.
    pub async fn ping(&self) -> Result<(), BackendError> {
        let url = format!("{}/", self.base_url);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| transport_failure(&url, e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(BackendError::Unavailable {
                reason: format!("{} returned {}", url, status),
            })
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((user, password)) => request.basic_auth(user, password.as_ref()),
            None => request,
        }
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<(StatusCode, Value), BackendError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| transport_failure(url, e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_failure(url, e))?;

        // Error responses from proxies in front of the cluster may not be
        // JSON; keep the status and an empty body in that case.
        let body = match serde_json::from_slice::<Value>(&bytes) {
            Ok(body) => body,
            Err(_) if !status.is_success() => Value::Null,
            Err(e) => {
                return Err(BackendError::MalformedResponse {
                    index: url.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        Ok((status, body))
    }
}

impl std::fmt::Debug for ElasticsearchBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchBackend")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.credentials.is_some())
            .finish()
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    async fn fetch_by_id<T: SourceDocument>(
        &self,
        kind: EntityKind,
        index: &str,
        id: EntityId,
        fields: &[&str],
    ) -> Result<T, BackendError> {
        let url = format!("{}/{}/_doc/{}", self.base_url, index, id);
        let mut request = self.client.get(&url);
        if !fields.is_empty() {
            request = request.query(&[("_source_includes", fields.join(","))]);
        }

        let (status, body) = self.send(&url, request).await?;
        let source = document_source(kind, index, id, status, body)?;
        decode_source(index, source)
    }

    async fn search<T: SourceDocument>(&self, query: &BackendQuery) -> Result<Vec<T>, BackendError> {
        let url = format!("{}/{}/_search", self.base_url, query.index);
        let request = self.client.post(&url).json(&query.to_body());

        let (status, body) = self.send(&url, request).await?;
        if !status.is_success() {
            return Err(classify_failure(&query.index, status, &body));
        }

        extract_hits(&query.index, body)?
            .into_iter()
            .map(|source| decode_source(&query.index, source))
            .collect()
    }
}

fn not_found(kind: EntityKind, id: EntityId) -> BackendError {
    BackendError::NotFound {
        kind,
        id: id.to_string(),
    }
}

fn transport_failure(url: &str, error: reqwest::Error) -> BackendError {
    BackendError::Unavailable {
        reason: format!("request to {} failed: {}", url, error),
    }
}

/// Pull `_source` out of a `_doc` response.
///
/// Only an explicit `"found": false` means the document is absent. Any
/// other 404 (missing index, a proxy, a wrong base path) is a failure.
fn document_source(
    kind: EntityKind,
    index: &str,
    id: EntityId,
    status: StatusCode,
    mut body: Value,
) -> Result<Value, BackendError> {
    if body.get("found").and_then(Value::as_bool) == Some(false) {
        return Err(not_found(kind, id));
    }
    if !status.is_success() {
        return Err(classify_failure(index, status, &body));
    }
    body.get_mut("_source")
        .map(Value::take)
        .ok_or_else(|| BackendError::MalformedResponse {
            index: index.to_string(),
            reason: "document has no _source".to_string(),
        })
}

fn error_type(body: &Value) -> Option<&str> {
    body.pointer("/error/type").and_then(Value::as_str)
}

fn is_index_missing(body: &Value) -> bool {
    error_type(body) == Some("index_not_found_exception")
}

/// Map a non-success response to a backend error.
fn classify_failure(index: &str, status: StatusCode, body: &Value) -> BackendError {
    if is_index_missing(body) {
        return BackendError::IndexMissing {
            index: index.to_string(),
        };
    }

    let reason = body
        .pointer("/error/reason")
        .and_then(Value::as_str)
        .or_else(|| error_type(body))
        .unwrap_or("no error details");
    BackendError::Unavailable {
        reason: format!("index {} returned {}: {}", index, status, reason),
    }
}

/// Pull the `_source` of every hit out of a `_search` response.
fn extract_hits(index: &str, mut body: Value) -> Result<Vec<Value>, BackendError> {
    let hits = body
        .pointer_mut("/hits/hits")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| BackendError::MalformedResponse {
            index: index.to_string(),
            reason: "response has no hits.hits array".to_string(),
        })?;

    hits.iter_mut()
        .map(|hit| {
            hit.get_mut("_source")
                .map(Value::take)
                .ok_or_else(|| BackendError::MalformedResponse {
                    index: index.to_string(),
                    reason: "hit has no _source".to_string(),
                })
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
