//! In-memory search index.
//!
//! Stores raw JSON documents per index and interprets [`BackendQuery`]
//! values the way the search engine would for the subset of the DSL the
//! services emit. Used by tests and local runs without Elasticsearch.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use cinedex_core::{BackendError, EntityId, EntityKind};
use serde_json::{Map, Value};
use tokio::sync::Barrier;

use super::query_builder::{BackendQuery, QueryClause, SortOrder};
use super::traits::{decode_source, SearchBackend, SourceDocument};

/// In-memory [`SearchBackend`].
///
/// A missing index and an empty index behave differently, as they do
/// against a real cluster: the former fails with
/// [`BackendError::IndexMissing`], the latter returns no hits.
pub struct InMemorySearchBackend {
    indices: RwLock<HashMap<String, Vec<Value>>>,
    available: AtomicBool,
    calls: AtomicU64,
    gate: RwLock<Option<Arc<Barrier>>>,
}

impl Default for InMemorySearchBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySearchBackend {
    pub fn new() -> Self {
        Self {
            indices: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            calls: AtomicU64::new(0),
            gate: RwLock::new(None),
        }
    }

    /// Create an empty index if it does not exist.
    pub fn create_index(&self, index: &str) {
        if let Ok(mut indices) = self.indices.write() {
            indices.entry(index.to_string()).or_default();
        }
    }

    /// Remove an index and all its documents.
    pub fn drop_index(&self, index: &str) {
        if let Ok(mut indices) = self.indices.write() {
            indices.remove(index);
        }
    }

    /// Add a document, creating the index on first use.
    ///
    /// A document whose `id` matches an existing one replaces it.
    pub fn insert(&self, index: &str, document: Value) {
        if let Ok(mut indices) = self.indices.write() {
            let documents = indices.entry(index.to_string()).or_default();
            let id = document_id(&document).map(str::to_string);
            match documents
                .iter_mut()
                .find(|existing| id.is_some() && document_id(existing) == id.as_deref())
            {
                Some(existing) => *existing = document,
                None => documents.push(document),
            }
        }
    }

    /// Serialize `record` with its plain `id` field and insert it.
    pub fn insert_record<T: serde::Serialize>(&self, index: &str, record: &T) {
        match serde_json::to_value(record) {
            Ok(mut document) => {
                rename_uuid_to_id(&mut document);
                self.insert(index, document);
            }
            Err(e) => tracing::warn!(index, error = %e, "record not indexable"),
        }
    }

    /// Simulate a cluster outage.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Hold every call until `parties` calls are waiting, then release
    /// them together. Lets tests force overlapping requests.
    pub fn set_gate(&self, parties: usize) {
        if let Ok(mut gate) = self.gate.write() {
            *gate = Some(Arc::new(Barrier::new(parties)));
        }
    }

    pub fn clear_gate(&self) {
        if let Ok(mut gate) = self.gate.write() {
            *gate = None;
        }
    }

    /// Number of fetch and search calls received.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn document_count(&self, index: &str) -> usize {
        self.indices
            .read()
            .ok()
            .and_then(|indices| indices.get(index).map(Vec::len))
            .unwrap_or(0)
    }

    async fn begin_call(&self) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.read().ok().and_then(|gate| gate.clone());
        if let Some(barrier) = gate {
            barrier.wait().await;
        }
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable {
                reason: "in-memory index is unavailable".to_string(),
            })
        }
    }

    fn snapshot(&self, index: &str) -> Result<Vec<Value>, BackendError> {
        let indices = self.indices.read().map_err(|_| BackendError::Unavailable {
            reason: "index lock poisoned".to_string(),
        })?;
        indices
            .get(index)
            .cloned()
            .ok_or_else(|| BackendError::IndexMissing {
                index: index.to_string(),
            })
    }
}

#[async_trait]
impl SearchBackend for InMemorySearchBackend {
    async fn fetch_by_id<T: SourceDocument>(
        &self,
        kind: EntityKind,
        index: &str,
        id: EntityId,
        fields: &[&str],
    ) -> Result<T, BackendError> {
        self.begin_call().await?;
        let wanted = id.to_string();
        let document = self
            .snapshot(index)?
            .into_iter()
            .find(|document| document_id(document) == Some(wanted.as_str()))
            .ok_or(BackendError::NotFound { kind, id: wanted })?;

        decode_source(index, project(document, fields))
    }

    async fn search<T: SourceDocument>(&self, query: &BackendQuery) -> Result<Vec<T>, BackendError> {
        self.begin_call().await?;
        let mut hits: Vec<Value> = self
            .snapshot(&query.index)?
            .into_iter()
            .filter(|document| matches_clause(&query.clause, document))
            .collect();

        let sort_path = query
            .sort
            .field
            .strip_suffix(".raw")
            .unwrap_or(&query.sort.field);
        hits.sort_by(|a, b| compare_for_sort(lookup(a, sort_path), lookup(b, sort_path), query.sort.order));

        let fields: Vec<&str> = query.source.iter().map(String::as_str).collect();
        let skip = usize::try_from(query.from).unwrap_or(usize::MAX);
        hits.into_iter()
            .skip(skip)
            .take(query.size as usize)
            .map(|document| decode_source(&query.index, project(document, &fields)))
            .collect()
    }
}

fn document_id(document: &Value) -> Option<&str> {
    document.get("id").and_then(Value::as_str)
}

fn rename_uuid_to_id(document: &mut Value) {
    if let Some(object) = document.as_object_mut() {
        if let Some(id) = object.remove("uuid") {
            object.insert("id".to_string(), id);
        }
    }
}

/// Follow a dotted path through nested objects.
fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.get(segment))
        .filter(|value| !value.is_null())
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn matches_clause(clause: &QueryClause, document: &Value) -> bool {
    match clause {
        QueryClause::MatchAll => true,
        QueryClause::NestedMatch { path, field, value } => {
            let inner = field
                .strip_prefix(path.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                .unwrap_or(field);
            lookup(document, path)
                .and_then(Value::as_array)
                .is_some_and(|elements| {
                    elements.iter().any(|element| {
                        lookup(element, inner).and_then(Value::as_str) == Some(value.as_str())
                    })
                })
        }
        QueryClause::TextMatch { field, text } => {
            let Some(haystack) = lookup(document, field).and_then(Value::as_str) else {
                return false;
            };
            let wanted: Vec<String> = tokens(text).collect();
            tokens(haystack).any(|token| wanted.contains(&token))
        }
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: &Value, b: &Value) -> CmpOrdering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(CmpOrdering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Missing sort values go last in both directions.
fn compare_for_sort(a: Option<&Value>, b: Option<&Value>, order: SortOrder) -> CmpOrdering {
    match (a, b) {
        (None, None) => CmpOrdering::Equal,
        (None, Some(_)) => CmpOrdering::Greater,
        (Some(_), None) => CmpOrdering::Less,
        (Some(x), Some(y)) => match order {
            SortOrder::Asc => compare_values(x, y),
            SortOrder::Desc => compare_values(y, x),
        },
    }
}

/// Keep only the top-level `fields` of a document; empty keeps everything.
fn project(document: Value, fields: &[&str]) -> Value {
    if fields.is_empty() {
        return document;
    }
    match document {
        Value::Object(object) => Value::Object(
            object
                .into_iter()
                .filter(|(key, _)| fields.contains(&key.as_str()))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::query_builder::{Projection, SearchQueryBuilder};
    use cinedex_core::{Film, FilmBrief, GenreBrief, QuerySpec};
    use serde_json::json;
    use uuid::Uuid;

    const WESTERN: &str = "0b105f87-e0a5-45dc-8ce7-f8632088f390";
    const SOME_FILM: &str = "bb74a838-584e-11ec-9885-c13c488d29c0";

    fn seeded() -> InMemorySearchBackend {
        let backend = InMemorySearchBackend::new();
        backend.insert(
            "movies",
            json!({
                "id": SOME_FILM,
                "title": "Some film",
                "imdb_rating": 5.5,
                "description": "A film about something",
                "genres": [{ "id": WESTERN, "name": "Western" }],
                "actors": [],
                "writers": []
            }),
        );
        backend.insert(
            "movies",
            json!({
                "id": "3d8d9bf5-0d90-4353-88ba-4ccc5d2c07ff",
                "title": "Another story",
                "imdb_rating": 8.1,
                "genres": []
            }),
        );
        backend.insert(
            "movies",
            json!({
                "id": "5a7a3f4e-3b42-4a9e-8c3b-8a2f0a0b0c0d",
                "title": "Unrated film",
                "genres": [{ "id": WESTERN, "name": "Western" }]
            }),
        );
        backend
    }

    fn id(raw: &str) -> EntityId {
        EntityId::new(Uuid::parse_str(raw).unwrap())
    }

    #[tokio::test]
    async fn test_fetch_by_id_projects_fields() {
        let backend = seeded();
        let profile = EntityKind::Movie.profile();
        let film: Film = backend
            .fetch_by_id(EntityKind::Movie, "movies", id(SOME_FILM), profile.full_fields)
            .await
            .unwrap();
        assert_eq!(film.title, "Some film");
        assert_eq!(film.imdb_rating, Some(5.5));
        assert_eq!(film.genres.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_unknown_id_is_not_found() {
        let backend = seeded();
        let err = backend
            .fetch_by_id::<Film>(EntityKind::Movie, "movies", EntityId::new_random(), &[])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_missing_index_vs_empty_index() {
        let backend = InMemorySearchBackend::new();
        let query = SearchQueryBuilder::build(
            &EntityKind::Genre.profile(),
            &QuerySpec::default(),
            Projection::Brief,
        );

        let err = backend.search::<GenreBrief>(&query).await.unwrap_err();
        assert_eq!(
            err,
            BackendError::IndexMissing {
                index: "genres".to_string()
            }
        );

        backend.create_index("genres");
        let hits: Vec<GenreBrief> = backend.search(&query).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_nested_filter_and_sort_with_missing_values_last() {
        let backend = seeded();
        let spec = QuerySpec::builder()
            .related(id(WESTERN))
            .sort("-imdb_rating")
            .build()
            .unwrap();
        let query = SearchQueryBuilder::build(&EntityKind::Movie.profile(), &spec, Projection::Brief);

        let hits: Vec<FilmBrief> = backend.search(&query).await.unwrap();
        let titles: Vec<&str> = hits.iter().map(|film| film.title.as_str()).collect();
        assert_eq!(titles, vec!["Some film", "Unrated film"]);
    }

    #[tokio::test]
    async fn test_text_match_is_token_based() {
        let backend = seeded();
        let spec = QuerySpec::builder().text("FILM").build().unwrap();
        let query = SearchQueryBuilder::build(&EntityKind::Movie.profile(), &spec, Projection::Brief);

        let hits: Vec<FilmBrief> = backend.search(&query).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_pagination() {
        let backend = seeded();
        let spec = QuerySpec::builder()
            .sort("title")
            .page_number(2)
            .page_size(2)
            .build()
            .unwrap();
        let query = SearchQueryBuilder::build(&EntityKind::Movie.profile(), &spec, Projection::Brief);

        let hits: Vec<FilmBrief> = backend.search(&query).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Unrated film");
    }

    #[tokio::test]
    async fn test_raw_suffix_sorts_on_base_field() {
        let backend = InMemorySearchBackend::new();
        backend.insert("persons", json!({ "id": Uuid::new_v4().to_string(), "full_name": "Zed" }));
        backend.insert("persons", json!({ "id": Uuid::new_v4().to_string(), "full_name": "Ann" }));

        let query = SearchQueryBuilder::build(
            &EntityKind::Person.profile(),
            &QuerySpec::default(),
            Projection::Brief,
        );
        let hits: Vec<Value> = backend.search(&query).await.unwrap();
        assert_eq!(hits[0]["full_name"], "Ann");
        assert_eq!(hits[1]["full_name"], "Zed");
    }

    #[tokio::test]
    async fn test_unavailable_backend() {
        let backend = seeded();
        backend.set_available(false);
        let err = backend
            .fetch_by_id::<Film>(EntityKind::Movie, "movies", id(SOME_FILM), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unavailable { .. }));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_gate_releases_calls_together() {
        let backend = seeded();
        backend.set_gate(2);
        let query = SearchQueryBuilder::build(
            &EntityKind::Movie.profile(),
            &QuerySpec::default(),
            Projection::Brief,
        );

        let (a, b) = tokio::join!(
            backend.search::<FilmBrief>(&query),
            backend.fetch_by_id::<Film>(EntityKind::Movie, "movies", id(SOME_FILM), &[]),
        );
        assert_eq!(a.unwrap().len(), 3);
        assert_eq!(b.unwrap().title, "Some film");
        assert_eq!(backend.call_count(), 2);

        backend.clear_gate();
        backend.search::<FilmBrief>(&query).await.unwrap();
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_undecodable_document_is_malformed() {
        let backend = InMemorySearchBackend::new();
        backend.insert("movies", json!({ "id": SOME_FILM, "title": 42 }));
        let err = backend
            .fetch_by_id::<Film>(EntityKind::Movie, "movies", id(SOME_FILM), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::MalformedResponse { .. }));
    }

    #[test]
    fn test_insert_record_uses_plain_id() {
        let backend = InMemorySearchBackend::new();
        let film = Film {
            id: id(SOME_FILM),
            title: "Some film".to_string(),
            imdb_rating: Some(5.5),
            description: None,
            genres: Vec::new(),
            actors: Vec::new(),
            writers: Vec::new(),
        };
        backend.insert_record("movies", &film);
        backend.insert_record("movies", &film);
        assert_eq!(backend.document_count("movies"), 1);
    }
}
