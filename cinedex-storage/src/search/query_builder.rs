//! Translation of a [`QuerySpec`] into a backend query.
//!
//! [`BackendQuery`] is backend-neutral: the Elasticsearch adapter renders it
//! with [`BackendQuery::to_body`], the in-memory index interprets it
//! directly.

use cinedex_core::{KindProfile, QuerySpec};
use serde_json::{json, Value};

/// Which record shape the source projection should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Full,
    Brief,
}

impl Projection {
    pub fn fields(self, profile: &KindProfile) -> &'static [&'static str] {
        match self {
            Self::Full => profile.full_fields,
            Self::Brief => profile.brief_fields,
        }
    }
}

/// Document filter.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryClause {
    /// Every document in the index.
    MatchAll,
    /// Documents whose nested collection `path` holds an element with
    /// `field == value`.
    NestedMatch {
        path: String,
        field: String,
        value: String,
    },
    /// Documents whose `field` matches any token of `text`.
    TextMatch { field: String, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    pub field: String,
    pub order: SortOrder,
}

/// A fully resolved search request against one index.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendQuery {
    pub index: String,
    pub clause: QueryClause,
    pub sort: SortClause,
    /// Records skipped before the first hit.
    pub from: u64,
    /// Maximum number of hits.
    pub size: u32,
    /// Source fields to return; empty means all.
    pub source: Vec<String>,
}

impl BackendQuery {
    /// Render as an Elasticsearch `_search` request body.
    pub fn to_body(&self) -> Value {
        let query = match &self.clause {
            QueryClause::MatchAll => json!({ "match_all": {} }),
            QueryClause::NestedMatch { path, field, value } => json!({
                "nested": {
                    "path": path,
                    "query": {
                        "bool": {
                            "must": [{ "match": { field.as_str(): value } }]
                        }
                    }
                }
            }),
            QueryClause::TextMatch { field, text } => json!({
                "match": { field.as_str(): { "query": text } }
            }),
        };

        let mut body = json!({
            "from": self.from,
            "size": self.size,
            "query": query,
            "sort": [{ self.sort.field.as_str(): { "order": self.sort.order.as_str() } }],
        });
        if !self.source.is_empty() {
            body["_source"] = json!(self.source);
        }
        body
    }
}

/// Builds [`BackendQuery`] values for a kind.
pub struct SearchQueryBuilder;

impl SearchQueryBuilder {
    /// Build the listing query for `spec`.
    ///
    /// A text term takes precedence over a related-entity filter; the two
    /// are never combined. Without a sort field the profile's default sort
    /// applies, ascending unless the query asked for descending.
    pub fn build(profile: &KindProfile, spec: &QuerySpec, projection: Projection) -> BackendQuery {
        let clause = match (spec.text_filter(), spec.related_filter()) {
            (Some(text), related) => {
                if related.is_some() {
                    tracing::debug!(
                        kind = %profile.kind,
                        "text filter overrides related filter"
                    );
                }
                QueryClause::TextMatch {
                    field: profile.text_field.to_string(),
                    text: text.to_string(),
                }
            }
            (None, Some(related)) => QueryClause::NestedMatch {
                path: profile.relation_path.to_string(),
                field: profile.relation_field.to_string(),
                value: related.to_string(),
            },
            (None, None) => QueryClause::MatchAll,
        };

        let sort = SortClause {
            field: spec
                .sort_field()
                .unwrap_or(profile.default_sort)
                .to_string(),
            order: if spec.sort_descending() {
                SortOrder::Desc
            } else {
                SortOrder::Asc
            },
        };

        BackendQuery {
            index: profile.index.clone(),
            clause,
            sort,
            from: spec.offset(),
            size: spec.page_size(),
            source: projection
                .fields(profile)
                .iter()
                .map(|field| field.to_string())
                .collect(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
