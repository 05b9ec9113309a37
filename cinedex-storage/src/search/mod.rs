//! Search backend layer.
//!
//! The services describe listings as a [`QuerySpec`](cinedex_core::QuerySpec);
//! [`SearchQueryBuilder`] resolves it against a kind's profile into a
//! [`BackendQuery`], and a [`SearchBackend`] executes it.

pub mod elastic;
pub mod memory;
pub mod query_builder;
pub mod traits;

pub use elastic::{ElasticsearchBackend, ElasticsearchConfig};
pub use memory::InMemorySearchBackend;
pub use query_builder::{
    BackendQuery, Projection, QueryClause, SearchQueryBuilder, SortClause, SortOrder,
};
pub use traits::{SearchBackend, SourceDocument};
