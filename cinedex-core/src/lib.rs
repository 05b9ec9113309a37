//! cinedex Core - Catalog Types
//!
//! Pure data structures shared by the storage and service crates: entity
//! kinds and their index profiles, record shapes, listing query specs, and
//! the error taxonomy. No IO lives here.

pub mod entities;
pub mod error;
pub mod kind;
pub mod query;

pub use entities::{
    BriefRecord, CatalogEntity, EntityId, Film, FilmBrief, FullRecord, Genre, GenreBrief, Person,
    PersonBrief, RelatedRef,
};
pub use error::{
    BackendError, CacheError, CatalogError, CatalogResult, ConfigError, ValidationError,
};
pub use kind::{EntityKind, KindProfile};
pub use query::{QuerySpec, QuerySpecBuilder, SortSpec, DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE};
