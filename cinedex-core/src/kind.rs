//! Entity kinds and their index profiles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Catalog entity kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// The primary entity.
    Movie,
    Genre,
    Person,
}

impl EntityKind {
    /// All kinds, primary first.
    pub const ALL: [EntityKind; 3] = [EntityKind::Movie, EntityKind::Genre, EntityKind::Person];

    /// Stable lowercase name, also used as the cache key prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Genre => "genre",
            Self::Person => "person",
        }
    }

    /// Default index profile for this kind.
    pub fn profile(&self) -> KindProfile {
        KindProfile::for_kind(*self)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ValidationError;

    /// Accepts the singular name and the index name, case-insensitively.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" | "film" | "films" => Ok(Self::Movie),
            "genre" | "genres" => Ok(Self::Genre),
            "person" | "persons" => Ok(Self::Person),
            _ => Err(ValidationError::UnknownKind {
                value: value.to_string(),
            }),
        }
    }
}

/// Index configuration for one entity kind.
///
/// Everything the generic lookup service needs to know about a kind: where
/// its documents live, which source fields each record shape needs, which
/// nested collection links it to other kinds, which field free-text search
/// matches against, and how listings sort when the caller gives no field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindProfile {
    pub kind: EntityKind,
    /// Name of the search index.
    pub index: String,
    /// Source projection for full records.
    pub full_fields: &'static [&'static str],
    /// Source projection for brief records.
    pub brief_fields: &'static [&'static str],
    /// Nested collection holding references to related entities.
    pub relation_path: &'static str,
    /// Identifier field inside `relation_path`.
    pub relation_field: &'static str,
    /// Field matched by free-text search.
    pub text_field: &'static str,
    /// Sort field used when the request names none.
    pub default_sort: &'static str,
}

impl KindProfile {
    /// Default profile for a kind.
    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Movie => Self {
                kind,
                index: "movies".to_string(),
                full_fields: &[
                    "id",
                    "title",
                    "imdb_rating",
                    "description",
                    "genres",
                    "actors",
                    "writers",
                ],
                brief_fields: &["id", "title", "imdb_rating"],
                relation_path: "genres",
                relation_field: "genres.id",
                text_field: "title",
                default_sort: "imdb_rating",
            },
            EntityKind::Genre => Self {
                kind,
                index: "genres".to_string(),
                full_fields: &["id", "name", "description", "films"],
                brief_fields: &["id", "name", "description"],
                relation_path: "films",
                relation_field: "films.id",
                text_field: "name",
                default_sort: "name",
            },
            EntityKind::Person => Self {
                kind,
                index: "persons".to_string(),
                full_fields: &["id", "full_name", "birth_date", "films"],
                brief_fields: &["id", "full_name", "birth_date"],
                relation_path: "films",
                relation_field: "films.id",
                text_field: "full_name",
                default_sort: "full_name.raw",
            },
        }
    }

    /// Point the profile at a different index.
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }
}
