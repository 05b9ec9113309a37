//! Catalog record types.
//!
//! Every kind has a full record (returned by single lookups) and a brief
//! projection (returned by listings). Records are immutable snapshots of an
//! index document; nothing here is ever written back to the index.
//!
//! Identifiers serialize as `uuid`. Index documents carry `id`, so both
//! spellings are accepted when decoding.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EntityKind, ValidationError};

// ============================================================================
// IDENTITY
// ============================================================================

/// Unique identifier of a catalog record (string form of a UUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a random identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parse the string form of an identifier.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        value.parse()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for EntityId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|e| ValidationError::InvalidIdentifier {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }
}

impl From<Uuid> for EntityId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Reference to a related record inside a nested collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedRef {
    pub id: EntityId,
    /// Display name; film references in the index call this `title`.
    #[serde(
        default,
        alias = "title",
        alias = "full_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
}

impl RelatedRef {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

// ============================================================================
// MOVIES
// ============================================================================

/// Full movie record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Film {
    #[serde(rename = "uuid", alias = "id")]
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub imdb_rating: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genres: Vec<RelatedRef>,
    #[serde(default)]
    pub actors: Vec<RelatedRef>,
    #[serde(default)]
    pub writers: Vec<RelatedRef>,
}

/// Movie listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmBrief {
    #[serde(rename = "uuid", alias = "id")]
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub imdb_rating: Option<f64>,
}

impl From<&Film> for FilmBrief {
    fn from(film: &Film) -> Self {
        Self {
            id: film.id,
            title: film.title.clone(),
            imdb_rating: film.imdb_rating,
        }
    }
}

// ============================================================================
// GENRES
// ============================================================================

/// Full genre record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(rename = "uuid", alias = "id")]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub films: Vec<RelatedRef>,
}

/// Genre listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreBrief {
    #[serde(rename = "uuid", alias = "id")]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<&Genre> for GenreBrief {
    fn from(genre: &Genre) -> Self {
        Self {
            id: genre.id,
            name: genre.name.clone(),
            description: genre.description.clone(),
        }
    }
}

// ============================================================================
// PERSONS
// ============================================================================

/// Full person record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "uuid", alias = "id")]
    pub id: EntityId,
    pub full_name: String,
    #[serde(default, alias = "birthdate")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub films: Vec<RelatedRef>,
}

/// Person listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonBrief {
    #[serde(rename = "uuid", alias = "id")]
    pub id: EntityId,
    pub full_name: String,
    #[serde(default, alias = "birthdate")]
    pub birth_date: Option<NaiveDate>,
}

impl From<&Person> for PersonBrief {
    fn from(person: &Person) -> Self {
        Self {
            id: person.id,
            full_name: person.full_name.clone(),
            birth_date: person.birth_date,
        }
    }
}

// ============================================================================
// KIND BINDING
// ============================================================================

/// Binds a full record type to its kind and listing projection.
///
/// The lookup service is generic over this trait, so one implementation
/// serves every kind.
pub trait CatalogEntity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Listing projection of this record.
    type Brief: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Kind this record belongs to.
    fn kind() -> EntityKind;

    /// Identifier of this record.
    fn entity_id(&self) -> EntityId;

    /// Wrap into the kind-erased record.
    fn into_full_record(self) -> FullRecord;

    /// Wrap a listing entry into the kind-erased listing record.
    fn brief_into_record(brief: Self::Brief) -> BriefRecord;
}

impl CatalogEntity for Film {
    type Brief = FilmBrief;

    fn kind() -> EntityKind {
        EntityKind::Movie
    }

    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn into_full_record(self) -> FullRecord {
        FullRecord::Movie(self)
    }

    fn brief_into_record(brief: FilmBrief) -> BriefRecord {
        BriefRecord::Movie(brief)
    }
}

impl CatalogEntity for Genre {
    type Brief = GenreBrief;

    fn kind() -> EntityKind {
        EntityKind::Genre
    }

    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn into_full_record(self) -> FullRecord {
        FullRecord::Genre(self)
    }

    fn brief_into_record(brief: GenreBrief) -> BriefRecord {
        BriefRecord::Genre(brief)
    }
}

impl CatalogEntity for Person {
    type Brief = PersonBrief;

    fn kind() -> EntityKind {
        EntityKind::Person
    }

    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn into_full_record(self) -> FullRecord {
        FullRecord::Person(self)
    }

    fn brief_into_record(brief: PersonBrief) -> BriefRecord {
        BriefRecord::Person(brief)
    }
}

/// Full record of any kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FullRecord {
    Movie(Film),
    Genre(Genre),
    Person(Person),
}

impl FullRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Movie(_) => EntityKind::Movie,
            Self::Genre(_) => EntityKind::Genre,
            Self::Person(_) => EntityKind::Person,
        }
    }

    pub fn id(&self) -> EntityId {
        match self {
            Self::Movie(film) => film.id,
            Self::Genre(genre) => genre.id,
            Self::Person(person) => person.id,
        }
    }
}

/// Listing record of any kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BriefRecord {
    Movie(FilmBrief),
    Genre(GenreBrief),
    Person(PersonBrief),
}

impl BriefRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Movie(_) => EntityKind::Movie,
            Self::Genre(_) => EntityKind::Genre,
            Self::Person(_) => EntityKind::Person,
        }
    }

    pub fn id(&self) -> EntityId {
        match self {
            Self::Movie(film) => film.id,
            Self::Genre(genre) => genre.id,
            Self::Person(person) => person.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_id_parse() {
        let id = EntityId::parse("bb74a838-584e-11ec-9885-c13c488d29c0").unwrap();
        assert_eq!(id.to_string(), "bb74a838-584e-11ec-9885-c13c488d29c0");

        let err = EntityId::parse("not-a-uuid").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_film_decodes_index_document() {
        let doc = json!({
            "id": "bb74a838-584e-11ec-9885-c13c488d29c0",
            "title": "Some film",
            "imdb_rating": 5.5,
            "description": "Something happens",
            "genres": [{"id": "0b105f87-e0a5-45dc-8ce7-f8632088f390", "name": "Western"}],
            "actors": [],
            "writers": []
        });
        let film: Film = serde_json::from_value(doc).unwrap();
        assert_eq!(film.title, "Some film");
        assert_eq!(film.imdb_rating, Some(5.5));
        assert_eq!(film.genres.len(), 1);
        assert_eq!(film.genres[0].name.as_deref(), Some("Western"));
    }

    #[test]
    fn test_record_serializes_uuid_and_decodes_back() {
        let film = Film {
            id: EntityId::parse("bb74a838-584e-11ec-9885-c13c488d29c0").unwrap(),
            title: "Some film".to_string(),
            imdb_rating: Some(5.5),
            description: None,
            genres: vec![],
            actors: vec![],
            writers: vec![],
        };
        let encoded = serde_json::to_string(&film).unwrap();
        assert!(encoded.contains(r#""uuid":"bb74a838-584e-11ec-9885-c13c488d29c0""#));
        assert!(encoded.contains(r#""title":"Some film""#));

        let decoded: Film = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, film);
    }

    #[test]
    fn test_related_ref_accepts_title() {
        let reference: RelatedRef = serde_json::from_value(json!({
            "id": "bb74a838-584e-11ec-9885-c13c488d29c0",
            "title": "Some film"
        }))
        .unwrap();
        assert_eq!(reference.name.as_deref(), Some("Some film"));
    }

    #[test]
    fn test_person_accepts_legacy_birthdate() {
        let person: Person = serde_json::from_value(json!({
            "id": "6d3b6c52-2f6e-4a3b-9a55-0f0b2c0d8f11",
            "full_name": "Jane Doe",
            "birthdate": "1970-01-02",
            "films": []
        }))
        .unwrap();
        assert_eq!(person.birth_date, NaiveDate::from_ymd_opt(1970, 1, 2));
    }

    #[test]
    fn test_brief_projection_from_full() {
        let genre = Genre {
            id: EntityId::new_random(),
            name: "Western".to_string(),
            description: Some("Cowboys".to_string()),
            films: vec![RelatedRef::new(EntityId::new_random(), "Some film")],
        };
        let brief = GenreBrief::from(&genre);
        assert_eq!(brief.id, genre.id);
        assert_eq!(brief.name, "Western");

        let record = Genre::brief_into_record(brief);
        assert_eq!(record.kind(), EntityKind::Genre);
        assert_eq!(record.id(), genre.id);
    }

    #[test]
    fn test_kind_binding() {
        assert_eq!(Film::kind(), EntityKind::Movie);
        assert_eq!(Genre::kind(), EntityKind::Genre);
        assert_eq!(Person::kind(), EntityKind::Person);
    }
}
