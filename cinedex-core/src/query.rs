//! Normalized listing requests.
//!
//! A [`QuerySpec`] is built per request from loosely typed parameters and
//! discarded afterwards. All normalization happens in
//! [`QuerySpecBuilder::build`], so two specs that compare equal are the same
//! logical query no matter how, or in which order, their fields were set.

use crate::{EntityId, ValidationError};

/// Page number used when the request names none.
pub const DEFAULT_PAGE_NUMBER: u32 = 1;

/// Page size used when the request names none. Large enough to mean "all".
pub const DEFAULT_PAGE_SIZE: u32 = 9999;

/// Sort field and direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SortSpec {
    field: Option<String>,
    descending: bool,
}

impl SortSpec {
    /// Parse a raw sort token.
    ///
    /// A leading `-` selects descending order and is stripped from the
    /// field. An empty token means "no field, ascending". A bare `-` names
    /// no field and is rejected.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let token = raw.trim();
        if token.is_empty() {
            return Ok(Self::default());
        }

        let (descending, field) = match token.strip_prefix('-') {
            Some(rest) => (true, rest.trim()),
            None => (false, token),
        };

        if field.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "sort".to_string(),
                reason: format!("sort token {:?} names no field", raw),
            });
        }

        Ok(Self {
            field: Some(field.to_string()),
            descending,
        })
    }

    /// Ascending sort on `field`.
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            descending: false,
        }
    }

    /// Descending sort on `field`.
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            descending: true,
        }
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }
}

/// Normalized filter, sort, and page parameters of a listing request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuerySpec {
    related_filter: Option<EntityId>,
    text_filter: Option<String>,
    sort: SortSpec,
    page_number: u32,
    page_size: u32,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            related_filter: None,
            text_filter: None,
            sort: SortSpec::default(),
            page_number: DEFAULT_PAGE_NUMBER,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QuerySpec {
    pub fn builder() -> QuerySpecBuilder {
        QuerySpecBuilder::default()
    }

    /// Related entity the listing is restricted to.
    pub fn related_filter(&self) -> Option<EntityId> {
        self.related_filter
    }

    /// Free-text term, trimmed and never empty.
    pub fn text_filter(&self) -> Option<&str> {
        self.text_filter.as_deref()
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn sort_field(&self) -> Option<&str> {
        self.sort.field()
    }

    pub fn sort_descending(&self) -> bool {
        self.sort.is_descending()
    }

    /// One-based page number, at least 1.
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Page size, at least 1.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of records skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number - 1) * u64::from(self.page_size)
    }
}

/// Collects raw listing parameters; [`build`](Self::build) validates them.
#[derive(Debug, Clone, Default)]
pub struct QuerySpecBuilder {
    related_filter: Option<EntityId>,
    text_filter: Option<String>,
    sort_token: Option<String>,
    page_number: Option<u32>,
    page_size: Option<u32>,
}

impl QuerySpecBuilder {
    /// Restrict the listing to records related to `id`.
    pub fn related(mut self, id: EntityId) -> Self {
        self.related_filter = Some(id);
        self
    }

    pub fn related_opt(mut self, id: Option<EntityId>) -> Self {
        self.related_filter = id;
        self
    }

    /// Free-text term matched against the kind's text field.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text_filter = Some(text.into());
        self
    }

    pub fn text_opt(mut self, text: Option<String>) -> Self {
        self.text_filter = text;
        self
    }

    /// Raw sort token such as `"-imdb_rating"`.
    pub fn sort(mut self, token: impl Into<String>) -> Self {
        self.sort_token = Some(token.into());
        self
    }

    pub fn sort_opt(mut self, token: Option<String>) -> Self {
        self.sort_token = token;
        self
    }

    pub fn page_number(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Validate and normalize into a [`QuerySpec`].
    ///
    /// Whitespace-only text terms are dropped, so a missing term and an
    /// empty one describe the same query.
    pub fn build(self) -> Result<QuerySpec, ValidationError> {
        let page_number = self.page_number.unwrap_or(DEFAULT_PAGE_NUMBER);
        if page_number == 0 {
            return Err(ValidationError::InvalidValue {
                field: "page_number".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(ValidationError::InvalidValue {
                field: "page_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let sort = match self.sort_token {
            Some(token) => SortSpec::parse(&token)?,
            None => SortSpec::default(),
        };

        let text_filter = self
            .text_filter
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        Ok(QuerySpec {
            related_filter: self.related_filter,
            text_filter,
            sort,
            page_number,
            page_size,
        })
    }
}
