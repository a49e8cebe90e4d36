//! Transport-agnostic query shaping for resource collections.
//!
//! The pieces fit together in request order:
//! sort validation ([`SortMappingRegistry`]) → ordering ([`SortMappingDefinition::build`]) →
//! count + page fetch ([`PaginationResult::create`]) → field projection ([`shaping`]) →
//! hypermedia links ([`LinkSynthesizer`]).
//!
//! Nothing here knows about HTTP. Route resolution is delegated to a [`LinkResolver`]
//! and storage access to a [`PageSource`].

use serde::{Deserialize, Serialize};
use std::fmt;

mod error;
pub mod link;
pub mod page;
pub mod shaping;
pub mod sort;

pub use error::Error;
pub use link::{LinkCatalog, LinkDto, LinkResolver, LinkSynthesizer, LinkTemplate, QueryParams};
pub use page::{PageRequest, PageSource, PaginationResult};
pub use shaping::{FieldDescriptor, FieldSelection, Shape, ShapedRecord};
pub use sort::{SortMapping, SortMappingDefinition, SortMappingRegistry};

#[cfg_attr(feature = "with-utoipa", derive(utoipa::ToSchema))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }

    /// Resolve the storage direction for a client request against a mapping's reverse flag.
    #[must_use]
    pub fn resolve(requested_desc: bool, reverse: bool) -> Self {
        if requested_desc ^ reverse {
            SortDir::Desc
        } else {
            SortDir::Asc
        }
    }
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDir::Asc => f.write_str("ASC"),
            SortDir::Desc => f.write_str("DESC"),
        }
    }
}

/// One storage-level ordering: a storage field path and its resolved direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderKey {
    pub field: String,
    pub dir: SortDir,
}

impl OrderKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: SortDir::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: SortDir::Desc,
        }
    }
}

/// Ordered, left-to-right tie-break chain of storage orderings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderBy(pub Vec<OrderKey>);

impl OrderBy {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> &[OrderKey] {
        &self.0
    }

    /// Render as `"path DIR, path DIR"`; handy in logs.
    pub fn to_clause(&self) -> String {
        self.0
            .iter()
            .map(|k| format!("{} {}", k.field, k.dir))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_clause())
    }
}

/// Split a comma-separated client parameter into trimmed, non-empty tokens.
pub(crate) fn split_tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}
