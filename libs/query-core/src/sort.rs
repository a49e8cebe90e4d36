//! Sort-mapping registry and sort expression builder.
//!
//! A [`SortMappingDefinition`] maps the public sort keys of one external shape (a DTO)
//! to storage field paths of one internal shape (an entity). Definitions are declared
//! once at startup, collected in a [`SortMappingRegistry`] and looked up by type pair.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;

use crate::{split_tokens, Error, OrderBy, OrderKey, SortDir};

/// One public sort key and the storage path it orders by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortMapping {
    pub sort_key: String,
    pub storage_path: String,
    pub reverse: bool,
}

impl SortMapping {
    pub fn new(sort_key: impl Into<String>, storage_path: impl Into<String>) -> Self {
        Self {
            sort_key: sort_key.into(),
            storage_path: storage_path.into(),
            reverse: false,
        }
    }

    /// Invert the requested direction for this key.
    #[must_use]
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    fn matches(&self, key: &str) -> bool {
        self.sort_key.eq_ignore_ascii_case(key)
    }
}

/// Parse one sort token into `(key, requested_descending)`.
/// The direction word is optional; only a case-insensitive `desc` means descending.
fn parse_token(token: &str) -> (&str, bool) {
    let mut parts = token.split_whitespace();
    let key = parts.next().unwrap_or_default();
    let desc = parts
        .next()
        .map(|d| d.eq_ignore_ascii_case("desc"))
        .unwrap_or(false);
    (key, desc)
}

/// Immutable set of sort mappings for the `(S, D)` type pair.
#[derive(Clone, Debug)]
pub struct SortMappingDefinition {
    source_type: &'static str,
    destination_type: &'static str,
    key: (TypeId, TypeId),
    mappings: Vec<SortMapping>,
}

impl SortMappingDefinition {
    /// Build a definition for external shape `S` and internal shape `D`.
    ///
    /// Fails if two mappings share a sort key (case-insensitively).
    pub fn new<S: 'static, D: 'static>(mappings: Vec<SortMapping>) -> Result<Self, Error> {
        for (i, m) in mappings.iter().enumerate() {
            if mappings[..i].iter().any(|prev| prev.matches(&m.sort_key)) {
                return Err(Error::DuplicateSortKey(m.sort_key.clone()));
            }
        }
        Ok(Self {
            source_type: type_name::<S>(),
            destination_type: type_name::<D>(),
            key: (TypeId::of::<S>(), TypeId::of::<D>()),
            mappings,
        })
    }

    pub fn builder<S: 'static, D: 'static>() -> SortMappingDefinitionBuilder<S, D> {
        SortMappingDefinitionBuilder {
            mappings: Vec::new(),
            _types: PhantomData,
        }
    }

    pub fn mappings(&self) -> &[SortMapping] {
        &self.mappings
    }

    pub fn source_type(&self) -> &'static str {
        self.source_type
    }

    pub fn destination_type(&self) -> &'static str {
        self.destination_type
    }

    /// Case-insensitive lookup of a public sort key.
    pub fn find(&self, sort_key: &str) -> Option<&SortMapping> {
        self.mappings.iter().find(|m| m.matches(sort_key))
    }

    /// Check every token of `sort` against this definition.
    ///
    /// An absent or blank `sort` is always valid. The first token whose key has no
    /// mapping is reported verbatim together with the whole parameter.
    pub fn validate(&self, sort: Option<&str>) -> Result<(), Error> {
        let Some(raw) = sort.filter(|s| !s.trim().is_empty()) else {
            return Ok(());
        };
        for token in split_tokens(raw) {
            let (key, _) = parse_token(token);
            if self.find(key).is_none() {
                return Err(Error::invalid_sort(token, raw));
            }
        }
        Ok(())
    }

    pub fn is_valid(&self, sort: Option<&str>) -> bool {
        self.validate(sort).is_ok()
    }

    /// Turn a client sort string into storage orderings.
    ///
    /// Empty `sort` yields a single ascending ordering on `default_key` (a storage path),
    /// so paging stays deterministic. Tokens keep their order and form a tie-break chain.
    /// Unknown keys are a contract violation here: call [`validate`](Self::validate) first.
    pub fn build(&self, sort: Option<&str>, default_key: &str) -> Result<OrderBy, Error> {
        let Some(raw) = sort.filter(|s| !s.trim().is_empty()) else {
            return Ok(OrderBy(vec![OrderKey::asc(default_key)]));
        };

        let mut keys = Vec::new();
        for token in split_tokens(raw) {
            let (key, desc) = parse_token(token);
            let mapping = self.find(key).ok_or_else(|| {
                tracing::error!(sort_key = key, "sort key reached builder without validation");
                Error::UnresolvedSortKey(key.to_owned())
            })?;
            keys.push(OrderKey {
                field: mapping.storage_path.clone(),
                dir: SortDir::resolve(desc, mapping.reverse),
            });
        }
        Ok(OrderBy(keys))
    }
}

/// Fluent declaration helper for [`SortMappingDefinition`].
pub struct SortMappingDefinitionBuilder<S, D> {
    mappings: Vec<SortMapping>,
    _types: PhantomData<fn() -> (S, D)>,
}

impl<S: 'static, D: 'static> SortMappingDefinitionBuilder<S, D> {
    pub fn map(mut self, sort_key: &str, storage_path: &str) -> Self {
        self.mappings.push(SortMapping::new(sort_key, storage_path));
        self
    }

    pub fn map_reversed(mut self, sort_key: &str, storage_path: &str) -> Self {
        self.mappings
            .push(SortMapping::new(sort_key, storage_path).reversed());
        self
    }

    pub fn build(self) -> Result<SortMappingDefinition, Error> {
        SortMappingDefinition::new::<S, D>(self.mappings)
    }
}

/// Process-wide, read-only collection of sort mapping definitions.
///
/// Built before serving and shared behind an `Arc`; lookups need no locking.
#[derive(Clone, Debug, Default)]
pub struct SortMappingRegistry {
    definitions: HashMap<(TypeId, TypeId), SortMappingDefinition>,
}

impl SortMappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition. A later definition for the same type pair replaces the earlier one.
    #[must_use]
    pub fn with(mut self, definition: SortMappingDefinition) -> Self {
        self.register(definition);
        self
    }

    pub fn register(&mut self, definition: SortMappingDefinition) {
        tracing::debug!(
            source = definition.source_type,
            destination = definition.destination_type,
            keys = definition.mappings.len(),
            "registered sort mapping definition"
        );
        self.definitions.insert(definition.key, definition);
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Look up the definition for `(S, D)`. Absence is a deployment bug, not a client error.
    pub fn lookup<S: 'static, D: 'static>(&self) -> Result<&SortMappingDefinition, Error> {
        self.definitions
            .get(&(TypeId::of::<S>(), TypeId::of::<D>()))
            .ok_or(Error::MissingMappingDefinition {
                source_type: type_name::<S>(),
                destination_type: type_name::<D>(),
            })
    }

    pub fn validate<S: 'static, D: 'static>(&self, sort: Option<&str>) -> Result<(), Error> {
        self.lookup::<S, D>()?.validate(sort)
    }

    pub fn build<S: 'static, D: 'static>(
        &self,
        sort: Option<&str>,
        default_key: &str,
    ) -> Result<OrderBy, Error> {
        self.lookup::<S, D>()?.build(sort, default_key)
    }
}
