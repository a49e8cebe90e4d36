use thiserror::Error;

/// Unified error for the query-shaping core.
///
/// Only [`Error::InvalidSortKey`] and [`Error::InvalidFieldName`] are the caller's fault.
/// Everything else is a deployment or programming error and must surface as a server failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("The provided sort parameter isn't valid: '{sort}' (unknown sort key '{token}')")]
    InvalidSortKey { token: String, sort: String },

    #[error("The provided data shaping fields aren't valid: '{fields}' (unknown field '{token}')")]
    InvalidFieldName { token: String, fields: String },

    #[error("duplicate sort key '{0}' in sort mapping definition")]
    DuplicateSortKey(String),

    #[error("no sort mapping definition found for source type '{source_type}' and destination type '{destination_type}'")]
    MissingMappingDefinition {
        source_type: &'static str,
        destination_type: &'static str,
    },

    #[error("sort key '{0}' has no mapping; sort must be validated before building")]
    UnresolvedSortKey(String),

    #[error("unable to resolve link for action '{action}' (scope: {scope:?})")]
    LinkResolution {
        action: String,
        scope: Option<String>,
    },

    #[error("data shaping failed: {0}")]
    Shaping(String),
}

impl Error {
    pub fn invalid_sort(token: impl Into<String>, sort: impl Into<String>) -> Self {
        Self::InvalidSortKey {
            token: token.into(),
            sort: sort.into(),
        }
    }

    pub fn invalid_field(token: impl Into<String>, fields: impl Into<String>) -> Self {
        Self::InvalidFieldName {
            token: token.into(),
            fields: fields.into(),
        }
    }

    pub fn link_resolution(action: impl Into<String>, scope: Option<&str>) -> Self {
        Self::LinkResolution {
            action: action.into(),
            scope: scope.map(str::to_owned),
        }
    }

    /// True for 400-class conditions caused by client-supplied parameters.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidSortKey { .. } | Error::InvalidFieldName { .. }
        )
    }
}
