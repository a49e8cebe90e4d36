use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Habit not found: {id}")]
    HabitNotFound { id: String },

    #[error("Tag not found: {id}")]
    TagNotFound { id: String },

    #[error("A tag with the name '{name}' already exists")]
    TagNameConflict { name: String },

    #[error("Unknown tag ids: {}", ids.join(", "))]
    UnknownTags { ids: Vec<String> },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn habit_not_found(id: impl Into<String>) -> Self {
        Self::HabitNotFound { id: id.into() }
    }

    pub fn tag_not_found(id: impl Into<String>) -> Self {
        Self::TagNotFound { id: id.into() }
    }

    pub fn tag_name_conflict(name: impl Into<String>) -> Self {
        Self::TagNameConflict { name: name.into() }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for DomainError {
    fn from(e: anyhow::Error) -> Self {
        Self::storage(format!("{e:#}"))
    }
}
