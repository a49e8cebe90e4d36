use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use modkit::api::problem::ValidationError;
use modkit::{ApiError, ApiResult, Problem, ProblemResponse};

use crate::domain::error::DomainError;

/// Handler result for this module.
pub type HabitsResult<T> = ApiResult<T, DomainError>;
pub type HabitsError = ApiError<DomainError>;

/// Map domain errors to RFC 9457 problems.
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::HabitNotFound { id } => Problem::from_parts(
            StatusCode::NOT_FOUND,
            "HABIT_NOT_FOUND",
            "Habit not found",
            format!("Habit with id '{id}' was not found"),
            instance,
        )
        .into(),
        DomainError::TagNotFound { id } => Problem::from_parts(
            StatusCode::NOT_FOUND,
            "TAG_NOT_FOUND",
            "Tag not found",
            format!("Tag with id '{id}' was not found"),
            instance,
        )
        .into(),
        DomainError::TagNameConflict { name } => Problem::from_parts(
            StatusCode::CONFLICT,
            "TAG_NAME_CONFLICT",
            "Tag name already exists",
            format!("The tag '{name}' already exists"),
            instance,
        )
        .into(),
        DomainError::UnknownTags { ids } => Problem::from_parts(
            StatusCode::BAD_REQUEST,
            "UNKNOWN_TAGS",
            "Unknown tags",
            e.to_string(),
            instance,
        )
        .with_errors(
            ids.iter()
                .map(|id| ValidationError {
                    detail: format!("Tag '{id}' does not exist"),
                    pointer: "/tagIds".to_owned(),
                })
                .collect(),
        )
        .into(),
        DomainError::Validation { field, message } => Problem::from_parts(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Validation error",
            format!("{field}: {message}"),
            instance,
        )
        .with_errors(vec![ValidationError {
            detail: message.clone(),
            pointer: format!("/{}", field.replace('.', "/")),
        }])
        .into(),
        DomainError::Storage { message } => {
            tracing::error!(error = %message, "storage error");
            Problem::from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal Server Error",
                "An internal error occurred",
                instance,
            )
            .into()
        }
    }
}

impl From<DomainError> for ProblemResponse {
    fn from(e: DomainError) -> Self {
        map_domain_error(&e, "")
    }
}

impl From<DomainError> for HabitsError {
    fn from(e: DomainError) -> Self {
        ApiError::Domain(e)
    }
}

/// Render any handler error against the request path.
pub fn problem(instance: &str) -> impl Fn(HabitsError) -> ProblemResponse + '_ {
    move |e| e.into_problem(instance)
}

/// Malformed or mistyped JSON body.
pub fn body_problem(rejection: JsonRejection, instance: &str) -> ProblemResponse {
    Problem::from_parts(
        rejection.status(),
        "INVALID_BODY",
        "Invalid request body",
        rejection.body_text(),
        instance,
    )
    .into()
}
