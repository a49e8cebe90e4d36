use crate::api::problem::{Problem, ProblemResponse};
use axum::{http::StatusCode, response::IntoResponse};
use query_core::Error as QueryError;

/// Unified API error type that handles all errors at the API boundary
///
/// Handlers use `?` on both query-shaping and domain results and get RFC 9457
/// Problem+json responses. `D` is the module's own domain error type.
#[derive(thiserror::Error, Debug)]
pub enum ApiError<D> {
    /// Sort/fields validation, mapping and link synthesis errors
    #[error(transparent)]
    Query(QueryError),

    /// Domain business logic errors
    #[error(transparent)]
    Domain(D),

    /// Already rendered problem (e.g. from a boundary check inside the handler)
    #[error("{0:?}")]
    Problem(ProblemResponse),
}

impl<D> ApiError<D> {
    pub fn from_query(e: QueryError) -> Self {
        ApiError::Query(e)
    }

    pub fn from_domain(e: D) -> Self {
        ApiError::Domain(e)
    }
}

impl<D> From<QueryError> for ApiError<D> {
    fn from(e: QueryError) -> Self {
        ApiError::Query(e)
    }
}

impl<D> From<ProblemResponse> for ApiError<D> {
    fn from(p: ProblemResponse) -> Self {
        ApiError::Problem(p)
    }
}

impl<D> ApiError<D>
where
    D: Into<ProblemResponse>,
{
    /// Render as a problem whose `instance` is the request path (unless already set).
    pub fn into_problem(self, instance: &str) -> ProblemResponse {
        let mut problem = match self {
            ApiError::Query(e) => query_error_to_problem(&e, instance),
            ApiError::Domain(e) => e.into(),
            ApiError::Problem(p) => p,
        };
        if problem.0.instance.is_empty() {
            problem.0.instance = instance.to_owned();
        }
        problem
    }
}

impl<D> IntoResponse for ApiError<D>
where
    D: Into<ProblemResponse>,
{
    fn into_response(self) -> axum::response::Response {
        self.into_problem("").into_response()
    }
}

/// Generic Result type for API handlers.
/// Each module typically defines its own alias: `type HabitsResult<T> = ApiResult<T, DomainError>;`
pub type ApiResult<T, D> = Result<T, ApiError<D>>;

/// Map query-shaping errors to RFC 9457 problems.
///
/// Only invalid `sort` / `fields` values are the caller's fault. Everything else is a
/// deployment or programming error: logged in full, answered with a generic 500.
pub fn query_error_to_problem(e: &QueryError, instance: &str) -> ProblemResponse {
    match e {
        QueryError::InvalidSortKey { .. } => Problem::from_parts(
            StatusCode::BAD_REQUEST,
            "INVALID_SORT",
            "Invalid sort parameter",
            e.to_string(),
            instance,
        )
        .into(),
        QueryError::InvalidFieldName { .. } => Problem::from_parts(
            StatusCode::BAD_REQUEST,
            "INVALID_FIELDS",
            "Invalid data shaping fields",
            e.to_string(),
            instance,
        )
        .into(),
        QueryError::DuplicateSortKey(_)
        | QueryError::MissingMappingDefinition { .. }
        | QueryError::UnresolvedSortKey(_)
        | QueryError::LinkResolution { .. }
        | QueryError::Shaping(_) => {
            tracing::error!(error = %e, "query shaping failed on the server side");
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_sort_is_a_bad_request_naming_the_value() {
        let p = query_error_to_problem(&QueryError::invalid_sort("bogus", "name,bogus"), "/habits");
        assert_eq!(p.0.status, 400);
        assert_eq!(p.0.code, "INVALID_SORT");
        assert!(p.0.detail.contains("'name,bogus'"));
        assert!(p.0.detail.contains("bogus"));
        assert_eq!(p.0.instance, "/habits");
    }

    #[test]
    fn invalid_fields_is_a_bad_request() {
        let p = query_error_to_problem(&QueryError::invalid_field("bogus", "bogus"), "/habits");
        assert_eq!(p.0.status, 400);
        assert_eq!(p.0.code, "INVALID_FIELDS");
    }

    #[test]
    fn into_problem_fills_missing_instance() {
        let err: ApiError<ProblemResponse> =
            ApiError::Domain(crate::api::problem::not_found("Habit 'h_1' was not found"));
        let p = err.into_problem("/habits/h_1");
        assert_eq!(p.0.status, 404);
        assert_eq!(p.0.instance, "/habits/h_1");

        let err: ApiError<ProblemResponse> = QueryError::invalid_field("x", "x").into();
        assert_eq!(err.into_problem("/tags").0.instance, "/tags");
    }

    #[test]
    fn configuration_errors_do_not_leak_details() {
        for e in [
            QueryError::link_resolution("get", Some("habits")),
            QueryError::UnresolvedSortKey("x".into()),
            QueryError::Shaping("boom".into()),
        ] {
            let p = query_error_to_problem(&e, "/habits");
            assert_eq!(p.0.status, 500);
            assert_eq!(p.0.code, "INTERNAL_ERROR");
            assert_eq!(p.0.detail, "An internal error occurred");
        }
    }
}
