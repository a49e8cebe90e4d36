use axum::http::Uri;
use axum::Extension;
use modkit::ProblemResponse;

use crate::request_id::XRequestId;

pub async fn health_check() -> &'static str {
    "ok"
}

/// Problem response for paths no module serves.
pub async fn not_found(rid: Option<Extension<XRequestId>>, uri: Uri) -> ProblemResponse {
    let mut problem = modkit::not_found(format!("No resource at '{}'", uri.path()));
    problem.0.instance = uri.path().to_owned();
    if let Some(Extension(XRequestId(id))) = rid {
        problem.0 = problem.0.with_trace_id(id);
    }
    problem
}
