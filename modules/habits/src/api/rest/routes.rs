use std::sync::Arc;

use axum::routing::{get, put};
use axum::{Extension, Router};
use modkit::PageLimits;

use crate::api::rest::handlers::{self, RestState};

/// Mount the habits and tags endpoints on `router`.
pub fn register_routes(
    router: Router,
    state: Arc<RestState>,
    limits: PageLimits,
) -> anyhow::Result<Router> {
    let routes = Router::new()
        .route(
            "/habits",
            get(handlers::list_habits).post(handlers::create_habit),
        )
        .route(
            "/habits/{id}",
            get(handlers::get_habit)
                .put(handlers::update_habit)
                .patch(handlers::patch_habit)
                .delete(handlers::delete_habit),
        )
        .route("/habits/{id}/tags", put(handlers::upsert_habit_tags))
        .route("/tags", get(handlers::list_tags).post(handlers::create_tag))
        .route(
            "/tags/{id}",
            get(handlers::get_tag)
                .put(handlers::update_tag)
                .delete(handlers::delete_tag),
        )
        .layer(Extension(limits))
        .layer(Extension(state));

    tracing::debug!(routes = 7, "registered habits routes");
    Ok(router.merge(routes))
}
