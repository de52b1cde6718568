use crate::api::handlers;
use crate::service::{ImportService, SemaphoreService};
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

/// Shared state: import and semaphore services
#[derive(Clone)]
pub struct AppState {
    pub import: Arc<ImportService>,
    pub semaphore: Arc<SemaphoreService>,
}

pub fn router(state: AppState) -> Router {
    let import_routes = Router::new()
        .route(
            "/api/insurers/:insurer_id/glosas/import/preview",
            post(handlers::preview_import),
        )
        .route(
            "/api/insurers/:insurer_id/glosas/import/preview/csv",
            post(handlers::preview_import_csv),
        )
        .route(
            "/api/insurers/:insurer_id/glosas/import/preview/xlsx",
            post(handlers::preview_import_xlsx),
        )
        .route(
            "/api/insurers/:insurer_id/glosas/import/commit",
            post(handlers::commit_import),
        )
        .route(
            "/api/insurers/:insurer_id/column-mapping",
            put(handlers::put_column_mapping),
        );

    let semaphore_routes = Router::new()
        .route("/api/glosas/semaphores/recompute", post(handlers::recompute_semaphores))
        .route("/api/glosas/:dispute_id/state", patch(handlers::change_dispute_state));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(import_routes)
        .merge(semaphore_routes)
        .layer(ServiceBuilder::new())
        .with_state(state)
}
