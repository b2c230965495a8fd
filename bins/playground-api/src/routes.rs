// Route table for the playground API

use axum::routing::{delete, get, patch, post};
use axum::Router;
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/languages", get(handlers::list_languages))
        .route("/execute", post(handlers::execute_code))
        .route("/detect-language", post(handlers::detect_language))
        .route("/assistant/ask", post(handlers::ask_assistant))
        .route("/assistant/explain", post(handlers::explain_code))
        .route("/assistant/edit", post(handlers::edit_code))
        .route(
            "/folders",
            get(handlers::list_folders).post(handlers::create_folder),
        )
        .route(
            "/folders/:id",
            patch(handlers::rename_folder).delete(handlers::delete_folder),
        )
        .route(
            "/snippets",
            get(handlers::list_snippets).post(handlers::save_snippet),
        )
        .route("/snippets/:id", delete(handlers::delete_snippet))
        .route("/snippets/:id/folder", patch(handlers::move_snippet))
        .route("/executions", get(handlers::list_executions))
        .route("/executions/recent", get(handlers::recent_executions))
}
