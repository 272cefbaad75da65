use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::templates::handlers;
use crate::features::templates::services::TemplateService;

/// Create routes for the templates feature
pub fn routes(service: Arc<TemplateService>) -> Router {
    Router::new()
        .route(
            "/api/templates",
            post(handlers::create_template).get(handlers::list_templates),
        )
        .route(
            "/api/templates/{id}",
            get(handlers::get_template)
                .put(handlers::update_template)
                .delete(handlers::delete_template),
        )
        .route(
            "/api/projects/{project_id}/stats",
            get(handlers::project_stats),
        )
        .with_state(service)
}
