use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::features::submissions::handlers;
use crate::features::submissions::services::{AttachmentService, SubmissionService};

/// Create routes for the submissions feature
///
/// `body_limit` bounds the multipart routes and comes from configuration;
/// JSON routes keep the default limit.
pub fn routes(
    submission_service: Arc<SubmissionService>,
    attachment_service: Arc<AttachmentService>,
    body_limit: usize,
) -> Router {
    let submission_routes = Router::new()
        .route("/api/templates/{id}/submit", post(handlers::submit_form))
        .route(
            "/api/templates/{id}/submit/multipart",
            post(handlers::submit_form_multipart).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/api/templates/{id}/submit/batch",
            post(handlers::submit_batch),
        )
        .route(
            "/api/templates/{id}/submissions",
            get(handlers::list_submissions),
        )
        .route("/api/submissions/{id}", get(handlers::get_submission))
        .route(
            "/api/submissions/{id}/status",
            put(handlers::update_submission_status),
        )
        .with_state(submission_service);

    let attachment_routes = Router::new()
        .route(
            "/api/submissions/{id}/attachments",
            post(handlers::upload_attachments).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/attachments/{id}", delete(handlers::delete_attachment))
        .with_state(attachment_service);

    submission_routes.merge(attachment_routes)
}
