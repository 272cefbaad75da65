use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::submissions::dtos::{AttachmentResponseDto, ReceivedFile};
use crate::features::submissions::services::AttachmentService;
use crate::shared::types::ApiResponse;

/// Upload attachments to an existing submission
///
/// Every multipart part must carry a filename; the part name selects the
/// template field the file belongs to. All files are checked against the
/// field's constraints before any of them is stored.
#[utoipa::path(
    post,
    path = "/api/submissions/{id}/attachments",
    tag = "attachments",
    params(("id" = Uuid, Path, description = "Submission ID")),
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "One part per file; the part name selects the template field",
    ),
    responses(
        (status = 201, description = "Per-file upload results", body = ApiResponse<Vec<AttachmentResponseDto>>),
        (status = 404, description = "Submission not found"),
        (status = 422, description = "Files failed validation"),
        (status = 503, description = "Attachment storage unavailable")
    )
)]
pub async fn upload_attachments(
    State(service): State<Arc<AttachmentService>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Vec<AttachmentResponseDto>>>), AppError> {
    let mut files: Vec<ReceivedFile> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let part_name = field.name().unwrap_or("").to_string();

        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            return Err(AppError::BadRequest(format!(
                "Part `{}` is not a file",
                part_name
            )));
        };
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data = field.bytes().await.map_err(|e| {
            debug!("Failed to read file bytes: {}", e);
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        files.push(ReceivedFile {
            field_name: part_name,
            filename,
            content_type,
            data: data.to_vec(),
        });
    }

    let attachments = service.upload_to_submission(id, files).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(attachments),
            Some("Attachments uploaded".to_string()),
            None,
        )),
    ))
}

/// Delete an attachment
///
/// Removes the blob first, then the record. Returns 404 when the record
/// does not exist.
#[utoipa::path(
    delete,
    path = "/api/attachments/{id}",
    tag = "attachments",
    params(("id" = Uuid, Path, description = "Attachment ID")),
    responses(
        (status = 200, description = "Attachment deleted"),
        (status = 404, description = "Attachment not found"),
        (status = 503, description = "Attachment storage unavailable")
    )
)]
pub async fn delete_attachment(
    State(service): State<Arc<AttachmentService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    service.delete(id).await?;

    Ok(Json(ApiResponse::success(
        None,
        Some("Attachment deleted successfully".to_string()),
        None,
    )))
}
