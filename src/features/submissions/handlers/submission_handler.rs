use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::AppJson;
use crate::features::submissions::dtos::{
    BatchItemResultDto, BatchSubmitDto, ClientMeta, ListSubmissionsQuery, ReceivedFile,
    SubmissionResponseDto, SubmitFormDto, UpdateSubmissionStatusDto,
};
use crate::features::submissions::services::SubmissionService;
use crate::shared::types::ApiResponse;

/// Header carrying the caller's project label when the body has none
const PROJECT_HEADER: &str = "x-project-id";

/// Submit a form
///
/// Validates the JSON payload against the template's schema and persists it.
/// Validation reports every violation at once, not just the first.
#[utoipa::path(
    post,
    path = "/api/templates/{id}/submit",
    tag = "submissions",
    params(("id" = Uuid, Path, description = "Template ID")),
    request_body = SubmitFormDto,
    responses(
        (status = 201, description = "Submission accepted", body = ApiResponse<SubmissionResponseDto>),
        (status = 404, description = "Template not found or inactive"),
        (status = 422, description = "Payload failed validation")
    )
)]
pub async fn submit_form(
    State(service): State<Arc<SubmissionService>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    AppJson(mut dto): AppJson<SubmitFormDto>,
) -> Result<(StatusCode, Json<ApiResponse<SubmissionResponseDto>>), AppError> {
    dto.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if dto.project_context.is_none() {
        dto.project_context = header_value(&headers, PROJECT_HEADER);
    }

    let meta = client_meta(&headers);
    let submission = service.submit(id, dto, meta).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(submission),
            Some("Form submitted successfully".to_string()),
            None,
        )),
    ))
}

/// Submit a form with files
///
/// Accepts multipart/form-data with:
/// - `data`: JSON object with the non-file field values (optional)
/// - `submitted_by`, `language`, `project_context`: optional text parts
/// - any part carrying a filename is stored as an attachment for the
///   template field named by the part
#[utoipa::path(
    post,
    path = "/api/templates/{id}/submit/multipart",
    tag = "submissions",
    params(("id" = Uuid, Path, description = "Template ID")),
    request_body(
        content = SubmitFormDto,
        content_type = "multipart/form-data",
        description = "Form payload in the `data` part plus one part per uploaded file",
    ),
    responses(
        (status = 201, description = "Submission accepted", body = ApiResponse<SubmissionResponseDto>),
        (status = 404, description = "Template not found or inactive"),
        (status = 422, description = "Payload or files failed validation"),
        (status = 503, description = "Attachment storage unavailable")
    )
)]
pub async fn submit_form_multipart(
    State(service): State<Arc<SubmissionService>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<SubmissionResponseDto>>), AppError> {
    let mut dto = SubmitFormDto::empty();
    let mut files: Vec<ReceivedFile> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let part_name = field.name().unwrap_or("").to_string();

        if let Some(filename) = field.file_name().map(|s| s.to_string()) {
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
            continue;
        }

        let text = field.text().await.map_err(|e| {
            AppError::BadRequest(format!("Failed to read `{}` part: {}", part_name, e))
        })?;
        match part_name.as_str() {
            "data" => {
                dto.data = serde_json::from_str(&text).map_err(|e| {
                    AppError::BadRequest(format!("`data` part is not valid JSON: {}", e))
                })?;
            }
            "submitted_by" => dto.submitted_by = Some(text),
            "language" => dto.language = Some(text),
            "project_context" => dto.project_context = Some(text),
            other => {
                return Err(AppError::BadRequest(format!(
                    "Unexpected form part `{}`",
                    other
                )));
            }
        }
    }

    dto.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if dto.project_context.is_none() {
        dto.project_context = header_value(&headers, PROJECT_HEADER);
    }

    let meta = client_meta(&headers);
    let submission = service.submit_with_files(id, dto, files, meta).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(submission),
            Some("Form submitted successfully".to_string()),
            None,
        )),
    ))
}

/// Submit a batch of payloads
///
/// Up to 50 JSON payloads in one request; the response reports a per-index
/// outcome and an invalid payload never aborts the rest.
#[utoipa::path(
    post,
    path = "/api/templates/{id}/submit/batch",
    tag = "submissions",
    params(("id" = Uuid, Path, description = "Template ID")),
    request_body = BatchSubmitDto,
    responses(
        (status = 200, description = "Per-payload results", body = ApiResponse<Vec<BatchItemResultDto>>),
        (status = 400, description = "Empty or oversized batch"),
        (status = 404, description = "Template not found or inactive")
    )
)]
pub async fn submit_batch(
    State(service): State<Arc<SubmissionService>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    AppJson(dto): AppJson<BatchSubmitDto>,
) -> Result<Json<ApiResponse<Vec<BatchItemResultDto>>>, AppError> {
    let meta = client_meta(&headers);
    let results = service.submit_batch(id, dto, meta).await?;

    let succeeded = results.iter().filter(|r| r.success).count();
    let failed = results.len() - succeeded;

    Ok(Json(ApiResponse::success(
        Some(results),
        Some(format!(
            "Batch processed: {} succeeded, {} failed",
            succeeded, failed
        )),
        None,
    )))
}

/// List a template's submissions
#[utoipa::path(
    get,
    path = "/api/templates/{id}/submissions",
    tag = "submissions",
    params(
        ("id" = Uuid, Path, description = "Template ID"),
        ListSubmissionsQuery
    ),
    responses(
        (status = 200, description = "Submissions, newest first", body = ApiResponse<Vec<SubmissionResponseDto>>),
        (status = 404, description = "Template not found")
    )
)]
pub async fn list_submissions(
    State(service): State<Arc<SubmissionService>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListSubmissionsQuery>,
) -> Result<Json<ApiResponse<Vec<SubmissionResponseDto>>>, AppError> {
    let (submissions, meta) = service.list(id, &query).await?;

    Ok(Json(ApiResponse::success(
        Some(submissions),
        None,
        Some(meta),
    )))
}

/// Get a submission with its attachments
#[utoipa::path(
    get,
    path = "/api/submissions/{id}",
    tag = "submissions",
    params(("id" = Uuid, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission", body = ApiResponse<SubmissionResponseDto>),
        (status = 404, description = "Submission not found")
    )
)]
pub async fn get_submission(
    State(service): State<Arc<SubmissionService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SubmissionResponseDto>>, AppError> {
    let submission = service.get(id).await?;

    Ok(Json(ApiResponse::success(Some(submission), None, None)))
}

/// Update a submission's processing state
#[utoipa::path(
    put,
    path = "/api/submissions/{id}/status",
    tag = "submissions",
    params(("id" = Uuid, Path, description = "Submission ID")),
    request_body = UpdateSubmissionStatusDto,
    responses(
        (status = 200, description = "Submission updated", body = ApiResponse<SubmissionResponseDto>),
        (status = 400, description = "No fields to update"),
        (status = 404, description = "Submission not found")
    )
)]
pub async fn update_submission_status(
    State(service): State<Arc<SubmissionService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateSubmissionStatusDto>,
) -> Result<Json<ApiResponse<SubmissionResponseDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let submission = service.update_status(id, dto).await?;

    Ok(Json(ApiResponse::success(
        Some(submission),
        Some("Submission status updated".to_string()),
        None,
    )))
}

/// Client address and agent from request headers, favoring proxy headers
/// since the service is expected to sit behind one
pub(super) fn client_meta(headers: &HeaderMap) -> ClientMeta {
    let ip_address = header_value(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
        .or_else(|| header_value(headers, "x-real-ip"))
        // ip_address column is 45 chars wide
        .map(|ip| ip.chars().take(45).collect());

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    ClientMeta {
        ip_address,
        user_agent,
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_takes_the_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.5"));

        let meta = client_meta(&headers);
        assert_eq!(meta.ip_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(meta.user_agent.as_deref(), Some("curl/8.5"));
    }

    #[test]
    fn real_ip_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("192.0.2.1"));

        let meta = client_meta(&headers);
        assert_eq!(meta.ip_address.as_deref(), Some("192.0.2.1"));
        assert_eq!(meta.user_agent, None);
    }

    #[test]
    fn absent_headers_leave_meta_empty() {
        let meta = client_meta(&HeaderMap::new());
        assert_eq!(meta.ip_address, None);
        assert_eq!(meta.user_agent, None);
    }
}
