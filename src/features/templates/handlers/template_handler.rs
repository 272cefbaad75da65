use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::AppJson;
use crate::features::templates::dtos::{
    CreateTemplateDto, ListTemplatesQuery, ProjectStatsDto, ProjectStatsQuery,
    TemplateResponseDto, UpdateTemplateDto,
};
use crate::features::templates::services::TemplateService;
use crate::shared::types::ApiResponse;

/// Create a form template
///
/// Parses the field definitions, generates the validation schema from them
/// and stores both. Duplicate field names or unsupported field types are
/// rejected before anything is persisted.
#[utoipa::path(
    post,
    path = "/api/templates",
    tag = "templates",
    request_body = CreateTemplateDto,
    responses(
        (status = 201, description = "Template created", body = ApiResponse<TemplateResponseDto>),
        (status = 400, description = "Invalid template definition")
    )
)]
pub async fn create_template(
    State(service): State<Arc<TemplateService>>,
    AppJson(dto): AppJson<CreateTemplateDto>,
) -> Result<(StatusCode, Json<ApiResponse<TemplateResponseDto>>), AppError> {
    dto.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let template = service.create(dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(template),
            Some("Template created successfully".to_string()),
            None,
        )),
    ))
}

/// List form templates
#[utoipa::path(
    get,
    path = "/api/templates",
    tag = "templates",
    params(ListTemplatesQuery),
    responses(
        (status = 200, description = "Templates", body = ApiResponse<Vec<TemplateResponseDto>>)
    )
)]
pub async fn list_templates(
    State(service): State<Arc<TemplateService>>,
    Query(query): Query<ListTemplatesQuery>,
) -> Result<Json<ApiResponse<Vec<TemplateResponseDto>>>, AppError> {
    let (templates, meta) = service.list(&query).await?;

    Ok(Json(ApiResponse::success(Some(templates), None, Some(meta))))
}

/// Get a form template by ID
#[utoipa::path(
    get,
    path = "/api/templates/{id}",
    tag = "templates",
    params(("id" = Uuid, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Template", body = ApiResponse<TemplateResponseDto>),
        (status = 404, description = "Template not found")
    )
)]
pub async fn get_template(
    State(service): State<Arc<TemplateService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TemplateResponseDto>>, AppError> {
    let template = service.get(id).await?;

    Ok(Json(ApiResponse::success(Some(template), None, None)))
}

/// Update a form template
///
/// Sending a new `fields` list regenerates the stored schema in full.
#[utoipa::path(
    put,
    path = "/api/templates/{id}",
    tag = "templates",
    params(("id" = Uuid, Path, description = "Template ID")),
    request_body = UpdateTemplateDto,
    responses(
        (status = 200, description = "Template updated", body = ApiResponse<TemplateResponseDto>),
        (status = 400, description = "Invalid template definition"),
        (status = 404, description = "Template not found")
    )
)]
pub async fn update_template(
    State(service): State<Arc<TemplateService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateTemplateDto>,
) -> Result<Json<ApiResponse<TemplateResponseDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let template = service.update(id, dto).await?;

    Ok(Json(ApiResponse::success(
        Some(template),
        Some("Template updated successfully".to_string()),
        None,
    )))
}

/// Soft delete a form template
///
/// The template stops accepting submissions but stays in the database, so
/// existing submissions keep a valid reference.
#[utoipa::path(
    delete,
    path = "/api/templates/{id}",
    tag = "templates",
    params(("id" = Uuid, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Template deleted"),
        (status = 404, description = "Template not found")
    )
)]
pub async fn delete_template(
    State(service): State<Arc<TemplateService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    service.delete(id).await?;

    Ok(Json(ApiResponse::success(
        None,
        Some("Template deleted successfully".to_string()),
        None,
    )))
}

/// Project submission statistics
///
/// Totals, the busiest templates and per-day submission counts over the
/// requested window (30 days by default). A project with no templates
/// returns zeros rather than 404, since project IDs are free-form labels.
#[utoipa::path(
    get,
    path = "/api/projects/{project_id}/stats",
    tag = "stats",
    params(
        ("project_id" = String, Path, description = "Project ID"),
        ProjectStatsQuery
    ),
    responses(
        (status = 200, description = "Project statistics", body = ApiResponse<ProjectStatsDto>)
    )
)]
pub async fn project_stats(
    State(service): State<Arc<TemplateService>>,
    Path(project_id): Path<String>,
    Query(query): Query<ProjectStatsQuery>,
) -> Result<Json<ApiResponse<ProjectStatsDto>>, AppError> {
    let stats = service.project_stats(&project_id, &query).await?;

    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}
