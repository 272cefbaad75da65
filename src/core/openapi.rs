use utoipa::{Modify, OpenApi};

use crate::features::submissions::{
    dtos as submissions_dtos, handlers as submissions_handlers, models as submissions_models,
};
use crate::features::templates::{
    dtos as templates_dtos, handlers as templates_handlers, models as templates_models,
};
use crate::shared::schema::{ArrayItemType, FieldSpec, StringFormat};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Templates
        templates_handlers::create_template,
        templates_handlers::list_templates,
        templates_handlers::get_template,
        templates_handlers::update_template,
        templates_handlers::delete_template,
        // Submissions
        submissions_handlers::submit_form,
        submissions_handlers::submit_form_multipart,
        submissions_handlers::submit_batch,
        submissions_handlers::list_submissions,
        submissions_handlers::get_submission,
        submissions_handlers::update_submission_status,
        // Attachments
        submissions_handlers::upload_attachments,
        submissions_handlers::delete_attachment,
        // Stats
        templates_handlers::project_stats,
    ),
    components(
        schemas(
            Meta,
            // Templates
            FieldSpec,
            StringFormat,
            ArrayItemType,
            templates_models::ValidationRules,
            templates_models::TranslationOverlay,
            templates_dtos::CreateTemplateDto,
            templates_dtos::UpdateTemplateDto,
            templates_dtos::TemplateResponseDto,
            ApiResponse<templates_dtos::TemplateResponseDto>,
            ApiResponse<Vec<templates_dtos::TemplateResponseDto>>,
            // Submissions
            submissions_dtos::SubmitFormDto,
            submissions_dtos::BatchSubmitDto,
            submissions_dtos::BatchItemResultDto,
            submissions_dtos::UpdateSubmissionStatusDto,
            submissions_dtos::SubmissionResponseDto,
            ApiResponse<submissions_dtos::SubmissionResponseDto>,
            ApiResponse<Vec<submissions_dtos::SubmissionResponseDto>>,
            ApiResponse<Vec<submissions_dtos::BatchItemResultDto>>,
            // Attachments
            submissions_models::UploadStatus,
            submissions_dtos::AttachmentResponseDto,
            ApiResponse<Vec<submissions_dtos::AttachmentResponseDto>>,
            // Stats
            templates_dtos::TopTemplateDto,
            templates_dtos::DailySubmissionsDto,
            templates_dtos::ProjectStatsDto,
            ApiResponse<templates_dtos::ProjectStatsDto>,
        )
    ),
    tags(
        (name = "templates", description = "Form template management"),
        (name = "submissions", description = "Form submission intake and review"),
        (name = "attachments", description = "Submission file attachments"),
        (name = "stats", description = "Project-level submission statistics"),
    ),
    info(
        title = "Formgate API",
        version = "0.1.0",
        description = "API documentation for Formgate",
    )
)]
pub struct ApiDoc;

/// Overrides OpenAPI info with values from configuration
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
