use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::submissions::dtos::AttachmentResponseDto;
use crate::features::submissions::models::FormSubmission;
use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Request DTO for submitting a form
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitFormDto {
    /// Payload keyed by field name, validated against the template's schema
    #[schema(value_type = Object)]
    pub data: Value,

    #[validate(length(max = 255, message = "Submitted by must not exceed 255 characters"))]
    pub submitted_by: Option<String>,

    /// Language code selecting the template's translation overlay
    #[validate(length(max = 10, message = "Language must not exceed 10 characters"))]
    pub language: Option<String>,

    /// Caller-supplied project label; the `x-project-id` header is used
    /// when this is absent
    #[validate(length(max = 100, message = "Project context must not exceed 100 characters"))]
    pub project_context: Option<String>,
}

impl SubmitFormDto {
    /// An empty submission, used as the starting point when parsing
    /// multipart requests part by part.
    pub fn empty() -> Self {
        Self {
            data: Value::Object(Default::default()),
            submitted_by: None,
            language: None,
            project_context: None,
        }
    }
}

/// Request DTO for batch submission. Size limits are enforced in the
/// service so the error message can name the configured maximum.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchSubmitDto {
    pub submissions: Vec<SubmitFormDto>,
}

/// Per-payload outcome of a batch submission, reported by input index
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchItemResultDto {
    /// Position of the payload in the request
    pub index: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl BatchItemResultDto {
    pub fn ok(index: usize, submission_id: Uuid) -> Self {
        Self {
            index,
            success: true,
            submission_id: Some(submission_id),
            errors: None,
        }
    }

    pub fn failed(index: usize, errors: Vec<String>) -> Self {
        Self {
            index,
            success: false,
            submission_id: None,
            errors: Some(errors),
        }
    }
}

/// Request DTO for updating a submission's processing state
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateSubmissionStatusDto {
    pub is_processed: Option<bool>,

    #[validate(length(max = 5000, message = "Processing notes must not exceed 5000 characters"))]
    pub processing_notes: Option<String>,
}

/// Query params for listing a template's submissions
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListSubmissionsQuery {
    /// Filter by processing state
    pub is_processed: Option<bool>,
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    /// Number of items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl ListSubmissionsQuery {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }

    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

/// Client context captured at intake time, extracted from request headers
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// One file pulled out of a multipart request, held in memory until the
/// payload has validated and the storage path is derived
#[derive(Debug, Clone)]
pub struct ReceivedFile {
    /// Multipart part name; must match a file field on the template
    pub field_name: String,
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Response DTO for a submission. List responses leave `attachments` empty;
/// detail responses carry the full set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponseDto {
    pub id: Uuid,
    pub template_id: Uuid,
    #[schema(value_type = Object)]
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_context: Option<String>,
    pub is_processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentResponseDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubmissionResponseDto {
    pub fn with_attachments(mut self, attachments: Vec<AttachmentResponseDto>) -> Self {
        self.attachments = attachments;
        self
    }
}

impl From<FormSubmission> for SubmissionResponseDto {
    fn from(submission: FormSubmission) -> Self {
        Self {
            id: submission.id,
            template_id: submission.template_id,
            data: submission.data,
            submitted_by: submission.submitted_by,
            language: submission.language,
            project_context: submission.project_context,
            is_processed: submission.is_processed,
            processing_notes: submission.processing_notes,
            attachments: Vec::new(),
            created_at: submission.created_at,
            updated_at: submission.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_clamps_pagination() {
        let query = ListSubmissionsQuery {
            is_processed: None,
            page: 0,
            page_size: 10_000,
        };
        assert_eq!(query.offset(), 0);
        assert_eq!(query.limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn response_omits_empty_attachments() {
        let dto = SubmissionResponseDto {
            id: Uuid::now_v7(),
            template_id: Uuid::now_v7(),
            data: serde_json::json!({"name": "Ana"}),
            submitted_by: None,
            language: None,
            project_context: None,
            is_processed: false,
            processing_notes: None,
            attachments: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let rendered = serde_json::to_value(&dto).unwrap();
        assert!(rendered.get("attachments").is_none());
        assert!(rendered.get("submitted_by").is_none());
    }
}
