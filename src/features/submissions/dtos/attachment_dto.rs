use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::submissions::models::{FormAttachment, UploadStatus};

/// Response DTO for an attachment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachmentResponseDto {
    pub id: Uuid,
    pub submission_id: Uuid,
    /// Template field the file was uploaded for
    pub field_name: String,
    pub original_filename: String,
    /// Derived path inside the blob store
    pub storage_path: String,
    pub file_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub status: UploadStatus,
    pub created_at: DateTime<Utc>,
}

impl From<FormAttachment> for AttachmentResponseDto {
    fn from(attachment: FormAttachment) -> Self {
        Self {
            id: attachment.id,
            submission_id: attachment.submission_id,
            field_name: attachment.field_name,
            original_filename: attachment.original_filename,
            storage_path: attachment.storage_path,
            file_size: attachment.file_size,
            content_type: attachment.content_type,
            status: attachment.status,
            created_at: attachment.created_at,
        }
    }
}
