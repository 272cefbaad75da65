use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of an uploaded file. Rows start as `Pending`, move to
/// `Uploaded` once the blob write succeeds and to `Failed` when it does not.
/// Rows stuck in `Pending` are reclaimed by the sweeper worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "upload_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Uploaded,
    Failed,
}

/// Database model for a submission attachment
///
/// `storage_path` is derived server-side from the template name, submission
/// id and field name; the request never chooses where bytes land.
#[derive(Debug, Clone, FromRow)]
pub struct FormAttachment {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub field_name: String,
    pub original_filename: String,
    pub storage_path: String,
    pub file_size: i64,
    pub content_type: Option<String>,
    pub status: UploadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormAttachment {
    pub fn is_uploaded(&self) -> bool {
        self.status == UploadStatus::Uploaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&UploadStatus::Uploaded).unwrap(),
            "\"uploaded\""
        );
        let parsed: UploadStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, UploadStatus::Pending);
    }
}
