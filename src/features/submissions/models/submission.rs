use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a form submission
///
/// `data` is the payload exactly as it passed validation. After creation only
/// `is_processed` and `processing_notes` ever change.
#[derive(Debug, Clone, FromRow)]
pub struct FormSubmission {
    pub id: Uuid,
    pub template_id: Uuid,
    pub data: Value,
    pub submitted_by: Option<String>,
    pub language: Option<String>,
    pub project_context: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub is_processed: bool,
    pub processing_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
