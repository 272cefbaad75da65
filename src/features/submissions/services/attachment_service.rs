use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::config::FormsConfig;
use crate::core::error::{AppError, Result};
use crate::features::submissions::dtos::{AttachmentResponseDto, ReceivedFile};
use crate::features::submissions::models::{FormAttachment, FormSubmission, UploadStatus};
use crate::features::templates::models::{FormTemplate, ValidationRules};
use crate::modules::storage::{derive_path, BlobStorage};
use crate::shared::constants::FALLBACK_FILENAME;
use crate::shared::schema::{FieldDescriptor, FieldKind, Violation};

/// Attempts per blob write before the failure sticks
const STORE_ATTEMPTS: u64 = 3;

/// Base delay between store attempts; grows linearly per attempt
const RETRY_BACKOFF_MS: u64 = 200;

/// Service for attachment storage and bookkeeping
///
/// Every file follows the same lifecycle: a `pending` row is written first,
/// then the bytes go to the blob store (with bounded retries), then the row
/// flips to `uploaded` or `failed`. A crash in between leaves a `pending`
/// row for the sweeper worker to reclaim.
pub struct AttachmentService {
    pool: PgPool,
    storage: Arc<dyn BlobStorage>,
    limits: FormsConfig,
    store_timeout_secs: u64,
}

impl AttachmentService {
    pub fn new(
        pool: PgPool,
        storage: Arc<dyn BlobStorage>,
        limits: FormsConfig,
        store_timeout_secs: u64,
    ) -> Self {
        Self {
            pool,
            storage,
            limits,
            store_timeout_secs,
        }
    }

    /// Check incoming files against the template's file fields and limits.
    /// Returns every violation, never just the first.
    pub fn check_files(&self, template: &FormTemplate, files: &[ReceivedFile]) -> Vec<Violation> {
        file_violations(
            &template.fields.0,
            &template.validation_rules.0,
            &self.limits,
            files,
        )
    }

    /// Store every file for a submission, one attachment row per file.
    /// Individual store failures are recorded on the row, not propagated;
    /// only database errors abort.
    pub async fn store_files(
        &self,
        template: &FormTemplate,
        submission_id: Uuid,
        files: Vec<ReceivedFile>,
    ) -> Result<Vec<FormAttachment>> {
        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            stored.push(self.store_one(template, submission_id, file).await?);
        }
        Ok(stored)
    }

    /// Add files to an existing submission
    pub async fn upload_to_submission(
        &self,
        submission_id: Uuid,
        files: Vec<ReceivedFile>,
    ) -> Result<Vec<AttachmentResponseDto>> {
        if files.is_empty() {
            return Err(AppError::BadRequest(
                "Request contains no files".to_string(),
            ));
        }

        let submission = self.find_submission(submission_id).await?;
        let template = self.find_template(submission.template_id).await?;

        let violations = self.check_files(&template, &files);
        if !violations.is_empty() {
            return Err(AppError::ValidationFailed(violations));
        }

        let stored = self.store_files(&template, submission_id, files).await?;

        info!(
            "Uploaded {} attachment(s) to submission {}",
            stored.len(),
            submission_id
        );

        Ok(stored.into_iter().map(Into::into).collect())
    }

    /// All attachments of a submission, oldest first
    pub async fn list_for_submission(&self, submission_id: Uuid) -> Result<Vec<FormAttachment>> {
        Ok(sqlx::query_as::<_, FormAttachment>(
            "SELECT * FROM form_attachments WHERE submission_id = $1 ORDER BY created_at",
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Delete an attachment: blob first, then the row. A blob that is
    /// already gone does not block the row delete.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let attachment = sqlx::query_as::<_, FormAttachment>(
            "SELECT * FROM form_attachments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Attachment {} not found", id)))?;

        let removed = self.storage.delete(&attachment.storage_path).await?;
        if !removed {
            debug!(
                "No blob at {} for attachment {}",
                attachment.storage_path, id
            );
        }

        sqlx::query("DELETE FROM form_attachments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        info!(
            "Attachment deleted: id={}, path={}",
            id, attachment.storage_path
        );
        Ok(())
    }

    /// Best-effort blob cleanup when an all-or-nothing submission rolls
    /// back; the rows go away with the submission via the cascade.
    pub async fn discard_uploaded(&self, attachments: &[FormAttachment]) {
        for attachment in attachments.iter().filter(|a| a.is_uploaded()) {
            if let Err(e) = self.storage.delete(&attachment.storage_path).await {
                warn!(
                    "Could not discard blob {}: {}",
                    attachment.storage_path, e
                );
            }
        }
    }

    async fn store_one(
        &self,
        template: &FormTemplate,
        submission_id: Uuid,
        file: ReceivedFile,
    ) -> Result<FormAttachment> {
        let original_filename = if file.filename.trim().is_empty() {
            FALLBACK_FILENAME.to_string()
        } else {
            file.filename.clone()
        };
        let path = derive_path(
            &template.name,
            &submission_id.to_string(),
            &file.field_name,
            &original_filename,
            Utc::now(),
        );

        let pending = sqlx::query_as::<_, FormAttachment>(
            r#"
            INSERT INTO form_attachments (
                id, submission_id, field_name, original_filename,
                storage_path, file_size, content_type
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(submission_id)
        .bind(&file.field_name)
        .bind(&original_filename)
        .bind(&path)
        .bind(file.data.len() as i64)
        .bind(&file.content_type)
        .fetch_one(&self.pool)
        .await?;

        match self
            .store_with_retry(&path, &file.data, &file.content_type)
            .await
        {
            Ok(()) => {
                debug!("Attachment stored: {}", path);
                self.set_status(pending.id, UploadStatus::Uploaded).await
            }
            Err(e) => {
                warn!("Attachment {} failed to store at {}: {}", pending.id, path, e);
                self.set_status(pending.id, UploadStatus::Failed).await
            }
        }
    }

    async fn store_with_retry(
        &self,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<()> {
        let timeout = Duration::from_secs(self.store_timeout_secs);
        let mut last_error = AppError::Storage("no store attempt made".to_string());

        for attempt in 1..=STORE_ATTEMPTS {
            match tokio::time::timeout(
                timeout,
                self.storage.store(path, data.to_vec(), content_type),
            )
            .await
            {
                Ok(Ok(_)) => return Ok(()),
                Ok(Err(e)) => last_error = e,
                Err(_) => {
                    last_error = AppError::Storage(format!(
                        "store of {} timed out after {}s",
                        path,
                        timeout.as_secs()
                    ))
                }
            }
            if attempt < STORE_ATTEMPTS {
                sleep(Duration::from_millis(RETRY_BACKOFF_MS * attempt)).await;
            }
        }

        Err(last_error)
    }

    async fn set_status(&self, id: Uuid, status: UploadStatus) -> Result<FormAttachment> {
        Ok(sqlx::query_as::<_, FormAttachment>(
            "UPDATE form_attachments SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_submission(&self, id: Uuid) -> Result<FormSubmission> {
        sqlx::query_as::<_, FormSubmission>("SELECT * FROM form_submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Submission {} not found", id)))
    }

    async fn find_template(&self, id: Uuid) -> Result<FormTemplate> {
        sqlx::query_as::<_, FormTemplate>("SELECT * FROM form_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::TemplateNotFound(id))
    }
}

/// Check files against the template's file fields, per-template rules and
/// the global limits. Pure, so the submit path can run it before anything
/// is persisted.
pub(crate) fn file_violations(
    fields: &[FieldDescriptor],
    rules: &ValidationRules,
    limits: &FormsConfig,
    files: &[ReceivedFile],
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for file in files {
        let Some(descriptor) = fields.iter().find(|f| f.name == file.field_name) else {
            violations.push(Violation::new(
                &file.field_name,
                "is not a recognized field",
            ));
            continue;
        };
        let FieldKind::File {
            accepted_types,
            max_file_size,
        } = &descriptor.kind
        else {
            violations.push(Violation::new(
                &file.field_name,
                "does not accept file uploads",
            ));
            continue;
        };
        *counts.entry(descriptor.name.as_str()).or_default() += 1;

        let mut size_limit = limits.max_file_size as u64;
        if let Some(cap) = rules.max_file_size {
            size_limit = size_limit.min(cap);
        }
        if let Some(cap) = *max_file_size {
            size_limit = size_limit.min(cap);
        }
        if file.data.len() as u64 > size_limit {
            violations.push(Violation::new(
                &file.field_name,
                format!(
                    "file `{}` exceeds the maximum size of {} bytes",
                    display_name(file),
                    size_limit
                ),
            ));
        }

        if rules.validate_file_types
            && !accepted_types.is_empty()
            && !mime_accepted(accepted_types, &file.content_type)
        {
            violations.push(Violation::new(
                &file.field_name,
                format!(
                    "file `{}` has unsupported type `{}`",
                    display_name(file),
                    file.content_type
                ),
            ));
        }
    }

    let mut max_files = limits.max_files_per_field;
    if let Some(cap) = rules.max_files_per_field {
        max_files = max_files.min(cap as usize);
    }
    for descriptor in fields {
        if let Some(&n) = counts.get(descriptor.name.as_str()) {
            if n > max_files {
                violations.push(Violation::new(
                    &descriptor.name,
                    format!("accepts at most {} file(s), got {}", max_files, n),
                ));
            }
        }
    }

    violations
}

fn display_name(file: &ReceivedFile) -> &str {
    if file.filename.is_empty() {
        FALLBACK_FILENAME
    } else {
        &file.filename
    }
}

/// Exact match, case-insensitive; entries ending in `/*` match the whole
/// top-level type (e.g. `image/*` accepts `image/png`).
fn mime_accepted(accepted: &[String], content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    accepted.iter().any(|entry| {
        let entry = entry.to_ascii_lowercase();
        match entry.strip_suffix("/*") {
            Some(prefix) => content_type
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/')),
            None => entry == content_type,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::schema::FieldSpec;

    fn limits() -> FormsConfig {
        FormsConfig {
            schema_cache_capacity: 256,
            max_file_size: 1024,
            max_files_per_field: 2,
            stale_upload_retention_hours: 24,
        }
    }

    fn fields() -> Vec<FieldDescriptor> {
        let mut photo = FieldSpec::new("photo", "file");
        photo.accepted_types = Some(vec!["image/*".to_string(), "application/pdf".to_string()]);
        let mut receipt = FieldSpec::new("receipt", "file");
        receipt.max_file_size = Some(100);
        let name = FieldSpec::new("name", "string");
        FieldDescriptor::parse_all(&[photo, receipt, name]).unwrap()
    }

    fn file(field: &str, filename: &str, content_type: &str, size: usize) -> ReceivedFile {
        ReceivedFile {
            field_name: field.to_string(),
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            data: vec![0; size],
        }
    }

    #[test]
    fn conforming_files_produce_no_violations() {
        let violations = file_violations(
            &fields(),
            &ValidationRules::default(),
            &limits(),
            &[
                file("photo", "cat.png", "image/png", 512),
                file("receipt", "r.txt", "text/plain", 50),
            ],
        );
        assert!(violations.is_empty(), "unexpected: {violations:?}");
    }

    #[test]
    fn rejects_unknown_and_non_file_fields() {
        let violations = file_violations(
            &fields(),
            &ValidationRules::default(),
            &limits(),
            &[
                file("signature", "s.png", "image/png", 10),
                file("name", "n.txt", "text/plain", 10),
            ],
        );
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].field_path, "signature");
        assert!(violations[1].message.contains("does not accept file uploads"));
    }

    #[test]
    fn field_size_cap_tightens_the_global_limit() {
        // receipt caps at 100 bytes even though the global limit is 1024
        let violations = file_violations(
            &fields(),
            &ValidationRules::default(),
            &limits(),
            &[file("receipt", "big.txt", "text/plain", 200)],
        );
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("100 bytes"));
    }

    #[test]
    fn mime_enforcement_respects_the_rules_toggle() {
        let input = [file("photo", "n.exe", "application/x-msdownload", 10)];

        let strict = file_violations(&fields(), &ValidationRules::default(), &limits(), &input);
        assert_eq!(strict.len(), 1);
        assert!(strict[0].message.contains("application/x-msdownload"));

        let relaxed = ValidationRules {
            validate_file_types: false,
            ..Default::default()
        };
        assert!(file_violations(&fields(), &relaxed, &limits(), &input).is_empty());
    }

    #[test]
    fn per_field_count_limit_applies() {
        let parts: Vec<ReceivedFile> = (0..3)
            .map(|i| file("photo", &format!("p{i}.png"), "image/png", 10))
            .collect();
        let violations =
            file_violations(&fields(), &ValidationRules::default(), &limits(), &parts);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("at most 2 file(s), got 3"));
    }

    #[test]
    fn wildcard_mime_entries_match_the_top_level_type() {
        let accepted = vec!["image/*".to_string()];
        assert!(mime_accepted(&accepted, "image/png"));
        assert!(mime_accepted(&accepted, "IMAGE/JPEG"));
        assert!(!mime_accepted(&accepted, "imagex/png"));
        assert!(!mime_accepted(&accepted, "application/pdf"));

        let exact = vec!["application/pdf".to_string()];
        assert!(mime_accepted(&exact, "application/pdf"));
        assert!(!mime_accepted(&exact, "application/pdf-x"));
    }
}
