use std::sync::Arc;

use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::submissions::dtos::{
    BatchItemResultDto, BatchSubmitDto, ClientMeta, ListSubmissionsQuery, ReceivedFile,
    SubmissionResponseDto, SubmitFormDto, UpdateSubmissionStatusDto,
};
use crate::features::submissions::models::FormSubmission;
use crate::features::submissions::services::AttachmentService;
use crate::features::templates::models::FormTemplate;
use crate::features::templates::TemplateService;
use crate::modules::webhook::WebhookNotifier;
use crate::shared::constants::MAX_BATCH_SIZE;
use crate::shared::schema::{validate_with_policy, FieldDescriptor, ValidationOutcome};
use crate::shared::types::Meta;

/// Webhook event fired for a single accepted submission
const EVENT_SUBMISSION_CREATED: &str = "submission_created";

/// Webhook event fired for each accepted payload of a batch
const EVENT_BATCH_SUBMISSION_CREATED: &str = "batch_submission_created";

/// Service orchestrating the submission intake flow
///
/// The ordering contract: the payload and any files are fully validated
/// before a path is derived, a row is written or a byte reaches the blob
/// store. Webhook delivery happens after persistence and can never fail a
/// submission.
pub struct SubmissionService {
    pool: PgPool,
    templates: Arc<TemplateService>,
    attachments: Arc<AttachmentService>,
    notifier: WebhookNotifier,
}

impl SubmissionService {
    pub fn new(
        pool: PgPool,
        templates: Arc<TemplateService>,
        attachments: Arc<AttachmentService>,
        notifier: WebhookNotifier,
    ) -> Self {
        Self {
            pool,
            templates,
            attachments,
            notifier,
        }
    }

    /// Submit a JSON-only payload
    pub async fn submit(
        &self,
        template_id: Uuid,
        dto: SubmitFormDto,
        meta: ClientMeta,
    ) -> Result<SubmissionResponseDto> {
        self.submit_with_files(template_id, dto, Vec::new(), meta)
            .await
    }

    /// Submit a payload together with uploaded files
    ///
    /// Each file's detected content type is injected as the value of its
    /// field before validation, so required file fields and their MIME
    /// patterns are checked by the same schema pass as everything else.
    /// Store failures of individual files are reported on the returned
    /// attachment rows; only the template's `all_or_nothing_uploads` policy
    /// turns a partial failure into a rollback.
    pub async fn submit_with_files(
        &self,
        template_id: Uuid,
        dto: SubmitFormDto,
        files: Vec<ReceivedFile>,
        meta: ClientMeta,
    ) -> Result<SubmissionResponseDto> {
        let template = self.templates.get_active(template_id).await?;
        let rules = &template.validation_rules.0;

        let mut payload = dto.data.clone();
        inject_file_values(&mut payload, &template.fields.0, &files);

        let mut violations = match validate_with_policy(
            &template.schema.0,
            &payload,
            rules.allow_additional_properties,
        ) {
            ValidationOutcome::Valid => Vec::new(),
            ValidationOutcome::Invalid(violations) => violations,
        };
        violations.extend(self.attachments.check_files(&template, &files));
        if !violations.is_empty() {
            return Err(AppError::ValidationFailed(violations));
        }

        let submission = self
            .insert_submission(&template, &payload, &dto, &meta)
            .await?;

        let stored = self
            .attachments
            .store_files(&template, submission.id, files)
            .await?;

        if rules.all_or_nothing_uploads && stored.iter().any(|a| !a.is_uploaded()) {
            self.attachments.discard_uploaded(&stored).await;
            self.delete_row(submission.id).await?;
            return Err(AppError::Storage(format!(
                "submission {} rolled back: not all attachments could be stored",
                submission.id
            )));
        }

        info!(
            "Submission created: id={}, template={}, attachments={}",
            submission.id,
            template.id,
            stored.len()
        );

        self.notify(EVENT_SUBMISSION_CREATED, &template, &submission);

        Ok(SubmissionResponseDto::from(submission)
            .with_attachments(stored.into_iter().map(Into::into).collect()))
    }

    /// Submit up to [`MAX_BATCH_SIZE`] payloads in one request, reporting a
    /// per-index outcome. Invalid payloads never abort the rest; only
    /// infrastructure errors do.
    pub async fn submit_batch(
        &self,
        template_id: Uuid,
        dto: BatchSubmitDto,
        meta: ClientMeta,
    ) -> Result<Vec<BatchItemResultDto>> {
        if dto.submissions.is_empty() {
            return Err(AppError::BadRequest(
                "Batch contains no submissions".to_string(),
            ));
        }
        if dto.submissions.len() > MAX_BATCH_SIZE {
            return Err(AppError::BadRequest(format!(
                "Batch size {} exceeds the maximum of {}",
                dto.submissions.len(),
                MAX_BATCH_SIZE
            )));
        }

        let template = self.templates.get_active(template_id).await?;
        let rules = &template.validation_rules.0;

        let mut results = Vec::with_capacity(dto.submissions.len());
        for (index, item) in dto.submissions.into_iter().enumerate() {
            if let Err(e) = item.validate() {
                results.push(BatchItemResultDto::failed(index, vec![e.to_string()]));
                continue;
            }
            match validate_with_policy(
                &template.schema.0,
                &item.data,
                rules.allow_additional_properties,
            ) {
                ValidationOutcome::Invalid(violations) => {
                    results.push(BatchItemResultDto::failed(
                        index,
                        violations.iter().map(ToString::to_string).collect(),
                    ));
                }
                ValidationOutcome::Valid => {
                    let submission = self
                        .insert_submission(&template, &item.data, &item, &meta)
                        .await?;
                    self.notify(EVENT_BATCH_SUBMISSION_CREATED, &template, &submission);
                    results.push(BatchItemResultDto::ok(index, submission.id));
                }
            }
        }

        let succeeded = results.iter().filter(|r| r.success).count();
        info!(
            "Batch processed for template {}: {} of {} succeeded",
            template.id,
            succeeded,
            results.len()
        );

        Ok(results)
    }

    /// List a template's submissions, newest first
    pub async fn list(
        &self,
        template_id: Uuid,
        query: &ListSubmissionsQuery,
    ) -> Result<(Vec<SubmissionResponseDto>, Meta)> {
        // 404 for templates that never existed; inactive ones still list
        self.templates.get(template_id).await?;

        let submissions = sqlx::query_as::<_, FormSubmission>(
            r#"
            SELECT * FROM form_submissions
            WHERE template_id = $1
              AND ($2::boolean IS NULL OR is_processed = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(template_id)
        .bind(query.is_processed)
        .bind(query.limit())
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM form_submissions
            WHERE template_id = $1
              AND ($2::boolean IS NULL OR is_processed = $2)
            "#,
        )
        .bind(template_id)
        .bind(query.is_processed)
        .fetch_one(&self.pool)
        .await?;

        let meta = Meta {
            total,
            page: query.page.max(1),
            page_size: query.limit(),
        };

        Ok((submissions.into_iter().map(Into::into).collect(), meta))
    }

    /// Get one submission with its attachments
    pub async fn get(&self, id: Uuid) -> Result<SubmissionResponseDto> {
        let submission = self.fetch(id).await?;
        let attachments = self.attachments.list_for_submission(id).await?;

        Ok(SubmissionResponseDto::from(submission)
            .with_attachments(attachments.into_iter().map(Into::into).collect()))
    }

    /// Update the processing state; absent fields keep their value
    pub async fn update_status(
        &self,
        id: Uuid,
        dto: UpdateSubmissionStatusDto,
    ) -> Result<SubmissionResponseDto> {
        if dto.is_processed.is_none() && dto.processing_notes.is_none() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }

        let submission = sqlx::query_as::<_, FormSubmission>(
            r#"
            UPDATE form_submissions
            SET is_processed = COALESCE($2, is_processed),
                processing_notes = COALESCE($3, processing_notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(dto.is_processed)
        .bind(&dto.processing_notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Submission {} not found", id)))?;

        info!(
            "Submission status updated: id={}, is_processed={}",
            submission.id, submission.is_processed
        );

        Ok(submission.into())
    }

    async fn insert_submission(
        &self,
        template: &FormTemplate,
        payload: &Value,
        dto: &SubmitFormDto,
        meta: &ClientMeta,
    ) -> Result<FormSubmission> {
        let language = dto
            .language
            .clone()
            .unwrap_or_else(|| template.default_language.clone());

        Ok(sqlx::query_as::<_, FormSubmission>(
            r#"
            INSERT INTO form_submissions (
                id, template_id, data, submitted_by, language,
                project_context, ip_address, user_agent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(template.id)
        .bind(payload)
        .bind(&dto.submitted_by)
        .bind(&language)
        .bind(&dto.project_context)
        .bind(&meta.ip_address)
        .bind(&meta.user_agent)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn fetch(&self, id: Uuid) -> Result<FormSubmission> {
        sqlx::query_as::<_, FormSubmission>("SELECT * FROM form_submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Submission {} not found", id)))
    }

    async fn delete_row(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM form_submissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn notify(&self, event_type: &str, template: &FormTemplate, submission: &FormSubmission) {
        self.notifier.notify(
            event_type,
            template.id,
            template.webhook_url.clone(),
            json!({
                "submission_id": submission.id,
                "template_name": template.name,
                "project_id": template.project_id,
                "data": submission.data,
                "submitted_by": submission.submitted_by,
                "project_context": submission.project_context,
                "submitted_at": submission.created_at,
            }),
        );
    }
}

/// Replace each uploaded file's field value with the file's content type so
/// the schema pass can check required file fields and their MIME patterns.
/// Only declared file fields are touched; anything else stays as sent and
/// gets reported by the regular checks.
fn inject_file_values(payload: &mut Value, fields: &[FieldDescriptor], files: &[ReceivedFile]) {
    let Some(object) = payload.as_object_mut() else {
        return;
    };
    for file in files {
        let declared = fields
            .iter()
            .any(|f| f.name == file.field_name && f.kind.is_file());
        if declared {
            object.insert(
                file.field_name.clone(),
                Value::String(file.content_type.clone()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::schema::FieldSpec;

    fn fields() -> Vec<FieldDescriptor> {
        let name = FieldSpec::new("name", "string");
        let mut photo = FieldSpec::new("photo", "file");
        photo.required = true;
        FieldDescriptor::parse_all(&[name, photo]).unwrap()
    }

    fn received(field: &str, content_type: &str) -> ReceivedFile {
        ReceivedFile {
            field_name: field.to_string(),
            filename: "f.bin".to_string(),
            content_type: content_type.to_string(),
            data: vec![0; 4],
        }
    }

    #[test]
    fn file_values_are_injected_for_declared_file_fields() {
        let mut payload = json!({"name": "Ana"});
        inject_file_values(&mut payload, &fields(), &[received("photo", "image/png")]);
        assert_eq!(payload["photo"], json!("image/png"));
        assert_eq!(payload["name"], json!("Ana"));
    }

    #[test]
    fn unknown_and_non_file_parts_are_not_injected() {
        let mut payload = json!({});
        inject_file_values(
            &mut payload,
            &fields(),
            &[received("name", "text/plain"), received("other", "text/plain")],
        );
        // neither key appears, so the regular checks still see the mismatch
        assert_eq!(payload, json!({}));
    }

    #[test]
    fn non_object_payloads_are_left_alone() {
        let mut payload = json!([1, 2, 3]);
        inject_file_values(&mut payload, &fields(), &[received("photo", "image/png")]);
        assert_eq!(payload, json!([1, 2, 3]));
    }
}
