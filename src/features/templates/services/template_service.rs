use std::sync::Arc;

use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::templates::dtos::{
    CreateTemplateDto, DailySubmissionsDto, ListTemplatesQuery, ProjectStatsDto,
    ProjectStatsQuery, TemplateResponseDto, TopTemplateDto, UpdateTemplateDto,
};
use crate::features::templates::models::FormTemplate;
use crate::shared::schema::{FieldDescriptor, SchemaCache};
use crate::shared::types::Meta;

/// How many templates the stats endpoint ranks
const TOP_TEMPLATES_LIMIT: i64 = 10;

/// Service for template operations
///
/// Owns the write path for templates: every stored schema comes out of the
/// generator (through the cache), never from the request body.
pub struct TemplateService {
    pool: PgPool,
    schema_cache: Arc<SchemaCache>,
}

impl TemplateService {
    pub fn new(pool: PgPool, schema_cache: Arc<SchemaCache>) -> Self {
        Self { pool, schema_cache }
    }

    /// Parse the wire field specs, generate the schema and persist the template
    pub async fn create(&self, dto: CreateTemplateDto) -> Result<TemplateResponseDto> {
        let descriptors = FieldDescriptor::parse_all(&dto.fields)?;
        let schema = self.schema_cache.get_or_generate(&descriptors)?;

        let rules = dto.validation_rules.unwrap_or_default();
        let default_language = dto.default_language.unwrap_or_else(|| "en".to_string());
        let id = Uuid::now_v7();

        let template = sqlx::query_as::<_, FormTemplate>(
            r#"
            INSERT INTO form_templates (
                id, name, description, project_id, fields, schema,
                validation_rules, translations, default_language, webhook_url, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&dto.name)
        .bind(&dto.description)
        .bind(&dto.project_id)
        .bind(Json(&descriptors))
        .bind(Json(&schema))
        .bind(Json(&rules))
        .bind(dto.translations.as_ref().map(Json))
        .bind(&default_language)
        .bind(&dto.webhook_url)
        .bind(&dto.created_by)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Template created: id={}, name={}, project={}, fields={}",
            template.id,
            template.name,
            template.project_id,
            descriptors.len()
        );

        Ok(template.into())
    }

    /// Get a template by ID, active or not
    pub async fn get(&self, id: Uuid) -> Result<TemplateResponseDto> {
        Ok(self.fetch(id).await?.into())
    }

    /// Get an active template by ID; inactive templates do not accept
    /// submissions, so the submission path resolves templates through this.
    pub async fn get_active(&self, id: Uuid) -> Result<FormTemplate> {
        sqlx::query_as::<_, FormTemplate>(
            "SELECT * FROM form_templates WHERE id = $1 AND is_active",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::TemplateNotFound(id))
    }

    /// List templates, newest first
    pub async fn list(
        &self,
        query: &ListTemplatesQuery,
    ) -> Result<(Vec<TemplateResponseDto>, Meta)> {
        let templates = sqlx::query_as::<_, FormTemplate>(
            r#"
            SELECT * FROM form_templates
            WHERE ($1::varchar IS NULL OR project_id = $1)
              AND ($2 OR is_active)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&query.project_id)
        .bind(query.include_inactive)
        .bind(query.limit())
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM form_templates
            WHERE ($1::varchar IS NULL OR project_id = $1)
              AND ($2 OR is_active)
            "#,
        )
        .bind(&query.project_id)
        .bind(query.include_inactive)
        .fetch_one(&self.pool)
        .await?;

        let meta = Meta {
            total,
            page: query.page.max(1),
            page_size: query.limit(),
        };

        Ok((templates.into_iter().map(Into::into).collect(), meta))
    }

    /// Apply changes to a template. A new field list regenerates the schema
    /// from scratch; the stored schema is never patched in place.
    pub async fn update(&self, id: Uuid, dto: UpdateTemplateDto) -> Result<TemplateResponseDto> {
        let current = self.fetch(id).await?;

        let (descriptors, schema) = match &dto.fields {
            Some(specs) => {
                let descriptors = FieldDescriptor::parse_all(specs)?;
                let schema = self.schema_cache.get_or_generate(&descriptors)?;
                (descriptors, schema)
            }
            None => (current.fields.0, current.schema.0),
        };

        let name = dto.name.unwrap_or(current.name);
        let description = dto.description.or(current.description);
        let rules = dto.validation_rules.unwrap_or(current.validation_rules.0);
        let translations = dto.translations.or(current.translations.map(|t| t.0));
        let default_language = dto.default_language.unwrap_or(current.default_language);
        let webhook_url = dto.webhook_url.or(current.webhook_url);
        let is_active = dto.is_active.unwrap_or(current.is_active);

        let template = sqlx::query_as::<_, FormTemplate>(
            r#"
            UPDATE form_templates
            SET name = $2, description = $3, fields = $4, schema = $5,
                validation_rules = $6, translations = $7, default_language = $8,
                webhook_url = $9, is_active = $10, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(&description)
        .bind(Json(&descriptors))
        .bind(Json(&schema))
        .bind(Json(&rules))
        .bind(translations.as_ref().map(Json))
        .bind(&default_language)
        .bind(&webhook_url)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await?;

        info!("Template updated: id={}, name={}", template.id, template.name);

        Ok(template.into())
    }

    /// Soft delete: clears the active flag, existing submissions stay intact
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE form_templates SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::TemplateNotFound(id));
        }

        info!("Template soft deleted: id={}", id);
        Ok(())
    }

    /// Project-level dashboard: totals, the busiest templates and a per-day
    /// submission series over the requested window
    pub async fn project_stats(
        &self,
        project_id: &str,
        query: &ProjectStatsQuery,
    ) -> Result<ProjectStatsDto> {
        let days = query.window_days();
        let since = Utc::now() - chrono::Duration::days(days);

        let total_templates: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM form_templates WHERE project_id = $1 AND is_active",
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await?;

        let total_submissions: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM form_submissions s
            JOIN form_templates t ON t.id = s.template_id
            WHERE t.project_id = $1 AND s.created_at >= $2
            "#,
        )
        .bind(project_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        let top_templates = sqlx::query_as::<_, TopTemplateDto>(
            r#"
            SELECT t.id, t.name, COUNT(s.id) AS submissions
            FROM form_templates t
            LEFT JOIN form_submissions s
                ON s.template_id = t.id AND s.created_at >= $2
            WHERE t.project_id = $1
            GROUP BY t.id, t.name
            ORDER BY submissions DESC, t.name
            LIMIT $3
            "#,
        )
        .bind(project_id)
        .bind(since)
        .bind(TOP_TEMPLATES_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let daily_submissions = sqlx::query_as::<_, DailySubmissionsDto>(
            r#"
            SELECT DATE(s.created_at) AS date, COUNT(*) AS count
            FROM form_submissions s
            JOIN form_templates t ON t.id = s.template_id
            WHERE t.project_id = $1 AND s.created_at >= $2
            GROUP BY DATE(s.created_at)
            ORDER BY date
            "#,
        )
        .bind(project_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let avg_submissions_per_day =
            ((total_submissions as f64 / days as f64) * 100.0).round() / 100.0;

        Ok(ProjectStatsDto {
            project_id: project_id.to_string(),
            period_days: days,
            total_templates,
            total_submissions,
            avg_submissions_per_day,
            top_templates,
            daily_submissions,
        })
    }

    async fn fetch(&self, id: Uuid) -> Result<FormTemplate> {
        sqlx::query_as::<_, FormTemplate>("SELECT * FROM form_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::TemplateNotFound(id))
    }
}
