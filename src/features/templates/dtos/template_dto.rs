use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::templates::models::{FormTemplate, TranslationOverlay, ValidationRules};
use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::shared::schema::{FieldDescriptor, FieldSpec, SchemaDocument};

/// Request DTO for creating a template
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateTemplateDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must not exceed 2000 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Project ID must be 1-100 characters"))]
    pub project_id: String,

    /// Ordered field definitions; the schema is generated from these
    #[validate(length(min = 1, message = "At least one field is required"))]
    pub fields: Vec<FieldSpec>,

    pub validation_rules: Option<ValidationRules>,

    /// Language code -> display text overrides
    pub translations: Option<BTreeMap<String, TranslationOverlay>>,

    /// Defaults to "en"
    pub default_language: Option<String>,

    /// Notified about this template's submissions, on top of the global URLs
    #[validate(url(message = "Invalid webhook URL"))]
    pub webhook_url: Option<String>,

    #[validate(length(max = 255, message = "Created by must not exceed 255 characters"))]
    pub created_by: Option<String>,
}

/// Request DTO for updating a template. Absent fields keep their value;
/// a new `fields` list regenerates the schema from scratch.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateTemplateDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description must not exceed 2000 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 1, message = "At least one field is required"))]
    pub fields: Option<Vec<FieldSpec>>,

    pub validation_rules: Option<ValidationRules>,

    pub translations: Option<BTreeMap<String, TranslationOverlay>>,

    pub default_language: Option<String>,

    #[validate(url(message = "Invalid webhook URL"))]
    pub webhook_url: Option<String>,

    pub is_active: Option<bool>,
}

/// Query params for listing templates
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListTemplatesQuery {
    /// Restrict to one project
    pub project_id: Option<String>,
    /// Include soft-deleted templates
    #[serde(default)]
    pub include_inactive: bool,
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

impl ListTemplatesQuery {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }

    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

/// Response DTO for a template
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemplateResponseDto {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub project_id: String,
    #[schema(value_type = Vec<FieldSpec>)]
    pub fields: Vec<FieldDescriptor>,
    /// Generated validation schema, derived from `fields`
    #[schema(value_type = Object)]
    pub schema: SchemaDocument,
    pub validation_rules: ValidationRules,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translations: Option<BTreeMap<String, TranslationOverlay>>,
    pub default_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FormTemplate> for TemplateResponseDto {
    fn from(template: FormTemplate) -> Self {
        Self {
            id: template.id,
            name: template.name,
            description: template.description,
            project_id: template.project_id,
            fields: template.fields.0,
            schema: template.schema.0,
            validation_rules: template.validation_rules.0,
            translations: template.translations.map(|t| t.0),
            default_language: template.default_language,
            webhook_url: template.webhook_url,
            is_active: template.is_active,
            created_by: template.created_by,
            created_at: template.created_at,
            updated_at: template.updated_at,
        }
    }
}
