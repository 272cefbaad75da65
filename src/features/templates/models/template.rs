use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::shared::schema::{FieldDescriptor, SchemaDocument};

/// Per-template validation policy, stored as JSONB beside the schema.
///
/// Missing keys fall back to the defaults, so a template created without
/// explicit rules rejects unknown payload keys and checks file types.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ValidationRules {
    /// Accept payload keys that are not declared fields
    pub allow_additional_properties: bool,
    /// Enforce each file field's accepted MIME types on upload
    pub validate_file_types: bool,
    /// Per-template upload size ceiling in bytes; the global limit still applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
    /// Per-template cap on files per field; the global limit still applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_files_per_field: Option<u32>,
    /// Reject the whole submission when any of its attachments fails to store
    pub all_or_nothing_uploads: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            allow_additional_properties: false,
            validate_file_types: true,
            max_file_size: None,
            max_files_per_field: None,
            all_or_nothing_uploads: false,
        }
    }
}

/// Per-language display text overrides for a template
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TranslationOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Field name -> translated label
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_labels: BTreeMap<String, String>,
}

/// Database model for a form template
///
/// `schema` is always derived from `fields` at write time; the two columns
/// never diverge, so re-generating from the stored field list reproduces the
/// stored schema byte for byte.
#[derive(Debug, Clone, FromRow)]
pub struct FormTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub project_id: String,
    pub fields: Json<Vec<FieldDescriptor>>,
    pub schema: Json<SchemaDocument>,
    pub validation_rules: Json<ValidationRules>,
    pub translations: Option<Json<BTreeMap<String, TranslationOverlay>>>,
    pub default_language: String,
    pub webhook_url: Option<String>,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_default_to_the_strict_policy() {
        // An empty JSONB object is what the database stores for templates
        // created without explicit rules.
        let rules: ValidationRules = serde_json::from_str("{}").unwrap();
        assert!(!rules.allow_additional_properties);
        assert!(rules.validate_file_types);
        assert!(!rules.all_or_nothing_uploads);
        assert_eq!(rules.max_file_size, None);
    }

    #[test]
    fn partial_rules_keep_unset_defaults() {
        let rules: ValidationRules =
            serde_json::from_str(r#"{"allow_additional_properties": true}"#).unwrap();
        assert!(rules.allow_additional_properties);
        assert!(rules.validate_file_types);
    }
}
