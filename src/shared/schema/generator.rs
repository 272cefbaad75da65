use std::collections::{BTreeMap, HashSet};

use super::document::{ItemsSchema, PropertySchema, SchemaDocument};
use super::field::{ArrayItemType, FieldDescriptor, FieldKind};
use super::SchemaError;

/// Build the schema document for an ordered field list.
///
/// Pure and deterministic: the same input always yields the same document,
/// byte for byte, which is what makes cache keys and stored schemas
/// comparable across processes. Field names must be unique; duplicates are
/// rejected here before any schema is produced.
pub fn generate(fields: &[FieldDescriptor]) -> Result<SchemaDocument, SchemaError> {
    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::InvalidTemplate(format!(
                "duplicate field name `{}`",
                field.name
            )));
        }
    }

    let mut properties = BTreeMap::new();
    let mut required = Vec::new();
    for field in fields {
        properties.insert(field.name.clone(), property_schema(field));
        if field.required {
            required.push(field.name.clone());
        }
    }

    Ok(SchemaDocument {
        schema_type: "object".to_string(),
        properties,
        required,
        additional_properties: false,
    })
}

fn property_schema(field: &FieldDescriptor) -> PropertySchema {
    let mut prop = PropertySchema::new(
        schema_primitive(&field.kind),
        field.label.clone(),
        field.description.clone().unwrap_or_default(),
    );

    match &field.kind {
        FieldKind::String {
            min_length,
            max_length,
            pattern,
            format,
        } => {
            prop.min_length = *min_length;
            prop.max_length = *max_length;
            prop.pattern = pattern.clone();
            prop.format = *format;
        }
        FieldKind::Number { minimum, maximum } | FieldKind::Integer { minimum, maximum } => {
            prop.minimum = minimum.clone();
            prop.maximum = maximum.clone();
        }
        FieldKind::Boolean | FieldKind::Object => {}
        FieldKind::Array {
            min_items,
            max_items,
            item_type,
        } => {
            prop.items = Some(ItemsSchema {
                item_type: item_type.unwrap_or(ArrayItemType::String),
            });
            prop.min_items = *min_items;
            prop.max_items = *max_items;
        }
        // Files validate as stored references: the submitted value is the
        // detected content type, matched against the accepted MIME list.
        FieldKind::File { accepted_types, .. } => {
            if !accepted_types.is_empty() {
                prop.pattern = Some(mime_pattern(accepted_types));
            }
        }
    }

    prop.enum_values = field.enum_values.clone();
    prop
}

fn schema_primitive(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::String { .. } | FieldKind::File { .. } => "string",
        FieldKind::Number { .. } => "number",
        FieldKind::Integer { .. } => "integer",
        FieldKind::Boolean => "boolean",
        FieldKind::Array { .. } => "array",
        FieldKind::Object => "object",
    }
}

fn mime_pattern(accepted: &[String]) -> String {
    let alternatives: Vec<String> = accepted.iter().map(|t| regex::escape(t)).collect();
    format!("({})", alternatives.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::schema::FieldSpec;
    use serde_json::{json, Number};

    fn parse(specs: &[FieldSpec]) -> Vec<FieldDescriptor> {
        FieldDescriptor::parse_all(specs).unwrap()
    }

    fn contact_fields() -> Vec<FieldDescriptor> {
        let mut email = FieldSpec::new("email", "string");
        email.format = Some("email".to_string());
        email.required = true;
        let mut age = FieldSpec::new("age", "integer");
        age.minimum = Some(Number::from(0));
        parse(&[email, age])
    }

    #[test]
    fn generates_schema_with_required_and_constraints() {
        let doc = generate(&contact_fields()).unwrap();

        assert_eq!(doc.required, vec!["email"]);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["type"], json!("object"));
        assert_eq!(value["properties"]["email"]["format"], json!("email"));
        assert_eq!(value["properties"]["email"]["type"], json!("string"));
        assert_eq!(value["properties"]["age"]["minimum"], json!(0));
        assert_eq!(value["additionalProperties"], json!(false));
    }

    #[test]
    fn rejects_duplicate_field_names_before_generating() {
        let fields = parse(&[FieldSpec::new("name", "string"), FieldSpec::new("name", "integer")]);
        let err = generate(&fields).unwrap_err();
        match err {
            SchemaError::InvalidTemplate(message) => assert!(message.contains("name")),
            other => panic!("expected InvalidTemplate, got {other:?}"),
        }
    }

    #[test]
    fn output_is_byte_identical_across_calls() {
        let fields = contact_fields();
        let first = serde_json::to_string(&generate(&fields).unwrap()).unwrap();
        let second = serde_json::to_string(&generate(&fields).unwrap()).unwrap();
        assert_eq!(first, second);

        // Integer bounds stay integers in the serialized form.
        assert!(first.contains("\"minimum\":0"));
        assert!(!first.contains("0.0"));
    }

    #[test]
    fn required_preserves_field_declaration_order() {
        let mut zeta = FieldSpec::new("zeta", "string");
        zeta.required = true;
        let mut alpha = FieldSpec::new("alpha", "string");
        alpha.required = true;
        let doc = generate(&parse(&[zeta, alpha])).unwrap();

        assert_eq!(doc.required, vec!["zeta", "alpha"]);
        // Properties themselves are stored sorted by name.
        let names: Vec<&String> = doc.properties.keys().collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn file_fields_become_string_entries_with_mime_pattern() {
        let mut upload = FieldSpec::new("attachment", "file");
        upload.accepted_types = Some(vec![
            "application/pdf".to_string(),
            "image/svg+xml".to_string(),
        ]);
        let doc = generate(&parse(&[upload])).unwrap();

        let prop = &doc.properties["attachment"];
        assert_eq!(prop.schema_type, "string");
        assert_eq!(
            prop.pattern.as_deref(),
            Some(r"(application/pdf|image/svg\+xml)")
        );
    }

    #[test]
    fn file_field_without_accepted_types_has_no_pattern() {
        let doc = generate(&parse(&[FieldSpec::new("attachment", "file")])).unwrap();
        assert_eq!(doc.properties["attachment"].pattern, None);
    }

    #[test]
    fn array_items_default_to_string_elements() {
        let mut tags = FieldSpec::new("tags", "array");
        tags.max_items = Some(5);
        let mut scores = FieldSpec::new("scores", "array");
        scores.item_type = Some("integer".to_string());
        let doc = generate(&parse(&[tags, scores])).unwrap();

        assert_eq!(
            doc.properties["tags"].items,
            Some(ItemsSchema {
                item_type: ArrayItemType::String
            })
        );
        assert_eq!(
            doc.properties["scores"].items,
            Some(ItemsSchema {
                item_type: ArrayItemType::Integer
            })
        );
    }

    #[test]
    fn empty_field_list_generates_an_empty_object_schema() {
        let doc = generate(&[]).unwrap();
        assert!(doc.properties.is_empty());
        assert!(doc.required.is_empty());
        assert!(!doc.additional_properties);
    }

    #[test]
    fn stored_document_round_trips_to_the_same_value() {
        let doc = generate(&contact_fields()).unwrap();
        let stored = serde_json::to_string(&doc).unwrap();
        let loaded: SchemaDocument = serde_json::from_str(&stored).unwrap();
        assert_eq!(loaded, doc);
    }
}
