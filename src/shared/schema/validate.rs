use regex::Regex;
use serde_json::{Number, Value};

use crate::shared::validation::{
    is_valid_date, is_valid_datetime, is_valid_email, is_valid_phone, is_valid_url,
};

use super::document::{PropertySchema, SchemaDocument};
use super::field::{ArrayItemType, StringFormat};

/// One rule violation, addressed by dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field_path: String,
    pub message: String,
}

impl Violation {
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field_path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.field_path, self.message)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(Vec<Violation>),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Violations carried by an invalid outcome; empty when valid.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Valid => &[],
            Self::Invalid(violations) => violations,
        }
    }
}

/// Check `payload` against `schema`, honoring the document's own
/// `additionalProperties` flag.
pub fn validate(schema: &SchemaDocument, payload: &Value) -> ValidationOutcome {
    validate_with_policy(schema, payload, schema.additional_properties)
}

/// Check `payload` against `schema`, with `allow_additional` overriding the
/// document's `additionalProperties` flag (per-template validation rules can
/// relax the policy without regenerating the schema).
///
/// Collects every violation in a single pass rather than stopping at the
/// first, so a submitter sees all problems at once. Deterministic for a given
/// schema and payload, and free of side effects.
pub fn validate_with_policy(
    schema: &SchemaDocument,
    payload: &Value,
    allow_additional: bool,
) -> ValidationOutcome {
    let Some(object) = payload.as_object() else {
        return ValidationOutcome::Invalid(vec![Violation::new(
            "",
            "payload must be a JSON object",
        )]);
    };

    let mut violations = Vec::new();

    if !allow_additional {
        for key in object.keys() {
            if !schema.properties.contains_key(key) {
                violations.push(Violation::new(key, "is not a recognized field"));
            }
        }
    }

    for name in &schema.required {
        check_required(schema, object, name, &mut violations);
    }

    for (name, property) in &schema.properties {
        let Some(value) = object.get(name) else {
            continue;
        };
        // Explicit null counts as not provided; the required pass above
        // already reported it where that matters.
        if value.is_null() {
            continue;
        }
        // A blank required string was reported as such; skip the constraint
        // checks that would pile on top of it.
        if property.schema_type == "string"
            && is_blank_string(value)
            && schema.required.iter().any(|required| required == name)
        {
            continue;
        }
        check_property(name, property, value, &mut violations);
    }

    if violations.is_empty() {
        ValidationOutcome::Valid
    } else {
        ValidationOutcome::Invalid(violations)
    }
}

fn check_required(
    schema: &SchemaDocument,
    object: &serde_json::Map<String, Value>,
    name: &str,
    violations: &mut Vec<Violation>,
) {
    match object.get(name) {
        None | Some(Value::Null) => violations.push(Violation::new(name, "is required")),
        Some(value) => {
            let string_typed = schema
                .properties
                .get(name)
                .map(|property| property.schema_type == "string")
                .unwrap_or(false);
            if string_typed && is_blank_string(value) {
                violations.push(Violation::new(name, "must not be empty"));
            }
        }
    }
}

fn check_property(
    name: &str,
    property: &PropertySchema,
    value: &Value,
    violations: &mut Vec<Violation>,
) {
    let type_ok = match property.schema_type.as_str() {
        "string" => check_string(name, property, value, violations),
        "number" => check_number(name, property, value, violations),
        "integer" => check_integer(name, property, value, violations),
        "boolean" => check_simple(name, value.is_boolean(), "expected a boolean", violations),
        "array" => check_array(name, property, value, violations),
        "object" => check_simple(name, value.is_object(), "expected an object", violations),
        // Unknown primitive in a hand-edited document: nothing to check.
        _ => true,
    };

    if type_ok {
        if let Some(allowed) = &property.enum_values {
            if !allowed.contains(value) {
                violations.push(Violation::new(name, "must be one of the allowed values"));
            }
        }
    }
}

fn check_simple(
    name: &str,
    type_ok: bool,
    message: &str,
    violations: &mut Vec<Violation>,
) -> bool {
    if !type_ok {
        violations.push(Violation::new(name, message));
    }
    type_ok
}

fn check_string(
    name: &str,
    property: &PropertySchema,
    value: &Value,
    violations: &mut Vec<Violation>,
) -> bool {
    let Some(text) = value.as_str() else {
        violations.push(Violation::new(name, "expected a string"));
        return false;
    };

    let length = text.chars().count() as u32;
    if let Some(min) = property.min_length {
        if length < min {
            violations.push(Violation::new(
                name,
                format!("must be at least {min} characters"),
            ));
        }
    }
    if let Some(max) = property.max_length {
        if length > max {
            violations.push(Violation::new(
                name,
                format!("must be at most {max} characters"),
            ));
        }
    }
    if let Some(pattern) = &property.pattern {
        if let Ok(re) = Regex::new(pattern) {
            if !re.is_match(text) {
                violations.push(Violation::new(name, "does not match the required pattern"));
            }
        }
    }
    if let Some(format) = property.format {
        let (ok, message) = match format {
            StringFormat::Email => (is_valid_email(text), "must be a valid email address"),
            StringFormat::Date => (is_valid_date(text), "must be a valid date (YYYY-MM-DD)"),
            StringFormat::Datetime => (
                is_valid_datetime(text),
                "must be a valid RFC 3339 datetime",
            ),
            StringFormat::Url => (is_valid_url(text), "must be a valid URL"),
            StringFormat::Phone => (is_valid_phone(text), "must be a valid phone number"),
        };
        if !ok {
            violations.push(Violation::new(name, message));
        }
    }

    true
}

fn check_number(
    name: &str,
    property: &PropertySchema,
    value: &Value,
    violations: &mut Vec<Violation>,
) -> bool {
    let Value::Number(number) = value else {
        violations.push(Violation::new(name, "expected a number"));
        return false;
    };
    check_bounds(name, property, number, violations);
    true
}

fn check_integer(
    name: &str,
    property: &PropertySchema,
    value: &Value,
    violations: &mut Vec<Violation>,
) -> bool {
    let Value::Number(number) = value else {
        violations.push(Violation::new(name, "expected an integer"));
        return false;
    };
    if !is_whole_number(number) {
        violations.push(Violation::new(name, "expected an integer"));
        return false;
    }
    check_bounds(name, property, number, violations);
    true
}

fn check_bounds(
    name: &str,
    property: &PropertySchema,
    number: &Number,
    violations: &mut Vec<Violation>,
) {
    let value = number.as_f64().unwrap_or(0.0);
    if let Some(minimum) = &property.minimum {
        if value < minimum.as_f64().unwrap_or(f64::NEG_INFINITY) {
            violations.push(Violation::new(name, format!("must be at least {minimum}")));
        }
    }
    if let Some(maximum) = &property.maximum {
        if value > maximum.as_f64().unwrap_or(f64::INFINITY) {
            violations.push(Violation::new(name, format!("must be at most {maximum}")));
        }
    }
}

fn check_array(
    name: &str,
    property: &PropertySchema,
    value: &Value,
    violations: &mut Vec<Violation>,
) -> bool {
    let Value::Array(items) = value else {
        violations.push(Violation::new(name, "expected an array"));
        return false;
    };

    let count = items.len() as u32;
    if let Some(min) = property.min_items {
        if count < min {
            violations.push(Violation::new(
                name,
                format!("must have at least {min} items"),
            ));
        }
    }
    if let Some(max) = property.max_items {
        if count > max {
            violations.push(Violation::new(
                name,
                format!("must have at most {max} items"),
            ));
        }
    }
    if let Some(items_schema) = &property.items {
        for (index, item) in items.iter().enumerate() {
            if !item_matches(items_schema.item_type, item) {
                let message = match items_schema.item_type {
                    ArrayItemType::String => "expected a string",
                    ArrayItemType::Number => "expected a number",
                    ArrayItemType::Integer => "expected an integer",
                    ArrayItemType::Boolean => "expected a boolean",
                };
                violations.push(Violation::new(format!("{name}.{index}"), message));
            }
        }
    }

    true
}

fn item_matches(item_type: ArrayItemType, value: &Value) -> bool {
    match item_type {
        ArrayItemType::String => value.is_string(),
        ArrayItemType::Number => value.is_number(),
        ArrayItemType::Integer => matches!(value, Value::Number(n) if is_whole_number(n)),
        ArrayItemType::Boolean => value.is_boolean(),
    }
}

fn is_blank_string(value: &Value) -> bool {
    value.as_str().map(|s| s.trim().is_empty()).unwrap_or(false)
}

fn is_whole_number(number: &Number) -> bool {
    number.is_i64()
        || number.is_u64()
        || number.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::schema::{generate, FieldDescriptor, FieldSpec};
    use serde_json::json;

    fn build(specs: Vec<FieldSpec>) -> SchemaDocument {
        generate(&FieldDescriptor::parse_all(&specs).unwrap()).unwrap()
    }

    fn contact_schema() -> SchemaDocument {
        let mut email = FieldSpec::new("email", "string");
        email.format = Some("email".to_string());
        email.required = true;
        let mut age = FieldSpec::new("age", "integer");
        age.minimum = Some(Number::from(0));
        build(vec![email, age])
    }

    #[test]
    fn accepts_a_conforming_payload() {
        let outcome = validate(&contact_schema(), &json!({"email": "a@b.com", "age": 30}));
        assert_eq!(outcome, ValidationOutcome::Valid);
    }

    #[test]
    fn collects_every_violation_in_one_pass() {
        let outcome = validate(&contact_schema(), &json!({"age": -5}));
        assert_eq!(
            outcome.violations(),
            &[
                Violation::new("email", "is required"),
                Violation::new("age", "must be at least 0"),
            ]
        );
    }

    #[test]
    fn missing_optional_fields_are_not_errors() {
        let outcome = validate(&contact_schema(), &json!({"email": "a@b.com"}));
        assert!(outcome.is_valid());
    }

    #[test]
    fn explicit_null_counts_as_not_provided() {
        let schema = contact_schema();
        assert!(validate(&schema, &json!({"email": "a@b.com", "age": null})).is_valid());

        let outcome = validate(&schema, &json!({"email": null}));
        assert_eq!(
            outcome.violations(),
            &[Violation::new("email", "is required")]
        );
    }

    #[test]
    fn blank_required_string_is_reported_once() {
        let outcome = validate(&contact_schema(), &json!({"email": "   "}));
        assert_eq!(
            outcome.violations(),
            &[Violation::new("email", "must not be empty")]
        );
    }

    #[test]
    fn unknown_keys_are_rejected_by_default() {
        let schema = contact_schema();
        let payload = json!({"email": "a@b.com", "nickname": "zed"});

        let outcome = validate(&schema, &payload);
        assert_eq!(
            outcome.violations(),
            &[Violation::new("nickname", "is not a recognized field")]
        );
    }

    #[test]
    fn policy_override_admits_unknown_keys() {
        let schema = contact_schema();
        let payload = json!({"email": "a@b.com", "nickname": "zed"});
        assert!(validate_with_policy(&schema, &payload, true).is_valid());
    }

    #[test]
    fn non_object_payload_is_a_single_violation() {
        let outcome = validate(&contact_schema(), &json!([1, 2, 3]));
        let violations = outcome.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].to_string(), "payload must be a JSON object");
    }

    #[test]
    fn type_mismatch_suppresses_constraint_noise() {
        let outcome = validate(&contact_schema(), &json!({"email": "a@b.com", "age": "thirty"}));
        assert_eq!(
            outcome.violations(),
            &[Violation::new("age", "expected an integer")]
        );
    }

    #[test]
    fn integer_accepts_whole_floats_and_rejects_fractions() {
        let schema = contact_schema();
        assert!(validate(&schema, &json!({"email": "a@b.com", "age": 30.0})).is_valid());

        let outcome = validate(&schema, &json!({"email": "a@b.com", "age": 30.5}));
        assert_eq!(
            outcome.violations(),
            &[Violation::new("age", "expected an integer")]
        );
    }

    #[test]
    fn string_length_and_pattern_constraints() {
        let mut code = FieldSpec::new("code", "string");
        code.min_length = Some(3);
        code.max_length = Some(3);
        code.pattern = Some("^[A-Z]+$".to_string());
        let schema = build(vec![code]);

        assert!(validate(&schema, &json!({"code": "ABC"})).is_valid());

        let outcome = validate(&schema, &json!({"code": "ab"}));
        assert_eq!(
            outcome.violations(),
            &[
                Violation::new("code", "must be at least 3 characters"),
                Violation::new("code", "does not match the required pattern"),
            ]
        );
    }

    #[test]
    fn format_checks_cover_date_url_and_phone() {
        let mut starts = FieldSpec::new("starts", "string");
        starts.format = Some("date".to_string());
        let mut site = FieldSpec::new("site", "string");
        site.format = Some("url".to_string());
        let mut phone = FieldSpec::new("phone", "string");
        phone.format = Some("phone".to_string());
        let schema = build(vec![starts, site, phone]);

        let ok = json!({
            "starts": "2025-06-01",
            "site": "https://example.com/forms",
            "phone": "+46 70 123 45 67",
        });
        assert!(validate(&schema, &ok).is_valid());

        let bad = json!({"starts": "2025-02-30", "site": "not a url", "phone": "abc"});
        let violations = validate(&schema, &bad);
        assert_eq!(violations.violations().len(), 3);
    }

    #[test]
    fn array_length_and_element_types() {
        let mut tags = FieldSpec::new("tags", "array");
        tags.min_items = Some(2);
        tags.item_type = Some("string".to_string());
        let schema = build(vec![tags]);

        let outcome = validate(&schema, &json!({"tags": [7]}));
        assert_eq!(
            outcome.violations(),
            &[
                Violation::new("tags", "must have at least 2 items"),
                Violation::new("tags.0", "expected a string"),
            ]
        );

        assert!(validate(&schema, &json!({"tags": ["a", "b"]})).is_valid());
    }

    #[test]
    fn enum_membership_is_enforced() {
        let mut color = FieldSpec::new("color", "string");
        color.enum_values = Some(vec![json!("red"), json!("green")]);
        let schema = build(vec![color]);

        assert!(validate(&schema, &json!({"color": "red"})).is_valid());
        let outcome = validate(&schema, &json!({"color": "blue"}));
        assert_eq!(
            outcome.violations(),
            &[Violation::new("color", "must be one of the allowed values")]
        );
    }

    #[test]
    fn file_entries_validate_the_stored_content_type() {
        let mut upload = FieldSpec::new("attachment", "file");
        upload.accepted_types = Some(vec!["application/pdf".to_string()]);
        upload.required = true;
        let schema = build(vec![upload]);

        assert!(validate(&schema, &json!({"attachment": "application/pdf"})).is_valid());

        let outcome = validate(&schema, &json!({"attachment": "text/html"}));
        assert_eq!(
            outcome.violations(),
            &[Violation::new(
                "attachment",
                "does not match the required pattern"
            )]
        );
    }

    #[test]
    fn every_constraint_satisfied_means_valid() {
        let mut name = FieldSpec::new("name", "string");
        name.required = true;
        name.min_length = Some(2);
        let mut score = FieldSpec::new("score", "number");
        score.minimum = Some(Number::from(0));
        score.maximum = Some(Number::from(100));
        let subscribed = FieldSpec::new("subscribed", "boolean");
        let mut tags = FieldSpec::new("tags", "array");
        tags.max_items = Some(3);
        let extra = FieldSpec::new("extra", "object");
        let schema = build(vec![name, score, subscribed, tags, extra]);

        let payload = json!({
            "name": "Ada",
            "score": 99.5,
            "subscribed": true,
            "tags": ["one", "two"],
            "extra": {"note": "anything"},
        });
        assert_eq!(validate(&schema, &payload), ValidationOutcome::Valid);
    }

    #[test]
    fn violation_display_prefixes_the_dotted_path() {
        let violation = Violation::new("address.city", "is required");
        assert_eq!(violation.to_string(), "address.city: is required");
    }

    #[test]
    fn validation_is_deterministic() {
        let schema = contact_schema();
        let payload = json!({"age": -5, "unexpected": 1});
        assert_eq!(validate(&schema, &payload), validate(&schema, &payload));
    }
}
