use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use utoipa::ToSchema;

use super::SchemaError;

/// String format refinements understood by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StringFormat {
    Email,
    Date,
    Datetime,
    Url,
    Phone,
}

impl StringFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "email" => Some(Self::Email),
            "date" => Some(Self::Date),
            "datetime" => Some(Self::Datetime),
            "url" => Some(Self::Url),
            "phone" => Some(Self::Phone),
            _ => None,
        }
    }
}

impl std::fmt::Display for StringFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StringFormat::Email => write!(f, "email"),
            StringFormat::Date => write!(f, "date"),
            StringFormat::Datetime => write!(f, "datetime"),
            StringFormat::Url => write!(f, "url"),
            StringFormat::Phone => write!(f, "phone"),
        }
    }
}

/// Element type for array fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArrayItemType {
    String,
    Number,
    Integer,
    Boolean,
}

impl ArrayItemType {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ArrayItemType::String => "string",
            ArrayItemType::Number => "number",
            ArrayItemType::Integer => "integer",
            ArrayItemType::Boolean => "boolean",
        }
    }
}

/// Wire-level field definition as accepted by the template API.
///
/// Constraints are free-form at this layer; [`FieldDescriptor::parse`] keeps
/// the ones relevant to the declared type and rejects unusable combinations,
/// so a stored template only ever contains well-formed fields.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FieldSpec {
    /// Field name, used as the JSON object key in payloads
    pub name: String,
    /// Display label; defaults to the field name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// One of: string, number, integer, boolean, array, object, file
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    // String constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// One of: email, date, datetime, url, phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    // Numeric constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub minimum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub maximum: Option<Number>,

    // Array constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,

    // File constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,

    /// Fixed set of allowed values, any type
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub enum_values: Option<Vec<Value>>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            field_type: field_type.into(),
            required: false,
            description: None,
            min_length: None,
            max_length: None,
            pattern: None,
            format: None,
            minimum: None,
            maximum: None,
            min_items: None,
            max_items: None,
            item_type: None,
            accepted_types: None,
            max_file_size: None,
            enum_values: None,
        }
    }
}

/// A single named, typed field within a template. Immutable once stored.
///
/// Serialization note: the tagged `kind` is flattened, so the stored JSON
/// reads `{"name": "email", "type": "string", "format": "email", ...}` with
/// keys in sorted order, which keeps the serialized field list canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// Closed set of field types; each variant carries only the constraints
/// that apply to it, so a string field with a numeric bound cannot exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<StringFormat>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<Number>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<Number>,
    },
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<Number>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<Number>,
    },
    Boolean,
    Array {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_type: Option<ArrayItemType>,
    },
    Object,
    File {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        accepted_types: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_file_size: Option<u64>,
    },
}

impl FieldKind {
    /// Declared type name, as written in field specs.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::String { .. } => "string",
            FieldKind::Number { .. } => "number",
            FieldKind::Integer { .. } => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Array { .. } => "array",
            FieldKind::Object => "object",
            FieldKind::File { .. } => "file",
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, FieldKind::File { .. })
    }
}

impl FieldDescriptor {
    /// Turn a wire-level spec into a typed descriptor.
    ///
    /// Rejects unknown types, unknown formats/item types, uncompilable
    /// patterns and fractional integer bounds. Constraints that do not apply
    /// to the declared type are simply not carried over.
    pub fn parse(spec: &FieldSpec) -> Result<Self, SchemaError> {
        let name = spec.name.trim();
        if name.is_empty() {
            return Err(SchemaError::InvalidTemplate(
                "field with an empty name".to_string(),
            ));
        }

        let kind = match spec.field_type.as_str() {
            "string" => {
                let format = match spec.format.as_deref() {
                    None => None,
                    Some(raw) => Some(StringFormat::parse(raw).ok_or_else(|| {
                        SchemaError::InvalidTemplate(format!(
                            "field `{name}` has unknown format `{raw}`"
                        ))
                    })?),
                };
                if let Some(pattern) = &spec.pattern {
                    Regex::new(pattern).map_err(|_| {
                        SchemaError::InvalidTemplate(format!(
                            "field `{name}` has a pattern that does not compile"
                        ))
                    })?;
                }
                FieldKind::String {
                    min_length: spec.min_length,
                    max_length: spec.max_length,
                    pattern: spec.pattern.clone(),
                    format,
                }
            }
            "number" => FieldKind::Number {
                minimum: spec.minimum.clone(),
                maximum: spec.maximum.clone(),
            },
            "integer" => {
                for bound in [&spec.minimum, &spec.maximum].into_iter().flatten() {
                    if !is_whole(bound) {
                        return Err(SchemaError::InvalidTemplate(format!(
                            "field `{name}` has a fractional integer bound `{bound}`"
                        )));
                    }
                }
                FieldKind::Integer {
                    minimum: spec.minimum.clone(),
                    maximum: spec.maximum.clone(),
                }
            }
            "boolean" => FieldKind::Boolean,
            "array" => {
                let item_type = match spec.item_type.as_deref() {
                    None => None,
                    Some(raw) => Some(ArrayItemType::parse(raw).ok_or_else(|| {
                        SchemaError::InvalidTemplate(format!(
                            "field `{name}` has unsupported item_type `{raw}`"
                        ))
                    })?),
                };
                FieldKind::Array {
                    min_items: spec.min_items,
                    max_items: spec.max_items,
                    item_type,
                }
            }
            "object" => FieldKind::Object,
            "file" => FieldKind::File {
                accepted_types: spec.accepted_types.clone().unwrap_or_default(),
                max_file_size: spec.max_file_size,
            },
            other => {
                return Err(SchemaError::UnsupportedFieldType {
                    field: name.to_string(),
                    ty: other.to_string(),
                })
            }
        };

        Ok(Self {
            name: name.to_string(),
            label: spec
                .label
                .clone()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| name.to_string()),
            description: spec.description.clone(),
            required: spec.required,
            enum_values: spec.enum_values.clone().filter(|v| !v.is_empty()),
            kind,
        })
    }

    /// Parse a whole field list, stopping at the first bad definition.
    pub fn parse_all(specs: &[FieldSpec]) -> Result<Vec<Self>, SchemaError> {
        specs.iter().map(Self::parse).collect()
    }
}

fn is_whole(n: &Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_unknown_type_names_the_field() {
        let spec = FieldSpec::new("color", "rainbow");
        let err = FieldDescriptor::parse(&spec).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnsupportedFieldType {
                field: "color".to_string(),
                ty: "rainbow".to_string(),
            }
        );
    }

    #[test]
    fn parse_rejects_empty_name() {
        let spec = FieldSpec::new("   ", "string");
        assert!(matches!(
            FieldDescriptor::parse(&spec),
            Err(SchemaError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn parse_drops_constraints_foreign_to_the_type() {
        let mut spec = FieldSpec::new("title", "string");
        spec.minimum = Some(Number::from(3));
        spec.min_items = Some(1);
        spec.min_length = Some(2);

        let field = FieldDescriptor::parse(&spec).unwrap();
        match field.kind {
            FieldKind::String {
                min_length,
                max_length,
                pattern,
                format,
            } => {
                assert_eq!(min_length, Some(2));
                assert_eq!(max_length, None);
                assert_eq!(pattern, None);
                assert_eq!(format, None);
            }
            other => panic!("expected string kind, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_unknown_format_and_bad_pattern() {
        let mut spec = FieldSpec::new("email", "string");
        spec.format = Some("zipcode".to_string());
        assert!(matches!(
            FieldDescriptor::parse(&spec),
            Err(SchemaError::InvalidTemplate(_))
        ));

        let mut spec = FieldSpec::new("code", "string");
        spec.pattern = Some("[unclosed".to_string());
        assert!(matches!(
            FieldDescriptor::parse(&spec),
            Err(SchemaError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn parse_rejects_fractional_integer_bounds() {
        let mut spec = FieldSpec::new("age", "integer");
        spec.minimum = serde_json::Number::from_f64(0.5);
        assert!(matches!(
            FieldDescriptor::parse(&spec),
            Err(SchemaError::InvalidTemplate(_))
        ));

        let mut spec = FieldSpec::new("age", "integer");
        spec.minimum = Some(Number::from(0));
        assert!(FieldDescriptor::parse(&spec).is_ok());
    }

    #[test]
    fn label_falls_back_to_name() {
        let field = FieldDescriptor::parse(&FieldSpec::new("city", "string")).unwrap();
        assert_eq!(field.label, "city");

        let mut spec = FieldSpec::new("city", "string");
        spec.label = Some("City of residence".to_string());
        let field = FieldDescriptor::parse(&spec).unwrap();
        assert_eq!(field.label, "City of residence");
    }

    #[test]
    fn descriptor_serializes_with_flattened_type_tag() {
        let mut spec = FieldSpec::new("email", "string");
        spec.format = Some("email".to_string());
        spec.required = true;
        let field = FieldDescriptor::parse(&spec).unwrap();

        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["type"], json!("string"));
        assert_eq!(value["format"], json!("email"));
        assert_eq!(value["required"], json!(true));

        let back: FieldDescriptor = serde_json::from_value(value).unwrap();
        assert_eq!(back, field);
    }

    #[test]
    fn file_kind_round_trips_without_empty_accepted_types() {
        let mut spec = FieldSpec::new("upload", "file");
        spec.max_file_size = Some(1024);
        let field = FieldDescriptor::parse(&spec).unwrap();

        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["type"], json!("file"));
        assert!(value.get("accepted_types").is_none());

        let back: FieldDescriptor = serde_json::from_value(value).unwrap();
        assert_eq!(back, field);
    }
}
