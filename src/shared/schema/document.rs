use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::field::{ArrayItemType, StringFormat};

/// Generated schema for a whole template: an object schema with one property
/// per field. Stored alongside the field list and re-derivable from it.
///
/// `properties` is a sorted map and the struct serializes with a fixed key
/// order, so the same field list always produces the same bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: BTreeMap<String, PropertySchema>,
    /// Names of required fields, in field declaration order.
    pub required: Vec<String>,
    #[serde(rename = "additionalProperties", default)]
    pub additional_properties: bool,
}

/// Schema entry for a single property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "minLength", default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(rename = "maxLength", default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<StringFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<ItemsSchema>,
    #[serde(rename = "minItems", default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u32>,
    #[serde(rename = "maxItems", default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl PropertySchema {
    pub fn new(
        schema_type: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            schema_type: schema_type.into(),
            title: title.into(),
            description: description.into(),
            min_length: None,
            max_length: None,
            pattern: None,
            format: None,
            minimum: None,
            maximum: None,
            items: None,
            min_items: None,
            max_items: None,
            enum_values: None,
        }
    }
}

/// Element schema for array properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsSchema {
    #[serde(rename = "type")]
    pub item_type: ArrayItemType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn property_omits_unset_constraints() {
        let prop = PropertySchema::new("string", "Email", "");
        let value = serde_json::to_value(&prop).unwrap();
        assert_eq!(
            value,
            json!({"type": "string", "title": "Email", "description": ""})
        );
    }

    #[test]
    fn property_serializes_camel_case_constraint_keys() {
        let mut prop = PropertySchema::new("string", "Code", "");
        prop.min_length = Some(2);
        prop.max_length = Some(8);

        let value = serde_json::to_value(&prop).unwrap();
        assert_eq!(value["minLength"], json!(2));
        assert_eq!(value["maxLength"], json!(8));
        assert!(value.get("min_length").is_none());
    }

    #[test]
    fn document_round_trips_through_json() {
        let mut properties = BTreeMap::new();
        let mut tags = PropertySchema::new("array", "Tags", "Free-form labels");
        tags.items = Some(ItemsSchema {
            item_type: ArrayItemType::String,
        });
        tags.max_items = Some(5);
        properties.insert("tags".to_string(), tags);

        let doc = SchemaDocument {
            schema_type: "object".to_string(),
            properties,
            required: vec!["tags".to_string()],
            additional_properties: false,
        };

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["additionalProperties"], json!(false));
        assert_eq!(value["properties"]["tags"]["items"]["type"], json!("string"));

        let back: SchemaDocument = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }
}
