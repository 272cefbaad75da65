//! Dynamic form schema engine
//!
//! Turns ordered field definitions into validation schemas, validates
//! submitted payloads against them, and memoizes generation behind a
//! bounded LRU cache. Everything here is pure and synchronous; persistence
//! and transport live in the feature layer.

mod cache;
mod document;
mod field;
mod generator;
mod validate;

pub use cache::{SchemaCache, SchemaKey};
pub use document::{ItemsSchema, PropertySchema, SchemaDocument};
pub use field::{ArrayItemType, FieldDescriptor, FieldKind, FieldSpec, StringFormat};
pub use generator::generate;
pub use validate::{validate, validate_with_policy, ValidationOutcome, Violation};

use thiserror::Error;

/// Errors raised while parsing field definitions or generating schemas.
/// Transport mapping happens at the HTTP boundary, not here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    #[error("field `{field}` has unsupported type `{ty}`")]
    UnsupportedFieldType { field: String, ty: String },
}
