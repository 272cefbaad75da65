pub mod constants;
pub mod schema;
pub mod types;
pub mod validation;
