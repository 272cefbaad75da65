pub mod submissions;
pub mod templates;
