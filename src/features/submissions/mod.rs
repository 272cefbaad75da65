pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod workers;

pub use routes::routes;
pub use services::{AttachmentService, SubmissionService};
pub use workers::AttachmentSweeper;
