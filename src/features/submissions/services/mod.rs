mod attachment_service;
mod submission_service;

pub use attachment_service::AttachmentService;
pub use submission_service::SubmissionService;
