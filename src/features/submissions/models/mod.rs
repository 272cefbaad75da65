mod attachment;
mod submission;

pub use attachment::{FormAttachment, UploadStatus};
pub use submission::FormSubmission;
