pub mod attachment_handler;
pub mod submission_handler;

pub use attachment_handler::{
    __path_delete_attachment, __path_upload_attachments, delete_attachment, upload_attachments,
};
pub use submission_handler::{
    __path_get_submission, __path_list_submissions, __path_submit_batch, __path_submit_form,
    __path_submit_form_multipart, __path_update_submission_status, get_submission,
    list_submissions, submit_batch, submit_form, submit_form_multipart, update_submission_status,
};
