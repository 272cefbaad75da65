pub mod attachment_dto;
pub mod submission_dto;

pub use attachment_dto::AttachmentResponseDto;
pub use submission_dto::{
    BatchItemResultDto, BatchSubmitDto, ClientMeta, ListSubmissionsQuery, ReceivedFile,
    SubmissionResponseDto, SubmitFormDto, UpdateSubmissionStatusDto,
};
