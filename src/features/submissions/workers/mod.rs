mod attachment_sweeper;

pub use attachment_sweeper::AttachmentSweeper;
