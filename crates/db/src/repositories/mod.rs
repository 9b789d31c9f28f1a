//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod draft_repo;
pub mod submission_repo;
pub mod upload_record_repo;
pub mod user_last_repo;

pub use draft_repo::DraftRepo;
pub use submission_repo::SubmissionRepo;
pub use upload_record_repo::UploadRecordRepo;
pub use user_last_repo::UserLastRepo;
