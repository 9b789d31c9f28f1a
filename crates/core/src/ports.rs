//! Collaborator interfaces.
//!
//! The engines never talk to the messenger, the database, or the file
//! vault directly. The bot crate wires concrete adapters behind these
//! traits; tests wire in-memory fakes.

use async_trait::async_trait;

use crate::dialogue::Draft;
use crate::error::CoreError;
use crate::prompt::{Markup, Prompt};
use crate::submission::{
    LastPointer, NewSubmission, NewUploadRecord, RemoteFile, Submission, SubmissionPatch,
    UploadRecord, YearMonth,
};
use crate::types::{DbId, UserId};

/// Failure reported by a collaborator.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Identifier of a message already shown to the user.
pub type MessageId = i64;

/// Outbound messaging.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a prompt; returns the id of the new message.
    async fn prompt(&self, chat: UserId, prompt: &Prompt) -> Result<MessageId, PortError>;

    /// Replace the inline keyboard of an existing message.
    async fn refresh_markup(
        &self,
        chat: UserId,
        message: MessageId,
        markup: &Markup,
    ) -> Result<(), PortError>;

    /// Answer a button press with a transient notice (or silently when
    /// `text` is empty).
    async fn notice(&self, callback_id: &str, text: &str, alert: bool) -> Result<(), PortError>;

    async fn send_document(
        &self,
        chat: UserId,
        file_name: &str,
        bytes: Vec<u8>,
        caption: &str,
        markup: &Markup,
    ) -> Result<(), PortError>;

    /// Fetch the contents of a file the user sent.
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, PortError>;
}

/// Durable storage.
#[async_trait]
pub trait Store: Send + Sync {
    async fn save_draft(&self, user_id: UserId, draft: &Draft) -> Result<(), PortError>;

    /// Load the user's draft. An unreadable payload is reported as
    /// [`CoreError::Validation`] wrapped in [`PortError::Core`].
    async fn load_draft(&self, user_id: UserId) -> Result<Option<Draft>, PortError>;

    async fn delete_draft(&self, user_id: UserId) -> Result<(), PortError>;

    async fn insert_submission(&self, input: &NewSubmission) -> Result<Submission, PortError>;

    /// Insert the submission, point the user's last pointer at it, and
    /// delete the draft, atomically.
    async fn commit_submission(&self, input: &NewSubmission) -> Result<Submission, PortError>;

    /// Apply a patch and return the updated submission.
    async fn patch_submission(
        &self,
        id: DbId,
        patch: &SubmissionPatch,
    ) -> Result<Submission, PortError>;

    async fn get_submission(&self, id: DbId) -> Result<Option<Submission>, PortError>;

    async fn get_last_submission_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Submission>, PortError>;

    /// Submissions whose event date falls in the given month.
    async fn list_submissions_by_month(&self, month: YearMonth)
        -> Result<Vec<Submission>, PortError>;

    /// Returns true when a row was deleted.
    async fn delete_submission(&self, id: DbId) -> Result<bool, PortError>;

    async fn count_submissions(&self) -> Result<i64, PortError>;

    async fn upsert_last_pointer(
        &self,
        user_id: UserId,
        submission_id: Option<DbId>,
        folder_path: &str,
    ) -> Result<(), PortError>;

    async fn get_last_pointer(&self, user_id: UserId) -> Result<Option<LastPointer>, PortError>;

    async fn save_upload_record(&self, input: &NewUploadRecord) -> Result<UploadRecord, PortError>;

    /// The user's records, newest first.
    async fn list_upload_records(&self, user_id: UserId) -> Result<Vec<UploadRecord>, PortError>;

    async fn get_upload_record(&self, id: DbId) -> Result<Option<UploadRecord>, PortError>;
}

/// Remote file storage.
#[async_trait]
pub trait FileVault: Send + Sync {
    /// Create the folder and every missing parent. Existing folders are
    /// not an error.
    async fn ensure_folder(&self, path: &str) -> Result<(), PortError>;

    async fn upload_bytes(&self, path: &str, bytes: Vec<u8>, overwrite: bool)
        -> Result<(), PortError>;

    /// Files (not folders) directly inside `folder`; empty when the folder
    /// does not exist.
    async fn list_files(&self, folder: &str) -> Result<Vec<RemoteFile>, PortError>;

    async fn get_download_url(&self, path: &str) -> Result<String, PortError>;

    async fn download_bytes(&self, path: &str) -> Result<Vec<u8>, PortError>;

    /// Delete a folder. Missing folders are not an error.
    async fn delete_folder(&self, path: &str, permanent: bool) -> Result<(), PortError>;
}

/// Renders the printable summary of a submission.
pub trait DocRenderer: Send + Sync {
    fn render_summary_document(&self, submission: &Submission) -> Result<Vec<u8>, PortError>;
}
