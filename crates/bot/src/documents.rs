//! Documents menu, downloads and uploads.

use lightdesk_core::prompt::{Button, Markup, Prompt, STALE_BUTTON};
use lightdesk_core::submission::{NewUploadRecord, RemoteFile, UploadRecord};
use lightdesk_core::types::DbId;

use crate::error::BotResult;
use crate::session::{Ack, ChatSession};

/// Prefix of every download button payload.
pub const DOWNLOAD_PREFIX: &str = "dl:";

/// Payload prefix of a token-backed download.
const TOKEN_PREFIX: &str = "dl:t:";

/// Payload prefix of an upload-record download.
const RECORD_PREFIX: &str = "dl:r:";

pub const NO_DOCUMENTS: &str =
    "No documents yet. Send files to this chat and they will be stored with your submission.";

pub const LINK_EXPIRED: &str = "This link has expired. Open the list again.";

pub const FILE_NOT_FOUND: &str = "File not found.";

impl ChatSession {
    /// Shared files plus the user's own uploads.
    pub(crate) async fn show_documents(&mut self) -> BotResult<()> {
        let shared_folder = self.state.folders.shared_folder();
        let shared = match self.state.vault.list_files(&shared_folder).await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(user_id = self.user_id, folder = %shared_folder, error = %e, "Failed to list shared files");
                Vec::new()
            }
        };
        let records = self.state.store.list_upload_records(self.user_id).await?;

        if shared.is_empty() && records.is_empty() {
            return self.send(&Prompt::text(NO_DOCUMENTS)).await;
        }
        if !shared.is_empty() {
            let markup = self.file_buttons(shared).await;
            self.send(&Prompt::new("Shared files:", markup)).await?;
        }
        if !records.is_empty() {
            self.send(&Prompt::new("Your files:", record_buttons(&records)))
                .await?;
        }
        Ok(())
    }

    /// One download button per remote file, each backed by a fresh token.
    pub(crate) async fn file_buttons(&self, files: Vec<RemoteFile>) -> Markup {
        let mut buttons = Vec::with_capacity(files.len());
        for file in files {
            let token = self.state.tokens.issue(file.path, file.name.clone()).await;
            buttons.push(Button::new(file.name, format!("{TOKEN_PREFIX}{token}")));
        }
        Markup::inline_column(buttons)
    }

    pub(crate) async fn download(&mut self, data: &str) -> BotResult<Ack> {
        let (path, file_name) = if let Some(token) = data.strip_prefix(TOKEN_PREFIX) {
            match self.state.tokens.take(token).await {
                Some(entry) => (entry.path, entry.file_name),
                None => return Ok(Ack::Notice(LINK_EXPIRED)),
            }
        } else if let Some(id) = data.strip_prefix(RECORD_PREFIX) {
            let Ok(id) = id.parse::<DbId>() else {
                return Ok(Ack::Notice(STALE_BUTTON));
            };
            match self.state.store.get_upload_record(id).await? {
                Some(record)
                    if record.user_id == self.user_id || self.state.is_admin(self.user_id) =>
                {
                    (record.remote_path, record.file_name)
                }
                _ => return Ok(Ack::Notice(FILE_NOT_FOUND)),
            }
        } else {
            return Ok(Ack::Notice(STALE_BUTTON));
        };

        let bytes = self.state.vault.download_bytes(&path).await?;
        tracing::info!(user_id = self.user_id, path = %path, size = bytes.len(), "File sent");
        self.state
            .messenger
            .send_document(self.user_id, &file_name, bytes, "", &Markup::None)
            .await?;
        Ok(Ack::Silent)
    }

    /// Store a file the user sent in the folder of their last submission,
    /// or in their inbox folder before the first one.
    pub(crate) async fn receive_upload(&mut self, file_id: &str, file_name: &str) -> BotResult<()> {
        let (folder, submission_id) = match self.state.store.get_last_pointer(self.user_id).await? {
            Some(pointer) => (pointer.folder_path, pointer.submission_id),
            None => (self.state.folders.inbox_folder(self.user_id), None),
        };
        if let Err(e) = self.state.vault.ensure_folder(&folder).await {
            tracing::warn!(user_id = self.user_id, folder = %folder, error = %e, "Failed to create upload folder");
        }

        let bytes = self.state.messenger.download_file(file_id).await?;
        let remote_path = format!("{folder}/{file_name}");
        self.state.vault.upload_bytes(&remote_path, bytes, true).await?;
        self.state
            .store
            .save_upload_record(&NewUploadRecord {
                user_id: self.user_id,
                submission_id,
                file_name: file_name.to_string(),
                remote_path: remote_path.clone(),
            })
            .await?;
        tracing::info!(user_id = self.user_id, ?submission_id, path = %remote_path, "File stored");

        self.send(&Prompt::text(format!("File saved: {remote_path}"))).await
    }
}

fn record_buttons(records: &[UploadRecord]) -> Markup {
    Markup::inline_column(
        records
            .iter()
            .map(|r| Button::new(r.file_name.as_str(), format!("{RECORD_PREFIX}{}", r.id)))
            .collect(),
    )
}
