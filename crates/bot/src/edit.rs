//! Edit flow for the user's last submission.

use lightdesk_core::edit::{EditSession, EditStep};
use lightdesk_core::ports::MessageId;
use lightdesk_core::prompt::{Input, Prompt, STALE_BUTTON, USE_BUTTONS};
use lightdesk_core::submission::{FieldPatch, Submission, SubmissionPatch};

use crate::error::BotResult;
use crate::session::{Ack, ChatSession, Mode};
use crate::survey::folder_for;

pub const NOTHING_TO_EDIT: &str = "You have no submissions to edit yet.";

pub const SUBMISSION_GONE: &str = "This submission no longer exists.";

impl ChatSession {
    pub(crate) async fn start_edit(&mut self) -> BotResult<()> {
        match self.state.store.get_last_submission_by_user(self.user_id).await? {
            Some(submission) => {
                tracing::debug!(user_id = self.user_id, submission_id = submission.id, "Edit started");
                self.mode = Mode::Edit(EditSession::new(submission.id));
                self.send(&EditSession::menu_prompt()).await
            }
            None => self.show_menu(NOTHING_TO_EDIT).await,
        }
    }

    pub(crate) async fn edit_input(
        &mut self,
        input: Input,
        message_id: Option<MessageId>,
    ) -> BotResult<Ack> {
        let Mode::Edit(current) = &self.mode else {
            return Ok(Ack::Notice(STALE_BUTTON));
        };
        let mut session = current.clone();

        let Some(submission) = self.state.store.get_submission(session.submission_id).await? else {
            self.show_menu(SUBMISSION_GONE).await?;
            return Ok(Ack::Silent);
        };

        match session.handle(&submission, &input) {
            EditStep::Ask(prompt) | EditStep::Discarded(prompt) => {
                self.mode = Mode::Edit(session);
                self.send(&prompt).await?;
            }
            EditStep::Refresh(markup) => {
                self.mode = Mode::Edit(session);
                if let Some(id) = message_id {
                    self.refresh(id, &markup).await;
                }
            }
            EditStep::Reject(prompt) => self.send(&prompt).await?,
            EditStep::UseButtons => self.send(&Prompt::text(USE_BUTTONS)).await?,
            EditStep::Stale => return Ok(Ack::Notice(STALE_BUTTON)),
            EditStep::Patch(patch) => {
                self.apply_patch(submission, patch).await?;
                self.mode = Mode::Edit(session);
                self.send(&EditSession::menu_prompt()).await?;
            }
            EditStep::Back => self.show_menu("Editing finished.").await?,
        }
        Ok(Ack::Silent)
    }

    /// Write the patch. When it touches a folder-naming field the folder
    /// path is recomputed from the patched answers and the last pointer
    /// follows it; files in the old folder stay where they are.
    async fn apply_patch(
        &self,
        submission: Submission,
        mut patch: SubmissionPatch,
    ) -> BotResult<()> {
        let mut new_folder = None;
        if patch.needs_new_folder() {
            let mut preview = submission.clone();
            preview.apply(&patch);
            let folder = folder_for(&self.state.folders, &preview.answers);
            if folder != submission.folder_path {
                if let Err(e) = self.state.vault.ensure_folder(&folder).await {
                    tracing::warn!(user_id = self.user_id, folder = %folder, error = %e, "Failed to create submission folder");
                }
                patch.push(FieldPatch::FolderPath(folder.clone()));
                new_folder = Some(folder);
            }
        }

        let updated = self.state.store.patch_submission(submission.id, &patch).await?;
        if let Some(folder) = new_folder {
            self.state
                .store
                .upsert_last_pointer(self.user_id, Some(updated.id), &folder)
                .await?;
            tracing::info!(
                user_id = self.user_id,
                submission_id = updated.id,
                old_folder = %submission.folder_path,
                new_folder = %folder,
                "Submission folder moved",
            );
        }

        self.send(&Prompt::text(format!(
            "Saved.\n\n{}",
            updated.answers.summary().to_text()
        )))
        .await
    }
}
