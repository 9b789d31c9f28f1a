//! Survey flow: start, resume, step, pause, commit.

use lightdesk_core::answers::Answers;
use lightdesk_core::dialogue::{DialogueEngine, Step};
use lightdesk_core::draft::{PauseOutcome, Resumed, PAUSED, PAUSE_REFUSED};
use lightdesk_core::naming::FolderLayout;
use lightdesk_core::options::PLACEHOLDER;
use lightdesk_core::ports::{MessageId, PortError};
use lightdesk_core::prompt::{parse_choice, Input, Prompt, PAUSE_LABEL, STALE_BUTTON, USE_BUTTONS};
use lightdesk_core::submission::{NewSubmission, NewUploadRecord, Submission};

use crate::docx::summary_file_name;
use crate::error::BotResult;
use crate::menu::{self, DRAFT_SCOPE};
use crate::session::{Ack, ChatSession, Mode};

pub const DRAFT_UNREADABLE: &str =
    "Your saved answers could not be restored, so the survey starts from the beginning.";

pub const NO_DRAFT: &str = "You have no unfinished survey.";

pub const DISCARDED: &str = "Your answers were discarded.";

/// Folder of a submission with the given answers.
pub fn folder_for(layout: &FolderLayout, answers: &Answers) -> String {
    let field = |v: &Option<String>| v.clone().unwrap_or_else(|| PLACEHOLDER.to_string());
    layout.submission_folder(
        &field(&answers.event_date),
        &field(&answers.org),
        &field(&answers.event_title),
    )
}

impl ChatSession {
    /// "Take survey": offer a choice when a draft is saved, else start.
    pub(crate) async fn take_survey(&mut self) -> BotResult<()> {
        if self.lifecycle().exists(self.user_id).await? {
            self.mode = Mode::DraftChoice;
            return self.send(&menu::draft_choice_prompt()).await;
        }
        self.begin_survey().await
    }

    pub(crate) async fn continue_survey(&mut self) -> BotResult<()> {
        let resumed = self.lifecycle().resume(self.user_id).await?;
        match resumed {
            Resumed::Restored(draft, prompt) => {
                self.mode = Mode::Survey(draft);
                self.send(&prompt).await
            }
            Resumed::Restarted(draft, prompt) => {
                self.mode = Mode::Survey(draft);
                self.send(&Prompt::text(DRAFT_UNREADABLE)).await?;
                self.send(&prompt).await
            }
            Resumed::Missing => self.show_menu(NO_DRAFT).await,
        }
    }

    pub(crate) async fn draft_choice(&mut self, data: &str) -> BotResult<Ack> {
        if !matches!(self.mode, Mode::DraftChoice) {
            return Ok(Ack::Notice(STALE_BUTTON));
        }
        match parse_choice(data, DRAFT_SCOPE) {
            Some(0) => self.continue_survey().await?,
            Some(1) => {
                self.lifecycle().abandon(self.user_id).await?;
                self.begin_survey().await?;
            }
            _ => return Ok(Ack::Notice(STALE_BUTTON)),
        }
        Ok(Ack::Silent)
    }

    pub(crate) async fn survey_text(&mut self, text: String) -> BotResult<()> {
        if text.trim() == PAUSE_LABEL {
            return self.pause_survey().await;
        }
        self.survey_input(Input::Text(text), None).await.map(|_| ())
    }

    /// Feed one input to the engine. The new draft is persisted before the
    /// next prompt goes out; on any failure the chat keeps the old draft.
    pub(crate) async fn survey_input(
        &mut self,
        input: Input,
        message_id: Option<MessageId>,
    ) -> BotResult<Ack> {
        let Mode::Survey(current) = &self.mode else {
            return Ok(Ack::Notice(STALE_BUTTON));
        };
        let mut draft = current.clone();

        match DialogueEngine::handle(&mut draft, &input) {
            Step::Advance(prompt) => {
                self.lifecycle().checkpoint(self.user_id, &draft).await?;
                tracing::debug!(user_id = self.user_id, state = draft.state.as_str(), "Survey advanced");
                self.mode = Mode::Survey(draft);
                self.send(&prompt).await?;
            }
            Step::Refresh(markup) => {
                self.lifecycle().checkpoint(self.user_id, &draft).await?;
                self.mode = Mode::Survey(draft);
                if let Some(id) = message_id {
                    self.refresh(id, &markup).await;
                }
            }
            Step::Reject(prompt) => self.send(&prompt).await?,
            Step::UseButtons => self.send(&Prompt::text(USE_BUTTONS)).await?,
            Step::Stale => return Ok(Ack::Notice(STALE_BUTTON)),
            Step::Commit(answers) => self.commit_survey(answers).await?,
            Step::Restart => {
                self.lifecycle().abandon(self.user_id).await?;
                tracing::info!(user_id = self.user_id, "Survey discarded");
                self.show_menu(DISCARDED).await?;
            }
        }
        Ok(Ack::Silent)
    }

    async fn pause_survey(&mut self) -> BotResult<()> {
        let Mode::Survey(draft) = &self.mode else {
            return self.show_menu(menu::CHOOSE_FROM_MENU).await;
        };
        let outcome = self.lifecycle().pause(self.user_id, draft).await?;
        match outcome {
            PauseOutcome::Paused => self.show_menu(PAUSED).await,
            PauseOutcome::Refused => self.send(&Prompt::text(PAUSE_REFUSED)).await,
        }
    }

    /// Commit the answers. Only the insert itself can fail the step;
    /// folder creation and the summary document are best effort.
    async fn commit_survey(&mut self, answers: Answers) -> BotResult<()> {
        let folder_path = folder_for(&self.state.folders, &answers);
        if let Err(e) = self.state.vault.ensure_folder(&folder_path).await {
            tracing::warn!(user_id = self.user_id, folder = %folder_path, error = %e, "Failed to create submission folder");
        }

        let submission = self
            .state
            .store
            .commit_submission(&NewSubmission {
                user_id: self.user_id,
                answers,
                folder_path,
            })
            .await?;
        tracing::info!(
            user_id = self.user_id,
            submission_id = submission.id,
            folder = %submission.folder_path,
            "Submission committed",
        );

        self.show_menu(&format!(
            "Thank you! Your answers are saved as submission #{}.\n\
             Send riders, plots and other documents to this chat at any time; \
             they will be filed with your submission.",
            submission.id
        ))
        .await?;

        if let Err(e) = self.archive_summary(&submission).await {
            tracing::warn!(
                user_id = self.user_id,
                submission_id = submission.id,
                error = %e,
                "Failed to archive summary document",
            );
        }
        Ok(())
    }

    /// Render the summary document into the submission folder.
    async fn archive_summary(&self, submission: &Submission) -> Result<(), PortError> {
        let bytes = self.state.renderer.render_summary_document(submission)?;
        let file_name = summary_file_name(submission);
        let remote_path = format!("{}/{file_name}", submission.folder_path);
        self.state.vault.upload_bytes(&remote_path, bytes, true).await?;
        self.state
            .store
            .save_upload_record(&NewUploadRecord {
                user_id: submission.user_id,
                submission_id: Some(submission.id),
                file_name,
                remote_path,
            })
            .await?;
        Ok(())
    }
}
