//! Per-chat conversation router.
//!
//! A [`ChatSession`] owns the in-memory mode of one chat and is driven by
//! exactly one worker task, so events for a chat are handled strictly in
//! order. Menu keys take precedence over whatever flow the chat is in;
//! files are accepted in every mode. The flows themselves live in
//! [`survey`](crate::survey), [`edit`](crate::edit), [`admin`](crate::admin)
//! and [`documents`](crate::documents).

use lightdesk_core::dialogue::Draft;
use lightdesk_core::draft::DraftLifecycle;
use lightdesk_core::edit::EditSession;
use lightdesk_core::naming::sanitize_name;
use lightdesk_core::ports::MessageId;
use lightdesk_core::prompt::{Input, Markup, Prompt, STALE_BUTTON, USE_BUTTONS};
use lightdesk_core::types::UserId;

use crate::admin::AdminFlow;
use crate::documents::DOWNLOAD_PREFIX;
use crate::error::BotResult;
use crate::event::UserEvent;
use crate::menu::{self, MenuCommand, DRAFT_SCOPE};
use crate::state::BotState;

/// What the chat is doing right now.
#[derive(Debug, Clone, Default)]
pub enum Mode {
    #[default]
    Idle,
    /// Waiting for "continue" or "start over" on a saved draft.
    DraftChoice,
    Survey(Draft),
    Edit(EditSession),
    Admin(AdminFlow),
}

/// How to answer an inline button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Silent,
    Notice(&'static str),
}

pub struct ChatSession {
    pub(crate) user_id: UserId,
    pub(crate) mode: Mode,
    pub(crate) state: BotState,
}

impl ChatSession {
    pub fn new(user_id: UserId, state: BotState) -> Self {
        Self {
            user_id,
            mode: Mode::Idle,
            state,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Handle one event. Failures are logged and answered with a generic
    /// message; the mode is left as it was before the failing step.
    pub async fn handle(&mut self, event: UserEvent) {
        let callback_id = match &event {
            UserEvent::Choice { callback_id, .. } => Some(callback_id.clone()),
            _ => None,
        };

        if let Err(e) = self.dispatch(event).await {
            tracing::error!(user_id = self.user_id, error = %e, "Failed to handle chat event");
            if let Some(id) = callback_id {
                self.ack(&id, Ack::Silent).await;
            }
            if let Err(e) = self
                .state
                .messenger
                .prompt(self.user_id, &Prompt::text(menu::SOMETHING_WENT_WRONG))
                .await
            {
                tracing::warn!(user_id = self.user_id, error = %e, "Failed to report error to user");
            }
        }
    }

    async fn dispatch(&mut self, event: UserEvent) -> BotResult<()> {
        match event {
            UserEvent::Start => {
                self.mode = Mode::Idle;
                self.show_menu(menu::WELCOME).await
            }
            UserEvent::Text(text) => match MenuCommand::parse(&text) {
                Some(command) => self.run_command(command).await,
                None => self.on_text(text).await,
            },
            UserEvent::Choice {
                callback_id,
                data,
                message_id,
            } => {
                let ack = self.on_choice(&data, message_id).await?;
                self.ack(&callback_id, ack).await;
                Ok(())
            }
            UserEvent::Document { file_id, file_name } => {
                self.receive_upload(&file_id, &sanitize_name(&file_name)).await
            }
            UserEvent::Photo { file_id, unique_id } => {
                let name = format!("photo_{}.jpg", sanitize_name(&unique_id));
                self.receive_upload(&file_id, &name).await
            }
        }
    }

    async fn run_command(&mut self, command: MenuCommand) -> BotResult<()> {
        tracing::debug!(user_id = self.user_id, ?command, "Menu command");
        match command {
            MenuCommand::TakeSurvey => self.take_survey().await,
            MenuCommand::ContinueSurvey => self.continue_survey().await,
            MenuCommand::Documents => self.show_documents().await,
            MenuCommand::MyAnswers => self.show_my_answers().await,
            MenuCommand::EditAnswers => self.start_edit().await,
            MenuCommand::Admin if self.state.is_admin(self.user_id) => self.open_admin().await,
            MenuCommand::Admin => self.show_menu(menu::CHOOSE_FROM_MENU).await,
        }
    }

    async fn on_text(&mut self, text: String) -> BotResult<()> {
        match &self.mode {
            Mode::Idle => self.show_menu(menu::CHOOSE_FROM_MENU).await,
            Mode::DraftChoice => self.send(&Prompt::text(USE_BUTTONS)).await,
            Mode::Survey(_) => self.survey_text(text).await,
            Mode::Edit(_) => self.edit_input(Input::Text(text), None).await.map(|_| ()),
            Mode::Admin(_) => self.admin_text(text).await,
        }
    }

    async fn on_choice(&mut self, data: &str, message_id: MessageId) -> BotResult<Ack> {
        if data.starts_with(DOWNLOAD_PREFIX) {
            return self.download(data).await;
        }
        if data.starts_with(DRAFT_SCOPE) {
            return self.draft_choice(data).await;
        }
        match &self.mode {
            Mode::Survey(_) => {
                self.survey_input(Input::Choice(data.to_string()), Some(message_id))
                    .await
            }
            Mode::Edit(_) => {
                self.edit_input(Input::Choice(data.to_string()), Some(message_id))
                    .await
            }
            _ => Ok(Ack::Notice(STALE_BUTTON)),
        }
    }

    async fn show_my_answers(&mut self) -> BotResult<()> {
        match self.state.store.get_last_submission_by_user(self.user_id).await? {
            Some(submission) => {
                let text = format!(
                    "Submission #{}\n\n{}",
                    submission.id,
                    submission.answers.summary().to_text()
                );
                self.send(&Prompt::text(text)).await
            }
            None => self.show_menu("You have no submissions yet.").await,
        }
    }

    // ---- shared helpers ----

    pub(crate) fn lifecycle(&self) -> DraftLifecycle<'_> {
        DraftLifecycle::new(self.state.store.as_ref())
    }

    pub(crate) async fn send(&self, prompt: &Prompt) -> BotResult<()> {
        self.state.messenger.prompt(self.user_id, prompt).await?;
        Ok(())
    }

    /// Redraw an inline keyboard. A failed redraw only costs the visual
    /// update, so it is logged rather than raised.
    pub(crate) async fn refresh(&self, message_id: MessageId, markup: &Markup) {
        if let Err(e) = self
            .state
            .messenger
            .refresh_markup(self.user_id, message_id, markup)
            .await
        {
            tracing::warn!(user_id = self.user_id, error = %e, "Failed to refresh keyboard");
        }
    }

    /// Show the main menu with a message, leaving any flow.
    pub(crate) async fn show_menu(&mut self, text: &str) -> BotResult<()> {
        self.mode = Mode::Idle;
        let has_draft = self.lifecycle().exists(self.user_id).await?;
        let markup = menu::main_menu(has_draft, self.state.is_admin(self.user_id));
        self.send(&Prompt::new(text, markup)).await
    }

    async fn ack(&self, callback_id: &str, ack: Ack) {
        let text = match ack {
            Ack::Silent => "",
            Ack::Notice(text) => text,
        };
        if let Err(e) = self.state.messenger.notice(callback_id, text, false).await {
            tracing::warn!(user_id = self.user_id, error = %e, "Failed to answer button press");
        }
    }
}
