//! Draft persistence contract: start, checkpoint, pause, resume, abandon.
//!
//! A persisted draft exists exactly while the user has an unfinished
//! survey pass. Commit removes it in the same transaction as the insert
//! (see [`Store::commit_submission`]); everything else goes through here.

use crate::dialogue::{DialogueEngine, Draft};
use crate::error::CoreError;
use crate::ports::{PortError, Store};
use crate::prompt::Prompt;
use crate::types::UserId;

/// Message shown when pause is attempted inside a sub-loop.
pub const PAUSE_REFUSED: &str =
    "Please finish the current block (power connections or special effects) before pausing.";

/// Message shown after a successful pause.
pub const PAUSED: &str = "Your answers are saved. Choose \"Continue survey\" in the menu to pick up where you left off.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    Paused,
    Refused,
}

/// Result of a resume attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resumed {
    /// The saved draft and the prompt of its state.
    Restored(Draft, Prompt),
    /// The saved payload was unreadable; a fresh draft was started.
    Restarted(Draft, Prompt),
    /// No draft was saved.
    Missing,
}

/// Draft operations over a [`Store`].
pub struct DraftLifecycle<'a> {
    store: &'a dyn Store,
}

impl<'a> DraftLifecycle<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Begin a new pass, replacing any saved draft.
    pub async fn start(&self, user_id: UserId) -> Result<(Draft, Prompt), PortError> {
        let draft = Draft::new();
        self.store.save_draft(user_id, &draft).await?;
        tracing::debug!(user_id, "Draft started");
        let prompt = DialogueEngine::prompt(&draft);
        Ok((draft, prompt))
    }

    /// Persist the draft after an accepted step.
    pub async fn checkpoint(&self, user_id: UserId, draft: &Draft) -> Result<(), PortError> {
        self.store.save_draft(user_id, draft).await
    }

    /// Persist the draft for a later resume. Idempotent; refused inside
    /// the power and special-effects sub-loops.
    pub async fn pause(&self, user_id: UserId, draft: &Draft) -> Result<PauseOutcome, PortError> {
        if draft.state.in_subloop() {
            return Ok(PauseOutcome::Refused);
        }
        self.store.save_draft(user_id, draft).await?;
        tracing::info!(user_id, state = draft.state.as_str(), "Draft paused");
        Ok(PauseOutcome::Paused)
    }

    /// Load the saved draft and regenerate the prompt of its state.
    pub async fn resume(&self, user_id: UserId) -> Result<Resumed, PortError> {
        match self.store.load_draft(user_id).await {
            Ok(Some(draft)) => {
                let prompt = DialogueEngine::prompt(&draft);
                tracing::info!(user_id, state = draft.state.as_str(), "Draft resumed");
                Ok(Resumed::Restored(draft, prompt))
            }
            Ok(None) => Ok(Resumed::Missing),
            Err(PortError::Core(CoreError::Validation(reason))) => {
                tracing::warn!(user_id, %reason, "Discarding unreadable draft");
                self.store.delete_draft(user_id).await?;
                let (draft, prompt) = self.start(user_id).await?;
                Ok(Resumed::Restarted(draft, prompt))
            }
            Err(e) => Err(e),
        }
    }

    /// Delete the saved draft, if any.
    pub async fn abandon(&self, user_id: UserId) -> Result<(), PortError> {
        self.store.delete_draft(user_id).await?;
        tracing::debug!(user_id, "Draft abandoned");
        Ok(())
    }

    /// True when a draft is saved, readable or not.
    pub async fn exists(&self, user_id: UserId) -> Result<bool, PortError> {
        match self.store.load_draft(user_id).await {
            Ok(found) => Ok(found.is_some()),
            Err(PortError::Core(CoreError::Validation(_))) => Ok(true),
            Err(e) => Err(e),
        }
    }
}
