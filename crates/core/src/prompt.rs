//! Messenger-neutral prompts and user input.
//!
//! Engines produce [`Prompt`] values and consume [`Input`] values; the
//! messenger adapter translates them to and from its own wire types.
//! Inline button payloads are short colon-separated strings built by the
//! helpers at the bottom of this module.

use serde::{Deserialize, Serialize};

/// Reply-keyboard button that pauses the survey.
pub const PAUSE_LABEL: &str = "⏸ Pause and finish later";

/// Reply-keyboard button that leaves the edit flow.
pub const BACK_LABEL: &str = "⬅️ Back";

/// Multi-select button clearing the whole selection.
pub const NONE_LABEL: &str = "None";

/// Multi-select button finalizing the selection.
pub const NEXT_LABEL: &str = "Next ➡️";

/// Prefix marking a selected multi-select option.
pub const CHECK_MARK: &str = "✅ ";

/// Shown when text arrives on a step that only accepts buttons.
pub const USE_BUTTONS: &str = "Please use the buttons above.";

/// Transient notice for a button that does not belong to the current step.
pub const STALE_BUTTON: &str = "This button is no longer active.";

/// One inline button: the visible label and the payload sent back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Keyboard attached to a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Markup {
    /// Leave whatever keyboard the user currently sees.
    #[default]
    None,
    /// Buttons attached to the message itself.
    Inline(Vec<Vec<Button>>),
    /// Persistent keyboard under the input field; pressing a key sends its
    /// text as a normal message.
    Reply(Vec<Vec<String>>),
    /// Hide the persistent keyboard.
    RemoveReply,
}

impl Markup {
    /// One inline button per row.
    pub fn inline_column(buttons: Vec<Button>) -> Self {
        Markup::Inline(buttons.into_iter().map(|b| vec![b]).collect())
    }

    /// One reply key per row.
    pub fn reply_column<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Markup::Reply(keys.into_iter().map(|k| vec![k.into()]).collect())
    }

    /// All button payloads, in display order.
    pub fn callback_data(&self) -> Vec<&str> {
        match self {
            Markup::Inline(rows) => rows.iter().flatten().map(|b| b.data.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

/// A message to show the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub text: String,
    pub markup: Markup,
}

impl Prompt {
    pub fn new(text: impl Into<String>, markup: Markup) -> Self {
        Self {
            text: text.into(),
            markup,
        }
    }

    /// Plain text with no keyboard change.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, Markup::None)
    }
}

/// One user input as seen by the engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A typed message, or a reply-keyboard key.
    Text(String),
    /// An inline button payload.
    Choice(String),
}

// ---------------------------------------------------------------------------
// Callback payloads
// ---------------------------------------------------------------------------

/// Payload of option `index` in a single-choice question.
pub fn choice_data(scope: &str, index: usize) -> String {
    format!("{scope}:{index}")
}

/// Parse a payload built by [`choice_data`] for the given scope.
pub fn parse_choice(data: &str, scope: &str) -> Option<usize> {
    data.strip_prefix(scope)?.strip_prefix(':')?.parse().ok()
}

/// Build the buttons of a single-choice question.
pub fn single_choice_markup<S: AsRef<str>>(scope: &str, labels: &[S]) -> Markup {
    Markup::inline_column(
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| Button::new(label.as_ref(), choice_data(scope, i)))
            .collect(),
    )
}

/// Action decoded from a multi-select payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiSelectAction {
    Toggle(usize),
    Clear,
    Finish,
}

/// Parse a multi-select payload for the given scope.
pub fn parse_multi_select(data: &str, scope: &str) -> Option<MultiSelectAction> {
    let rest = data.strip_prefix(scope)?.strip_prefix(':')?;
    match rest {
        "none" => Some(MultiSelectAction::Clear),
        "next" => Some(MultiSelectAction::Finish),
        _ => rest
            .strip_prefix("t:")
            .and_then(|i| i.parse().ok())
            .map(MultiSelectAction::Toggle),
    }
}

/// Build a multi-select keyboard: one toggle button per option (checked
/// when selected), then a row with "None" and "Next".
pub fn multi_select_markup<S: AsRef<str>>(scope: &str, options: &[&str], selected: &[S]) -> Markup {
    let mut rows: Vec<Vec<Button>> = options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let checked = selected.iter().any(|s| s.as_ref() == *option);
            let label = if checked {
                format!("{CHECK_MARK}{option}")
            } else {
                option.to_string()
            };
            vec![Button::new(label, format!("{scope}:t:{i}"))]
        })
        .collect();
    rows.push(vec![
        Button::new(NONE_LABEL, format!("{scope}:none")),
        Button::new(NEXT_LABEL, format!("{scope}:next")),
    ]);
    Markup::Inline(rows)
}
