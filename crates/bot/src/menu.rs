//! Main menu keys and the messages around them.

use lightdesk_core::prompt::{Markup, Prompt};

pub const TAKE_SURVEY: &str = "📝 Take survey";
pub const CONTINUE_SURVEY: &str = "▶️ Continue survey";
pub const DOCUMENTS: &str = "📂 Documents";
pub const MY_ANSWERS: &str = "📋 My answers";
pub const EDIT_ANSWERS: &str = "✏️ Edit answers";
pub const ADMIN: &str = "🛠 Admin";

pub const WELCOME: &str = "Hello! This bot collects the lighting requirements for your event.\n\
Take the survey, and send any documents (riders, plots, schedules) straight to this chat.";

pub const CHOOSE_FROM_MENU: &str = "Please choose an option from the menu.";

pub const SOMETHING_WENT_WRONG: &str = "Something went wrong. Please try again in a moment.";

/// Scope of the resume-or-restart buttons.
pub const DRAFT_SCOPE: &str = "draft";

/// A menu command. Pressed keys take precedence over whatever flow the
/// chat is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    TakeSurvey,
    ContinueSurvey,
    Documents,
    MyAnswers,
    EditAnswers,
    Admin,
}

impl MenuCommand {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            TAKE_SURVEY => Some(Self::TakeSurvey),
            CONTINUE_SURVEY => Some(Self::ContinueSurvey),
            DOCUMENTS => Some(Self::Documents),
            MY_ANSWERS => Some(Self::MyAnswers),
            EDIT_ANSWERS => Some(Self::EditAnswers),
            ADMIN => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Main menu keyboard. "Continue survey" only shows while a draft is
/// saved; "Admin" only for admins.
pub fn main_menu(has_draft: bool, is_admin: bool) -> Markup {
    let mut rows = vec![vec![TAKE_SURVEY.to_string()]];
    if has_draft {
        rows[0].push(CONTINUE_SURVEY.to_string());
    }
    rows.push(vec![DOCUMENTS.to_string(), MY_ANSWERS.to_string()]);
    rows.push(vec![EDIT_ANSWERS.to_string()]);
    if is_admin {
        rows.push(vec![ADMIN.to_string()]);
    }
    Markup::Reply(rows)
}

/// Prompt offering to resume a saved draft or start over.
pub fn draft_choice_prompt() -> Prompt {
    Prompt::new(
        "You have an unfinished survey. Continue where you left off or start over?",
        lightdesk_core::prompt::single_choice_markup(DRAFT_SCOPE, &["▶️ Continue", "🔁 Start over"]),
    )
}
