//! Admin menu: browse, statistics, export, delete.
//!
//! Every admin screen uses reply keyboards. Browsing, export and delete
//! share the same two pickers: a month (by event date) and then one of
//! that month's submissions, labelled `#id date | org | title`.

use chrono::{Datelike, Utc};

use lightdesk_core::prompt::{Markup, Prompt, BACK_LABEL};
use lightdesk_core::submission::{Submission, YearMonth};
use lightdesk_core::types::DbId;

use crate::docx::summary_file_name;
use crate::error::BotResult;
use crate::menu;
use crate::session::{ChatSession, Mode};

pub const SUBMISSIONS: &str = "📑 Submissions";
pub const STATISTICS: &str = "📊 Statistics";
pub const EXPORT: &str = "📄 Word export";
pub const DELETE: &str = "🗑 Delete submission";
pub const CONFIRM_DELETE: &str = "✅ Delete";

/// What the picked submission is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    View,
    Export,
    Delete,
}

/// Position inside the admin menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminFlow {
    Menu,
    PickMonth(AdminAction),
    PickSubmission(AdminAction, YearMonth),
    ConfirmDelete { id: DbId, month: YearMonth },
}

pub fn admin_menu_prompt(text: &str) -> Prompt {
    Prompt::new(
        text,
        Markup::Reply(vec![
            vec![SUBMISSIONS.to_string(), STATISTICS.to_string()],
            vec![EXPORT.to_string(), DELETE.to_string()],
            vec![BACK_LABEL.to_string()],
        ]),
    )
}

/// Previous, current and next month around `center`.
pub fn month_row(center: YearMonth) -> Vec<String> {
    vec![
        format!("◀️ {}", center.shift(-1)),
        format!("✅ {center}"),
        format!("▶️ {}", center.shift(1)),
    ]
}

pub fn month_prompt(center: YearMonth) -> Prompt {
    Prompt::new(
        "Choose a month (by event date):",
        Markup::Reply(vec![month_row(center), vec![BACK_LABEL.to_string()]]),
    )
}

/// Submission id from a picker label.
pub fn parse_submission_label(text: &str) -> Option<DbId> {
    let digits: String = text
        .trim()
        .strip_prefix('#')?
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn current_month() -> YearMonth {
    let today = Utc::now().date_naive();
    YearMonth {
        year: today.year(),
        month: today.month(),
    }
}

impl ChatSession {
    pub(crate) async fn open_admin(&mut self) -> BotResult<()> {
        self.mode = Mode::Admin(AdminFlow::Menu);
        self.send(&admin_menu_prompt("Admin menu")).await
    }

    pub(crate) async fn admin_text(&mut self, text: String) -> BotResult<()> {
        let flow = match &self.mode {
            Mode::Admin(flow) if self.state.is_admin(self.user_id) => flow.clone(),
            _ => return self.show_menu(menu::CHOOSE_FROM_MENU).await,
        };
        let text = text.trim();

        if text == BACK_LABEL {
            return match flow {
                AdminFlow::Menu => self.show_menu("Admin menu closed.").await,
                AdminFlow::PickMonth(_) => self.open_admin().await,
                AdminFlow::PickSubmission(action, _) => self.pick_month(action).await,
                AdminFlow::ConfirmDelete { month, .. } => {
                    self.list_month(AdminAction::Delete, month).await
                }
            };
        }

        match flow {
            AdminFlow::Menu => match text {
                SUBMISSIONS => self.pick_month(AdminAction::View).await,
                EXPORT => self.pick_month(AdminAction::Export).await,
                DELETE => self.pick_month(AdminAction::Delete).await,
                STATISTICS => {
                    let total = self.state.store.count_submissions().await?;
                    self.send(&admin_menu_prompt(&format!("Total submissions: {total}")))
                        .await
                }
                _ => {
                    self.send(&admin_menu_prompt("Please choose an option from the admin menu."))
                        .await
                }
            },
            AdminFlow::PickMonth(action) => match YearMonth::parse_label(text) {
                Some(month) => self.list_month(action, month).await,
                None => self.send(&month_prompt(current_month())).await,
            },
            AdminFlow::PickSubmission(action, month) => {
                if let Some(id) = parse_submission_label(text) {
                    return self.pick_submission(action, month, id).await;
                }
                match YearMonth::parse_label(text) {
                    Some(other) => self.list_month(action, other).await,
                    None => self.list_month(action, month).await,
                }
            }
            AdminFlow::ConfirmDelete { id, month } => {
                if text == CONFIRM_DELETE {
                    self.delete_submission(id, month).await
                } else {
                    self.send(&Prompt::text(format!(
                        "Press {CONFIRM_DELETE} to delete or {BACK_LABEL} to cancel."
                    )))
                    .await
                }
            }
        }
    }

    async fn pick_month(&mut self, action: AdminAction) -> BotResult<()> {
        self.mode = Mode::Admin(AdminFlow::PickMonth(action));
        self.send(&month_prompt(current_month())).await
    }

    async fn list_month(&mut self, action: AdminAction, month: YearMonth) -> BotResult<()> {
        let submissions = self.state.store.list_submissions_by_month(month).await?;
        self.mode = Mode::Admin(AdminFlow::PickSubmission(action, month));

        let mut rows: Vec<Vec<String>> = submissions.iter().map(|s| vec![s.list_label()]).collect();
        rows.push(month_row(month));
        rows.push(vec![BACK_LABEL.to_string()]);

        let text = if submissions.is_empty() {
            format!("No submissions for {month}.")
        } else {
            format!("Submissions for {month}: {}", submissions.len())
        };
        self.send(&Prompt::new(text, Markup::Reply(rows))).await
    }

    async fn pick_submission(
        &mut self,
        action: AdminAction,
        month: YearMonth,
        id: DbId,
    ) -> BotResult<()> {
        let Some(submission) = self.state.store.get_submission(id).await? else {
            self.send(&Prompt::text(format!("Submission #{id} not found."))).await?;
            return self.list_month(action, month).await;
        };

        match action {
            AdminAction::View => self.show_submission(&submission).await,
            AdminAction::Export => self.export_submission(&submission).await,
            AdminAction::Delete => {
                self.mode = Mode::Admin(AdminFlow::ConfirmDelete { id, month });
                self.send(&Prompt::new(
                    format!(
                        "Delete this submission?\n\n{}\nFolder: {}\n\nThe folder on the disk is deleted too.",
                        submission.list_label(),
                        submission.folder_path
                    ),
                    Markup::Reply(vec![vec![CONFIRM_DELETE.to_string(), BACK_LABEL.to_string()]]),
                ))
                .await
            }
        }
    }

    /// Summary plus download buttons for the files in its folder.
    async fn show_submission(&self, submission: &Submission) -> BotResult<()> {
        let files = match self.state.vault.list_files(&submission.folder_path).await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(submission_id = submission.id, error = %e, "Failed to list submission files");
                Vec::new()
            }
        };
        let text = format!(
            "Submission #{} (user {})\nFolder: {}\n\n{}",
            submission.id,
            submission.user_id,
            submission.folder_path,
            submission.answers.summary().to_text()
        );
        if files.is_empty() {
            return self.send(&Prompt::text(format!("{text}\n\nNo files in the folder."))).await;
        }
        let markup = self.file_buttons(files).await;
        self.send(&Prompt::new(text, markup)).await
    }

    async fn export_submission(&self, submission: &Submission) -> BotResult<()> {
        let bytes = self.state.renderer.render_summary_document(submission)?;
        self.state
            .messenger
            .send_document(
                self.user_id,
                &summary_file_name(submission),
                bytes,
                &format!("Submission #{}", submission.id),
                &Markup::None,
            )
            .await?;
        tracing::info!(user_id = self.user_id, submission_id = submission.id, "Submission exported");
        Ok(())
    }

    /// Delete the folder (best effort), then the record.
    async fn delete_submission(&mut self, id: DbId, month: YearMonth) -> BotResult<()> {
        if let Some(submission) = self.state.store.get_submission(id).await? {
            if let Err(e) = self.state.vault.delete_folder(&submission.folder_path, false).await {
                tracing::warn!(submission_id = id, folder = %submission.folder_path, error = %e, "Failed to delete submission folder");
            }
        }
        let deleted = self.state.store.delete_submission(id).await?;
        tracing::info!(user_id = self.user_id, submission_id = id, deleted, "Submission deleted by admin");

        let text = if deleted {
            format!("Submission #{id} deleted.")
        } else {
            format!("Submission #{id} was already deleted.")
        };
        self.send(&Prompt::text(text)).await?;
        self.list_month(AdminAction::Delete, month).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_label_parses_leading_id() {
        assert_eq!(parse_submission_label("#42 01.01.2030 | Acme | Gala"), Some(42));
        assert_eq!(parse_submission_label("42 Acme"), None);
        assert_eq!(parse_submission_label("#x"), None);
    }

    #[test]
    fn month_row_wraps_year() {
        let jan = YearMonth::new(2030, 1).unwrap();
        assert_eq!(month_row(jan), vec!["◀️ 2029-12", "✅ 2030-01", "▶️ 2030-02"]);
    }
}
