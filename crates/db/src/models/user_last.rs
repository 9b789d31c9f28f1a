use lightdesk_core::submission::LastPointer;
use lightdesk_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `user_last` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserLastRow {
    pub user_id: i64,
    pub submission_id: Option<DbId>,
    pub folder_path: String,
    pub updated_at: Timestamp,
}

impl From<UserLastRow> for LastPointer {
    fn from(row: UserLastRow) -> Self {
        LastPointer {
            user_id: row.user_id,
            submission_id: row.submission_id,
            folder_path: row.folder_path,
            updated_at: row.updated_at,
        }
    }
}
