use lightdesk_core::submission::UploadRecord;
use lightdesk_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `upload_records` table.
#[derive(Debug, Clone, FromRow)]
pub struct UploadRecordRow {
    pub id: DbId,
    pub user_id: i64,
    pub submission_id: Option<DbId>,
    pub file_name: String,
    pub remote_path: String,
    pub created_at: Timestamp,
}

impl From<UploadRecordRow> for UploadRecord {
    fn from(row: UploadRecordRow) -> Self {
        UploadRecord {
            id: row.id,
            user_id: row.user_id,
            submission_id: row.submission_id,
            file_name: row.file_name,
            remote_path: row.remote_path,
            created_at: row.created_at,
        }
    }
}
