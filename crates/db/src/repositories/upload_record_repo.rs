//! Repository for the `upload_records` table. Rows are insert-only.

use lightdesk_core::submission::NewUploadRecord;
use lightdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::upload_record::UploadRecordRow;

/// Column list for `upload_records` queries.
const COLUMNS: &str = "id, user_id, submission_id, file_name, remote_path, created_at";

/// Most records returned for one user.
const LIST_LIMIT: i64 = 50;

pub struct UploadRecordRepo;

impl UploadRecordRepo {
    pub async fn create(pool: &PgPool, input: &NewUploadRecord) -> Result<UploadRecordRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO upload_records (user_id, submission_id, file_name, remote_path) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UploadRecordRow>(&query)
            .bind(input.user_id)
            .bind(input.submission_id)
            .bind(&input.file_name)
            .bind(&input.remote_path)
            .fetch_one(pool)
            .await
    }

    /// The user's records, newest first.
    pub async fn list_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<UploadRecordRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM upload_records \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        sqlx::query_as::<_, UploadRecordRow>(&query)
            .bind(user_id)
            .bind(LIST_LIMIT)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<UploadRecordRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM upload_records WHERE id = $1");
        sqlx::query_as::<_, UploadRecordRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
