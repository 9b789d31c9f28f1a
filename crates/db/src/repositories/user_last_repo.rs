//! Repository for the `user_last` table: the submission (and folder) each
//! user touched last.

use lightdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::user_last::UserLastRow;

/// Column list for `user_last` queries.
const COLUMNS: &str = "user_id, submission_id, folder_path, updated_at";

pub struct UserLastRepo;

impl UserLastRepo {
    pub async fn upsert(
        pool: &PgPool,
        user_id: i64,
        submission_id: Option<DbId>,
        folder_path: &str,
    ) -> Result<UserLastRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_last (user_id, submission_id, folder_path) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 submission_id = EXCLUDED.submission_id, \
                 folder_path   = EXCLUDED.folder_path, \
                 updated_at    = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserLastRow>(&query)
            .bind(user_id)
            .bind(submission_id)
            .bind(folder_path)
            .fetch_one(pool)
            .await
    }

    pub async fn find(pool: &PgPool, user_id: i64) -> Result<Option<UserLastRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_last WHERE user_id = $1");
        sqlx::query_as::<_, UserLastRow>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
