//! Repository for the `drafts` table. One row per user.

use sqlx::PgPool;

use crate::models::draft::DraftRow;

/// Column list for `drafts` queries.
const COLUMNS: &str = "user_id, state, payload, created_at, updated_at";

/// Provides upsert/find/delete for survey drafts.
pub struct DraftRepo;

impl DraftRepo {
    /// Insert or overwrite the user's draft.
    pub async fn upsert(
        pool: &PgPool,
        user_id: i64,
        state: &str,
        payload: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO drafts (user_id, state, payload) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 state      = EXCLUDED.state, \
                 payload    = EXCLUDED.payload, \
                 updated_at = NOW()",
        )
        .bind(user_id)
        .bind(state)
        .bind(payload)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find(pool: &PgPool, user_id: i64) -> Result<Option<DraftRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM drafts WHERE user_id = $1");
        sqlx::query_as::<_, DraftRow>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete the user's draft. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM drafts WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
