use lightdesk_core::types::Timestamp;
use sqlx::FromRow;

/// A row from the `drafts` table. The payload is the serialized
/// `lightdesk_core::dialogue::Draft`; `state` duplicates its state tag for
/// ad-hoc queries.
#[derive(Debug, Clone, FromRow)]
pub struct DraftRow {
    pub user_id: i64,
    pub state: String,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
