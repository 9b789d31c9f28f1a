/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Messenger-side user identifier. Private chats share the user's id, so
/// this doubles as the chat id for outbound messages.
pub type UserId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
