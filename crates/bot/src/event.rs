//! Inbound chat events, decoded from Bot API updates.

use lightdesk_core::ports::MessageId;
use lightdesk_core::types::UserId;

use crate::telegram::types::Update;

/// One thing the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    /// The `/start` command.
    Start,
    /// A typed message or a reply-keyboard key.
    Text(String),
    /// An inline button press.
    Choice {
        callback_id: String,
        data: String,
        message_id: MessageId,
    },
    /// A file sent as a document.
    Document { file_id: String, file_name: String },
    /// A photo; the largest size is kept.
    Photo { file_id: String, unique_id: String },
}

/// Decode an update into the sender and the event. Updates the bot does
/// not act on (stickers, edits, bot senders, ...) yield `None`.
pub fn decode(update: Update) -> Option<(UserId, UserEvent)> {
    if let Some(cb) = update.callback_query {
        if cb.from.is_bot {
            return None;
        }
        let message_id = cb.message.as_ref().map(|m| m.message_id).unwrap_or_default();
        return Some((
            cb.from.id,
            UserEvent::Choice {
                callback_id: cb.id,
                data: cb.data.unwrap_or_default(),
                message_id,
            },
        ));
    }

    let message = update.message?;
    let from = message.from.filter(|u| !u.is_bot)?;

    if let Some(doc) = message.document {
        let file_name = doc
            .file_name
            .unwrap_or_else(|| format!("file_{}", doc.file_unique_id));
        return Some((
            from.id,
            UserEvent::Document {
                file_id: doc.file_id,
                file_name,
            },
        ));
    }

    if let Some(largest) = message
        .photo
        .and_then(|sizes| sizes.into_iter().max_by_key(|p| p.width * p.height))
    {
        return Some((
            from.id,
            UserEvent::Photo {
                file_id: largest.file_id,
                unique_id: largest.file_unique_id,
            },
        ));
    }

    let text = message.text?;
    if text.trim() == "/start" || text.trim().starts_with("/start ") {
        return Some((from.id, UserEvent::Start));
    }
    Some((from.id, UserEvent::Text(text)))
}
