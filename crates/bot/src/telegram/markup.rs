//! Keyboard conversion to Bot API `reply_markup` objects.

use serde_json::{json, Value};

use lightdesk_core::prompt::Markup;

/// `reply_markup` for `sendMessage`/`sendDocument`; `None` leaves the
/// user's current keyboard in place.
pub fn reply_markup(markup: &Markup) -> Option<Value> {
    match markup {
        Markup::None => None,
        Markup::Inline(_) => Some(inline_keyboard(markup)),
        Markup::Reply(rows) => Some(json!({
            "keyboard": rows
                .iter()
                .map(|row| row.iter().map(|key| json!({ "text": key })).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
            "resize_keyboard": true,
        })),
        Markup::RemoveReply => Some(json!({ "remove_keyboard": true })),
    }
}

/// `reply_markup` for `editMessageReplyMarkup`. Only inline keyboards can
/// be attached to a sent message; anything else clears the buttons.
pub fn inline_keyboard(markup: &Markup) -> Value {
    let rows = match markup {
        Markup::Inline(rows) => rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| json!({ "text": b.label, "callback_data": b.data }))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>(),
        _ => Vec::new(),
    };
    json!({ "inline_keyboard": rows })
}
