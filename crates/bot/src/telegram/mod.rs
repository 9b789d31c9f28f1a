//! Telegram Bot API adapter.
//!
//! [`TelegramApi`] is a thin REST client; [`messenger`] implements the
//! [`Messenger`](lightdesk_core::ports::Messenger) port on top of it and
//! [`markup`] converts messenger-neutral keyboards to Telegram JSON.

pub mod api;
pub mod markup;
pub mod messenger;
pub mod types;

pub use api::{TelegramApi, TelegramError};
