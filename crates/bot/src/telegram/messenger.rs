//! [`Messenger`] port backed by the Bot API. Chats are private, so the
//! chat id equals the user id.

use async_trait::async_trait;

use lightdesk_core::ports::{MessageId, Messenger, PortError};
use lightdesk_core::prompt::{Markup, Prompt};
use lightdesk_core::types::UserId;

use super::api::{TelegramApi, TelegramError};
use super::markup::{inline_keyboard, reply_markup};

impl From<TelegramError> for PortError {
    fn from(err: TelegramError) -> Self {
        PortError::Remote(err.to_string())
    }
}

#[async_trait]
impl Messenger for TelegramApi {
    async fn prompt(&self, chat: UserId, prompt: &Prompt) -> Result<MessageId, PortError> {
        let message = self
            .send_message(chat, &prompt.text, reply_markup(&prompt.markup))
            .await?;
        Ok(message.message_id)
    }

    async fn refresh_markup(
        &self,
        chat: UserId,
        message: MessageId,
        markup: &Markup,
    ) -> Result<(), PortError> {
        self.edit_message_reply_markup(chat, message, inline_keyboard(markup))
            .await?;
        Ok(())
    }

    async fn notice(&self, callback_id: &str, text: &str, alert: bool) -> Result<(), PortError> {
        self.answer_callback_query(callback_id, text, alert).await?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat: UserId,
        file_name: &str,
        bytes: Vec<u8>,
        caption: &str,
        markup: &Markup,
    ) -> Result<(), PortError> {
        TelegramApi::send_document(self, chat, file_name, bytes, caption, reply_markup(markup)).await?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, PortError> {
        Ok(TelegramApi::download_file(self, file_id).await?)
    }
}
