//! REST client for the Telegram Bot API.
//!
//! Every method is a `POST https://api.telegram.org/bot<token>/<method>`
//! returning the `{ok, result, description}` envelope. Files are fetched
//! from `https://api.telegram.org/file/bot<token>/<file_path>`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::types::{ApiResponse, File, Message, Update};

/// Production API base URL.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Slack added on top of the long-poll timeout before the HTTP client
/// gives up on `getUpdates`.
const POLL_SLACK: Duration = Duration::from_secs(10);

/// Description Telegram returns when a keyboard edit changes nothing.
const NOT_MODIFIED: &str = "message is not modified";

/// HTTP client for one bot.
#[derive(Clone)]
pub struct TelegramApi {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

/// Errors from the Bot API layer.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered `ok: false`.
    #[error("Telegram API error ({code}): {description}")]
    ApiError { code: i64, description: String },

    /// File download returned a non-success status.
    #[error("Telegram file download failed ({status})")]
    Download { status: u16 },

    /// `getFile` returned no downloadable path.
    #[error("Telegram file {0} has no download path")]
    NoFilePath(String),
}

impl TelegramApi {
    /// Create a client against the production API. `poll_timeout` is the
    /// long-poll timeout later passed to [`get_updates`](Self::get_updates).
    pub fn new(token: impl Into<String>, poll_timeout: Duration) -> Result<Self, TelegramError> {
        let client = reqwest::Client::builder()
            .timeout(poll_timeout + POLL_SLACK)
            .build()?;
        Ok(Self::with_client(client, DEFAULT_API_URL, token))
    }

    /// Create a client with a custom base URL (used by tests against a
    /// mock server).
    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url, self.token)
    }

    /// Call a JSON method and unwrap the envelope.
    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, TelegramError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await?;
        Self::parse_envelope(response).await
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<Value>,
    ) -> Result<Message, TelegramError> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(markup) = reply_markup {
            body["reply_markup"] = markup;
        }
        self.call("sendMessage", &body).await
    }

    /// Replace the inline keyboard of a sent message. An edit that changes
    /// nothing is not an error.
    pub async fn edit_message_reply_markup(
        &self,
        chat_id: i64,
        message_id: i64,
        reply_markup: Value,
    ) -> Result<(), TelegramError> {
        let result: Result<Value, _> = self
            .call(
                "editMessageReplyMarkup",
                &json!({
                    "chat_id": chat_id,
                    "message_id": message_id,
                    "reply_markup": reply_markup,
                }),
            )
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(TelegramError::ApiError { description, .. }) if description.contains(NOT_MODIFIED) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: &str,
        show_alert: bool,
    ) -> Result<(), TelegramError> {
        let mut body = json!({ "callback_query_id": callback_query_id });
        if !text.is_empty() {
            body["text"] = json!(text);
            body["show_alert"] = json!(show_alert);
        }
        let _: bool = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }

    /// Upload a document as multipart form data.
    pub async fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
        caption: &str,
        reply_markup: Option<Value>,
    ) -> Result<Message, TelegramError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);
        if !caption.is_empty() {
            form = form.text("caption", caption.to_string());
        }
        if let Some(markup) = reply_markup {
            form = form.text("reply_markup", markup.to_string());
        }

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;
        Self::parse_envelope(response).await
    }

    pub async fn get_file(&self, file_id: &str) -> Result<File, TelegramError> {
        self.call("getFile", &json!({ "file_id": file_id })).await
    }

    /// Resolve a file id and download its contents.
    pub async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, TelegramError> {
        let file = self.get_file(file_id).await?;
        let path = file
            .file_path
            .ok_or_else(|| TelegramError::NoFilePath(file_id.to_string()))?;

        let url = format!("{}/file/bot{}/{path}", self.api_url, self.token);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TelegramError::Download {
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    // ---- private helpers ----

    /// Decode the envelope. Error responses carry a JSON body too, so the
    /// HTTP status is not checked separately.
    async fn parse_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TelegramError> {
        let status = response.status().as_u16();
        let envelope: ApiResponse<T> = response.json().await?;
        match (envelope.ok, envelope.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(TelegramError::ApiError {
                code: envelope.error_code.unwrap_or(i64::from(status)),
                description: envelope.description.unwrap_or_default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_url_embeds_token() {
        let api = TelegramApi::with_client(reqwest::Client::new(), "http://localhost:1/", "123:abc");
        assert_eq!(api.method_url("getMe"), "http://localhost:1/bot123:abc/getMe");
    }
}
