//! Outbound Telegram calls behind a small trait so handlers can be tested.

use std::future::Future;

use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, ChatAction, FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId,
    ParseMode,
};
use tracing::{info, warn};

use crate::config::ApiConfig;

/// An inline keyboard button carrying callback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self { label: label.into(), data: data.into() }
    }
}

/// Rows of buttons.
pub type Keyboard = Vec<Vec<Button>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Plain,
    /// Telegram's legacy Markdown (`*bold*`, `_italic_`).
    Markdown,
}

/// Everything the bot sends to Telegram.
pub trait Messenger: Send + Sync {
    /// Returns the sent message id.
    fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        format: Format,
        keyboard: Option<Keyboard>,
    ) -> impl Future<Output = Result<i64, String>> + Send;

    fn send_voice(&self, chat_id: i64, audio: Vec<u8>) -> impl Future<Output = Result<i64, String>> + Send;

    fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> impl Future<Output = Result<(), String>> + Send;

    /// Replace a message's text and keyboard.
    fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Keyboard,
    ) -> impl Future<Output = Result<(), String>> + Send;

    fn send_typing(&self, chat_id: i64) -> impl Future<Output = Result<(), String>> + Send;

    /// Resolve a voice note's file id to a URL the content API can download.
    fn voice_file_url(&self, file_id: &str) -> impl Future<Output = Result<String, String>> + Send;
}

fn to_markup(keyboard: Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.into_iter().map(|row| {
        row.into_iter()
            .map(|b| InlineKeyboardButton::callback(b.label, b.data))
            .collect::<Vec<_>>()
    }))
}

/// Download URL for a file path returned by `getFile`.
pub fn file_download_url(api_url: &str, token: &str, file_path: &str) -> String {
    format!("{}/file/bot{}/{}", api_url.trim_end_matches('/'), token, file_path)
}

/// Build a `Bot` whose HTTP pool follows the configured tuning.
pub fn build_bot(token: &str, api: &ApiConfig) -> Result<Bot, String> {
    let client = teloxide::net::default_reqwest_settings()
        .pool_max_idle_per_host(api.pool_size)
        .build()
        .map_err(|e| format!("Failed to build Telegram HTTP client: {e}"))?;
    Ok(Bot::with_client(token, client))
}

/// Telegram API client.
#[derive(Clone)]
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl Messenger for TelegramClient {
    #[allow(deprecated)]
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        format: Format,
        keyboard: Option<Keyboard>,
    ) -> Result<i64, String> {
        let markup = keyboard.map(to_markup);
        let mut request = self.bot.send_message(ChatId(chat_id), text);
        if format == Format::Markdown {
            request = request.parse_mode(ParseMode::Markdown);
        }
        if let Some(ref markup) = markup {
            request = request.reply_markup(markup.clone());
        }

        match request.await {
            Ok(msg) => Ok(msg.id.0 as i64),
            // Generated answers aren't guaranteed to be valid Markdown
            Err(e) if format == Format::Markdown && e.to_string().contains("parse entities") => {
                warn!("Markdown rejected for chat {}, resending as plain text", chat_id);
                let mut plain = self.bot.send_message(ChatId(chat_id), text);
                if let Some(markup) = markup {
                    plain = plain.reply_markup(markup);
                }
                plain.await.map(|msg| msg.id.0 as i64).map_err(|e| {
                    let msg = format!("Failed to send: {e}");
                    warn!("{}", msg);
                    msg
                })
            }
            Err(e) => {
                let msg = format!("Failed to send: {e}");
                warn!("{}", msg);
                Err(msg)
            }
        }
    }

    async fn send_voice(&self, chat_id: i64, audio: Vec<u8>) -> Result<i64, String> {
        info!("🔊 Sending voice to chat {} ({} bytes)", chat_id, audio.len());

        let input_file = InputFile::memory(audio).file_name("voice.ogg");
        self.bot
            .send_voice(ChatId(chat_id), input_file)
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| {
                let msg = format!("Failed to send voice: {e}");
                warn!("{}", msg);
                msg
            })
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), String> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()));
        if let Some(text) = text {
            request = request.text(text);
        }
        request.await.map(|_| ()).map_err(|e| {
            let msg = format!("Failed to answer callback: {e}");
            warn!("{}", msg);
            msg
        })
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<(), String> {
        self.bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id as i32), text)
            .reply_markup(to_markup(keyboard))
            .await
            .map(|_| ())
            .map_err(|e| {
                let msg = format!("Failed to edit message: {e}");
                warn!("{}", msg);
                msg
            })
    }

    async fn send_typing(&self, chat_id: i64) -> Result<(), String> {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
            .map(|_| ())
            .map_err(|e| format!("Failed to send typing action: {e}"))
    }

    async fn voice_file_url(&self, file_id: &str) -> Result<String, String> {
        let file = self
            .bot
            .get_file(FileId(file_id.to_string()))
            .await
            .map_err(|e| format!("Failed to get file info: {e}"))?;

        Ok(file_download_url(self.bot.api_url().as_str(), self.bot.token(), &file.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_download_url() {
        assert_eq!(
            file_download_url("https://api.telegram.org/", "123:abc", "voice/file_7.oga"),
            "https://api.telegram.org/file/bot123:abc/voice/file_7.oga"
        );
        assert_eq!(
            file_download_url("http://localhost:8081", "1:x", "v.oga"),
            "http://localhost:8081/file/bot1:x/v.oga"
        );
    }

    #[test]
    fn test_markup_keeps_rows() {
        let markup = to_markup(vec![
            vec![Button::new("A", "lang_en")],
            vec![Button::new("👍", "x"), Button::new("👎", "y")],
        ]);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[1].len(), 2);
        assert_eq!(markup.inline_keyboard[0][0].text, "A");
    }
}
