//! Bot behaviour: menus, selections, and relaying questions to the content API.
//!
//! Every handler swallows its own failures (logging them) so one bad update
//! never reaches the dispatcher as an error.

use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

use crate::api::{ApiRequest, QueryClient, QueryInput, RequestMeta};
use crate::callback::{self, CallbackAction, Reaction};
use crate::config::Mode;
use crate::i18n::{self, Language, Persona};
use crate::session::SessionStore;
use crate::telegram::{Button, Format, Keyboard, Messenger};
use crate::telemetry::InteractEvent;

#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "start the bot")]
    Start,
    #[command(description = "show help")]
    Help,
    #[command(description = "choose your language")]
    SelectLanguage,
    #[command(description = "choose a Sakhi")]
    SelectBot,
}

/// Who sent an update.
#[derive(Debug, Clone)]
pub struct Sender {
    pub chat_id: i64,
    pub user_id: i64,
    pub first_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Voice { file_id: String },
}

/// A question from a user.
#[derive(Debug, Clone)]
pub struct Incoming {
    pub from: Sender,
    pub message_id: i64,
    pub content: Content,
}

/// A pressed inline button.
#[derive(Debug, Clone)]
pub struct IncomingCallback {
    pub id: String,
    pub from: Sender,
    /// Message carrying the keyboard, when Telegram still gives it to us.
    pub message_id: Option<i64>,
    pub data: String,
}

pub struct Handlers<M> {
    messenger: M,
    sessions: SessionStore,
    api: QueryClient,
    feedback_buttons: bool,
    typing_indicator: bool,
}

impl<M: Messenger> Handlers<M> {
    pub fn new(messenger: M, api: QueryClient, mode: Mode) -> Self {
        Self {
            messenger,
            sessions: SessionStore::new(),
            api,
            feedback_buttons: mode.feedback_buttons(),
            typing_indicator: mode.typing_indicator(),
        }
    }

    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn on_command(&self, from: &Sender, command: Command) {
        match command {
            Command::Start => {
                info!(
                    chat_id = from.chat_id,
                    username = %from.first_name,
                    category = "logged_in",
                    label = "logged_in",
                    "👋 /start"
                );
                self.send(from.chat_id, i18n::WELCOME_BANNER, Format::Markdown, None).await;
                if self.sessions.has_language(from.user_id).await {
                    self.show_persona_menu(from).await;
                } else {
                    self.show_language_menu(from.chat_id).await;
                }
            }
            Command::Help => {
                self.send(from.chat_id, i18n::HELP_TEXT, Format::Plain, None).await;
            }
            Command::SelectLanguage => self.show_language_menu(from.chat_id).await,
            Command::SelectBot => self.show_persona_menu(from).await,
        }
    }

    pub async fn on_callback(&self, cb: IncomingCallback) {
        let from = &cb.from;
        match CallbackAction::parse(&cb.data) {
            CallbackAction::SelectLanguage(language) => {
                self.sessions.set_language(from.user_id, language).await;
                info!(
                    chat_id = from.chat_id,
                    username = %from.first_name,
                    category = "language_selection",
                    label = "engine_selection",
                    value = language.code(),
                    "🌐 Language selected"
                );
                self.answer(&cb.id, None).await;
                self.show_persona_menu(from).await;
            }
            CallbackAction::UnknownLanguage(code) => {
                warn!("Unknown language '{}' from user {}", code, from.user_id);
                self.answer(&cb.id, None).await;
                self.show_language_menu(from.chat_id).await;
            }
            CallbackAction::SelectPersona(persona) => {
                self.sessions.set_persona(from.user_id, persona).await;
                let language = self.sessions.language(from.user_id).await;
                info!(
                    chat_id = from.chat_id,
                    username = %from.first_name,
                    category = "bot_selection",
                    label = "bot_selection",
                    value = persona.code(),
                    "🤖 Persona selected"
                );
                self.answer(&cb.id, None).await;
                self.send(from.chat_id, i18n::persona_welcome(language, persona), Format::Markdown, None)
                    .await;
            }
            CallbackAction::UnknownPersona(code) => {
                warn!("Unknown persona '{}' from user {}", code, from.user_id);
                self.answer(&cb.id, None).await;
                self.show_persona_menu(from).await;
            }
            CallbackAction::Feedback { reaction, message_id } => {
                let persona = self.sessions.persona(from.user_id).await;
                InteractEvent::feedback(from.user_id, reaction, persona, &message_id).emit();
                self.answer(&cb.id, Some(i18n::FEEDBACK_THANKS)).await;

                let Some(keyboard_message) = cb.message_id else {
                    debug!("Feedback callback without a message, nothing to redraw");
                    return;
                };
                let _ = self
                    .messenger
                    .edit_message(
                        from.chat_id,
                        keyboard_message,
                        i18n::FEEDBACK_REDRAW_PROMPT,
                        feedback_ack_keyboard(reaction),
                    )
                    .await;
            }
            CallbackAction::FeedbackAck => self.answer(&cb.id, None).await,
            CallbackAction::Unrecognized(data) => {
                debug!("Ignoring callback data {:?}", data);
                self.answer(&cb.id, None).await;
            }
        }
    }

    /// Relay a question to the content API and deliver the answer.
    pub async fn on_message(&self, msg: Incoming) {
        let from = &msg.from;
        let session = self.sessions.get(from.user_id).await;
        let language = session.language();
        let persona = session.persona();

        let question = question_label(&msg.content);
        let input = match &msg.content {
            Content::Text(text) => {
                info!(
                    chat_id = from.chat_id,
                    username = %from.first_name,
                    category = "query_handler",
                    label = "question",
                    value = %question,
                    "❓ Question"
                );
                QueryInput::Text(text.clone())
            }
            Content::Voice { file_id } => match self.messenger.voice_file_url(file_id).await {
                Ok(url) => {
                    info!(
                        chat_id = from.chat_id,
                        username = %from.first_name,
                        category = "query_handler",
                        label = "voice_question",
                        value = %question,
                        "🎤 Voice question"
                    );
                    QueryInput::Audio(url)
                }
                Err(e) => {
                    error!(chat_id = from.chat_id, "Failed to resolve voice file: {e}");
                    self.send(from.chat_id, i18n::GENERIC_ERROR, Format::Plain, None).await;
                    return;
                }
            },
        };

        self.send(from.chat_id, i18n::loader_message(language), Format::Plain, None).await;
        if self.typing_indicator {
            let _ = self.messenger.send_typing(from.chat_id).await;
        }

        let request = ApiRequest::new(language, persona, input);
        let meta = RequestMeta {
            message_id: msg.message_id,
            user_id: from.user_id,
        };

        let output = match self.api.query(persona, &request, meta).await {
            Ok(output) => output,
            Err(e) => {
                self.send(from.chat_id, i18n::GENERIC_ERROR, Format::Plain, None).await;
                error!(
                    chat_id = from.chat_id,
                    username = %from.first_name,
                    category = "handle_query_response",
                    label = "question_sent",
                    value = %question,
                    error = %e,
                    "❌ Query failed"
                );
                return;
            }
        };

        info!(
            chat_id = from.chat_id,
            username = %from.first_name,
            category = "handle_query_response",
            label = "answer_received",
            value = %question,
            "✅ Answer received"
        );
        self.send(from.chat_id, &output.text, Format::Markdown, None).await;

        if self.feedback_buttons {
            self.send(
                from.chat_id,
                i18n::FEEDBACK_PROMPT,
                Format::Markdown,
                Some(feedback_keyboard(msg.message_id)),
            )
            .await;
        }

        if let Some(audio_url) = output.audio {
            match self.api.fetch_audio(&audio_url).await {
                Ok(audio) => {
                    let _ = self.messenger.send_voice(from.chat_id, audio).await;
                }
                Err(e) => warn!("Failed to download answer audio {}: {}", audio_url, e),
            }
        }
    }

    async fn show_language_menu(&self, chat_id: i64) {
        self.send(chat_id, i18n::LANGUAGE_MENU_PROMPT, Format::Plain, Some(language_keyboard()))
            .await;
    }

    async fn show_persona_menu(&self, from: &Sender) {
        let language = self.sessions.language(from.user_id).await;
        self.send(
            from.chat_id,
            i18n::persona_menu_prompt(language),
            Format::Markdown,
            Some(persona_keyboard(language)),
        )
        .await;
    }

    async fn send(&self, chat_id: i64, text: &str, format: Format, keyboard: Option<Keyboard>) {
        // TelegramClient already logs send failures
        let _ = self.messenger.send_text(chat_id, text, format, keyboard).await;
    }

    async fn answer(&self, callback_id: &str, text: Option<&str>) {
        let _ = self.messenger.answer_callback(callback_id, text).await;
    }
}

/// How a question appears in logs. Voice notes are named by file id, never by
/// download URL, since that URL carries the bot token.
pub fn question_label(content: &Content) -> String {
    match content {
        Content::Text(text) => text.clone(),
        Content::Voice { file_id } => format!("voice:{file_id}"),
    }
}

/// One language per row.
pub fn language_keyboard() -> Keyboard {
    Language::ALL
        .iter()
        .map(|l| vec![Button::new(l.native_name(), callback::language_data(*l))])
        .collect()
}

/// One persona per row, labelled in `language`.
pub fn persona_keyboard(language: Language) -> Keyboard {
    Persona::ALL
        .iter()
        .map(|p| vec![Button::new(i18n::persona_label(language, *p), callback::persona_data(*p))])
        .collect()
}

/// 👍🏻 / 👎🏻 under an answer to `message_id`.
pub fn feedback_keyboard(message_id: i64) -> Keyboard {
    vec![vec![
        Button::new("👍🏻", callback::feedback_data(Reaction::Liked, message_id)),
        Button::new("👎🏻", callback::feedback_data(Reaction::Disliked, message_id)),
    ]]
}

/// Redrawn feedback keyboard with the chosen thumb highlighted.
pub fn feedback_ack_keyboard(chosen: Reaction) -> Keyboard {
    let up = if chosen == Reaction::Liked { "👍" } else { "👍🏻" };
    let down = if chosen == Reaction::Disliked { "👎" } else { "👎🏻" };
    vec![vec![
        Button::new(up, callback::feedback_ack_data(Reaction::Liked)),
        Button::new(down, callback::feedback_ack_data(Reaction::Disliked)),
    ]]
}
