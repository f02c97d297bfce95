//! Routes Telegram updates to the handlers. Shared by polling and webhook.

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{Me, UpdateKind};
use teloxide::utils::command::BotCommands;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::handlers::{Command, Content, Handlers, Incoming, IncomingCallback, Sender};
use crate::telegram::{Messenger, TelegramClient};

pub type BotHandlers = Handlers<TelegramClient>;

/// Caps how many updates are handled at once.
///
/// In polling mode teloxide starts a worker per chat with no upper bound; each
/// endpoint holds a permit while it runs, so at most `max` chats are served
/// concurrently and updates within a chat keep their order. The webhook
/// consumer takes a permit before spawning each update.
#[derive(Clone)]
pub struct UpdateLimit(Arc<Semaphore>);

impl UpdateLimit {
    pub fn new(max: usize) -> Self {
        Self(Arc::new(Semaphore::new(max.max(1))))
    }

    /// `None` only if the semaphore was closed, which never happens here.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.0.clone().acquire_owned().await.ok()
    }

    pub fn available(&self) -> usize {
        self.0.available_permits()
    }
}

pub fn sender_of(msg: &Message) -> Sender {
    let user = msg.from.as_ref();
    Sender {
        chat_id: msg.chat.id.0,
        user_id: user.map(|u| u.id.0 as i64).unwrap_or(msg.chat.id.0),
        first_name: user
            .map(|u| u.first_name.clone())
            .or_else(|| msg.chat.first_name().map(str::to_string))
            .unwrap_or_default(),
    }
}

/// Text or voice content of a message; `None` for anything else.
pub fn incoming_from(msg: &Message) -> Option<Incoming> {
    let content = if let Some(text) = msg.text() {
        Content::Text(text.to_string())
    } else if let Some(voice) = msg.voice() {
        Content::Voice {
            file_id: voice.file.id.0.clone(),
        }
    } else {
        return None;
    };

    Some(Incoming {
        from: sender_of(msg),
        message_id: msg.id.0 as i64,
        content,
    })
}

/// `None` when the button carried no data.
pub fn callback_from(q: &CallbackQuery) -> Option<IncomingCallback> {
    let data = q.data.clone()?;
    let user_id = q.from.id.0 as i64;
    Some(IncomingCallback {
        id: q.id.0.clone(),
        from: Sender {
            chat_id: q.message.as_ref().map(|m| m.chat().id.0).unwrap_or(user_id),
            user_id,
            first_name: q.from.first_name.clone(),
        },
        message_id: q.message.as_ref().map(|m| m.id().0 as i64),
        data,
    })
}

/// Commands first; any other text (including unknown commands) or voice is a question.
pub async fn route_message<M: Messenger>(handlers: &Handlers<M>, msg: &Message, bot_username: &str) {
    if let Some(text) = msg.text()
        && let Ok(command) = Command::parse(text, bot_username)
    {
        handlers.on_command(&sender_of(msg), command).await;
        return;
    }

    match incoming_from(msg) {
        Some(incoming) => handlers.on_message(incoming).await,
        None => debug!("Ignoring message {} without text or voice", msg.id.0),
    }
}

pub async fn route_callback<M: Messenger>(handlers: &Handlers<M>, q: &CallbackQuery) {
    match callback_from(q) {
        Some(cb) => handlers.on_callback(cb).await,
        None => debug!("Ignoring callback query without data"),
    }
}

pub async fn route_update<M: Messenger>(handlers: &Handlers<M>, update: Update, bot_username: &str) {
    match update.kind {
        UpdateKind::Message(ref msg) => route_message(handlers, msg, bot_username).await,
        UpdateKind::CallbackQuery(ref q) => route_callback(handlers, q).await,
        _ => debug!("Ignoring unsupported update kind"),
    }
}

/// dptree schema for teloxide's `Dispatcher`.
pub fn schema() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(message_endpoint))
        .branch(Update::filter_callback_query().endpoint(callback_endpoint))
}

async fn message_endpoint(
    msg: Message,
    me: Me,
    handlers: Arc<BotHandlers>,
    limit: UpdateLimit,
) -> ResponseResult<()> {
    let _permit = limit.acquire().await;
    route_message(&handlers, &msg, me.username()).await;
    Ok(())
}

async fn callback_endpoint(
    q: CallbackQuery,
    handlers: Arc<BotHandlers>,
    limit: UpdateLimit,
) -> ResponseResult<()> {
    let _permit = limit.acquire().await;
    route_callback(&handlers, &q).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn message(extra: serde_json::Value) -> Message {
        let mut value = json!({
            "message_id": 31,
            "date": 1_700_000_000,
            "chat": {"id": 100, "type": "private", "first_name": "Alice"},
            "from": {"id": 7, "is_bot": false, "first_name": "Alice"}
        });
        for (k, v) in extra.as_object().unwrap() {
            value[k] = v.clone();
        }
        // Parse from text, as updates arrive over the wire
        serde_json::from_str(&value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_update_limit_caps_concurrent_holders() {
        let limit = UpdateLimit::new(2);
        let first = limit.acquire().await.unwrap();
        let _second = limit.acquire().await.unwrap();
        assert_eq!(limit.available(), 0);

        let third = tokio::time::timeout(Duration::from_millis(50), limit.acquire()).await;
        assert!(third.is_err(), "a third update ran past the limit");

        drop(first);
        let third = tokio::time::timeout(Duration::from_millis(50), limit.acquire()).await;
        assert!(matches!(third, Ok(Some(_))));
    }

    #[test]
    fn test_update_limit_never_zero() {
        assert_eq!(UpdateLimit::new(0).available(), 1);
        assert_eq!(UpdateLimit::new(8).available(), 8);
    }

    #[test]
    fn test_text_message() {
        let incoming = incoming_from(&message(json!({"text": "a story about the sea"}))).unwrap();
        assert_eq!(incoming.message_id, 31);
        assert_eq!(incoming.from.chat_id, 100);
        assert_eq!(incoming.from.user_id, 7);
        assert_eq!(incoming.from.first_name, "Alice");
        assert_eq!(incoming.content, Content::Text("a story about the sea".into()));
    }

    #[test]
    fn test_voice_message() {
        let msg = message(json!({
            "voice": {
                "file_id": "AwAD",
                "file_unique_id": "u1",
                "duration": 3,
                "mime_type": "audio/ogg",
                "file_size": 5120
            }
        }));
        let incoming = incoming_from(&msg).unwrap();
        assert_eq!(incoming.content, Content::Voice { file_id: "AwAD".into() });
    }

    #[test]
    fn test_other_content_ignored() {
        let msg = message(json!({"location": {"latitude": 1.0, "longitude": 2.0}}));
        assert!(incoming_from(&msg).is_none());
    }

    #[test]
    fn test_callback_conversion() {
        let q: CallbackQuery = serde_json::from_str(&json!({
            "id": "cbq-1",
            "from": {"id": 7, "is_bot": false, "first_name": "Alice"},
            "chat_instance": "ci",
            "data": "lang_hi",
            "message": {
                "message_id": 90,
                "date": 1_700_000_000,
                "chat": {"id": 100, "type": "private", "first_name": "Alice"},
                "text": "menu"
            }
        })
        .to_string())
        .unwrap();

        let cb = callback_from(&q).unwrap();
        assert_eq!(cb.id, "cbq-1");
        assert_eq!(cb.from.chat_id, 100);
        assert_eq!(cb.message_id, Some(90));
        assert_eq!(cb.data, "lang_hi");
    }

    #[test]
    fn test_callback_without_message_uses_user_chat() {
        let q: CallbackQuery = serde_json::from_str(&json!({
            "id": "cbq-2",
            "from": {"id": 7, "is_bot": false, "first_name": "Alice"},
            "chat_instance": "ci",
            "data": "replymessage_liked"
        })
        .to_string())
        .unwrap();

        let cb = callback_from(&q).unwrap();
        assert_eq!(cb.from.chat_id, 7);
        assert_eq!(cb.message_id, None);
    }
}
