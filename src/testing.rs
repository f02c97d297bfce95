//! In-memory `Messenger` that records what the bot would have sent.

use std::sync::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use crate::telegram::{Format, Keyboard, Messenger};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat_id: i64,
        text: String,
        format: Format,
        keyboard: Option<Keyboard>,
    },
    Voice {
        chat_id: i64,
        bytes: usize,
    },
    Answer {
        id: String,
        text: Option<String>,
    },
    Edit {
        chat_id: i64,
        message_id: i64,
        text: String,
        keyboard: Keyboard,
    },
    Typing {
        chat_id: i64,
    },
}

#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    next_id: AtomicI64,
    fail_files: AtomicBool,
}

impl RecordingMessenger {
    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.recorded())
    }

    /// Make `voice_file_url` fail from now on.
    pub fn fail_file_lookups(&self) {
        self.fail_files.store(true, Ordering::SeqCst);
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<Sent>> {
        // A panicking test thread shouldn't hide what was recorded
        self.sent.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, item: Sent) -> i64 {
        self.recorded().push(item);
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        format: Format,
        keyboard: Option<Keyboard>,
    ) -> Result<i64, String> {
        Ok(self.record(Sent::Text {
            chat_id,
            text: text.to_string(),
            format,
            keyboard,
        }))
    }

    async fn send_voice(&self, chat_id: i64, audio: Vec<u8>) -> Result<i64, String> {
        Ok(self.record(Sent::Voice {
            chat_id,
            bytes: audio.len(),
        }))
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), String> {
        self.record(Sent::Answer {
            id: callback_id.to_string(),
            text: text.map(str::to_string),
        });
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<(), String> {
        self.record(Sent::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<(), String> {
        self.record(Sent::Typing { chat_id });
        Ok(())
    }

    async fn voice_file_url(&self, file_id: &str) -> Result<String, String> {
        if self.fail_files.load(Ordering::SeqCst) {
            return Err("file lookup failed".to_string());
        }
        Ok(format!("https://files.test/voice/{file_id}.oga"))
    }
}
