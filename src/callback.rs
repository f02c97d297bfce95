//! Inline-button callback data: building it and parsing it back.
//!
//! Formats:
//! - `lang_<code>`
//! - `botname_<persona>`
//! - `message-<liked|disliked>__<message id>`
//! - `replymessage_<liked|disliked>`

use std::sync::LazyLock;

use regex::Regex;

use crate::i18n::{Language, Persona};

static LANGUAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^lang_(\w*)").expect("language callback regex"));
static PERSONA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^botname_(\w*)").expect("persona callback regex"));
static FEEDBACK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^message-(\w*)").expect("feedback callback regex"));
static FEEDBACK_ACK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^replymessage_(\w*)").expect("feedback ack callback regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Liked,
    Disliked,
}

impl Reaction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reaction::Liked => "liked",
            Reaction::Disliked => "disliked",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "liked" => Some(Reaction::Liked),
            "disliked" => Some(Reaction::Disliked),
            _ => None,
        }
    }

    /// Telemetry subtype, e.g. `message-liked`.
    pub fn subtype(&self) -> String {
        format!("message-{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    SelectLanguage(Language),
    UnknownLanguage(String),
    SelectPersona(Persona),
    UnknownPersona(String),
    /// Thumb pressed under an answer. `message_id` is the question's id.
    Feedback { reaction: Reaction, message_id: String },
    /// Thumb pressed on the already-redrawn keyboard.
    FeedbackAck,
    /// Matches no known pattern.
    Unrecognized(String),
}

impl CallbackAction {
    pub fn parse(data: &str) -> Self {
        if let Some(caps) = LANGUAGE.captures(data) {
            let code = &caps[1];
            return match Language::from_code(code) {
                Some(lang) => Self::SelectLanguage(lang),
                None => Self::UnknownLanguage(code.to_string()),
            };
        }
        if let Some(caps) = PERSONA.captures(data) {
            let code = &caps[1];
            return match Persona::from_code(code) {
                Some(persona) => Self::SelectPersona(persona),
                None => Self::UnknownPersona(code.to_string()),
            };
        }
        if let Some(caps) = FEEDBACK.captures(data) {
            let parsed = caps[1]
                .split_once("__")
                .and_then(|(reaction, id)| Reaction::parse(reaction).map(|r| (r, id)));
            return match parsed {
                Some((reaction, id)) if !id.is_empty() => Self::Feedback {
                    reaction,
                    message_id: id.to_string(),
                },
                _ => Self::Unrecognized(data.to_string()),
            };
        }
        if FEEDBACK_ACK.is_match(data) {
            return Self::FeedbackAck;
        }
        Self::Unrecognized(data.to_string())
    }
}

pub fn language_data(language: Language) -> String {
    format!("lang_{}", language.code())
}

pub fn persona_data(persona: Persona) -> String {
    format!("botname_{}", persona.code())
}

pub fn feedback_data(reaction: Reaction, message_id: i64) -> String {
    format!("message-{}__{}", reaction.as_str(), message_id)
}

pub fn feedback_ack_data(reaction: Reaction) -> String {
    format!("replymessage_{}", reaction.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language() {
        assert_eq!(CallbackAction::parse("lang_hi"), CallbackAction::SelectLanguage(Language::Hi));
        assert_eq!(CallbackAction::parse(&language_data(Language::Or)), CallbackAction::SelectLanguage(Language::Or));
        assert_eq!(CallbackAction::parse("lang_xx"), CallbackAction::UnknownLanguage("xx".into()));
        assert_eq!(CallbackAction::parse("lang_"), CallbackAction::UnknownLanguage(String::new()));
    }

    #[test]
    fn test_persona() {
        assert_eq!(CallbackAction::parse("botname_parent"), CallbackAction::SelectPersona(Persona::Parent));
        assert_eq!(CallbackAction::parse("botname_wizard"), CallbackAction::UnknownPersona("wizard".into()));
    }

    #[test]
    fn test_feedback() {
        assert_eq!(
            CallbackAction::parse(&feedback_data(Reaction::Disliked, 812)),
            CallbackAction::Feedback { reaction: Reaction::Disliked, message_id: "812".into() }
        );
        assert_eq!(
            CallbackAction::parse("message-liked__55"),
            CallbackAction::Feedback { reaction: Reaction::Liked, message_id: "55".into() }
        );
    }

    #[test]
    fn test_malformed_feedback() {
        assert!(matches!(CallbackAction::parse("message-liked"), CallbackAction::Unrecognized(_)));
        assert!(matches!(CallbackAction::parse("message-loved__3"), CallbackAction::Unrecognized(_)));
        assert!(matches!(CallbackAction::parse("message-liked__"), CallbackAction::Unrecognized(_)));
    }

    #[test]
    fn test_feedback_ack() {
        assert_eq!(CallbackAction::parse(&feedback_ack_data(Reaction::Liked)), CallbackAction::FeedbackAck);
        assert_eq!(CallbackAction::parse("replymessage_disliked"), CallbackAction::FeedbackAck);
    }

    #[test]
    fn test_patterns_anchor_at_start() {
        assert!(matches!(CallbackAction::parse("xlang_en"), CallbackAction::Unrecognized(_)));
        assert!(matches!(CallbackAction::parse("noise"), CallbackAction::Unrecognized(_)));
    }

    #[test]
    fn test_subtype() {
        assert_eq!(Reaction::Liked.subtype(), "message-liked");
        assert_eq!(Reaction::Disliked.subtype(), "message-disliked");
    }
}
