//! Per-user menu selections, kept in memory for the life of the process.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::i18n::{Language, Persona};

/// What a user picked from the menus. `None` means never picked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    pub language: Option<Language>,
    pub persona: Option<Persona>,
}

impl Session {
    pub fn language(&self) -> Language {
        self.language.unwrap_or_default()
    }

    pub fn persona(&self) -> Persona {
        self.persona.unwrap_or_default()
    }
}

/// Sessions keyed by Telegram user id.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<i64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a user's session (empty if none exists).
    pub async fn get(&self, user_id: i64) -> Session {
        self.sessions.lock().await.get(&user_id).copied().unwrap_or_default()
    }

    pub async fn language(&self, user_id: i64) -> Language {
        self.get(user_id).await.language()
    }

    pub async fn persona(&self, user_id: i64) -> Persona {
        self.get(user_id).await.persona()
    }

    pub async fn has_language(&self, user_id: i64) -> bool {
        self.get(user_id).await.language.is_some()
    }

    pub async fn set_language(&self, user_id: i64, language: Language) {
        self.sessions.lock().await.entry(user_id).or_default().language = Some(language);
    }

    pub async fn set_persona(&self, user_id: i64, persona: Persona) {
        self.sessions.lock().await.entry(user_id).or_default().persona = Some(persona);
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_user_gets_defaults() {
        let store = SessionStore::new();
        assert_eq!(store.language(42).await, Language::En);
        assert_eq!(store.persona(42).await, Persona::Story);
        assert!(!store.has_language(42).await);
        // Reads don't create sessions
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_selections_persist() {
        let store = SessionStore::new();
        store.set_language(1, Language::Hi).await;
        store.set_persona(1, Persona::Teacher).await;

        assert!(store.has_language(1).await);
        assert_eq!(store.language(1).await, Language::Hi);
        assert_eq!(store.persona(1).await, Persona::Teacher);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = SessionStore::new();
        store.set_language(1, Language::Ta).await;
        store.set_persona(2, Persona::Parent).await;

        assert_eq!(store.get(1).await, Session { language: Some(Language::Ta), persona: None });
        assert_eq!(store.get(2).await, Session { language: None, persona: Some(Persona::Parent) });
        assert_eq!(store.persona(1).await, Persona::Story);
        assert_eq!(store.language(2).await, Language::En);
    }

    #[tokio::test]
    async fn test_reselecting_overwrites() {
        let store = SessionStore::new();
        store.set_persona(7, Persona::Teacher).await;
        store.set_persona(7, Persona::Parent).await;
        assert_eq!(store.persona(7).await, Persona::Parent);
        assert_eq!(store.len().await, 1);
    }
}
