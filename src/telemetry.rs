//! Feedback interaction events, emitted on the `telemetry` tracing target.

use serde::Serialize;
use tracing::info;

use crate::callback::Reaction;
use crate::i18n::Persona;

#[derive(Debug, Serialize)]
pub struct InteractEvent {
    pub eid: &'static str,
    /// Milliseconds since the epoch.
    pub ets: i64,
    pub actor: Actor,
    pub context: EventContext,
    pub edata: EventData,
}

#[derive(Debug, Serialize)]
pub struct Actor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EventContext {
    pub channel: &'static str,
    pub did: String,
}

#[derive(Debug, Serialize)]
pub struct EventData {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub subtype: String,
    /// Persona the feedback is about.
    pub id: &'static str,
    /// Id of the question message the answer was for.
    #[serde(rename = "requestId")]
    pub request_id: String,
}

impl InteractEvent {
    pub fn feedback(user_id: i64, reaction: Reaction, persona: Persona, request_id: &str) -> Self {
        Self {
            eid: "INTERACT",
            ets: chrono::Utc::now().timestamp_millis(),
            actor: Actor {
                id: user_id.to_string(),
                kind: "User",
            },
            context: EventContext {
                channel: "telegram",
                did: format!("d{user_id}"),
            },
            edata: EventData {
                kind: "CLICK",
                subtype: reaction.subtype(),
                id: persona.code(),
                request_id: request_id.to_string(),
            },
        }
    }

    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(json) => info!(target: "telemetry", event = %json, "interact"),
            Err(e) => tracing::warn!("Failed to serialize telemetry event: {e}"),
        }
    }
}
