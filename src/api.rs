//! Client for the story/activity generation API.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ApiConfig;
use crate::i18n::{Language, Persona};

/// What the user asked: typed text or a voice note URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryInput {
    Text(String),
    Audio(String),
}

/// Identifies the asker; sent as `x-*` headers.
#[derive(Debug, Clone, Copy)]
pub struct RequestMeta {
    pub message_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutput {
    pub text: String,
    pub audio: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ApiRequest {
    pub input: RequestInput,
    pub output: RequestOutput,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RequestInput {
    pub language: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(rename = "audienceType", skip_serializing_if = "Option::is_none")]
    pub audience_type: Option<&'static str>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RequestOutput {
    pub format: &'static str,
}

impl ApiRequest {
    /// Text asks for a text answer, voice asks for audio.
    /// Non-story personas add `audienceType`.
    pub fn new(language: Language, persona: Persona, input: QueryInput) -> Self {
        let (text, audio, format) = match input {
            QueryInput::Text(t) => (Some(t), None, "text"),
            QueryInput::Audio(url) => (None, Some(url), "audio"),
        };
        let audience_type = match persona {
            Persona::Story => None,
            other => Some(other.code()),
        };
        Self {
            input: RequestInput {
                language: language.code(),
                text,
                audio,
                audience_type,
            },
            output: RequestOutput { format },
        }
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    output: Option<ResponseOutput>,
    /// `Some` whenever the key is present, even as `null`.
    #[serde(default, deserialize_with = "present")]
    error: Option<serde_json::Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
struct ResponseOutput {
    text: Option<String>,
    audio: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    Http(String),
    Status(String),
    Parse(String),
    /// The API answered with an `error` field.
    Remote(String),
    /// Well-formed JSON without `output.text`.
    Empty,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Http(e) => write!(f, "HTTP error: {e}"),
            ApiError::Status(e) => write!(f, "API error: {e}"),
            ApiError::Parse(e) => write!(f, "Parse error: {e}"),
            ApiError::Remote(e) => write!(f, "Remote error: {e}"),
            ApiError::Empty => write!(f, "Invalid response received from API"),
        }
    }
}

impl std::error::Error for ApiError {}

pub struct QueryClient {
    story_url: String,
    activity_url: String,
    auth_token: Option<String>,
    http: reqwest::Client,
}

impl QueryClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_size)
            .build()
            .map_err(|e| ApiError::Http(e.to_string()))?;

        Ok(Self {
            story_url: format!("{}/v1/query", config.story_base_url),
            activity_url: format!("{}/v1/query", config.activity_base_url),
            auth_token: config.auth_token.clone(),
            http,
        })
    }

    /// Story goes to the story service, everything else to the activity service.
    pub fn endpoint(&self, persona: Persona) -> &str {
        match persona {
            Persona::Story => &self.story_url,
            Persona::Teacher | Persona::Parent => &self.activity_url,
        }
    }

    pub async fn query(
        &self,
        persona: Persona,
        request: &ApiRequest,
        meta: RequestMeta,
    ) -> Result<QueryOutput, ApiError> {
        let url = self.endpoint(persona);
        // Audio inputs are Telegram file URLs carrying the bot token, so the body isn't logged
        debug!(
            "API request to {url} (language {}, format {})",
            request.input.language, request.output.format
        );

        let mut builder = self
            .http
            .post(url)
            .header("x-source", "telegram")
            .header("x-request-id", meta.message_id.to_string())
            .header("x-device-id", format!("d{}", meta.user_id))
            .header("x-consumer-id", meta.user_id.to_string())
            .json(request);
        if let Some(ref token) = self.auth_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        if let Some(error) = api_response.error {
            let message = match error {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            return Err(ApiError::Remote(message));
        }

        let output = api_response.output.ok_or(ApiError::Empty)?;
        let text = output.text.ok_or(ApiError::Empty)?;
        Ok(QueryOutput {
            text,
            audio: output.audio.filter(|a| !a.is_empty()),
        })
    }

    /// Download generated audio.
    pub async fn fetch_audio(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().to_string()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
