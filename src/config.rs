use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A required environment variable is not set.
    Missing(&'static str),
    /// A variable is set but cannot be parsed.
    Invalid { var: &'static str, value: String },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(var) => write!(f, "missing required environment variable {}", var),
            Self::Invalid { var, value } => {
                write!(f, "invalid value for {}: '{}'", var, value)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// How the bot receives updates and which extras it enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Long polling, plain menu bot.
    Polling,
    /// Long polling with typing indicator and tuned HTTP pools.
    Accelerator,
    /// Webhook server feeding an update queue, with feedback buttons.
    Webhook,
}

impl Mode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "polling" | "bot" => Some(Self::Polling),
            "accelerator" => Some(Self::Accelerator),
            "webhook" => Some(Self::Webhook),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Polling => "polling",
            Self::Accelerator => "accelerator",
            Self::Webhook => "webhook",
        }
    }

    /// Whether answers get 👍/👎 feedback buttons.
    pub fn feedback_buttons(&self) -> bool {
        matches!(self, Self::Webhook)
    }

    /// Whether a typing action is sent while the API works.
    pub fn typing_indicator(&self) -> bool {
        matches!(self, Self::Accelerator)
    }
}

/// Content API endpoints and credentials.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub story_base_url: String,
    pub activity_base_url: String,
    /// Sent as a bearer token when present.
    pub auth_token: Option<String>,
    pub connect_timeout: Duration,
    pub pool_size: usize,
}

/// Webhook server settings. Only present in webhook mode.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Public base URL Telegram posts to; `/telegram` is appended.
    pub public_url: String,
    pub listen: SocketAddr,
    pub queue_size: usize,
}

pub struct Config {
    pub mode: Mode,
    pub telegram_bot_token: String,
    pub bot_name: String,
    pub api: ApiConfig,
    /// Max updates processed at once. 1 = strictly in order.
    pub concurrent_updates: usize,
    pub webhook: Option<WebhookConfig>,
    pub log_dir: PathBuf,
}

const DEFAULT_CONCURRENT_UPDATES: usize = 1;
const DEFAULT_POOL_TIMEOUT_SECS: u64 = 10;
const DEFAULT_POOL_SIZE: usize = 100;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_QUEUE_SIZE: usize = 256;

impl Config {
    /// Load from the process environment.
    pub fn from_env(mode: Mode) -> Result<Self, ConfigError> {
        Self::from_lookup(mode, |key| std::env::var(key).ok())
    }

    /// Load using `lookup` as the variable source.
    pub fn from_lookup<F>(mode: Mode, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &'static str| lookup(var).filter(|v| !v.trim().is_empty());
        let required = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));

        let telegram_bot_token = required("TELEGRAM_BOT_TOKEN")?;
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let valid_token = match telegram_bot_token.split_once(':') {
            Some((id, secret)) => id.parse::<u64>().is_ok() && !secret.is_empty(),
            None => false,
        };
        if !valid_token {
            return Err(ConfigError::Validation(
                "TELEGRAM_BOT_TOKEN appears invalid (expected format: 123456789:ABCdefGHI...)".into(),
            ));
        }

        let bot_name = required("TELEGRAM_BOT_NAME")?;
        let story_base_url = trim_base(required("STORY_API_BASE_URL")?);
        let activity_base_url = trim_base(required("ACTIVITY_API_BASE_URL")?);

        // The accelerator deployment used lowercase names for its tuning knobs.
        let tuning = |upper: &'static str, lower: &'static str| {
            get(upper)
                .map(|v| (upper, v))
                .or_else(|| get(lower).map(|v| (lower, v)))
        };

        let concurrent_updates = match tuning("CONCURRENT_UPDATES", "concurrent_updates") {
            Some((var, v)) => parse_num::<usize>(var, &v)?,
            None => DEFAULT_CONCURRENT_UPDATES,
        };
        if concurrent_updates == 0 {
            return Err(ConfigError::Validation("concurrent_updates must be at least 1".into()));
        }
        let pool_timeout = match tuning("POOL_TIMEOUT", "pool_timeout") {
            Some((var, v)) => parse_num::<u64>(var, &v)?,
            None => DEFAULT_POOL_TIMEOUT_SECS,
        };
        let pool_size = match tuning("CONNECTION_POOL_SIZE", "connection_pool_size") {
            Some((var, v)) => parse_num::<usize>(var, &v)?,
            None => DEFAULT_POOL_SIZE,
        };

        let webhook = if mode == Mode::Webhook {
            let public_url = trim_base(required("TELEGRAM_BASE_URL")?);
            let host = get("LOCAL_HOST_URL").unwrap_or_else(|| DEFAULT_HOST.to_string());
            let port = match get("LOCAL_HOST_PORT") {
                Some(v) => parse_num::<u16>("LOCAL_HOST_PORT", &v)?,
                None => DEFAULT_PORT,
            };
            let listen = format!("{host}:{port}")
                .parse::<SocketAddr>()
                .map_err(|_| ConfigError::Invalid { var: "LOCAL_HOST_URL", value: host.clone() })?;
            let queue_size = match get("UPDATE_QUEUE_SIZE") {
                Some(v) => parse_num::<usize>("UPDATE_QUEUE_SIZE", &v)?,
                None => DEFAULT_QUEUE_SIZE,
            };
            if queue_size == 0 {
                return Err(ConfigError::Validation("UPDATE_QUEUE_SIZE must be at least 1".into()));
            }
            Some(WebhookConfig { public_url, listen, queue_size })
        } else {
            None
        };

        let log_dir = get("LOG_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("logs"));

        Ok(Self {
            mode,
            telegram_bot_token,
            bot_name,
            api: ApiConfig {
                story_base_url,
                activity_base_url,
                auth_token: get("API_AUTH_TOKEN"),
                connect_timeout: Duration::from_secs(pool_timeout),
                pool_size,
            },
            concurrent_updates,
            webhook,
            log_dir,
        })
    }
}

fn parse_num<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value: value.to_string() })
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
