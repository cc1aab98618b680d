//! Runtime configuration for Homelink.
//!
//! Every setting comes from environment variables. Before reading them the
//! binary loads `.env` files with [`load_env_files`]:
//!
//! ```text
//! ~/.homelink/.env      # or $HOMELINK_CONFIG_DIR/.env
//! ./.env
//! ```
//!
//! Variables already present in the environment win over file values.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `HOMELINK_CLIENT_ID`, `HOMELINK_CLIENT_SECRET`: OAuth application credentials
//!
//! Optional (defaults target Yandex Smart Home):
//! - `HOMELINK_AUTHORIZE_URL`, `HOMELINK_TOKEN_URL`, `HOMELINK_REDIRECT_URL`
//! - `HOMELINK_API_URL`: Device API base URL
//! - `HOMELINK_SCOPES`: Space separated scopes
//! - `HOMELINK_DEVICE_ID`, `HOMELINK_DEVICE_NAME`: Extra authorize parameters
//! - `HOMELINK_LISTEN_HOST`, `HOMELINK_LISTEN_PORT`: Callback server bind address
//! - `HOMELINK_HTTP_TIMEOUT_SECS`: Outbound request timeout
//! - `HOMELINK_STATE_TTL_SECS`: Lifetime of an issued authorization state
//! - `HOMELINK_VERIFY_STATE`: `false` to use the bare chat id as OAuth state

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::correlation::{StateMode, DEFAULT_STATE_TTL};
use crate::error::{CoreError, Result};

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "HOMELINK_CONFIG_DIR";

/// Default config directory name under home.
const DEFAULT_CONFIG_DIR: &str = ".homelink";

pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const CLIENT_ID_ENV: &str = "HOMELINK_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "HOMELINK_CLIENT_SECRET";
pub const AUTHORIZE_URL_ENV: &str = "HOMELINK_AUTHORIZE_URL";
pub const TOKEN_URL_ENV: &str = "HOMELINK_TOKEN_URL";
pub const REDIRECT_URL_ENV: &str = "HOMELINK_REDIRECT_URL";
pub const API_URL_ENV: &str = "HOMELINK_API_URL";
pub const SCOPES_ENV: &str = "HOMELINK_SCOPES";
pub const DEVICE_ID_ENV: &str = "HOMELINK_DEVICE_ID";
pub const DEVICE_NAME_ENV: &str = "HOMELINK_DEVICE_NAME";
pub const LISTEN_HOST_ENV: &str = "HOMELINK_LISTEN_HOST";
pub const LISTEN_PORT_ENV: &str = "HOMELINK_LISTEN_PORT";
pub const HTTP_TIMEOUT_ENV: &str = "HOMELINK_HTTP_TIMEOUT_SECS";
pub const STATE_TTL_ENV: &str = "HOMELINK_STATE_TTL_SECS";
pub const VERIFY_STATE_ENV: &str = "HOMELINK_VERIFY_STATE";

pub const DEFAULT_AUTHORIZE_URL: &str = "https://oauth.yandex.ru/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth.yandex.ru/token";
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:8080/oauth_callback";
pub const DEFAULT_API_URL: &str = "https://api.iot.yandex.net/v1.0";
pub const DEFAULT_DEVICE_NAME: &str = "Telegram Bot";
pub const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";
pub const DEFAULT_LISTEN_PORT: u16 = 8080;
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Get the Homelink config directory.
///
/// 1. `HOMELINK_CONFIG_DIR` if set
/// 2. `~/.homelink` if a home directory is available
/// 3. `.homelink` in the current directory
pub fn config_dir() -> PathBuf {
    std::env::var(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(DEFAULT_CONFIG_DIR))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR))
        })
}

/// Path of the secrets file inside the config directory.
pub fn env_file() -> PathBuf {
    config_dir().join(".env")
}

/// Outcome of [`load_env_files`].
#[derive(Debug, Default)]
pub struct EnvFiles {
    /// Files read into the environment.
    pub loaded: Vec<PathBuf>,
    /// Files that exist but could not be parsed.
    pub failed: Vec<(PathBuf, String)>,
}

/// Load `.env` files into the process environment.
///
/// Missing files are skipped. Nothing is logged here since the subscriber
/// may read `RUST_LOG` from these files; callers report the result.
pub fn load_env_files() -> EnvFiles {
    let mut files = EnvFiles::default();
    load_env_file(&env_file(), &mut files);
    load_env_file(Path::new(".env"), &mut files);
    files
}

fn load_env_file(path: &Path, files: &mut EnvFiles) {
    if !path.is_file() {
        return;
    }
    match dotenvy::from_path(path) {
        Ok(()) => files.loaded.push(path.to_path_buf()),
        Err(e) => files.failed.push((path.to_path_buf(), e.to_string())),
    }
}

/// OAuth application settings.
#[derive(Clone)]
pub struct OAuthSettings {
    /// Application id registered with the provider.
    pub client_id: String,
    /// Application secret.
    pub client_secret: String,
    /// Browser-facing authorization endpoint.
    pub authorize_url: Url,
    /// Token endpoint.
    pub token_url: Url,
    /// Where the provider redirects after consent.
    pub redirect_url: Url,
    /// Requested scopes; empty means provider defaults.
    pub scopes: Vec<String>,
    /// Provider-specific `device_id` parameter.
    pub device_id: Option<String>,
    /// Provider-specific `device_name` parameter.
    pub device_name: Option<String>,
}

impl OAuthSettings {
    /// Settings pointing at the default provider endpoints.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorize_url: Url::parse(DEFAULT_AUTHORIZE_URL)?,
            token_url: Url::parse(DEFAULT_TOKEN_URL)?,
            redirect_url: Url::parse(DEFAULT_REDIRECT_URL)?,
            scopes: Vec::new(),
            device_id: None,
            device_name: Some(DEFAULT_DEVICE_NAME.to_string()),
        })
    }
}

impl fmt::Debug for OAuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("authorize_url", &self.authorize_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("redirect_url", &self.redirect_url.as_str())
            .field("scopes", &self.scopes)
            .field("device_id", &self.device_id)
            .field("device_name", &self.device_name)
            .finish()
    }
}

/// Complete runtime configuration.
#[derive(Clone)]
pub struct Settings {
    /// Telegram bot token.
    pub bot_token: String,
    /// OAuth application settings.
    pub oauth: OAuthSettings,
    /// Device API base URL.
    pub api_url: Url,
    /// Callback server bind host.
    pub listen_host: String,
    /// Callback server bind port.
    pub listen_port: u16,
    /// Timeout for outbound HTTP requests.
    pub http_timeout: Duration,
    /// Lifetime of an issued authorization state.
    pub state_ttl: Duration,
    /// How OAuth state values are produced.
    pub state_mode: StateMode,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| {
            get(key).ok_or_else(|| CoreError::Config(format!("{key} is not set")))
        };

        let bot_token = require(BOT_TOKEN_ENV)?;

        let oauth = OAuthSettings {
            client_id: require(CLIENT_ID_ENV)?,
            client_secret: require(CLIENT_SECRET_ENV)?,
            authorize_url: parse_url(AUTHORIZE_URL_ENV, get(AUTHORIZE_URL_ENV), DEFAULT_AUTHORIZE_URL)?,
            token_url: parse_url(TOKEN_URL_ENV, get(TOKEN_URL_ENV), DEFAULT_TOKEN_URL)?,
            redirect_url: parse_url(REDIRECT_URL_ENV, get(REDIRECT_URL_ENV), DEFAULT_REDIRECT_URL)?,
            scopes: get(SCOPES_ENV)
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            device_id: get(DEVICE_ID_ENV),
            device_name: Some(get(DEVICE_NAME_ENV).unwrap_or_else(|| DEFAULT_DEVICE_NAME.to_string())),
        };

        let api_url = parse_url(API_URL_ENV, get(API_URL_ENV), DEFAULT_API_URL)?;

        let listen_host = get(LISTEN_HOST_ENV).unwrap_or_else(|| DEFAULT_LISTEN_HOST.to_string());
        let listen_port = parse_value(LISTEN_PORT_ENV, get(LISTEN_PORT_ENV))?.unwrap_or(DEFAULT_LISTEN_PORT);

        let http_timeout = parse_value::<u64>(HTTP_TIMEOUT_ENV, get(HTTP_TIMEOUT_ENV))?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT);
        if http_timeout.is_zero() {
            return Err(CoreError::Config(format!("{HTTP_TIMEOUT_ENV} must be greater than 0")));
        }

        let state_ttl = parse_value::<u64>(STATE_TTL_ENV, get(STATE_TTL_ENV))?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_STATE_TTL);
        if state_ttl.is_zero() {
            return Err(CoreError::Config(format!("{STATE_TTL_ENV} must be greater than 0")));
        }

        let state_mode = match get(VERIFY_STATE_ENV) {
            None => StateMode::Verified,
            Some(v) => {
                if parse_bool(VERIFY_STATE_ENV, &v)? {
                    StateMode::Verified
                } else {
                    StateMode::Plain
                }
            }
        };

        Ok(Self {
            bot_token,
            oauth,
            api_url,
            listen_host,
            listen_port,
            http_timeout,
            state_ttl,
            state_mode,
        })
    }

    /// Callback server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("bot_token", &"<redacted>")
            .field("oauth", &self.oauth)
            .field("api_url", &self.api_url.as_str())
            .field("listen_host", &self.listen_host)
            .field("listen_port", &self.listen_port)
            .field("http_timeout", &self.http_timeout)
            .field("state_ttl", &self.state_ttl)
            .field("state_mode", &self.state_mode)
            .finish()
    }
}

fn parse_url(key: &str, value: Option<String>, default: &str) -> Result<Url> {
    let raw = value.as_deref().unwrap_or(default);
    Url::parse(raw).map_err(|e| CoreError::Config(format!("{key}: invalid URL {raw:?}: {e}")))
}

fn parse_value<T>(key: &str, value: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| CoreError::Config(format!("{key}: invalid value {v:?}: {e}")))
        })
        .transpose()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(CoreError::Config(format!("{key}: expected a boolean, got {other:?}"))),
    }
}
