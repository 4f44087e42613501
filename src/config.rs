//! Configuration and settings management
//!
//! Loads settings from environment variables and defines process constants.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Public base URL Telegram delivers webhook updates to
    pub public_base_url: String,

    /// Secret token Telegram echoes back on every webhook POST
    pub webhook_secret: Option<String>,

    /// Bind address for the inbound HTTP server
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Bacon Ipsum base URL (filler text)
    #[serde(default = "default_bacon_api_url")]
    pub bacon_api_url: String,
    /// Metaphorpsum base URL (filler text)
    #[serde(default = "default_metaphor_api_url")]
    pub metaphor_api_url: String,
    /// InspiroBot base URL (generated posters)
    #[serde(default = "default_inspiro_api_url")]
    pub inspiro_api_url: String,
    /// Evil Insult base URL (one-liners)
    #[serde(default = "default_insult_api_url")]
    pub insult_api_url: String,
    /// yesno.wtf base URL (answer gifs)
    #[serde(default = "default_yesno_api_url")]
    pub yesno_api_url: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_bacon_api_url() -> String {
    "https://baconipsum.com".to_string()
}

fn default_metaphor_api_url() -> String {
    "http://metaphorpsum.com".to_string()
}

fn default_inspiro_api_url() -> String {
    "https://inspirobot.me".to_string()
}

fn default_insult_api_url() -> String {
    "https://evilinsult.com".to_string()
}

fn default_yesno_api_url() -> String {
    "https://yesno.wtf".to_string()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use banterbot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required value is
    /// missing.
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            // Add in a local configuration file
            // This file shouldn't be checked into git
            .add_source(File::with_name("config/local").required(false))
            // Add in settings from environment variables directly
            // Note: Environment::default() auto-converts UPPER_SNAKE_CASE to snake_case
            // ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// Full webhook endpoint URL registered with Telegram
    #[must_use]
    pub fn webhook_endpoint(&self) -> String {
        format!(
            "{}{}",
            self.public_base_url.trim_end_matches('/'),
            crate::server::WEBHOOK_PATH
        )
    }
}

// Cooldown configuration
/// Suppression window for free-text triggers
pub const TRIGGER_COOLDOWN_SECS: u64 = 15 * 60; // 15 minutes
/// Upper bound on live cooldown entries
pub const COOLDOWN_CACHE_CAPACITY: u64 = 10_000;

// Content API retry configuration
/// Retries after the first failed attempt, per provider call
pub const CONTENT_MAX_RETRIES: u32 = 3;
/// First retry delay; each subsequent delay doubles (2s, 4s, 8s)
pub const CONTENT_BACKOFF_BASE_SECS: u64 = 2;
/// Per-request timeout for content API calls
pub const CONTENT_HTTP_TIMEOUT_SECS: u64 = 30;

// Telegram send retry configuration
/// Retries after the first failed send
pub const TELEGRAM_MAX_RETRIES: usize = 3;
/// Initial backoff before the first Telegram retry
pub const TELEGRAM_INITIAL_BACKOFF_MS: u64 = 500;
/// Cap on any single Telegram retry delay
pub const TELEGRAM_MAX_BACKOFF_SECS: u64 = 4;

// Update processing
/// Wall-clock bound for handling one inbound update
pub const UPDATE_DEADLINE_SECS: u64 = 60;
/// How long shutdown waits for in-flight updates to drain
pub const SHUTDOWN_GRACE_SECS: u64 = 10;
