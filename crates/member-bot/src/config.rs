//! Application configuration loaded from environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Telegram Bot API configuration
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Member store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Admin API configuration
    #[serde(default)]
    pub admin: AdminConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Bot behaviour
    #[serde(default)]
    pub bot: BotConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token. Without it the webhook answers 500 and sends fail.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Bot API base URL
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,

    /// Public URL of `/v1/webhook`; registered with Telegram at startup
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Secret Telegram must echo in `X-Telegram-Bot-Api-Secret-Token`
    #[serde(default)]
    pub webhook_secret: Option<String>,

    /// Request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the JSON snapshot
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Enable persistence (if false, members live in memory only)
    #[serde(default = "default_true")]
    pub persist: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Bearer token for the admin API. Admin routes are closed when unset.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Admin requests per minute
    #[serde(default = "default_admin_rpm")]
    pub admin_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// QR code generation endpoint used for member cards
    #[serde(default = "default_qr_service_url")]
    pub qr_service_url: String,

    /// Trigger texts for the built-in commands
    #[serde(default)]
    pub triggers: TriggerConfig,
}

/// Exact texts that select each built-in command.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerConfig {
    #[serde(default = "default_start_trigger")]
    pub start: String,
    #[serde(default = "default_register_trigger")]
    pub register: String,
    #[serde(default = "default_balance_trigger")]
    pub balance: String,
    #[serde(default = "default_member_card_trigger")]
    pub member_card: String,
    #[serde(default = "default_self_test_trigger")]
    pub self_test: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default implementations
impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_url: default_telegram_api_url(),
            webhook_url: None,
            webhook_secret: None,
            timeout: default_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            persist: true,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            admin_per_minute: default_admin_rpm(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            qr_service_url: default_qr_service_url(),
            triggers: TriggerConfig::default(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            start: default_start_trigger(),
            register: default_register_trigger(),
            balance: default_balance_trigger(),
            member_card: default_member_card_trigger(),
            self_test: default_self_test_trigger(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_telegram_api_url() -> String {
    "https://api.telegram.org".into()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_store_path() -> PathBuf {
    PathBuf::from("/data/members.json")
}

fn default_true() -> bool {
    true
}

fn default_admin_rpm() -> u32 {
    60
}

fn default_qr_service_url() -> String {
    "https://api.qrserver.com/v1/create-qr-code/".into()
}

fn default_start_trigger() -> String {
    "/start".into()
}

fn default_register_trigger() -> String {
    "註冊".into()
}

fn default_balance_trigger() -> String {
    "查詢積分".into()
}

fn default_member_card_trigger() -> String {
    "會員卡".into()
}

fn default_self_test_trigger() -> String {
    "/test".into()
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Bot tokens look like "123:abc"; keep everything a string.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
