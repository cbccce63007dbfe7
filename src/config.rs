//! # Configuration Module
//!
//! Process configuration read from environment variables (a `.env` file is
//! loaded first by `main`).

use url::Url;

use crate::errors::ConfigError;

pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_WEBHOOK_PORT: u16 = 8443;
/// Ports Telegram accepts for webhooks
pub const ALLOWED_WEBHOOK_PORTS: [u16; 4] = [443, 80, 88, 8443];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Webhook delivery settings; polling is used when absent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Public URL Telegram posts updates to
    pub url: Url,
    /// Local port the webhook server listens on
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub telegram_token: String,
    /// Postgres connection string; the in-memory store is used when absent
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub webhook: Option<WebhookConfig>,
    pub debug: bool,
    pub log_format: LogFormat,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Empty values count as unset
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        // TELEGRAM_API_TOKEN is the older name, still read by existing deployments
        let telegram_token = var("TELEGRAM_BOT_TOKEN")
            .or_else(|| var("TELEGRAM_API_TOKEN"))
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(value) => match value.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "DATABASE_MAX_CONNECTIONS",
                        value,
                        reason: "expected a positive integer".to_string(),
                    })
                }
            },
            None => DEFAULT_DATABASE_MAX_CONNECTIONS,
        };

        let webhook = match var("TELEGRAM_WEBHOOK_URL") {
            Some(value) => {
                let url = Url::parse(value.trim()).map_err(|e| ConfigError::Invalid {
                    name: "TELEGRAM_WEBHOOK_URL",
                    value: value.clone(),
                    reason: e.to_string(),
                })?;
                let port = match var("TELEGRAM_WEBHOOK_PORT") {
                    Some(port) => validate_webhook_port(&port)?,
                    None => DEFAULT_WEBHOOK_PORT,
                };
                Some(WebhookConfig { url, port })
            }
            None => None,
        };

        Ok(Self {
            telegram_token,
            database_url: var("DATABASE_URL"),
            database_max_connections,
            webhook,
            debug: parse_debug(var("DEBUG")),
            log_format: parse_log_format(var("LOG_FORMAT"))?,
        })
    }
}

/// What the `migrate` commands need; the bot token is not required
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateConfig {
    pub database_url: String,
    pub debug: bool,
    pub log_format: LogFormat,
}

impl MigrateConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Ok(Self {
            database_url: var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            debug: parse_debug(var("DEBUG")),
            log_format: parse_log_format(var("LOG_FORMAT"))?,
        })
    }
}

fn parse_debug(value: Option<String>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn parse_log_format(value: Option<String>) -> Result<LogFormat, ConfigError> {
    match value.map(|v| v.trim().to_lowercase()) {
        None => Ok(LogFormat::Text),
        Some(v) if v == "text" => Ok(LogFormat::Text),
        Some(v) if v == "json" => Ok(LogFormat::Json),
        Some(value) => Err(ConfigError::Invalid {
            name: "LOG_FORMAT",
            value,
            reason: "expected \"text\" or \"json\"".to_string(),
        }),
    }
}

/// Parse a webhook port and check Telegram allows it
pub fn validate_webhook_port(value: &str) -> Result<u16, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name: "TELEGRAM_WEBHOOK_PORT",
        value: value.to_string(),
        reason,
    };
    let port: u16 = value
        .trim()
        .parse()
        .map_err(|_| invalid("expected a port number".to_string()))?;
    if !ALLOWED_WEBHOOK_PORTS.contains(&port) {
        return Err(invalid(format!("must be one of {ALLOWED_WEBHOOK_PORTS:?}")));
    }
    Ok(port)
}
