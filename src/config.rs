//! Process configuration parsed from environment variables.
//!
//! Optional integrations switch off when their variables are absent:
//! no `DATABASE_URL` runs the in-process data service, no
//! `STRIPE_SECRET_KEY` disables donations, and no `RESEND_API_KEY` logs
//! password-reset links instead of mailing them.

use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_PUBLIC_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_STATIC_DIR: &str = "dist";
pub const DEFAULT_SESSION_TTL_HOURS: u64 = 720;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PUBLIC_ORIGIN must start with http:// or https://, got {0:?}")]
    InvalidOrigin(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailerConfig {
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Origin of reset links, and of share and donation links when a
    /// request has no `Origin`.
    pub public_origin: String,
    pub static_dir: String,
    pub cookie_secure: bool,
    pub session_ttl_hours: u64,
    pub stripe_secret_key: Option<String>,
    pub mailer: Option<MailerConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            public_origin: DEFAULT_PUBLIC_ORIGIN.into(),
            static_dir: DEFAULT_STATIC_DIR.into(),
            cookie_secure: false,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            stripe_secret_key: None,
            mailer: None,
        }
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.parse::<T>().ok()).unwrap_or(default)
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns `InvalidOrigin` when `PUBLIC_ORIGIN` is not an http(s) origin.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup. Unparseable numbers fall back to
    /// their defaults; empty strings count as unset.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOrigin` when `PUBLIC_ORIGIN` is not an http(s) origin.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let public_origin = get("PUBLIC_ORIGIN")
            .unwrap_or_else(|| DEFAULT_PUBLIC_ORIGIN.into())
            .trim_end_matches('/')
            .to_owned();
        if !(public_origin.starts_with("http://") || public_origin.starts_with("https://")) {
            return Err(ConfigError::InvalidOrigin(public_origin));
        }

        let cookie_secure = get("COOKIE_SECURE")
            .and_then(|raw| parse_bool(&raw))
            .unwrap_or_else(|| public_origin.starts_with("https://"));

        let mailer = match (get("RESEND_API_KEY"), get("RESEND_FROM")) {
            (Some(api_key), Some(from)) => Some(MailerConfig { api_key, from }),
            _ => None,
        };

        Ok(Self {
            port: parse_or(get("PORT"), DEFAULT_PORT),
            database_url: get("DATABASE_URL"),
            db_max_connections: parse_or(get("DB_MAX_CONNECTIONS"), DEFAULT_DB_MAX_CONNECTIONS),
            public_origin,
            static_dir: get("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.into()),
            cookie_secure,
            session_ttl_hours: parse_or(get("SESSION_TTL_HOURS"), DEFAULT_SESSION_TTL_HOURS),
            stripe_secret_key: get("STRIPE_SECRET_KEY"),
            mailer,
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
