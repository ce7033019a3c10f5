//! Runtime configuration read from the environment (and `.env` via dotenvy).

use std::env;
use std::fmt;
use std::str::FromStr;

use chrono::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub app_url: String,
    pub app_name: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub session_key: Option<String>,
    pub cookie_secure: bool,
    pub registration_enabled: bool,
    pub contract_creation_enabled: bool,
    pub require_email_confirmation: bool,
    pub email_from: String,
    pub email_host: Option<String>,
    pub email_port: u16,
    pub email_user: Option<String>,
    pub email_pass: Option<String>,
    pub email_secure: bool,
    pub reset_token_ttl_minutes: i64,
    pub verify_token_ttl_minutes: i64,
    pub draft_ttl_minutes: i64,
    pub login_max_attempts: usize,
    pub login_window_secs: u64,
}

/// Outgoing mail server, present only when host and credentials are all set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub secure: bool,
}

#[derive(Debug)]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid value for {}: {:?}", self.var, self.value)
    }
}

impl std::error::Error for ConfigError {}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            app_url: "http://127.0.0.1:8080".to_string(),
            app_name: "FastContracts".to_string(),
            database_url: None,
            db_max_connections: 8,
            session_key: None,
            cookie_secure: false,
            registration_enabled: true,
            contract_creation_enabled: true,
            require_email_confirmation: false,
            email_from: "noreply@fastcontracts.com".to_string(),
            email_host: None,
            email_port: 587,
            email_user: None,
            email_pass: None,
            email_secure: false,
            reset_token_ttl_minutes: 60,
            verify_token_ttl_minutes: 24 * 60,
            draft_ttl_minutes: 24 * 60,
            login_max_attempts: 5,
            login_window_secs: 900,
        }
    }
}

impl AppConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| {
            lookup(key).filter(|v| !v.trim().is_empty()).unwrap_or(default)
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            bind_addr: text("BIND_ADDR", defaults.bind_addr),
            app_url: text("APP_URL", defaults.app_url).trim_end_matches('/').to_string(),
            app_name: text("APP_NAME", defaults.app_name),
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            db_max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            session_key: lookup("SESSION_KEY").filter(|v| !v.is_empty()),
            cookie_secure: parse_bool(&lookup, "COOKIE_SECURE", defaults.cookie_secure)?,
            registration_enabled: parse_bool(&lookup, "REGISTRATION_ENABLED", defaults.registration_enabled)?,
            contract_creation_enabled: parse_bool(
                &lookup,
                "CONTRACT_CREATION_ENABLED",
                defaults.contract_creation_enabled,
            )?,
            require_email_confirmation: parse_bool(
                &lookup,
                "REQUIRE_EMAIL_CONFIRMATION",
                defaults.require_email_confirmation,
            )?,
            email_from: text("EMAIL_FROM", defaults.email_from),
            email_host: optional("EMAIL_HOST"),
            email_port: parse(&lookup, "EMAIL_PORT", defaults.email_port)?,
            email_user: optional("EMAIL_USER"),
            email_pass: lookup("EMAIL_PASS").filter(|v| !v.is_empty()),
            email_secure: parse_bool(&lookup, "EMAIL_SECURE", defaults.email_secure)?,
            reset_token_ttl_minutes: parse(&lookup, "RESET_TOKEN_TTL_MINUTES", defaults.reset_token_ttl_minutes)?,
            verify_token_ttl_minutes: parse(&lookup, "VERIFY_TOKEN_TTL_MINUTES", defaults.verify_token_ttl_minutes)?,
            draft_ttl_minutes: parse(&lookup, "DRAFT_TTL_MINUTES", defaults.draft_ttl_minutes)?,
            login_max_attempts: parse(&lookup, "LOGIN_MAX_ATTEMPTS", defaults.login_max_attempts)?,
            login_window_secs: parse(&lookup, "LOGIN_WINDOW_SECS", defaults.login_window_secs)?,
        })
    }

    pub fn reset_token_ttl(&self) -> Duration {
        Duration::minutes(self.reset_token_ttl_minutes)
    }

    pub fn verify_token_ttl(&self) -> Duration {
        Duration::minutes(self.verify_token_ttl_minutes)
    }

    pub fn draft_ttl(&self) -> Duration {
        Duration::minutes(self.draft_ttl_minutes)
    }

    /// SMTP delivery settings; `None` means emails are only logged.
    pub fn smtp_settings(&self) -> Option<SmtpSettings> {
        Some(SmtpSettings {
            host: self.email_host.clone()?,
            port: self.email_port,
            user: self.email_user.clone()?,
            pass: self.email_pass.clone()?,
            secure: self.email_secure,
        })
    }
}

fn parse<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError { var, value: raw }),
        _ => Ok(default),
    }
}

fn parse_bool<F>(lookup: &F, var: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError { var, value: raw }),
        },
        None => Ok(default),
    }
}
