use std::{env, fmt::Display, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{anyhow, Result};
use tracing::{info, warn, Level};

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./farmer_data.db?mode=rwc";

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub log_level: Level,
    pub rate_limit: Option<RateLimit>,
    pub smtp: Option<SmtpSettings>,
    pub feedback: FeedbackAddresses,
}

/// Per-IP token bucket for the API routes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub burst: u32,
    pub period: Duration,
}

#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

// Keep the password out of logs.
impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Who feedback mail is from and who receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackAddresses {
    pub sender: String,
    pub recipient: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Only the log level, so logging can be set up before the rest is read.
    pub fn log_level_from_env() -> Result<Level> {
        Self::log_level_from_lookup(|key| env::var(key).ok())
    }

    pub fn log_level_from_lookup<F>(lookup: F) -> Result<Level>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        try_load(&var, "LOG_LEVEL", "info")
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = var("DATABASE_URL").unwrap_or_else(|| {
            info!("DATABASE_URL not set, using default: {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });

        let bind_addr = try_load(&var, "BIND_ADDR", "127.0.0.1:3000")?;
        let log_level = Self::log_level_from_lookup(&lookup)?;

        let burst: u32 = try_load(&var, "RATE_LIMIT_BURST", "20")?;
        let period_ms: u64 = try_load(&var, "RATE_LIMIT_PERIOD_MS", "500")?;
        let rate_limit = if burst == 0 || period_ms == 0 {
            info!("rate limiting disabled");
            None
        } else {
            Some(RateLimit {
                burst,
                period: Duration::from_millis(period_ms),
            })
        };

        let smtp = match var("SMTP_HOST") {
            Some(host) => Some(SmtpSettings {
                host,
                port: try_load(&var, "SMTP_PORT", "587")?,
                username: var("SMTP_USERNAME").ok_or_else(|| anyhow!("SMTP_USERNAME must be set when SMTP_HOST is set"))?,
                password: var("SMTP_PASSWORD").ok_or_else(|| anyhow!("SMTP_PASSWORD must be set when SMTP_HOST is set"))?,
                timeout: Duration::from_secs(try_load(&var, "SMTP_TIMEOUT_SECS", "10")?),
            }),
            None => {
                warn!("SMTP_HOST not set; feedback cannot be delivered");
                None
            }
        };

        let sender = var("FEEDBACK_SENDER")
            .or_else(|| smtp.as_ref().map(|s| s.username.clone()))
            .unwrap_or_else(|| "noreply@localhost".to_string());
        let recipient = var("FEEDBACK_RECIPIENT").unwrap_or_else(|| sender.clone());

        Ok(Self {
            database_url,
            bind_addr,
            log_level,
            rate_limit,
            smtp,
            feedback: FeedbackAddresses { sender, recipient },
        })
    }
}

fn try_load<T, F>(var: &F, key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = var(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value {raw:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(
            config.rate_limit,
            Some(RateLimit { burst: 20, period: Duration::from_millis(500) })
        );
        assert!(config.smtp.is_none());
        assert_eq!(config.feedback.sender, "noreply@localhost");
        assert_eq!(config.feedback.recipient, "noreply@localhost");
    }

    #[test]
    fn test_smtp_settings() {
        let config = load(&[
            ("SMTP_HOST", "smtp.example.org"),
            ("SMTP_USERNAME", "ops@example.org"),
            ("SMTP_PASSWORD", "app-password"),
            ("FEEDBACK_RECIPIENT", "desk@example.org"),
        ])
        .unwrap();

        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.timeout, Duration::from_secs(10));
        assert!(!format!("{:?}", smtp).contains("app-password"));
        assert_eq!(config.feedback.sender, "ops@example.org");
        assert_eq!(config.feedback.recipient, "desk@example.org");
    }

    #[test]
    fn test_smtp_requires_credentials() {
        let err = load(&[("SMTP_HOST", "smtp.example.org")]).unwrap_err();
        assert!(err.to_string().contains("SMTP_USERNAME"));
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = load(&[("BIND_ADDR", "not-an-address")]).unwrap_err();
        assert!(err.to_string().contains("BIND_ADDR"));

        let err = load(&[("RATE_LIMIT_BURST", "-3")]).unwrap_err();
        assert!(err.to_string().contains("RATE_LIMIT_BURST"));
    }

    #[test]
    fn test_log_level_reads_independently() {
        let vars: HashMap<&str, &str> = [("LOG_LEVEL", "debug"), ("BIND_ADDR", "not-an-address")].into();
        let level = Config::log_level_from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(level, Level::DEBUG);

        let err = Config::log_level_from_lookup(|_| Some("chatty".to_string())).unwrap_err();
        assert!(err.to_string().contains("LOG_LEVEL"));
    }

    #[test]
    fn test_rate_limit_can_be_disabled() {
        let config = load(&[("RATE_LIMIT_BURST", "0")]).unwrap();
        assert!(config.rate_limit.is_none());
    }
}
