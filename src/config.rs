//! Configuration module for the upload monitor
//!
//! All settings come from the process environment (optionally seeded from a
//! `.env` file). Required values that are missing or empty abort startup.

use crate::errors::ConfigError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// AirDC++ web API
    pub source: SourceConfig,

    /// Telegram bot delivery
    pub telegram: TelegramConfig,

    /// Poll loop timing
    pub polling: PollingConfig,

    /// Logging and metrics
    pub monitoring: MonitoringConfig,
}

#[derive(Clone)]
pub struct SourceConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
}

#[derive(Clone)]
pub struct TelegramConfig {
    /// API base, without the `/bot<token>` suffix
    pub api_url: String,
    pub bot_token: String,
    pub chat_id: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Sleep between successful cycles
    pub poll_interval_secs: u64,

    /// Sleep after a cycle-level failure
    pub backoff_interval_secs: u64,

    /// Minimum age before the notified-names set is pruned
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    /// Verbose logging (`DEBUG_MODE` non-zero)
    pub debug: bool,

    pub log_format: LogFormat,

    /// Serve Prometheus metrics on this port when set
    pub metrics_port: Option<u16>,
}

// Default value functions
fn default_telegram_api_url() -> String { "https://api.telegram.org".to_string() }
fn default_poll_interval() -> u64 { 10 }
fn default_backoff_interval() -> u64 { 30 }
fn default_cleanup_interval() -> u64 { 3600 }
fn default_http_timeout() -> u64 { 30 }

impl SourceConfig {
    /// Base URL of the web API, e.g. `http://192.168.1.10:5600`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl TelegramConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PollingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn backoff_interval(&self) -> Duration {
        Duration::from_secs(self.backoff_interval_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            backoff_interval_secs: default_backoff_interval(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        let timeout_secs = env.parse_or("HTTP_TIMEOUT_SECS", default_http_timeout())?;

        let config = Self {
            source: SourceConfig {
                host: env.required("AIRDC_IP")?,
                port: env.required_parsed("AIRDC_PORT")?,
                username: env.required("AIRDC_USER")?,
                password: env.required("AIRDC_PASSWORD")?,
                timeout_secs,
            },
            telegram: TelegramConfig {
                api_url: env
                    .optional("TELEGRAM_API_URL")
                    .unwrap_or_else(default_telegram_api_url),
                bot_token: env.required("TELEGRAM_BOT_TOKEN")?,
                chat_id: env.required("TELEGRAM_CHAT_ID")?,
                timeout_secs,
            },
            polling: PollingConfig {
                poll_interval_secs: env.parse_or("POLL_INTERVAL_SECS", default_poll_interval())?,
                backoff_interval_secs: env
                    .parse_or("BACKOFF_INTERVAL_SECS", default_backoff_interval())?,
                cleanup_interval_secs: env
                    .parse_or("CLEANUP_INTERVAL_SECS", default_cleanup_interval())?,
            },
            monitoring: MonitoringConfig {
                debug: env.parse_or::<i64>("DEBUG_MODE", 0)? != 0,
                log_format: match env.optional("LOG_FORMAT").as_deref() {
                    None | Some("text") => LogFormat::Text,
                    Some("json") => LogFormat::Json,
                    Some(other) => {
                        return Err(ConfigError::InvalidValue {
                            var: "LOG_FORMAT".to_string(),
                            message: format!("expected 'text' or 'json', got '{}'", other),
                        })
                    }
                },
                metrics_port: env
                    .optional("METRICS_PORT")
                    .map(|v| parse_value("METRICS_PORT", &v))
                    .transpose()?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.timeout_secs == 0 {
            return Err(ConfigError::Validation("HTTP_TIMEOUT_SECS must be > 0".to_string()));
        }
        if self.polling.poll_interval_secs == 0 {
            return Err(ConfigError::Validation("POLL_INTERVAL_SECS must be > 0".to_string()));
        }
        if self.polling.backoff_interval_secs == 0 {
            return Err(ConfigError::Validation("BACKOFF_INTERVAL_SECS must be > 0".to_string()));
        }
        if self.polling.cleanup_interval_secs == 0 {
            return Err(ConfigError::Validation("CLEANUP_INTERVAL_SECS must be > 0".to_string()));
        }
        if !self.telegram.api_url.starts_with("http://")
            && !self.telegram.api_url.starts_with("https://")
        {
            return Err(ConfigError::Validation(format!(
                "Invalid TELEGRAM_API_URL: {}",
                self.telegram.api_url
            )));
        }
        Ok(())
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Empty values count as unset
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn required_parsed<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        parse_value(key, &self.required(key)?)
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.optional(key) {
            Some(v) => parse_value(key, &v),
            None => Ok(default),
        }
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        var: key.to_string(),
        message: e.to_string(),
    })
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_url", &self.api_url)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("AIRDC_IP", "192.168.1.10"),
            ("AIRDC_PORT", "5600"),
            ("AIRDC_USER", "monitor"),
            ("AIRDC_PASSWORD", "hunter2"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "-100200300"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_from_required_only() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.source.base_url(), "http://192.168.1.10:5600");
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.polling.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.polling.backoff_interval(), Duration::from_secs(30));
        assert_eq!(config.polling.cleanup_interval(), Duration::from_secs(3600));
        assert_eq!(config.source.timeout_secs, 30);
        assert!(!config.monitoring.debug);
        assert_eq!(config.monitoring.log_format, LogFormat::Text);
        assert_eq!(config.monitoring.metrics_port, None);
    }

    #[test]
    fn test_each_required_var_is_enforced() {
        for key in [
            "AIRDC_IP",
            "AIRDC_PORT",
            "AIRDC_USER",
            "AIRDC_PASSWORD",
            "TELEGRAM_BOT_TOKEN",
            "TELEGRAM_CHAT_ID",
        ] {
            let mut env = base_env();
            env.remove(key);
            assert_eq!(load(&env).unwrap_err(), ConfigError::MissingEnvVar(key.to_string()));

            env.insert(key, "   ");
            assert_eq!(load(&env).unwrap_err(), ConfigError::MissingEnvVar(key.to_string()));
        }
    }

    #[test]
    fn test_debug_mode_is_integer_flag() {
        let mut env = base_env();
        env.insert("DEBUG_MODE", "1");
        assert!(load(&env).unwrap().monitoring.debug);

        env.insert("DEBUG_MODE", "0");
        assert!(!load(&env).unwrap().monitoring.debug);

        env.insert("DEBUG_MODE", "yes");
        assert!(matches!(
            load(&env).unwrap_err(),
            ConfigError::InvalidValue { ref var, .. } if var == "DEBUG_MODE"
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut env = base_env();
        env.insert("AIRDC_PORT", "70000");
        assert!(matches!(load(&env).unwrap_err(), ConfigError::InvalidValue { .. }));

        let mut env = base_env();
        env.insert("POLL_INTERVAL_SECS", "0");
        assert!(matches!(load(&env).unwrap_err(), ConfigError::Validation(_)));

        let mut env = base_env();
        env.insert("TELEGRAM_API_URL", "api.telegram.org");
        assert!(matches!(load(&env).unwrap_err(), ConfigError::Validation(_)));

        let mut env = base_env();
        env.insert("LOG_FORMAT", "xml");
        assert!(matches!(load(&env).unwrap_err(), ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_optional_overrides() {
        let mut env = base_env();
        env.insert("POLL_INTERVAL_SECS", "5");
        env.insert("BACKOFF_INTERVAL_SECS", "60");
        env.insert("CLEANUP_INTERVAL_SECS", "120");
        env.insert("HTTP_TIMEOUT_SECS", "8");
        env.insert("METRICS_PORT", "9090");
        env.insert("LOG_FORMAT", "json");

        let config = load(&env).unwrap();
        assert_eq!(config.polling.poll_interval_secs, 5);
        assert_eq!(config.polling.backoff_interval_secs, 60);
        assert_eq!(config.polling.cleanup_interval_secs, 120);
        assert_eq!(config.telegram.timeout(), Duration::from_secs(8));
        assert_eq!(config.monitoring.metrics_port, Some(9090));
        assert_eq!(config.monitoring.log_format, LogFormat::Json);
    }

    #[test]
    fn test_debug_output_redacts_credentials() {
        let config = load(&base_env()).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("123:abc"));
        assert!(rendered.contains("<redacted>"));
    }
}
