use std::env;
use std::time::Duration;

use crate::error::{Result, SeedreamError};

pub const DEFAULT_BASE_URL: &str = "https://ark.ap-southeast.bytepluses.com/api/v3";
pub const DEFAULT_MODEL: &str = "seedream-4-0-250828";
pub const DEFAULT_PORT: u16 = 8080;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// How many times a vendor call is attempted and how long to wait between
/// attempts. The wait before retry `n` (1-based) is `backoff * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        RetryPolicy { attempts, backoff }
    }

    /// Total attempts, never less than one.
    pub fn max_attempts(&self) -> u32 {
        self.attempts.max(1)
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.checked_mul(attempt).unwrap_or(Duration::MAX)
    }
}

#[derive(Debug, Clone)]
pub struct SeedreamConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Vendor `stream` flag. Has no default: it must be set explicitly.
    pub stream: Option<bool>,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl Default for SeedreamConfig {
    fn default() -> Self {
        SeedreamConfig {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            stream: None,
            retry: RetryPolicy::default(),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl SeedreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from `lookup`. Unset variables fall back to
    /// defaults; set but unparsable ones are configuration errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let api_key = lookup("ARK_API_KEY");
        let base_url = lookup("SEEDREAM_BASE_URL").unwrap_or(defaults.base_url);
        let model = lookup("SEEDREAM_MODEL").unwrap_or(defaults.model);
        let stream = match lookup("SEEDREAM_STREAM") {
            Some(val) => Some(parse_bool(&val).ok_or_else(|| invalid("SEEDREAM_STREAM", &val))?),
            None => None,
        };
        let attempts = match lookup("SEEDREAM_RETRIES") {
            Some(val) => val
                .trim()
                .parse::<u32>()
                .map_err(|_| invalid("SEEDREAM_RETRIES", &val))?,
            None => defaults.retry.attempts,
        };
        let backoff = match lookup("SEEDREAM_BACKOFF_SECS") {
            Some(val) => val
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .ok_or_else(|| invalid("SEEDREAM_BACKOFF_SECS", &val))?,
            None => defaults.retry.backoff,
        };

        Ok(SeedreamConfig {
            api_key,
            base_url,
            model,
            stream,
            retry: RetryPolicy::new(attempts, backoff),
            timeout: REQUEST_TIMEOUT,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the API key, or a configuration error when it is absent or blank.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(SeedreamError::ConfigError(
                "ARK_API_KEY is required and must not be empty".into(),
            )),
        }
    }

    pub fn require_stream(&self) -> Result<bool> {
        self.stream.ok_or_else(|| {
            SeedreamError::ConfigError(
                "SEEDREAM_STREAM must be set explicitly to true or false".into(),
            )
        })
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: Option<u16>,
    pub log_format: LogFormat,
    pub log_file: Option<String>,
    pub seedream: SeedreamConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: None,
            log_format: LogFormat::Pretty,
            log_file: None,
            seedream: SeedreamConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(val) => Some(val.trim().parse::<u16>().map_err(|_| invalid("PORT", &val))?),
            None => None,
        };
        let log_format = match lookup("LOG_FORMAT") {
            Some(val) if val.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        let log_file = lookup("LOG_FILE").filter(|path| !path.trim().is_empty());

        Ok(Config {
            port,
            log_format,
            log_file,
            seedream: SeedreamConfig::from_lookup(lookup)?,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_seedream(mut self, config: SeedreamConfig) -> Self {
        self.seedream = config;
        self
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}

fn invalid(name: &str, value: &str) -> SeedreamError {
    SeedreamError::ConfigError(format!("invalid value for {}: '{}'", name, value))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_api_key_is_rejected() {
        assert!(SeedreamConfig::new().require_api_key().is_err());
        assert!(SeedreamConfig::new()
            .with_api_key("   ")
            .require_api_key()
            .is_err());
        assert_eq!(
            SeedreamConfig::new()
                .with_api_key("secret")
                .require_api_key()
                .unwrap(),
            "secret"
        );
    }

    #[test]
    fn test_stream_must_be_explicit() {
        let err = SeedreamConfig::new().require_stream().unwrap_err();
        assert!(matches!(err, SeedreamError::ConfigError(_)));
        assert!(!SeedreamConfig::new().with_stream(false).require_stream().unwrap());
    }

    #[test]
    fn test_retry_delays_grow_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[test]
    fn test_endpoint_url_joins_without_double_slash() {
        let config = SeedreamConfig::new().with_base_url("http://localhost:9000/api/v3/");
        assert_eq!(
            config.endpoint_url("/images/generations"),
            "http://localhost:9000/api/v3/images/generations"
        );
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool(" false "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name: &str| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    fn config_error(result: Result<impl std::fmt::Debug>) -> String {
        match result {
            Err(SeedreamError::ConfigError(message)) => message,
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_unset_variables_use_defaults() {
        let config = Config::from_lookup(lookup(&[("ARK_API_KEY", "k")])).unwrap();
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.log_file.is_none());
        assert_eq!(config.seedream.retry, RetryPolicy::default());
        assert_eq!(config.seedream.stream, None);
        assert_eq!(config.seedream.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_valid_variables_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("LOG_FORMAT", "JSON"),
            ("LOG_FILE", "seedgen.log"),
            ("SEEDREAM_STREAM", "false"),
            ("SEEDREAM_RETRIES", " 5 "),
            ("SEEDREAM_BACKOFF_SECS", "0.5"),
        ]))
        .unwrap();
        assert_eq!(config.port(), 9090);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_file.as_deref(), Some("seedgen.log"));
        assert_eq!(config.seedream.stream, Some(false));
        assert_eq!(
            config.seedream.retry,
            RetryPolicy::new(5, Duration::from_millis(500))
        );
    }

    #[test]
    fn test_bad_retry_count_is_rejected() {
        let message = config_error(SeedreamConfig::from_lookup(lookup(&[(
            "SEEDREAM_RETRIES",
            "three",
        )])));
        assert!(message.contains("SEEDREAM_RETRIES"));
        assert!(message.contains("three"));
    }

    #[test]
    fn test_bad_backoff_is_rejected() {
        for value in ["soon", "-1", "NaN", "inf", "1e20"] {
            let message = config_error(SeedreamConfig::from_lookup(lookup(&[(
                "SEEDREAM_BACKOFF_SECS",
                value,
            )])));
            assert!(message.contains("SEEDREAM_BACKOFF_SECS"), "{}", value);
        }
    }

    #[test]
    fn test_bad_port_is_rejected() {
        for value in ["http", "70000"] {
            let message = config_error(Config::from_lookup(lookup(&[("PORT", value)])));
            assert!(message.contains("PORT"));
        }
    }

    #[test]
    fn test_unparsable_stream_flag_is_invalid_not_missing() {
        let message = config_error(SeedreamConfig::from_lookup(lookup(&[(
            "SEEDREAM_STREAM",
            "maybe",
        )])));
        assert_eq!(message, "invalid value for SEEDREAM_STREAM: 'maybe'");
    }

    #[test]
    fn test_huge_backoff_delay_saturates() {
        let policy = RetryPolicy::new(3, Duration::from_secs(u64::MAX / 2 + 1));
        assert_eq!(policy.delay_for(2), Duration::MAX);
        assert_eq!(policy.delay_for(1), Duration::from_secs(u64::MAX / 2 + 1));
    }
}
