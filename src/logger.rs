use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::{Config, LogFormat};

static LOGGER: Lazy<SeedLogger> = Lazy::new(SeedLogger::new);

const CRATE_TARGET: &str = "seedgen";

pub fn init() -> Result<(), String> {
    init_with_config(LoggerConfig::default())
}

pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    let max_level = config.min_level.to_level_filter();
    LOGGER.update_config(config)?;

    log::set_logger(&*LOGGER).map_err(|e| format!("Failed to set logger: {:?}", e))?;
    log::set_max_level(max_level);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::Cyan,
            LogLevel::Debug => Color::Blue,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            LogLevel::Trace => "🔍",
            LogLevel::Debug => "🐛",
            LogLevel::Info => "💡",
            LogLevel::Warn => "⚠️",
            LogLevel::Error => "❌",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn to_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::Trace,
            LogLevel::Debug => Level::Debug,
            LogLevel::Info => Level::Info,
            LogLevel::Warn => Level::Warn,
            LogLevel::Error => Level::Error,
        }
    }

    pub fn to_level_filter(&self) -> LevelFilter {
        self.to_level().to_level_filter()
    }
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => LogLevel::Trace,
            Level::Debug => LogLevel::Debug,
            Level::Info => LogLevel::Info,
            Level::Warn => LogLevel::Warn,
            Level::Error => LogLevel::Error,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub target: String,
    pub file: String,
    pub line: u32,
}

impl LogEntry {
    fn from_record(record: &Record) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level: record.level().into(),
            message: record.args().to_string(),
            target: record.target().to_string(),
            file: record.file().unwrap_or("unknown").to_string(),
            line: record.line().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    /// Records from other crates (actix, reqwest, hyper) below this level are dropped.
    pub dependency_level: LogLevel,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub show_file_location: bool,
    pub timestamp_format: String,
    pub output_json: bool,
    pub log_file_path: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            dependency_level: LogLevel::Warn,
            show_colors: true,
            show_emojis: true,
            show_file_location: false,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
            log_file_path: None,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn with_file_output(mut self, path: &str) -> Self {
        self.log_file_path = Some(path.to_string());
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }

    pub fn production() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: false,
            show_emojis: false,
            output_json: true,
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LogLevel::Debug,
            dependency_level: LogLevel::Info,
            show_file_location: true,
            ..Default::default()
        }
    }

    pub fn for_format(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::production(),
            LogFormat::Pretty => Self::development(),
        }
    }

    /// Preset for the configured format, plus file output when `LOG_FILE` is set.
    pub fn from_config(config: &Config) -> Self {
        let logger = Self::for_format(config.log_format);
        match &config.log_file {
            Some(path) => logger.with_file_output(path),
            None => logger,
        }
    }

    fn allows(&self, metadata: &Metadata) -> bool {
        let threshold = if metadata.target().starts_with(CRATE_TARGET) {
            self.min_level
        } else {
            self.dependency_level.max(self.min_level)
        };
        metadata.level() <= threshold.to_level()
    }
}

pub struct SeedLogger {
    config: Mutex<LoggerConfig>,
    log_file: Mutex<Option<File>>,
}

impl SeedLogger {
    fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
            log_file: Mutex::new(None),
        }
    }

    fn update_config(&self, new_config: LoggerConfig) -> Result<(), String> {
        let file = match &new_config.log_file_path {
            Some(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| format!("Failed to open log file {}: {}", path, e))?,
            ),
            None => None,
        };

        if let Ok(mut log_file) = self.log_file.lock() {
            *log_file = file;
        }
        if let Ok(mut config) = self.config.lock() {
            *config = new_config;
        }
        Ok(())
    }

    fn format_line(entry: &LogEntry, config: &LoggerConfig) -> String {
        let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
        let level = if config.show_emojis {
            format!("{} {}", entry.level.emoji(), entry.level.as_str())
        } else {
            entry.level.as_str().to_string()
        };
        let location = format!("{}:{}", entry.file, entry.line);

        let mut line = if config.show_colors {
            format!(
                "{} [{}] {}: {}",
                timestamp.bright_black(),
                level.color(entry.level.color()).bold(),
                entry.target.bright_blue(),
                entry.message
            )
        } else {
            format!("{} [{}] {}: {}", timestamp, level, entry.target, entry.message)
        };

        if config.show_file_location {
            if config.show_colors {
                line.push_str(&format!(" ({})", location.bright_black()));
            } else {
                line.push_str(&format!(" ({})", location));
            }
        }
        line
    }

    fn render(entry: &LogEntry, config: &LoggerConfig) -> String {
        if config.output_json {
            serde_json::to_string(entry).unwrap_or_default()
        } else {
            Self::format_line(entry, config)
        }
    }
}

impl log::Log for SeedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.config.lock() {
            Ok(config) => config.allows(metadata),
            Err(_) => true,
        }
    }

    fn log(&self, record: &Record) {
        let Ok(config) = self.config.lock() else {
            return;
        };
        if !config.allows(record.metadata()) {
            return;
        }

        let entry = LogEntry::from_record(record);
        let line = Self::render(&entry, &config);
        if entry.level >= LogLevel::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }

        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(file) = guard.as_mut() {
                // Files never get ANSI colors.
                let plain = LoggerConfig {
                    show_colors: false,
                    ..config.clone()
                };
                let _ = writeln!(file, "{}", Self::render(&entry, &plain));
            }
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Logs how long an operation took when dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("⏱️  Starting: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::info!(
            "⏱️  '{}' finished in {}ms",
            self.name,
            self.elapsed().as_millis()
        );
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

pub fn log_startup_info(app_name: &str, version: &str, port: u16) {
    log::info!("🚀 Starting {} v{}", app_name, version);
    log::info!("🌐 Listening on http://0.0.0.0:{}", port);
}

/// Logs the loaded configuration. The API key is reported only as present or missing.
pub fn log_config_info(config: &Config) {
    let seedream = &config.seedream;
    let key_state = match seedream.require_api_key() {
        Ok(_) => "✅ set",
        Err(_) => "❌ missing",
    };
    let stream = seedream
        .stream
        .map(|s| s.to_string())
        .unwrap_or_else(|| "❌ unset".to_string());

    log::info!("⚙️  Configuration loaded:");
    log::info!("   Port: {}", config.port());
    log::info!("   ARK API key: {}", key_state);
    log::info!("   Base URL: {}", seedream.base_url);
    log::info!("   Model: {}", seedream.model);
    log::info!("   Stream: {}", stream);
    log::info!(
        "   Retries: {} attempt(s), {:.1}s backoff",
        seedream.retry.max_attempts(),
        seedream.retry.backoff.as_secs_f64()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(target: &str, level: Level) -> Metadata<'_> {
        Metadata::builder().target(target).level(level).build()
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(LogLevel::Info.as_str(), "INFO");
        assert_eq!(LogLevel::Error.emoji(), "❌");
        assert_eq!(LogLevel::Debug.color(), Color::Blue);
        assert_eq!(LogLevel::from(Level::Warn), LogLevel::Warn);
    }

    #[test]
    fn test_logger_presets() {
        let config = LoggerConfig::for_format(LogFormat::Pretty);
        assert_eq!(config.min_level, LogLevel::Debug);
        assert!(config.show_colors);

        let prod = LoggerConfig::for_format(LogFormat::Json);
        assert!(!prod.show_colors);
        assert!(prod.output_json);
    }

    #[test]
    fn test_log_file_comes_from_app_config() {
        let config = Config::new();
        assert!(LoggerConfig::from_config(&config).log_file_path.is_none());

        let config = Config {
            log_format: LogFormat::Json,
            log_file: Some("/var/log/seedgen.log".into()),
            ..Config::new()
        };
        let logger = LoggerConfig::from_config(&config);
        assert!(logger.output_json);
        assert_eq!(logger.log_file_path.as_deref(), Some("/var/log/seedgen.log"));
    }

    #[test]
    fn test_dependency_records_are_filtered_harder() {
        let config = LoggerConfig::development();
        assert!(config.allows(&metadata("seedgen::byteplus::client", Level::Debug)));
        assert!(!config.allows(&metadata("hyper::proto", Level::Debug)));
        assert!(config.allows(&metadata("actix_server::builder", Level::Info)));
    }

    #[test]
    fn test_json_render_contains_message() {
        let entry = LogEntry {
            id: "1".into(),
            timestamp: Utc::now(),
            level: LogLevel::Warn,
            message: "retrying".into(),
            target: "seedgen".into(),
            file: "src/lib.rs".into(),
            line: 1,
        };
        let json = SeedLogger::render(&entry, &LoggerConfig::production());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["message"], "retrying");
        assert_eq!(value["level"], "Warn");

        let plain = SeedLogger::render(&entry, &LoggerConfig::new().with_colors(false));
        assert!(plain.contains("[⚠️ WARN] seedgen: retrying"));
    }
}
