//! Structured logging for the kasir backend
//!
//! - Log levels (ERROR, WARN, INFO, DEBUG, TRACE)
//! - JSON lines in production, human-readable lines in development
//! - Daily log files with size-based rotation under `<app_data>/logs`
//! - Redaction of password/token fields in attached data

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use crate::config::LoggingConfig;

/// Log levels following RFC 5424
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "TRACE" => LogLevel::Trace,
            "DEBUG" => LogLevel::Debug,
            "INFO" => LogLevel::Info,
            "WARN" => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

/// Structured log entry
#[derive(Debug, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub target: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub log_to_file: bool,
    pub log_to_stdout: bool,
    pub json_format: bool,
    pub max_file_size_mb: u64,
    pub max_log_files: u32,
}

impl From<&LoggingConfig> for LoggerConfig {
    fn from(c: &LoggingConfig) -> Self {
        Self {
            level: LogLevel::parse(&c.level),
            log_to_file: c.log_to_file,
            log_to_stdout: c.log_to_stdout,
            json_format: c.json_format,
            max_file_size_mb: c.max_file_size_mb,
            max_log_files: c.max_log_files,
        }
    }
}

pub struct Logger {
    config: LoggerConfig,
    log_dir: PathBuf,
    current_file: Mutex<Option<BufWriter<File>>>,
    current_file_size: Mutex<u64>,
}

impl Logger {
    /// Initialize the logger, creating `log_dir` if needed
    pub fn init(log_dir: &Path, config: LoggerConfig) -> Result<Self, String> {
        let log_dir = log_dir.to_path_buf();

        std::fs::create_dir_all(&log_dir)
            .map_err(|e| format!("Failed to create log directory: {}", e))?;

        let logger = Self {
            config,
            log_dir,
            current_file: Mutex::new(None),
            current_file_size: Mutex::new(0),
        };

        logger.rotate_logs()?;

        Ok(logger)
    }

    fn log_file_path(&self) -> PathBuf {
        let date = Local::now().format("%Y-%m-%d");
        self.log_dir.join(format!("kasir-{}.log", date))
    }

    fn numbered_path(&self, n: u32) -> PathBuf {
        let date = Local::now().format("%Y-%m-%d");
        self.log_dir.join(format!("kasir-{}.{}.log", date, n))
    }

    /// Rotate today's log file once it exceeds the size limit
    fn rotate_logs(&self) -> Result<(), String> {
        let log_path = self.log_file_path();

        if log_path.exists() {
            let file_size = std::fs::metadata(&log_path)
                .map_err(|e| format!("Failed to read log file metadata: {}", e))?
                .len();
            let max_size = self.config.max_file_size_mb * 1024 * 1024;

            if file_size >= max_size {
                let oldest = self.numbered_path(self.config.max_log_files);
                if oldest.exists() {
                    let _ = std::fs::remove_file(&oldest);
                }
                for i in (1..self.config.max_log_files).rev() {
                    let old_path = self.numbered_path(i);
                    if old_path.exists() {
                        let _ = std::fs::rename(&old_path, self.numbered_path(i + 1));
                    }
                }
                let _ = std::fs::rename(&log_path, self.numbered_path(1));
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| format!("Failed to open log file: {}", e))?;

        let file_size = file.metadata().map(|m| m.len()).unwrap_or(0);

        *self.current_file.lock().map_err(|e| e.to_string())? = Some(BufWriter::new(file));
        *self.current_file_size.lock().map_err(|e| e.to_string())? = file_size;

        Ok(())
    }

    fn format_line(&self, entry: &LogEntry) -> String {
        if self.config.json_format {
            serde_json::to_string(entry).unwrap_or_else(|_| "{}".to_string())
        } else {
            format!(
                "{} [{}] [{}] {}{}{}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
                entry.level.as_str(),
                entry.target,
                entry.message,
                entry.data.as_ref().map(|d| format!(" | {}", d)).unwrap_or_default(),
                entry.error.as_ref().map(|e| format!(" | error: {}", e)).unwrap_or_default(),
            )
        }
    }

    fn write(&self, entry: &LogEntry) {
        if entry.level > self.config.level {
            return;
        }

        let log_line = self.format_line(entry);

        if self.config.log_to_stdout {
            match entry.level {
                LogLevel::Error | LogLevel::Warn => eprintln!("{}", log_line),
                _ => println!("{}", log_line),
            }
        }

        if self.config.log_to_file {
            let needs_rotation = match self.current_file.lock() {
                Ok(mut guard) => match guard.as_mut() {
                    Some(writer) => {
                        let _ = writeln!(writer, "{}", log_line);
                        let _ = writer.flush();
                        match self.current_file_size.lock() {
                            Ok(mut size) => {
                                *size += log_line.len() as u64 + 1;
                                *size >= self.config.max_file_size_mb * 1024 * 1024
                            }
                            Err(_) => false,
                        }
                    }
                    None => false,
                },
                Err(_) => false,
            };
            if needs_rotation {
                let _ = self.rotate_logs();
            }
        }
    }

    fn entry(level: LogLevel, target: &'static str, message: &str) -> LogEntry {
        LogEntry {
            timestamp: Local::now(),
            level,
            target,
            message: message.to_string(),
            data: None,
            error: None,
        }
    }

    pub fn error(&self, target: &'static str, message: &str, error: Option<&str>) {
        let mut entry = Self::entry(LogLevel::Error, target, message);
        entry.error = error.map(String::from);
        self.write(&entry);
    }

    pub fn warn(&self, target: &'static str, message: &str, data: Option<serde_json::Value>) {
        let mut entry = Self::entry(LogLevel::Warn, target, message);
        entry.data = data.map(redact_sensitive_data);
        self.write(&entry);
    }

    pub fn info(&self, target: &'static str, message: &str, data: Option<serde_json::Value>) {
        let mut entry = Self::entry(LogLevel::Info, target, message);
        entry.data = data.map(redact_sensitive_data);
        self.write(&entry);
    }

    pub fn debug(&self, target: &'static str, message: &str, data: Option<serde_json::Value>) {
        let mut entry = Self::entry(LogLevel::Debug, target, message);
        entry.data = data.map(redact_sensitive_data);
        self.write(&entry);
    }
}

/// Replace values of password/token/secret keys with a placeholder
pub fn redact_sensitive_data(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(key, val)| {
                    let lower = key.to_lowercase();
                    if lower.contains("password") || lower.contains("token") || lower.contains("secret") {
                        (key, serde_json::Value::String("***REDACTED***".to_string()))
                    } else {
                        (key, redact_sensitive_data(val))
                    }
                })
                .collect(),
        ),
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(redact_sensitive_data).collect())
        }
        _ => value,
    }
}

static GLOBAL_LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

/// Initialize the global logger from the logging section of the app config
pub fn init_global_logger(log_dir: &Path, config: &LoggingConfig) -> Result<(), String> {
    let logger = Logger::init(log_dir, LoggerConfig::from(config))?;

    GLOBAL_LOGGER
        .set(Mutex::new(logger))
        .map_err(|_| "Logger already initialized")?;

    Ok(())
}

pub fn get_logger() -> Option<&'static Mutex<Logger>> {
    GLOBAL_LOGGER.get()
}

#[macro_export]
macro_rules! log_error {
    ($target:expr, $msg:expr) => {
        if let Some(logger) = $crate::logger::get_logger() {
            if let Ok(l) = logger.lock() {
                l.error($target, $msg, None);
            }
        }
    };
    ($target:expr, $msg:expr, $err:expr) => {
        if let Some(logger) = $crate::logger::get_logger() {
            if let Ok(l) = logger.lock() {
                l.error($target, $msg, Some(&$err));
            }
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($target:expr, $msg:expr) => {
        if let Some(logger) = $crate::logger::get_logger() {
            if let Ok(l) = logger.lock() {
                l.warn($target, $msg, None);
            }
        }
    };
    ($target:expr, $msg:expr, $data:expr) => {
        if let Some(logger) = $crate::logger::get_logger() {
            if let Ok(l) = logger.lock() {
                l.warn($target, $msg, Some($data));
            }
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($target:expr, $msg:expr) => {
        if let Some(logger) = $crate::logger::get_logger() {
            if let Ok(l) = logger.lock() {
                l.info($target, $msg, None);
            }
        }
    };
    ($target:expr, $msg:expr, $data:expr) => {
        if let Some(logger) = $crate::logger::get_logger() {
            if let Ok(l) = logger.lock() {
                l.info($target, $msg, Some($data));
            }
        }
    };
}

#[macro_export]
macro_rules! log_debug {
    ($target:expr, $msg:expr) => {
        if let Some(logger) = $crate::logger::get_logger() {
            if let Ok(l) = logger.lock() {
                l.debug($target, $msg, None);
            }
        }
    };
    ($target:expr, $msg:expr, $data:expr) => {
        if let Some(logger) = $crate::logger::get_logger() {
            if let Ok(l) = logger.lock() {
                l.debug($target, $msg, Some($data));
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_config(level: LogLevel) -> LoggerConfig {
        LoggerConfig {
            level,
            log_to_file: true,
            log_to_stdout: false,
            json_format: true,
            max_file_size_mb: 1,
            max_log_files: 3,
        }
    }

    #[test]
    fn redacts_nested_credentials() {
        let redacted = redact_sensitive_data(json!({
            "username": "admin",
            "password": "admin123",
            "session": { "session_token": "abc" },
            "items": [{ "secret": "x", "qty": 2 }]
        }));

        assert_eq!(redacted["username"], "admin");
        assert_eq!(redacted["password"], "***REDACTED***");
        assert_eq!(redacted["session"]["session_token"], "***REDACTED***");
        assert_eq!(redacted["items"][0]["secret"], "***REDACTED***");
        assert_eq!(redacted["items"][0]["qty"], 2);
    }

    #[test]
    fn writes_json_lines_to_daily_file() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::init(dir.path(), test_config(LogLevel::Info)).unwrap();

        logger.info("CHECKOUT", "Transaksi berhasil", Some(json!({ "total": 15000 })));
        logger.debug("CHECKOUT", "tidak ditulis", None);

        let content = std::fs::read_to_string(logger.log_file_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);

        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["target"], "CHECKOUT");
        assert_eq!(parsed["data"]["total"], 15000);
    }

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!(LogLevel::parse("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::parse("WARN"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("nonsense"), LogLevel::Error);
    }
}
