//! Environment-based configuration module
//!
//! Configuration can be set via:
//! 1. Environment variables (highest priority)
//! 2. .env file in the app data directory
//! 3. Default values (lowest priority)

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

/// Application environment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Get environment from APP_ENV variable or default to Development
    pub fn from_env() -> Self {
        match env::var("APP_ENV").as_deref() {
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub app_name: String,
    pub version: String,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub store: StoreConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path (relative to app data dir)
    pub path: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Username of the account seeded on first run
    pub default_username: String,
    /// Password of the account seeded on first run
    pub default_password: String,
    pub session_timeout_mins: i64,
    /// Failed logins allowed per lockout window
    pub max_login_attempts: u32,
    pub lockout_duration_mins: i64,
    pub min_password_length: usize,
    pub bcrypt_cost: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    pub log_to_file: bool,
    pub log_to_stdout: bool,
    pub json_format: bool,
    pub max_file_size_mb: u64,
    pub max_log_files: u32,
}

/// Store (toko) behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub store_name: String,
    /// Stock at or below this count is listed as "stok menipis"
    pub low_stock_threshold: i64,
    /// Stock at or below this count raises a LOW_STOCK notification
    pub low_stock_alert_threshold: i64,
    /// Minimum gap between two LOW_STOCK notifications for one product
    pub low_stock_alert_cooldown_secs: i64,
    /// Receipt files directory (relative to app data dir)
    pub receipt_dir: String,
    pub recent_transactions_limit: i64,
    pub best_seller_limit: usize,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key).map(|s| s == "true").unwrap_or(default)
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::from_env();

        Self {
            environment: env,
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "Mini Kasir".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),

            database: DatabaseConfig {
                path: env::var("DB_PATH").unwrap_or_else(|_| "minikasir.db".to_string()),
                max_connections: env_or("DB_MAX_CONNECTIONS", 5),
                min_connections: env_or("DB_MIN_CONNECTIONS", 1),
                connect_timeout_secs: 30,
                idle_timeout_secs: 600,
            },

            security: SecurityConfig {
                default_username: env::var("DEFAULT_USERNAME").unwrap_or_else(|_| "admin".to_string()),
                default_password: env::var("DEFAULT_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
                session_timeout_mins: env_or("SESSION_TIMEOUT_MINS", 480), // 8 hours
                max_login_attempts: env_or("MAX_LOGIN_ATTEMPTS", 5),
                lockout_duration_mins: env_or("LOCKOUT_DURATION_MINS", 15),
                min_password_length: 6,
                bcrypt_cost: env_or("BCRYPT_COST", bcrypt::DEFAULT_COST),
            },

            logging: LoggingConfig {
                level: env::var("RUST_LOG").unwrap_or_else(|_| {
                    if env.is_production() { "warn".to_string() } else { "debug".to_string() }
                }),
                log_to_file: true,
                log_to_stdout: env_flag("LOG_TO_STDOUT", true),
                json_format: env.is_production(),
                max_file_size_mb: 10,
                max_log_files: 5,
            },

            store: StoreConfig {
                store_name: env::var("STORE_NAME").unwrap_or_else(|_| "MINI KASIR".to_string()),
                low_stock_threshold: env_or("LOW_STOCK_THRESHOLD", 10),
                low_stock_alert_threshold: env_or("LOW_STOCK_ALERT_THRESHOLD", 5),
                low_stock_alert_cooldown_secs: 3600,
                receipt_dir: env::var("RECEIPT_DIR").unwrap_or_else(|_| "receipts".to_string()),
                recent_transactions_limit: 5,
                best_seller_limit: 5,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and defaults
    pub fn load() -> Self {
        Self::default()
    }

    /// Load a `.env` file (if present) into the process environment, then
    /// build the configuration from it.
    pub fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        dotenvy::from_path(path).ok()?;
        Some(Self::default())
    }

    pub fn get_log_dir(&self, app_data_dir: &Path) -> PathBuf {
        app_data_dir.join("logs")
    }

    pub fn get_database_path(&self, app_data_dir: &Path) -> PathBuf {
        app_data_dir.join(&self.database.path)
    }

    pub fn get_receipt_dir(&self, app_data_dir: &Path) -> PathBuf {
        app_data_dir.join(&self.store.receipt_dir)
    }

    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }

    /// Validate configuration before the app starts serving commands
    pub fn validate(&self) -> Result<(), String> {
        if self.database.min_connections > self.database.max_connections {
            return Err("DB_MIN_CONNECTIONS tidak boleh lebih besar dari DB_MAX_CONNECTIONS".to_string());
        }
        if self.store.low_stock_alert_threshold < 0 || self.store.low_stock_threshold < 0 {
            return Err("Ambang stok menipis tidak boleh negatif".to_string());
        }
        if self.is_production() && self.security.default_password == "admin123" {
            return Err(
                "DEFAULT_PASSWORD harus diganti di production. Set via environment variable.".to_string(),
            );
        }
        Ok(())
    }
}

/// Global configuration instance
static GLOBAL_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Initialize the global configuration
pub fn init_config() -> &'static AppConfig {
    GLOBAL_CONFIG.get_or_init(AppConfig::load)
}

/// Initialize the global configuration from `<app_data_dir>/.env` when it exists
pub fn init_config_from_dir(app_data_dir: &Path) -> &'static AppConfig {
    GLOBAL_CONFIG.get_or_init(|| {
        AppConfig::load_from_file(&app_data_dir.join(".env")).unwrap_or_else(AppConfig::load)
    })
}

/// Get the global configuration, loading it from the environment on first use
pub fn get_config() -> &'static AppConfig {
    init_config()
}
