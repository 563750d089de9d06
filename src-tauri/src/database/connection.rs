use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use super::migrations::run_migrations;
use crate::config::get_config;
use crate::errors::AppResult;
use crate::log_info;

/// Inisialisasi database SQLite dengan connection pooling.
/// File database disimpan di direktori yang diberikan (biasanya AppData).
///
/// - WAL mode untuk concurrent reads/writes
/// - Foreign keys enforcement
/// - Busy timeout untuk handle concurrent access
pub async fn init_db(app_data_dir: &Path) -> AppResult<SqlitePool> {
    std::fs::create_dir_all(app_data_dir)?;

    let config = get_config();
    let db_path = config.get_database_path(app_data_dir);
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.database.idle_timeout_secs))
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    log_info!("DATABASE", "Connection pool initialized", serde_json::json!({
        "min": config.database.min_connections,
        "max": config.database.max_connections,
        "db": db_path.to_string_lossy(),
    }));

    Ok(pool)
}

/// In-memory database untuk test. Satu koneksi saja: setiap koneksi
/// `:memory:` punya database sendiri.
#[cfg(test)]
pub async fn init_memory_db() -> AppResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
