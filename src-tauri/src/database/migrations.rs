use sqlx::SqlitePool;

use crate::config::get_config;
use crate::log_warn;

/// Menjalankan semua migrasi database (CREATE TABLE IF NOT EXISTS + seed default settings).
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // ═══════════════════════════════════════
    // TABLE: products
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS products (
            id          INTEGER  PRIMARY KEY AUTOINCREMENT,
            name        TEXT     NOT NULL,
            category    TEXT     NOT NULL,
            price       REAL     NOT NULL CHECK(price >= 0),
            stock       INTEGER  NOT NULL DEFAULT 0 CHECK(stock >= 0),
            barcode     TEXT,
            image_path  TEXT,
            created_at  DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at  DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    // v2: deskripsi produk
    safe_add_column(pool, "products", "description", "TEXT").await;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_name ON products(name)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_products_barcode ON products(barcode) WHERE barcode IS NOT NULL",
    )
    .execute(pool)
    .await?;

    // ═══════════════════════════════════════
    // TABLE: transactions
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS transactions (
            id              INTEGER  PRIMARY KEY AUTOINCREMENT,
            created_at      TEXT     NOT NULL,
            total_amount    REAL     NOT NULL CHECK(total_amount >= 0),
            cash_received   REAL     NOT NULL,
            change_due      REAL     NOT NULL CHECK(change_due >= 0),
            items           TEXT     NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_created_at ON transactions(created_at)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: notifications
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS notifications (
            id          INTEGER  PRIMARY KEY AUTOINCREMENT,
            title       TEXT     NOT NULL,
            message     TEXT     NOT NULL,
            kind        TEXT     NOT NULL DEFAULT 'GENERAL',
            created_at  TEXT     NOT NULL,
            is_read     INTEGER  NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_notifications_is_read ON notifications(is_read)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: settings (key-value store)
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS settings (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // ── Seed default settings (OR IGNORE = tidak timpa jika sudah ada) ──
    let store = &get_config().store;
    let low_stock = store.low_stock_threshold.to_string();
    let low_stock_alert = store.low_stock_alert_threshold.to_string();

    let default_settings: Vec<(&str, &str)> = vec![
        ("app.store_name", store.store_name.as_str()),
        ("app.theme", "ocean"),
        ("app.low_stock_threshold", low_stock.as_str()),
        ("app.low_stock_alert_threshold", low_stock_alert.as_str()),
        ("session.is_logged_in", "0"),
    ];

    for (key, value) in default_settings {
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Helper: ALTER TABLE ADD COLUMN yang aman (abaikan jika kolom sudah ada).
async fn safe_add_column(pool: &SqlitePool, table: &str, column: &str, col_type: &str) {
    let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, col_type);
    if let Err(e) = sqlx::query(&sql).execute(pool).await {
        let msg = e.to_string();
        // SQLite error jika kolom sudah ada: "duplicate column name"
        if !msg.contains("duplicate column") {
            log_warn!("MIGRATION", "ALTER TABLE gagal", serde_json::json!({ "sql": sql, "error": msg }));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::database::connection::init_memory_db;

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = init_memory_db().await.unwrap();
        super::run_migrations(&pool).await.unwrap();

        let (tables,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
             AND name IN ('products', 'transactions', 'notifications', 'settings')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(tables, 4);

        let (theme,): (String,) = sqlx::query_as("SELECT value FROM settings WHERE key = 'app.theme'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(theme, "ocean");
    }

    #[tokio::test]
    async fn description_column_exists() {
        let pool = init_memory_db().await.unwrap();
        sqlx::query("INSERT INTO products (name, category, price, stock, description) VALUES ('Teh', 'Minuman', 3000, 5, 'Teh botol')")
            .execute(&pool)
            .await
            .unwrap();
    }
}
