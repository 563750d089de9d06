use sqlx::SqlitePool;

use super::product_cmd::delete_all_products;
use super::transaction_cmd::delete_all_transactions;
use crate::auth::guard::validate_session;
use crate::config::get_config;
use crate::errors::{AppError, AppResult};
use crate::models::settings::{AppSettings, Theme, ThemeOption};
use crate::{log_info, AppState};

pub(crate) const KEY_STORE_NAME: &str = "app.store_name";
pub(crate) const KEY_THEME: &str = "app.theme";
pub(crate) const KEY_LOW_STOCK: &str = "app.low_stock_threshold";
pub(crate) const KEY_LOW_STOCK_ALERT: &str = "app.low_stock_alert_threshold";

/// Baca satu nilai dari tabel settings.
pub(crate) async fn get_setting(db: &SqlitePool, key: &str) -> AppResult<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;
    Ok(row.map(|r| r.0))
}

/// Upsert satu nilai ke tabel settings.
pub(crate) async fn set_setting(db: &SqlitePool, key: &str, value: &str) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(db)
    .await?;
    Ok(())
}

async fn get_i64_setting(db: &SqlitePool, key: &str, fallback: i64) -> AppResult<i64> {
    Ok(get_setting(db, key)
        .await?
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback))
}

/// Batas "stok menipis" untuk daftar dan dashboard.
pub(crate) async fn low_stock_threshold(db: &SqlitePool) -> AppResult<i64> {
    get_i64_setting(db, KEY_LOW_STOCK, get_config().store.low_stock_threshold).await
}

/// Batas stok yang memicu notifikasi setelah checkout.
pub(crate) async fn low_stock_alert_threshold(db: &SqlitePool) -> AppResult<i64> {
    get_i64_setting(db, KEY_LOW_STOCK_ALERT, get_config().store.low_stock_alert_threshold).await
}

pub(crate) async fn store_name(db: &SqlitePool) -> AppResult<String> {
    Ok(get_setting(db, KEY_STORE_NAME)
        .await?
        .unwrap_or_else(|| get_config().store.store_name.clone()))
}

async fn load_theme(db: &SqlitePool) -> AppResult<Theme> {
    Ok(get_setting(db, KEY_THEME)
        .await?
        .and_then(|v| Theme::parse(&v))
        .unwrap_or_default())
}

pub async fn get_settings(state: &AppState, session_token: &str) -> AppResult<AppSettings> {
    validate_session(state, session_token)?;

    Ok(AppSettings {
        store_name: store_name(&state.db).await?,
        theme: load_theme(&state.db).await?,
        low_stock_threshold: low_stock_threshold(&state.db).await?,
        low_stock_alert_threshold: low_stock_alert_threshold(&state.db).await?,
    })
}

pub async fn save_settings(
    state: &AppState,
    session_token: &str,
    settings: AppSettings,
) -> AppResult<AppSettings> {
    validate_session(state, session_token)?;

    let store_name = settings.store_name.trim();
    if store_name.is_empty() {
        return Err(AppError::Validation("Nama toko tidak boleh kosong".into()));
    }
    if settings.low_stock_threshold < 0 || settings.low_stock_alert_threshold < 0 {
        return Err(AppError::Validation("Batas stok tidak boleh negatif".into()));
    }

    set_setting(&state.db, KEY_STORE_NAME, store_name).await?;
    set_setting(&state.db, KEY_THEME, settings.theme.as_str()).await?;
    set_setting(&state.db, KEY_LOW_STOCK, &settings.low_stock_threshold.to_string()).await?;
    set_setting(
        &state.db,
        KEY_LOW_STOCK_ALERT,
        &settings.low_stock_alert_threshold.to_string(),
    )
    .await?;

    log_info!("SETTINGS", "Settings saved", serde_json::json!({
        "store_name": store_name,
        "theme": settings.theme.as_str(),
    }));

    get_settings(state, session_token).await
}

pub async fn get_theme(state: &AppState, session_token: &str) -> AppResult<Theme> {
    validate_session(state, session_token)?;
    load_theme(&state.db).await
}

/// Ganti tema. Nama tema yang tidak dikenal ditolak.
pub async fn set_theme(state: &AppState, session_token: &str, theme: &str) -> AppResult<Theme> {
    validate_session(state, session_token)?;

    let theme = Theme::parse(theme)
        .ok_or_else(|| AppError::Validation(format!("Tema '{}' tidak dikenal", theme)))?;
    set_setting(&state.db, KEY_THEME, theme.as_str()).await?;
    Ok(theme)
}

pub fn get_theme_options() -> Vec<ThemeOption> {
    Theme::ALL
        .iter()
        .map(|t| ThemeOption {
            id: *t,
            display_name: t.display_name().to_string(),
        })
        .collect()
}

/// Hapus semua produk. Keranjang ikut dikosongkan karena isinya sudah tidak valid.
pub async fn reset_products(state: &AppState, session_token: &str) -> AppResult<u64> {
    delete_all_products(state, session_token).await
}

pub async fn reset_transactions(state: &AppState, session_token: &str) -> AppResult<u64> {
    delete_all_transactions(state, session_token).await
}

/// Hapus produk, transaksi dan notifikasi. Pengaturan dan akun tetap.
pub async fn reset_all_data(state: &AppState, session_token: &str) -> AppResult<()> {
    validate_session(state, session_token)?;

    let mut tx = state.db.begin().await?;
    sqlx::query("DELETE FROM transactions").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM products").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM notifications").execute(&mut *tx).await?;
    tx.commit().await?;

    state.with_cart(|cart| cart.clear())?;

    log_info!("SETTINGS", "All data reset");
    Ok(())
}
