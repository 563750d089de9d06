pub mod auth;
pub mod cart;
pub mod commands;
pub mod config;
pub mod database;
pub mod errors;
pub mod logger;
pub mod models;
pub mod rate_limiter;
pub mod receipt;
pub mod validation;

#[cfg(feature = "desktop")]
pub mod ipc;

use auth::session::SessionStore;
use cart::Cart;
use errors::{AppError, AppResult};
use rate_limiter::RateLimiter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// State global aplikasi — di-manage oleh Tauri.
pub struct AppState {
    pub db: sqlx::SqlitePool,
    /// Direktori data aplikasi (database, struk, gambar produk, log)
    pub data_dir: PathBuf,
    pub sessions: Mutex<SessionStore>,
    pub cart: Mutex<Cart>,
    /// Percobaan login gagal per username
    pub login_limiter: RateLimiter,
    /// Maksimal satu notifikasi stok menipis per produk per jendela waktu
    pub low_stock_alerts: RateLimiter,
    /// Satu checkout berjalan dalam satu waktu; ditahan melewati `.await`
    pub checkout_lock: tokio::sync::Mutex<()>,
}

impl AppState {
    pub fn new(db: sqlx::SqlitePool, data_dir: PathBuf) -> Self {
        let config = config::get_config();
        Self {
            db,
            data_dir,
            sessions: Mutex::new(SessionStore::new()),
            cart: Mutex::new(Cart::new()),
            login_limiter: RateLimiter::new(
                config.security.max_login_attempts,
                config.security.lockout_duration_mins * 60,
            ),
            low_stock_alerts: RateLimiter::new(1, config.store.low_stock_alert_cooldown_secs),
            checkout_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Jalankan `f` dengan keranjang terkunci. Lock tidak pernah ditahan melewati `.await`.
    pub fn with_cart<R>(&self, f: impl FnOnce(&mut Cart) -> R) -> AppResult<R> {
        let mut cart = self
            .cart
            .lock()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(f(&mut cart))
    }
}

/// Siapkan config, logger, database dan akun default di `app_data_dir`.
pub async fn bootstrap(app_data_dir: &Path) -> AppResult<AppState> {
    let config = config::init_config_from_dir(app_data_dir);
    config.validate().map_err(AppError::Internal)?;

    if let Err(e) = logger::init_global_logger(&config.get_log_dir(app_data_dir), &config.logging) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }

    log_info!("APP", "Application starting", serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "environment": config.environment.as_str(),
        "app_data_dir": app_data_dir.to_string_lossy(),
    }));

    let pool = database::connection::init_db(app_data_dir).await?;
    commands::auth_cmd::ensure_default_account(&pool, config.security.bcrypt_cost).await?;

    Ok(AppState::new(pool, app_data_dir.to_path_buf()))
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::Manager;

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let app_data_dir = app.path().app_data_dir()?;
            let state = tauri::async_runtime::block_on(bootstrap(&app_data_dir))?;
            app.manage(state);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Auth
            ipc::login,
            ipc::logout,
            ipc::check_session,
            ipc::is_logged_in,
            ipc::change_password,
            // Products
            ipc::get_products,
            ipc::get_product,
            ipc::get_product_by_barcode,
            ipc::search_products,
            ipc::get_low_stock_products,
            ipc::count_products,
            ipc::get_categories,
            ipc::create_product,
            ipc::update_product,
            ipc::delete_product,
            ipc::delete_all_products,
            ipc::adjust_stock,
            ipc::generate_barcode,
            ipc::save_product_image,
            // Cart & Checkout
            ipc::get_cart,
            ipc::add_product_to_cart,
            ipc::add_product_by_barcode,
            ipc::search_and_add,
            ipc::create_product_and_add_to_cart,
            ipc::update_cart_quantity,
            ipc::remove_from_cart,
            ipc::set_cash_received,
            ipc::clear_cart,
            ipc::process_checkout,
            // Transactions & Reports
            ipc::get_transactions,
            ipc::get_transaction_detail,
            ipc::get_recent_transactions,
            ipc::get_transactions_for_period,
            ipc::delete_all_transactions,
            ipc::get_period_report,
            ipc::get_best_sellers,
            ipc::get_dashboard_summary,
            ipc::export_receipt,
            ipc::notify_weekly_report,
            // Notifications
            ipc::get_notifications,
            ipc::get_unread_notifications,
            ipc::get_unread_count,
            ipc::mark_notification_read,
            ipc::mark_all_notifications_read,
            ipc::delete_notification,
            ipc::clear_notifications,
            // Settings
            ipc::get_settings,
            ipc::save_settings,
            ipc::get_theme,
            ipc::set_theme,
            ipc::get_theme_options,
            ipc::reset_products,
            ipc::reset_transactions,
            ipc::reset_all_data,
        ])
        .run(tauri::generate_context!())
        .expect("Gagal menjalankan aplikasi");
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub const TEST_USERNAME: &str = "admin";
    pub const TEST_PASSWORD: &str = "admin123";

    /// State dengan database in-memory, akun default, dan direktori data sementara.
    pub async fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = database::connection::init_memory_db().await.unwrap();
        commands::auth_cmd::ensure_default_account(&pool, 4).await.unwrap();
        (AppState::new(pool, dir.path().to_path_buf()), dir)
    }

    /// State siap pakai plus session token yang valid.
    pub async fn logged_in_state() -> (AppState, String, tempfile::TempDir) {
        let (state, dir) = test_state().await;
        let login = commands::auth_cmd::login(&state, TEST_USERNAME, TEST_PASSWORD)
            .await
            .unwrap();
        (state, login.session_token, dir)
    }
}
