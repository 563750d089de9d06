//! Tauri command handlers. Tiap handler hanya meneruskan ke `commands::*`
//! dan mengubah `AppError` menjadi pesan untuk webview.

use tauri::{AppHandle, Emitter, State};

use crate::cart::CartSnapshot;
use crate::commands::{
    auth_cmd, cart_cmd, notification_cmd, product_cmd, report_cmd, settings_cmd, transaction_cmd,
};
use crate::models::notification::Notification;
use crate::models::product::{CategoryWithCount, Product, ProductPayload};
use crate::models::report::{BestSeller, DashboardSummary, PeriodReport, ReportPeriod};
use crate::models::settings::{AppSettings, Theme, ThemeOption};
use crate::models::transaction::{ReceiptExport, Transaction, TransactionDetail};
use crate::models::user::{AuthUserData, LoginResult};
use crate::{log_warn, AppState};

/// Event untuk UI: daftar notifikasi berubah (UI menampilkan notifikasi perangkat).
pub const NOTIFICATIONS_CHANGED: &str = "notifications-changed";

fn notifications_changed(app: &AppHandle) {
    if let Err(e) = app.emit(NOTIFICATIONS_CHANGED, ()) {
        log_warn!("IPC", "Failed to emit event", serde_json::json!({ "error": e.to_string() }));
    }
}

// ── Auth ─────────────────────────────────────────

#[tauri::command]
pub async fn login(
    state: State<'_, AppState>,
    username: String,
    password: String,
) -> Result<LoginResult, String> {
    Ok(auth_cmd::login(&state, &username, &password).await?)
}

#[tauri::command]
pub async fn logout(state: State<'_, AppState>, session_token: String) -> Result<(), String> {
    Ok(auth_cmd::logout(&state, &session_token).await?)
}

#[tauri::command]
pub async fn check_session(
    state: State<'_, AppState>,
    session_token: String,
) -> Result<AuthUserData, String> {
    Ok(auth_cmd::check_session(&state, &session_token)?)
}

#[tauri::command]
pub async fn is_logged_in(state: State<'_, AppState>) -> Result<bool, String> {
    Ok(auth_cmd::is_logged_in(&state).await?)
}

#[tauri::command]
pub async fn change_password(
    state: State<'_, AppState>,
    session_token: String,
    old_password: String,
    new_password: String,
) -> Result<(), String> {
    Ok(auth_cmd::change_password(&state, &session_token, &old_password, &new_password).await?)
}

// ── Products ─────────────────────────────────────

#[tauri::command]
pub async fn get_products(state: State<'_, AppState>, session_token: String) -> Result<Vec<Product>, String> {
    Ok(product_cmd::get_products(&state, &session_token).await?)
}

#[tauri::command]
pub async fn get_product(state: State<'_, AppState>, session_token: String, id: i64) -> Result<Product, String> {
    Ok(product_cmd::get_product(&state, &session_token, id).await?)
}

#[tauri::command]
pub async fn get_product_by_barcode(
    state: State<'_, AppState>,
    session_token: String,
    barcode: String,
) -> Result<Product, String> {
    Ok(product_cmd::get_product_by_barcode(&state, &session_token, &barcode).await?)
}

#[tauri::command]
pub async fn search_products(
    state: State<'_, AppState>,
    session_token: String,
    query: String,
) -> Result<Vec<Product>, String> {
    Ok(product_cmd::search_products(&state, &session_token, &query).await?)
}

#[tauri::command]
pub async fn get_low_stock_products(
    state: State<'_, AppState>,
    session_token: String,
    threshold: Option<i64>,
) -> Result<Vec<Product>, String> {
    Ok(product_cmd::get_low_stock_products(&state, &session_token, threshold).await?)
}

#[tauri::command]
pub async fn count_products(state: State<'_, AppState>, session_token: String) -> Result<i64, String> {
    Ok(product_cmd::count_products(&state, &session_token).await?)
}

#[tauri::command]
pub async fn get_categories(
    state: State<'_, AppState>,
    session_token: String,
) -> Result<Vec<CategoryWithCount>, String> {
    Ok(product_cmd::get_categories(&state, &session_token).await?)
}

#[tauri::command]
pub async fn create_product(
    app: AppHandle,
    state: State<'_, AppState>,
    session_token: String,
    payload: ProductPayload,
) -> Result<Product, String> {
    let product = product_cmd::create_product(&state, &session_token, payload).await?;
    notifications_changed(&app);
    Ok(product)
}

#[tauri::command]
pub async fn update_product(
    state: State<'_, AppState>,
    session_token: String,
    id: i64,
    payload: ProductPayload,
) -> Result<Product, String> {
    Ok(product_cmd::update_product(&state, &session_token, id, payload).await?)
}

#[tauri::command]
pub async fn delete_product(state: State<'_, AppState>, session_token: String, id: i64) -> Result<(), String> {
    Ok(product_cmd::delete_product(&state, &session_token, id).await?)
}

#[tauri::command]
pub async fn delete_all_products(state: State<'_, AppState>, session_token: String) -> Result<u64, String> {
    Ok(product_cmd::delete_all_products(&state, &session_token).await?)
}

#[tauri::command]
pub async fn adjust_stock(
    state: State<'_, AppState>,
    session_token: String,
    id: i64,
    delta: i64,
) -> Result<i64, String> {
    Ok(product_cmd::adjust_stock(&state, &session_token, id, delta).await?)
}

#[tauri::command]
pub async fn generate_barcode(state: State<'_, AppState>, session_token: String, id: i64) -> Result<String, String> {
    Ok(product_cmd::generate_barcode(&state, &session_token, id).await?)
}

#[tauri::command]
pub async fn save_product_image(
    state: State<'_, AppState>,
    session_token: String,
    id: i64,
    file_path: String,
) -> Result<String, String> {
    Ok(product_cmd::save_product_image(&state, &session_token, id, &file_path).await?)
}

// ── Cart & Checkout ──────────────────────────────

#[tauri::command]
pub async fn get_cart(state: State<'_, AppState>, session_token: String) -> Result<CartSnapshot, String> {
    Ok(cart_cmd::get_cart(&state, &session_token)?)
}

#[tauri::command]
pub async fn add_product_to_cart(
    state: State<'_, AppState>,
    session_token: String,
    product_id: i64,
) -> Result<CartSnapshot, String> {
    Ok(cart_cmd::add_product_to_cart(&state, &session_token, product_id).await?)
}

#[tauri::command]
pub async fn add_product_by_barcode(
    state: State<'_, AppState>,
    session_token: String,
    barcode: String,
) -> Result<CartSnapshot, String> {
    Ok(cart_cmd::add_product_by_barcode(&state, &session_token, &barcode).await?)
}

#[tauri::command]
pub async fn search_and_add(
    state: State<'_, AppState>,
    session_token: String,
    query: String,
) -> Result<CartSnapshot, String> {
    Ok(cart_cmd::search_and_add(&state, &session_token, &query).await?)
}

#[tauri::command]
pub async fn create_product_and_add_to_cart(
    app: AppHandle,
    state: State<'_, AppState>,
    session_token: String,
    payload: ProductPayload,
) -> Result<CartSnapshot, String> {
    let cart = cart_cmd::create_product_and_add_to_cart(&state, &session_token, payload).await?;
    notifications_changed(&app);
    Ok(cart)
}

#[tauri::command]
pub async fn update_cart_quantity(
    state: State<'_, AppState>,
    session_token: String,
    product_id: i64,
    quantity: i64,
) -> Result<CartSnapshot, String> {
    Ok(cart_cmd::update_cart_quantity(&state, &session_token, product_id, quantity)?)
}

#[tauri::command]
pub async fn remove_from_cart(
    state: State<'_, AppState>,
    session_token: String,
    product_id: i64,
) -> Result<CartSnapshot, String> {
    Ok(cart_cmd::remove_from_cart(&state, &session_token, product_id)?)
}

#[tauri::command]
pub async fn set_cash_received(
    state: State<'_, AppState>,
    session_token: String,
    amount: f64,
) -> Result<CartSnapshot, String> {
    Ok(cart_cmd::set_cash_received(&state, &session_token, amount)?)
}

#[tauri::command]
pub async fn clear_cart(state: State<'_, AppState>, session_token: String) -> Result<CartSnapshot, String> {
    Ok(cart_cmd::clear_cart(&state, &session_token)?)
}

#[tauri::command]
pub async fn process_checkout(
    app: AppHandle,
    state: State<'_, AppState>,
    session_token: String,
) -> Result<Transaction, String> {
    let transaction = transaction_cmd::process_checkout(&state, &session_token).await?;
    notifications_changed(&app);
    Ok(transaction)
}

// ── Transactions & Reports ───────────────────────

#[tauri::command]
pub async fn get_transactions(
    state: State<'_, AppState>,
    session_token: String,
) -> Result<Vec<Transaction>, String> {
    Ok(transaction_cmd::get_transactions(&state, &session_token).await?)
}

#[tauri::command]
pub async fn get_transaction_detail(
    state: State<'_, AppState>,
    session_token: String,
    id: i64,
) -> Result<TransactionDetail, String> {
    Ok(transaction_cmd::get_transaction(&state, &session_token, id).await?)
}

#[tauri::command]
pub async fn get_recent_transactions(
    state: State<'_, AppState>,
    session_token: String,
    limit: Option<i64>,
) -> Result<Vec<Transaction>, String> {
    Ok(transaction_cmd::get_recent_transactions(&state, &session_token, limit).await?)
}

#[tauri::command]
pub async fn get_transactions_for_period(
    state: State<'_, AppState>,
    session_token: String,
    period: ReportPeriod,
) -> Result<Vec<Transaction>, String> {
    Ok(transaction_cmd::get_transactions_for_period(&state, &session_token, period).await?)
}

#[tauri::command]
pub async fn delete_all_transactions(state: State<'_, AppState>, session_token: String) -> Result<u64, String> {
    Ok(transaction_cmd::delete_all_transactions(&state, &session_token).await?)
}

#[tauri::command]
pub async fn export_receipt(
    state: State<'_, AppState>,
    session_token: String,
    id: i64,
) -> Result<ReceiptExport, String> {
    Ok(transaction_cmd::export_receipt(&state, &session_token, id).await?)
}

#[tauri::command]
pub async fn get_period_report(
    state: State<'_, AppState>,
    session_token: String,
    period: ReportPeriod,
) -> Result<PeriodReport, String> {
    Ok(report_cmd::get_period_report(&state, &session_token, period).await?)
}

#[tauri::command]
pub async fn get_best_sellers(
    state: State<'_, AppState>,
    session_token: String,
    limit: Option<usize>,
) -> Result<Vec<BestSeller>, String> {
    Ok(report_cmd::get_best_sellers(&state, &session_token, limit).await?)
}

#[tauri::command]
pub async fn get_dashboard_summary(
    state: State<'_, AppState>,
    session_token: String,
) -> Result<DashboardSummary, String> {
    Ok(report_cmd::get_dashboard_summary(&state, &session_token).await?)
}

#[tauri::command]
pub async fn notify_weekly_report(
    app: AppHandle,
    state: State<'_, AppState>,
    session_token: String,
) -> Result<Notification, String> {
    let notification = report_cmd::notify_weekly_report(&state, &session_token).await?;
    notifications_changed(&app);
    Ok(notification)
}

// ── Notifications ────────────────────────────────

#[tauri::command]
pub async fn get_notifications(
    state: State<'_, AppState>,
    session_token: String,
) -> Result<Vec<Notification>, String> {
    Ok(notification_cmd::get_notifications(&state, &session_token).await?)
}

#[tauri::command]
pub async fn get_unread_notifications(
    state: State<'_, AppState>,
    session_token: String,
) -> Result<Vec<Notification>, String> {
    Ok(notification_cmd::get_unread_notifications(&state, &session_token).await?)
}

#[tauri::command]
pub async fn get_unread_count(state: State<'_, AppState>, session_token: String) -> Result<i64, String> {
    Ok(notification_cmd::get_unread_count(&state, &session_token).await?)
}

#[tauri::command]
pub async fn mark_notification_read(
    app: AppHandle,
    state: State<'_, AppState>,
    session_token: String,
    id: i64,
) -> Result<(), String> {
    notification_cmd::mark_as_read(&state, &session_token, id).await?;
    notifications_changed(&app);
    Ok(())
}

#[tauri::command]
pub async fn mark_all_notifications_read(
    app: AppHandle,
    state: State<'_, AppState>,
    session_token: String,
) -> Result<u64, String> {
    let updated = notification_cmd::mark_all_as_read(&state, &session_token).await?;
    notifications_changed(&app);
    Ok(updated)
}

#[tauri::command]
pub async fn delete_notification(
    app: AppHandle,
    state: State<'_, AppState>,
    session_token: String,
    id: i64,
) -> Result<(), String> {
    notification_cmd::delete_notification(&state, &session_token, id).await?;
    notifications_changed(&app);
    Ok(())
}

#[tauri::command]
pub async fn clear_notifications(
    app: AppHandle,
    state: State<'_, AppState>,
    session_token: String,
) -> Result<u64, String> {
    let deleted = notification_cmd::clear_notifications(&state, &session_token).await?;
    notifications_changed(&app);
    Ok(deleted)
}

// ── Settings ─────────────────────────────────────

#[tauri::command]
pub async fn get_settings(state: State<'_, AppState>, session_token: String) -> Result<AppSettings, String> {
    Ok(settings_cmd::get_settings(&state, &session_token).await?)
}

#[tauri::command]
pub async fn save_settings(
    state: State<'_, AppState>,
    session_token: String,
    payload: AppSettings,
) -> Result<AppSettings, String> {
    Ok(settings_cmd::save_settings(&state, &session_token, payload).await?)
}

#[tauri::command]
pub async fn get_theme(state: State<'_, AppState>, session_token: String) -> Result<Theme, String> {
    Ok(settings_cmd::get_theme(&state, &session_token).await?)
}

#[tauri::command]
pub async fn set_theme(state: State<'_, AppState>, session_token: String, theme: String) -> Result<Theme, String> {
    Ok(settings_cmd::set_theme(&state, &session_token, &theme).await?)
}

#[tauri::command]
pub fn get_theme_options() -> Vec<ThemeOption> {
    settings_cmd::get_theme_options()
}

#[tauri::command]
pub async fn reset_products(state: State<'_, AppState>, session_token: String) -> Result<u64, String> {
    Ok(settings_cmd::reset_products(&state, &session_token).await?)
}

#[tauri::command]
pub async fn reset_transactions(state: State<'_, AppState>, session_token: String) -> Result<u64, String> {
    Ok(settings_cmd::reset_transactions(&state, &session_token).await?)
}

#[tauri::command]
pub async fn reset_all_data(
    app: AppHandle,
    state: State<'_, AppState>,
    session_token: String,
) -> Result<(), String> {
    settings_cmd::reset_all_data(&state, &session_token).await?;
    notifications_changed(&app);
    Ok(())
}
