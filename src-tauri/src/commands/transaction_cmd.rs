use chrono::{Local, NaiveDate};
use sqlx::SqlitePool;

use super::notification_cmd::notify;
use super::settings_cmd::{low_stock_alert_threshold, store_name};
use crate::auth::guard::validate_session;
use crate::config::get_config;
use crate::database::{format_timestamp, now_timestamp};
use crate::errors::{AppError, AppResult};
use crate::models::notification::NotificationKind;
use crate::models::report::ReportPeriod;
use crate::models::transaction::{LineItem, ReceiptExport, Transaction, TransactionDetail};
use crate::receipt::{format_currency, receipt_html, receipt_text, write_receipt};
use crate::{log_error, log_info, log_warn, AppState};

/// Item transaksi dari kolom JSON.
pub fn transaction_items(transaction: &Transaction) -> AppResult<Vec<LineItem>> {
    Ok(transaction.line_items()?)
}

/// Checkout keranjang.
///
/// Stok dikurangi dengan UPDATE bersyarat di dalam satu database transaction;
/// satu item yang stoknya kurang membatalkan seluruh checkout dan keranjang
/// tetap utuh. Checkout berikutnya menunggu sampai yang sedang berjalan
/// selesai, lalu melihat keranjang yang sudah kosong.
pub async fn process_checkout(state: &AppState, session_token: &str) -> AppResult<Transaction> {
    let session = validate_session(state, session_token)?;
    let _checkout = state.checkout_lock.lock().await;

    let (items, total, cash) =
        state.with_cart(|cart| (cart.items().to_vec(), cart.total(), cart.cash_received()))?;

    if items.is_empty() {
        return Err(AppError::EmptyCart);
    }
    if cash < total {
        return Err(AppError::InsufficientPayment { total, received: cash });
    }
    let change = cash - total;
    let now = now_timestamp();

    let mut tx = state.db.begin().await?;

    for item in &items {
        let res = sqlx::query(
            "UPDATE products SET stock = stock - ?, updated_at = ? WHERE id = ? AND stock >= ?",
        )
        .bind(item.quantity)
        .bind(&now)
        .bind(item.product_id)
        .bind(item.quantity)
        .execute(&mut *tx)
        .await?;

        if res.rows_affected() == 0 {
            let name: Option<(String,)> = sqlx::query_as("SELECT name FROM products WHERE id = ?")
                .bind(item.product_id)
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await?;

            let name = name
                .map(|n| n.0)
                .unwrap_or_else(|| format!("Produk ID {}", item.product_id));
            log_warn!("CHECKOUT", "Insufficient stock", serde_json::json!({
                "product_id": item.product_id,
                "requested": item.quantity,
            }));
            return Err(AppError::InsufficientStock(name));
        }
    }

    let items_json = serde_json::to_string(&items)?;
    let id = sqlx::query(
        "INSERT INTO transactions (created_at, total_amount, cash_received, change_due, items)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&now)
    .bind(total)
    .bind(cash)
    .bind(change)
    .bind(&items_json)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;

    state.with_cart(|cart| cart.clear())?;

    let transaction = Transaction {
        id,
        created_at: now,
        total_amount: total,
        cash_received: cash,
        change_due: change,
        items: items_json,
    };

    log_info!("CHECKOUT", "Transaction saved", serde_json::json!({
        "id": id,
        "total": total,
        "items": items.len(),
        "cashier": session.username,
    }));

    // Transaksi sudah tersimpan; kegagalan notifikasi cukup dicatat
    if let Err(e) = post_checkout_notifications(state, &transaction, &items).await {
        log_error!("CHECKOUT", "Failed to post notifications", e.to_string());
    }

    Ok(transaction)
}

async fn post_checkout_notifications(
    state: &AppState,
    transaction: &Transaction,
    items: &[LineItem],
) -> AppResult<()> {
    notify(
        &state.db,
        NotificationKind::Transaction,
        "Transaksi Berhasil",
        &format!(
            "{} sebesar {} berhasil disimpan",
            transaction.display_number(),
            format_currency(transaction.total_amount)
        ),
    )
    .await?;

    let threshold = low_stock_alert_threshold(&state.db).await?;
    for item in items {
        let row: Option<(String, i64)> = sqlx::query_as("SELECT name, stock FROM products WHERE id = ?")
            .bind(item.product_id)
            .fetch_optional(&state.db)
            .await?;
        let Some((name, stock)) = row else { continue };

        if stock <= threshold
            && state
                .low_stock_alerts
                .check(&format!("low_stock:{}", item.product_id))
                .is_ok()
        {
            notify(
                &state.db,
                NotificationKind::LowStock,
                "Stok Menipis",
                &format!("{} tersisa {} unit. Segera lakukan restock!", name, stock),
            )
            .await?;
        }
    }
    Ok(())
}

pub async fn get_transactions(state: &AppState, session_token: &str) -> AppResult<Vec<Transaction>> {
    validate_session(state, session_token)?;

    let rows = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(rows)
}

pub(crate) async fn find_transaction(db: &SqlitePool, id: i64) -> AppResult<Transaction> {
    sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Transaksi {}", id)))
}

/// Detail satu transaksi beserta item-nya.
pub async fn get_transaction(state: &AppState, session_token: &str, id: i64) -> AppResult<TransactionDetail> {
    validate_session(state, session_token)?;

    let transaction = find_transaction(&state.db, id).await?;
    let items = transaction_items(&transaction)?;
    Ok(TransactionDetail { transaction, items })
}

pub async fn get_recent_transactions(
    state: &AppState,
    session_token: &str,
    limit: Option<i64>,
) -> AppResult<Vec<Transaction>> {
    validate_session(state, session_token)?;
    recent_transactions(&state.db, limit.unwrap_or(get_config().store.recent_transactions_limit)).await
}

pub(crate) async fn recent_transactions(db: &SqlitePool, limit: i64) -> AppResult<Vec<Transaction>> {
    let rows = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(limit.max(0))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Transaksi dalam periode, terlama dulu.
pub(crate) async fn transactions_in_period(
    db: &SqlitePool,
    period: ReportPeriod,
    today: NaiveDate,
) -> AppResult<Vec<Transaction>> {
    let (start, end) = period
        .bounds(today)
        .ok_or_else(|| AppError::Validation("Tanggal awal harus sebelum tanggal akhir".into()))?;

    let rows = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions
         WHERE created_at >= ? AND created_at < ?
         ORDER BY created_at ASC, id ASC",
    )
    .bind(format_timestamp(start))
    .bind(format_timestamp(end))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get_transactions_for_period(
    state: &AppState,
    session_token: &str,
    period: ReportPeriod,
) -> AppResult<Vec<Transaction>> {
    validate_session(state, session_token)?;
    transactions_in_period(&state.db, period, Local::now().date_naive()).await
}

pub async fn delete_all_transactions(state: &AppState, session_token: &str) -> AppResult<u64> {
    validate_session(state, session_token)?;

    let deleted = sqlx::query("DELETE FROM transactions")
        .execute(&state.db)
        .await?
        .rows_affected();

    log_info!("TRANSACTION", "All transactions deleted", serde_json::json!({ "deleted": deleted }));
    Ok(deleted)
}

/// Simpan struk HTML ke `<data_dir>/receipts/` dan kembalikan juga versi teksnya.
pub async fn export_receipt(state: &AppState, session_token: &str, id: i64) -> AppResult<ReceiptExport> {
    validate_session(state, session_token)?;

    let transaction = find_transaction(&state.db, id).await?;
    let items = transaction_items(&transaction)?;
    let store = store_name(&state.db).await?;

    let dir = get_config().get_receipt_dir(&state.data_dir);
    let html = receipt_html(&store, &transaction, &items);
    let path = write_receipt(&dir, &transaction, &html).await?;

    log_info!("RECEIPT", "Receipt exported", serde_json::json!({
        "transaction_id": id,
        "path": path.to_string_lossy(),
    }));

    Ok(ReceiptExport {
        file_path: path.to_string_lossy().to_string(),
        text: receipt_text(&store, &transaction, &items),
    })
}
