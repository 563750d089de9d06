use sqlx::SqlitePool;

use crate::auth::guard::validate_session;
use crate::database::now_timestamp;
use crate::errors::{AppError, AppResult};
use crate::models::notification::{Notification, NotificationKind};
use crate::{log_info, AppState};

/// Simpan notifikasi baru. Dipanggil dari checkout, produk dan laporan.
pub async fn notify(
    db: &SqlitePool,
    kind: NotificationKind,
    title: &str,
    message: &str,
) -> AppResult<Notification> {
    let created_at = now_timestamp();
    let res = sqlx::query(
        "INSERT INTO notifications (title, message, kind, created_at, is_read) VALUES (?, ?, ?, ?, 0)",
    )
    .bind(title)
    .bind(message)
    .bind(kind.as_str())
    .bind(&created_at)
    .execute(db)
    .await?;

    log_info!("NOTIFICATION", title, serde_json::json!({
        "kind": kind.as_str(),
        "message": message,
    }));

    Ok(Notification {
        id: res.last_insert_rowid(),
        title: title.to_string(),
        message: message.to_string(),
        kind: kind.as_str().to_string(),
        created_at,
        is_read: false,
    })
}

pub async fn get_notifications(state: &AppState, session_token: &str) -> AppResult<Vec<Notification>> {
    validate_session(state, session_token)?;

    let rows = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(rows)
}

pub async fn get_unread_notifications(
    state: &AppState,
    session_token: &str,
) -> AppResult<Vec<Notification>> {
    validate_session(state, session_token)?;

    let rows = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE is_read = 0 ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(rows)
}

pub async fn get_unread_count(state: &AppState, session_token: &str) -> AppResult<i64> {
    validate_session(state, session_token)?;

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE is_read = 0")
        .fetch_one(&state.db)
        .await?;
    Ok(count.0)
}

pub async fn mark_as_read(state: &AppState, session_token: &str, id: i64) -> AppResult<()> {
    validate_session(state, session_token)?;

    let res = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Notifikasi {}", id)));
    }
    Ok(())
}

pub async fn mark_all_as_read(state: &AppState, session_token: &str) -> AppResult<u64> {
    validate_session(state, session_token)?;

    let res = sqlx::query("UPDATE notifications SET is_read = 1 WHERE is_read = 0")
        .execute(&state.db)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_notification(state: &AppState, session_token: &str, id: i64) -> AppResult<()> {
    validate_session(state, session_token)?;

    let res = sqlx::query("DELETE FROM notifications WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Notifikasi {}", id)));
    }
    Ok(())
}

pub async fn clear_notifications(state: &AppState, session_token: &str) -> AppResult<u64> {
    validate_session(state, session_token)?;

    let res = sqlx::query("DELETE FROM notifications").execute(&state.db).await?;
    Ok(res.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::logged_in_state;

    #[tokio::test]
    async fn unread_count_drops_after_mark_as_read() {
        let (state, token, _dir) = logged_in_state().await;
        let first = notify(&state.db, NotificationKind::General, "Halo", "Pesan 1").await.unwrap();
        notify(&state.db, NotificationKind::LowStock, "Stok Menipis", "Pesan 2").await.unwrap();

        assert_eq!(get_unread_count(&state, &token).await.unwrap(), 2);

        mark_as_read(&state, &token, first.id).await.unwrap();
        assert_eq!(get_unread_count(&state, &token).await.unwrap(), 1);

        let unread = get_unread_notifications(&state, &token).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].kind, "LOW_STOCK");

        assert_eq!(mark_all_as_read(&state, &token).await.unwrap(), 1);
        assert_eq!(get_unread_count(&state, &token).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn newest_notification_comes_first() {
        let (state, token, _dir) = logged_in_state().await;
        notify(&state.db, NotificationKind::General, "Lama", "a").await.unwrap();
        notify(&state.db, NotificationKind::General, "Baru", "b").await.unwrap();

        let all = get_notifications(&state, &token).await.unwrap();
        assert_eq!(all[0].title, "Baru");
        assert!(!all[0].is_read);
    }

    #[tokio::test]
    async fn delete_and_clear() {
        let (state, token, _dir) = logged_in_state().await;
        let n = notify(&state.db, NotificationKind::General, "x", "y").await.unwrap();
        notify(&state.db, NotificationKind::General, "x", "z").await.unwrap();

        delete_notification(&state, &token, n.id).await.unwrap();
        assert!(matches!(
            delete_notification(&state, &token, n.id).await,
            Err(AppError::NotFound(_))
        ));

        assert_eq!(clear_notifications(&state, &token).await.unwrap(), 1);
        assert!(get_notifications(&state, &token).await.unwrap().is_empty());
    }
}
