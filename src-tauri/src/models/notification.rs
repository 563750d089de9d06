use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub created_at: String,
    pub is_read: bool,
}

/// Kategori notifikasi sistem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Transaction,
    LowStock,
    ProductAdded,
    WeeklyReport,
    General,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Transaction => "TRANSACTION",
            NotificationKind::LowStock => "LOW_STOCK",
            NotificationKind::ProductAdded => "PRODUCT_ADDED",
            NotificationKind::WeeklyReport => "WEEKLY_REPORT",
            NotificationKind::General => "GENERAL",
        }
    }
}
