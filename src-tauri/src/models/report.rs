use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::transaction::Transaction;

/// Periode laporan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportPeriod {
    Today,
    /// Tujuh hari terakhir termasuk hari ini
    ThisWeek,
    /// Sejak tanggal 1 bulan berjalan
    ThisMonth,
    /// Rentang tanggal, inklusif di kedua ujung
    Range { start: NaiveDate, end: NaiveDate },
}

impl ReportPeriod {
    pub fn label(&self) -> &'static str {
        match self {
            ReportPeriod::Today => "Hari Ini",
            ReportPeriod::ThisWeek => "Minggu Ini",
            ReportPeriod::ThisMonth => "Bulan Ini",
            ReportPeriod::Range { .. } => "Custom Range",
        }
    }

    /// Batas waktu `[start, end)` relatif terhadap `today`.
    /// `None` untuk rentang yang terbalik.
    pub fn bounds(&self, today: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let (first, last) = match *self {
            ReportPeriod::Today => (today, today),
            ReportPeriod::ThisWeek => (today - Duration::days(6), today),
            ReportPeriod::ThisMonth => (today.with_day(1)?, today),
            ReportPeriod::Range { start, end } if start <= end => (start, end),
            ReportPeriod::Range { .. } => return None,
        };
        let start = first.and_hms_opt(0, 0, 0)?;
        let end = last.succ_opt()?.and_hms_opt(0, 0, 0)?;
        Some((start, end))
    }
}

/// Satu titik grafik penjualan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub revenue: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodReport {
    pub period: ReportPeriod,
    pub label: String,
    pub total_revenue: f64,
    pub transaction_count: i64,
    pub chart: Vec<ChartPoint>,
    pub transactions: Vec<Transaction>,
}

/// Statistik produk terlaris.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestSeller {
    pub product_id: i64,
    pub product_name: String,
    pub total_sold: i64,
    pub total_revenue: f64,
}

/// Ringkasan untuk layar dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_products: i64,
    pub today_transaction_count: i64,
    pub today_revenue: f64,
    pub low_stock_count: i64,
    pub recent_transactions: Vec<Transaction>,
    pub best_sellers: Vec<BestSeller>,
}
