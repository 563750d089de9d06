use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike, Weekday};
use std::collections::HashMap;

use super::notification_cmd::notify;
use super::settings_cmd::low_stock_threshold;
use super::transaction_cmd::{recent_transactions, transactions_in_period};
use crate::auth::guard::validate_session;
use crate::config::get_config;
use crate::database::parse_timestamp;
use crate::errors::AppResult;
use crate::models::notification::{Notification, NotificationKind};
use crate::models::report::{BestSeller, ChartPoint, DashboardSummary, PeriodReport, ReportPeriod};
use crate::models::transaction::Transaction;
use crate::receipt::format_currency;
use crate::{log_warn, AppState};

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Senin",
        Weekday::Tue => "Selasa",
        Weekday::Wed => "Rabu",
        Weekday::Thu => "Kamis",
        Weekday::Fri => "Jumat",
        Weekday::Sat => "Sabtu",
        Weekday::Sun => "Minggu",
    }
}

/// Kunci bucket (untuk urutan) dan label grafik satu transaksi.
fn bucket(period: &ReportPeriod, at: NaiveDateTime) -> (NaiveDateTime, String) {
    let day = at.date();
    let midnight = day.and_hms_opt(0, 0, 0).unwrap_or(at);
    match period {
        ReportPeriod::Today => (
            day.and_hms_opt(at.hour(), 0, 0).unwrap_or(at),
            format!("{}:00", at.hour()),
        ),
        ReportPeriod::ThisWeek => (midnight, weekday_name(day.weekday()).to_string()),
        ReportPeriod::ThisMonth => (midnight, day.day().to_string()),
        ReportPeriod::Range { .. } => (midnight, format!("{}/{}", day.day(), day.month())),
    }
}

/// Titik grafik per bucket, urut kronologis.
pub fn chart_points(period: &ReportPeriod, transactions: &[Transaction]) -> Vec<ChartPoint> {
    let mut buckets: Vec<(NaiveDateTime, ChartPoint)> = Vec::new();

    for t in transactions {
        let Some(at) = parse_timestamp(&t.created_at) else {
            continue;
        };
        let (key, label) = bucket(period, at);
        match buckets.iter_mut().find(|(k, _)| *k == key) {
            Some((_, point)) => {
                point.revenue += t.total_amount;
                point.count += 1;
            }
            None => buckets.push((
                key,
                ChartPoint {
                    label,
                    revenue: t.total_amount,
                    count: 1,
                },
            )),
        }
    }

    buckets.sort_by_key(|(k, _)| *k);
    buckets.into_iter().map(|(_, p)| p).collect()
}

/// Agregasi produk terlaris dari item JSON semua transaksi.
/// Baris yang JSON-nya rusak dilewati.
pub fn best_sellers(transactions: &[Transaction], limit: usize) -> Vec<BestSeller> {
    let mut stats: HashMap<i64, BestSeller> = HashMap::new();

    for t in transactions {
        let items = match t.line_items() {
            Ok(items) => items,
            Err(e) => {
                log_warn!("REPORT", "Skipping unreadable transaction items", serde_json::json!({
                    "transaction_id": t.id,
                    "error": e.to_string(),
                }));
                continue;
            }
        };

        for item in items {
            let entry = stats.entry(item.product_id).or_insert_with(|| BestSeller {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                total_sold: 0,
                total_revenue: 0.0,
            });
            entry.total_sold += item.quantity;
            entry.total_revenue += item.subtotal;
        }
    }

    let mut result: Vec<BestSeller> = stats.into_values().collect();
    result.sort_by(|a, b| {
        b.total_sold
            .cmp(&a.total_sold)
            .then(b.total_revenue.total_cmp(&a.total_revenue))
            .then(a.product_id.cmp(&b.product_id))
    });
    result.truncate(limit);
    result
}

async fn all_transactions(state: &AppState) -> AppResult<Vec<Transaction>> {
    let rows = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions")
        .fetch_all(&state.db)
        .await?;
    Ok(rows)
}

pub(crate) async fn period_report(state: &AppState, period: ReportPeriod, today: NaiveDate) -> AppResult<PeriodReport> {
    let transactions = transactions_in_period(&state.db, period, today).await?;

    Ok(PeriodReport {
        period,
        label: period.label().to_string(),
        total_revenue: transactions.iter().map(|t| t.total_amount).sum(),
        transaction_count: transactions.len() as i64,
        chart: chart_points(&period, &transactions),
        transactions,
    })
}

/// Laporan penjualan untuk satu periode.
pub async fn get_period_report(
    state: &AppState,
    session_token: &str,
    period: ReportPeriod,
) -> AppResult<PeriodReport> {
    validate_session(state, session_token)?;
    period_report(state, period, Local::now().date_naive()).await
}

pub async fn get_best_sellers(
    state: &AppState,
    session_token: &str,
    limit: Option<usize>,
) -> AppResult<Vec<BestSeller>> {
    validate_session(state, session_token)?;

    let transactions = all_transactions(state).await?;
    Ok(best_sellers(
        &transactions,
        limit.unwrap_or(get_config().store.best_seller_limit),
    ))
}

/// Ringkasan dashboard.
pub async fn get_dashboard_summary(state: &AppState, session_token: &str) -> AppResult<DashboardSummary> {
    validate_session(state, session_token)?;
    let store = &get_config().store;

    let (total_products,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(&state.db)
        .await?;

    let threshold = low_stock_threshold(&state.db).await?;
    let (low_stock_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE stock <= ?")
        .bind(threshold)
        .fetch_one(&state.db)
        .await?;

    let today = period_report(state, ReportPeriod::Today, Local::now().date_naive()).await?;
    let recent = recent_transactions(&state.db, store.recent_transactions_limit).await?;
    let all = all_transactions(state).await?;

    Ok(DashboardSummary {
        total_products,
        today_transaction_count: today.transaction_count,
        today_revenue: today.total_revenue,
        low_stock_count,
        recent_transactions: recent,
        best_sellers: best_sellers(&all, store.best_seller_limit),
    })
}

/// Kirim notifikasi ringkasan pendapatan 7 hari terakhir.
pub async fn notify_weekly_report(state: &AppState, session_token: &str) -> AppResult<Notification> {
    validate_session(state, session_token)?;

    let report = period_report(state, ReportPeriod::ThisWeek, Local::now().date_naive()).await?;
    notify(
        &state.db,
        NotificationKind::WeeklyReport,
        "Laporan Mingguan",
        &format!(
            "Total pendapatan minggu ini: {} dari {} transaksi",
            format_currency(report.total_revenue),
            report.transaction_count
        ),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::LineItem;
    use crate::test_support::logged_in_state;

    fn tx(id: i64, created_at: &str, items: &[LineItem]) -> Transaction {
        let total: f64 = items.iter().map(|i| i.subtotal).sum();
        Transaction {
            id,
            created_at: created_at.into(),
            total_amount: total,
            cash_received: total,
            change_due: 0.0,
            items: serde_json::to_string(items).unwrap(),
        }
    }

    async fn insert(state: &AppState, t: &Transaction) {
        sqlx::query(
            "INSERT INTO transactions (id, created_at, total_amount, cash_received, change_due, items)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(t.id)
        .bind(&t.created_at)
        .bind(t.total_amount)
        .bind(t.cash_received)
        .bind(t.change_due)
        .bind(&t.items)
        .execute(&state.db)
        .await
        .unwrap();
    }

    fn mie(qty: i64) -> LineItem {
        LineItem::new(1, "Indomie", 3500.0, qty)
    }

    fn teh(qty: i64) -> LineItem {
        LineItem::new(2, "Teh Botol", 5000.0, qty)
    }

    #[test]
    fn best_sellers_ordered_by_quantity_sold() {
        let transactions = vec![
            tx(1, "2024-03-01 10:00:00", &[mie(2), teh(1)]),
            tx(2, "2024-03-01 11:00:00", &[teh(4)]),
            tx(3, "2024-03-02 09:00:00", &[mie(1)]),
        ];
        let result = best_sellers(&transactions, 5);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].product_name, "Teh Botol");
        assert_eq!(result[0].total_sold, 5);
        assert_eq!(result[0].total_revenue, 25_000.0);
        assert_eq!(result[1].total_sold, 3);

        assert_eq!(best_sellers(&transactions, 1).len(), 1);
    }

    #[test]
    fn best_sellers_skip_unreadable_rows() {
        let mut broken = tx(2, "2024-03-01 11:00:00", &[]);
        broken.items = "not json".into();
        let transactions = vec![tx(1, "2024-03-01 10:00:00", &[mie(2)]), broken];

        let result = best_sellers(&transactions, 5);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].total_sold, 2);
    }

    #[test]
    fn hourly_chart_is_chronological() {
        let transactions = vec![
            tx(1, "2024-03-01 09:15:00", &[mie(1)]),
            tx(2, "2024-03-01 09:45:00", &[teh(1)]),
            tx(3, "2024-03-01 14:05:00", &[mie(2)]),
        ];
        let chart = chart_points(&ReportPeriod::Today, &transactions);

        assert_eq!(chart.len(), 2);
        assert_eq!(chart[0].label, "9:00");
        assert_eq!(chart[0].revenue, 8_500.0);
        assert_eq!(chart[0].count, 2);
        assert_eq!(chart[1].label, "14:00");
    }

    #[test]
    fn weekly_chart_uses_indonesian_day_names() {
        let transactions = vec![
            // 2024-03-04 adalah Senin
            tx(1, "2024-03-04 10:00:00", &[mie(1)]),
            tx(2, "2024-03-10 10:00:00", &[mie(1)]),
        ];
        let chart = chart_points(&ReportPeriod::ThisWeek, &transactions);
        let labels: Vec<&str> = chart.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["Senin", "Minggu"]);
    }

    #[test]
    fn range_chart_orders_by_date_not_label() {
        let range = ReportPeriod::Range {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        };
        let transactions = vec![
            tx(2, "2024-01-10 10:00:00", &[mie(1)]),
            tx(1, "2024-01-09 10:00:00", &[mie(1)]),
        ];
        let chart = chart_points(&range, &transactions);
        let labels: Vec<&str> = chart.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["9/1", "10/1"]);
    }

    #[tokio::test]
    async fn period_report_totals_match_transactions() {
        let (state, _token, _dir) = logged_in_state().await;
        insert(&state, &tx(1, "2024-03-04 10:00:00", &[mie(2)])).await;
        insert(&state, &tx(2, "2024-03-05 12:00:00", &[teh(1)])).await;
        insert(&state, &tx(3, "2024-02-20 12:00:00", &[teh(3)])).await;

        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let month = period_report(&state, ReportPeriod::ThisMonth, today).await.unwrap();
        assert_eq!(month.transaction_count, 2);
        assert_eq!(month.total_revenue, 12_000.0);
        assert_eq!(month.label, "Bulan Ini");
        let labels: Vec<&str> = month.chart.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["4", "5"]);

        let day = period_report(&state, ReportPeriod::Today, today).await.unwrap();
        assert_eq!(day.transaction_count, 1);
        assert_eq!(day.total_revenue, 5_000.0);
    }

    #[tokio::test]
    async fn dashboard_and_weekly_notification() {
        let (state, token, _dir) = logged_in_state().await;
        insert(&state, &tx(1, "2024-03-04 10:00:00", &[mie(2)])).await;

        let summary = get_dashboard_summary(&state, &token).await.unwrap();
        assert_eq!(summary.total_products, 0);
        assert_eq!(summary.recent_transactions.len(), 1);
        assert_eq!(summary.best_sellers[0].product_name, "Indomie");

        let n = notify_weekly_report(&state, &token).await.unwrap();
        assert_eq!(n.kind, "WEEKLY_REPORT");
        assert!(n.message.starts_with("Total pendapatan minggu ini: Rp"));
    }
}
