//! Render struk transaksi: teks polos untuk dibagikan dan HTML siap cetak
//! (Print / Save as PDF dari browser).

use std::path::{Path, PathBuf};

use crate::database::parse_timestamp;
use crate::errors::AppResult;
use crate::models::transaction::{LineItem, Transaction};

const SEPARATOR: &str = "--------------------------------";

/// Format angka dengan pemisah ribuan titik, mis. `15000` -> `15.000`
pub fn format_number(n: i64) -> String {
    let s = n.unsigned_abs().to_string();
    let len = s.len();
    let mut result = String::with_capacity(len + len / 3 + 1);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push('.');
        }
        result.push(c);
    }
    if n < 0 {
        result.insert(0, '-');
    }
    result
}

/// `Rp 15.000` (dibulatkan ke rupiah terdekat)
pub fn format_currency(amount: f64) -> String {
    format!("Rp {}", format_number(amount.round() as i64))
}

/// Tanggal struk `dd/mm/yyyy HH:MM`; kolom yang tidak bisa di-parse ditampilkan apa adanya.
fn display_date(created_at: &str) -> String {
    parse_timestamp(created_at)
        .map(|dt| dt.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|| created_at.to_string())
}

pub fn receipt_text(store_name: &str, transaction: &Transaction, items: &[LineItem]) -> String {
    let mut lines = vec![
        store_name.to_string(),
        "=== STRUK TRANSAKSI ===".to_string(),
        format!("No: {}", transaction.display_number()),
        format!("Tanggal: {}", display_date(&transaction.created_at)),
        SEPARATOR.to_string(),
    ];

    for item in items {
        lines.push(item.product_name.clone());
        lines.push(format!(
            "  {}x {} = {}",
            item.quantity,
            format_currency(item.unit_price),
            format_currency(item.subtotal)
        ));
    }

    lines.push(SEPARATOR.to_string());
    lines.push(format!("Total: {}", format_currency(transaction.total_amount)));
    lines.push(format!("Bayar: {}", format_currency(transaction.cash_received)));
    lines.push(format!("Kembali: {}", format_currency(transaction.change_due)));
    lines.push(SEPARATOR.to_string());
    lines.push("Terima Kasih".to_string());

    lines.join("\n")
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn receipt_html(store_name: &str, transaction: &Transaction, items: &[LineItem]) -> String {
    let rows: String = items
        .iter()
        .map(|item| {
            format!(
                r#"<tr><td class="item-name">{name}</td><td class="item-qty">{qty}x</td><td class="item-price">{price}</td></tr>
            <tr><td colspan="3" class="item-subtotal">= {subtotal}</td></tr>
            "#,
                name = escape_html(&item.product_name),
                qty = item.quantity,
                price = format_currency(item.unit_price),
                subtotal = format_currency(item.subtotal),
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Struk Penjualan - {number}</title>
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        @page {{ size: auto; margin: 0; }}
        body {{
            font-family: 'Courier New', Courier, monospace;
            font-size: 12px;
            line-height: 1.4;
            color: #000;
            background: #fff;
            width: 58mm;
            padding: 3mm;
        }}
        .header {{ text-align: center; margin-bottom: 10px; border-bottom: 1px dashed #000; padding-bottom: 10px; }}
        .store-name {{ font-size: 16px; font-weight: bold; margin-bottom: 5px; }}
        .items-table {{ width: 100%; border-collapse: collapse; margin: 8px 0; }}
        .items-table td {{ padding: 2px 0; vertical-align: top; }}
        .item-qty {{ text-align: center; }}
        .item-price, .item-subtotal {{ text-align: right; }}
        .totals-row {{ display: flex; justify-content: space-between; margin: 3px 0; }}
        .totals-row.total {{ font-weight: bold; font-size: 14px; border-top: 1px solid #000; padding-top: 5px; }}
        .footer {{ text-align: center; margin-top: 15px; font-weight: bold; }}
        .print-button {{ margin-top: 15px; text-align: center; }}
        @media print {{ body {{ padding: 0; }} .print-button {{ display: none; }} }}
    </style>
</head>
<body>
    <div class="header">
        <div class="store-name">{store}</div>
        <div>Struk Transaksi {number}</div>
        <div>Tanggal: {date}</div>
    </div>
    <table class="items-table">
            {rows}
    </table>
    <div class="totals">
        <div class="totals-row total"><span>Total</span><span>{total}</span></div>
        <div class="totals-row"><span>Bayar</span><span>{cash}</span></div>
        <div class="totals-row"><span>Kembali</span><span>{change}</span></div>
    </div>
    <div class="footer">Terima Kasih</div>
    <div class="print-button"><button onclick="window.print()">Print / Save as PDF</button></div>
</body>
</html>"#,
        number = transaction.display_number(),
        store = escape_html(store_name),
        date = display_date(&transaction.created_at),
        rows = rows,
        total = format_currency(transaction.total_amount),
        cash = format_currency(transaction.cash_received),
        change = format_currency(transaction.change_due),
    )
}

/// `Struk_<yyyyMMdd_HHmmss>_<id>.html` dari waktu transaksi.
pub fn receipt_file_name(transaction: &Transaction) -> String {
    let stamp = parse_timestamp(&transaction.created_at)
        .map(|dt| dt.format("%Y%m%d_%H%M%S").to_string())
        .unwrap_or_else(|| chrono::Local::now().format("%Y%m%d_%H%M%S").to_string());
    format!("Struk_{}_{}.html", stamp, transaction.id)
}

/// Tulis struk HTML ke `dir` (dibuat bila belum ada).
pub async fn write_receipt(dir: &Path, transaction: &Transaction, html: &str) -> AppResult<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(receipt_file_name(transaction));
    tokio::fs::write(&path, html).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Transaction, Vec<LineItem>) {
        let items = vec![
            LineItem::new(1, "Indomie <Goreng>", 3500.0, 2),
            LineItem::new(2, "Teh Botol", 5000.0, 1),
        ];
        let transaction = Transaction {
            id: 7,
            created_at: "2024-03-05 14:30:15".into(),
            total_amount: 12_000.0,
            cash_received: 20_000.0,
            change_due: 8_000.0,
            items: serde_json::to_string(&items).unwrap(),
        };
        (transaction, items)
    }

    #[test]
    fn formats_rupiah_with_thousand_dots() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_000), "1.000");
        assert_eq!(format_number(1_234_567), "1.234.567");
        assert_eq!(format_number(-15_000), "-15.000");
        assert_eq!(format_currency(15_000.4), "Rp 15.000");
    }

    #[test]
    fn text_receipt_lists_items_and_totals() {
        let (transaction, items) = sample();
        let text = receipt_text("MINI KASIR", &transaction, &items);

        assert!(text.starts_with("MINI KASIR"));
        assert!(text.contains("No: TRX-007"));
        assert!(text.contains("Tanggal: 05/03/2024 14:30"));
        assert!(text.contains("  2x Rp 3.500 = Rp 7.000"));
        assert!(text.contains("Total: Rp 12.000"));
        assert!(text.contains("Kembali: Rp 8.000"));
        assert!(text.ends_with("Terima Kasih"));
    }

    #[test]
    fn html_receipt_escapes_product_names() {
        let (transaction, items) = sample();
        let html = receipt_html("Toko & Co", &transaction, &items);

        assert!(html.contains("Indomie &lt;Goreng&gt;"));
        assert!(html.contains("Toko &amp; Co"));
        assert!(html.contains("Rp 20.000"));
    }

    #[tokio::test]
    async fn receipt_file_is_named_after_transaction_time() {
        let (transaction, items) = sample();
        assert_eq!(receipt_file_name(&transaction), "Struk_20240305_143015_7.html");

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("receipts");
        let html = receipt_html("MINI KASIR", &transaction, &items);
        let path = write_receipt(&target, &transaction, &html).await.unwrap();

        assert!(path.starts_with(&target));
        assert_eq!(std::fs::read_to_string(path).unwrap(), html);
    }
}
