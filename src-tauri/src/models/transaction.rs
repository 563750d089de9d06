use serde::{Deserialize, Serialize};

/// Transaksi tersimpan. `items` adalah JSON array dari [`LineItem`];
/// baris ini tidak pernah diubah setelah checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: i64,
    pub created_at: String,
    pub total_amount: f64,
    pub cash_received: f64,
    pub change_due: f64,
    pub items: String,
}

impl Transaction {
    /// Decode the stored line items
    pub fn line_items(&self) -> Result<Vec<LineItem>, serde_json::Error> {
        serde_json::from_str(&self.items)
    }

    /// Receipt-style number, e.g. `TRX-007`
    pub fn display_number(&self) -> String {
        format!("TRX-{:03}", self.id)
    }
}

/// Satu baris keranjang / struk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub subtotal: f64,
}

impl LineItem {
    pub fn new(product_id: i64, product_name: impl Into<String>, unit_price: f64, quantity: i64) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            unit_price,
            quantity,
            subtotal: unit_price * quantity as f64,
        }
    }
}

/// Detail lengkap satu transaksi (untuk frontend).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub transaction: Transaction,
    pub items: Vec<LineItem>,
}

/// Hasil export struk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptExport {
    pub file_path: String,
    pub text: String,
}
