//! In-memory keranjang belanja untuk satu kasir.
//!
//! Semua perhitungan checkout ada di sini: penggabungan item, total, uang
//! diterima dan kembalian. Penyimpanan dan pengurangan stok ada di
//! `commands::transaction_cmd`.

use serde::{Deserialize, Serialize};

use crate::models::transaction::LineItem;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<LineItem>,
    cash_received: f64,
}

/// Tampilan keranjang untuk UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub items: Vec<LineItem>,
    pub item_count: i64,
    pub total: f64,
    pub cash_received: f64,
    pub change: f64,
    pub can_checkout: bool,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tambah item. Produk yang sudah ada digabung: quantity dijumlah dan
    /// subtotal dihitung ulang dari harga satuan baris yang sudah ada.
    pub fn add_item(&mut self, item: LineItem) {
        match self.items.iter_mut().find(|i| i.product_id == item.product_id) {
            Some(existing) => {
                existing.quantity += item.quantity;
                existing.subtotal = existing.unit_price * existing.quantity as f64;
            }
            None => self.items.push(item),
        }
    }

    pub fn remove_item(&mut self, product_id: i64) -> Option<LineItem> {
        let index = self.items.iter().position(|i| i.product_id == product_id)?;
        Some(self.items.remove(index))
    }

    /// Quantity <= 0 menghapus baris. Produk yang tidak ada di keranjang diabaikan.
    pub fn update_quantity(&mut self, product_id: i64, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = quantity;
            item.subtotal = item.unit_price * quantity as f64;
        }
    }

    pub fn set_cash_received(&mut self, amount: f64) {
        self.cash_received = amount;
    }

    pub fn cash_received(&self) -> f64 {
        self.cash_received
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(|i| i.subtotal).sum()
    }

    /// Kembalian, tidak pernah negatif.
    pub fn change(&self) -> f64 {
        (self.cash_received - self.total()).max(0.0)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn can_checkout(&self) -> bool {
        !self.is_empty() && self.cash_received >= self.total()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.cash_received = 0.0;
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            item_count: self.item_count(),
            total: self.total(),
            cash_received: self.cash_received,
            change: self.change(),
            can_checkout: self.can_checkout(),
        }
    }
}
