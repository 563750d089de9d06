use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub stock: i64,
    pub barcode: Option<String>,
    pub image_path: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Payload tambah/edit produk dari form katalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPayload {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub stock: i64,
    pub barcode: Option<String>,
    pub image_path: Option<String>,
    pub description: Option<String>,
}

/// Kategori dengan jumlah produk.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryWithCount {
    pub name: String,
    pub product_count: i64,
}
