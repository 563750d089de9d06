use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Autentikasi gagal: {0}")]
    Auth(String),

    #[error("Data tidak ditemukan: {0}")]
    NotFound(String),

    #[error("Validasi gagal: {0}")]
    Validation(String),

    #[error("Keranjang kosong")]
    EmptyCart,

    #[error("Uang tidak mencukupi: total {total}, diterima {received}")]
    InsufficientPayment { total: f64, received: f64 },

    #[error("Stok {0} tidak mencukupi")]
    InsufficientStock(String),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format data tidak valid: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}

impl AppError {
    /// Unique-constraint violation dari SQLite (mis. barcode ganda).
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, AppError::Database(sqlx::Error::Database(err)) if err.is_unique_violation())
    }
}
