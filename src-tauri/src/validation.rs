//! Input validation and sanitization
//!
//! Centralized checks for catalog input, money, quantities, credentials and
//! file paths. Messages are shown to the cashier as-is.

use crate::models::product::ProductPayload;
use crate::receipt::format_currency;

/// Validation result type
pub type ValidationResult = Result<(), String>;

/// Validate a username
/// - Length: 3-50 characters
/// - Allowed: alphanumeric, underscore, hyphen
/// - Must start with letter
pub fn validate_username(username: &str) -> ValidationResult {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err("Username tidak boleh kosong".into());
    }

    if trimmed.len() < 3 || trimmed.len() > 50 {
        return Err("Username harus 3-50 karakter".into());
    }

    if !trimmed.chars().next().is_some_and(|c| c.is_alphabetic()) {
        return Err("Username harus dimulai dengan huruf".into());
    }

    if !trimmed.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err("Username hanya boleh berisi huruf, angka, underscore, dan hyphen".into());
    }

    Ok(())
}

/// Validate a new password against the configured minimum length
pub fn validate_password(password: &str, min_length: usize) -> ValidationResult {
    if password.is_empty() {
        return Err("Password tidak boleh kosong".into());
    }

    if password.chars().count() < min_length {
        return Err(format!("Password minimal {} karakter", min_length));
    }

    if password.len() > 72 {
        // bcrypt hanya memakai 72 byte pertama
        return Err("Password maksimal 72 karakter".into());
    }

    Ok(())
}

/// Validate monetary amount
pub fn validate_amount(amount: f64, min: Option<f64>, max: Option<f64>) -> ValidationResult {
    if amount.is_nan() || amount.is_infinite() {
        return Err("Jumlah tidak valid".into());
    }

    let min_val = min.unwrap_or(0.0);
    let max_val = max.unwrap_or(1_000_000_000.0);

    if amount < min_val {
        return Err(format!("Jumlah minimal {}", format_currency(min_val)));
    }

    if amount > max_val {
        return Err(format!("Jumlah maksimal {}", format_currency(max_val)));
    }

    Ok(())
}

/// Validate quantity (stock, cart quantity)
pub fn validate_quantity(qty: i64, min: Option<i64>, max: Option<i64>) -> ValidationResult {
    if qty < 0 {
        return Err("Jumlah tidak boleh negatif".into());
    }

    let min_val = min.unwrap_or(0);
    let max_val = max.unwrap_or(1_000_000);

    if qty < min_val {
        return Err(format!("Jumlah minimal {}", min_val));
    }

    if qty > max_val {
        return Err(format!("Jumlah maksimal {}", max_val));
    }

    Ok(())
}

pub fn validate_product_name(name: &str) -> ValidationResult {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err("Nama produk tidak boleh kosong".into());
    }

    if trimmed.chars().count() > 200 {
        return Err("Nama produk maksimal 200 karakter".into());
    }

    Ok(())
}

pub fn validate_category(category: &str) -> ValidationResult {
    let trimmed = category.trim();

    if trimmed.is_empty() {
        return Err("Kategori tidak boleh kosong".into());
    }

    if trimmed.chars().count() > 100 {
        return Err("Kategori maksimal 100 karakter".into());
    }

    Ok(())
}

/// Validate barcode (optional; empty means "no barcode")
pub fn validate_barcode(barcode: &str) -> ValidationResult {
    let trimmed = barcode.trim();

    if trimmed.is_empty() {
        return Ok(());
    }

    if trimmed.len() > 50 {
        return Err("Barcode terlalu panjang (max 50 karakter)".into());
    }

    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err("Barcode hanya boleh berisi huruf, angka, dan hyphen".into());
    }

    Ok(())
}

/// Validate file path (security check)
pub fn validate_file_path(path: &str) -> ValidationResult {
    if path.is_empty() {
        return Err("Path file tidak boleh kosong".into());
    }

    if path.contains("..") || path.contains('\0') {
        return Err("Path file tidak valid".into());
    }

    Ok(())
}

/// Remove control characters from free text
pub fn sanitize_string(input: &str) -> String {
    input.chars().filter(|c| !c.is_control()).collect()
}

/// Trim an optional text field; blank becomes `None`
pub fn normalize_optional(input: Option<&str>) -> Option<String> {
    input
        .map(|s| sanitize_string(s.trim()))
        .filter(|s| !s.is_empty())
}

/// Combined validation for creating or editing a product
pub fn validate_product(payload: &ProductPayload) -> ValidationResult {
    validate_product_name(&payload.name)?;
    validate_category(&payload.category)?;
    validate_amount(payload.price, Some(0.0), None)?;
    validate_quantity(payload.stock, None, None)?;

    if let Some(ref barcode) = payload.barcode {
        validate_barcode(barcode)?;
    }

    if let Some(ref description) = payload.description {
        if description.chars().count() > 1000 {
            return Err("Deskripsi terlalu panjang (max 1000 karakter)".into());
        }
    }

    Ok(())
}
