use rand::Rng;
use std::path::Path;

use super::notification_cmd::notify;
use super::settings_cmd::low_stock_threshold;
use crate::auth::guard::validate_session;
use crate::database::now_timestamp;
use crate::errors::{AppError, AppResult};
use crate::models::notification::NotificationKind;
use crate::models::product::{CategoryWithCount, Product, ProductPayload};
use crate::validation::{normalize_optional, validate_file_path, validate_product};
use crate::{log_error, log_info, AppState};

const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_BARCODE_ATTEMPTS: usize = 100;

/// Payload setelah validasi: teks di-trim, field opsional kosong jadi NULL.
fn clean_payload(payload: &ProductPayload) -> AppResult<ProductPayload> {
    validate_product(payload).map_err(AppError::Validation)?;
    Ok(ProductPayload {
        name: payload.name.trim().to_string(),
        category: payload.category.trim().to_string(),
        price: payload.price,
        stock: payload.stock,
        barcode: normalize_optional(payload.barcode.as_deref()),
        image_path: normalize_optional(payload.image_path.as_deref()),
        description: normalize_optional(payload.description.as_deref()),
    })
}

fn map_unique_barcode(err: sqlx::Error) -> AppError {
    let err = AppError::from(err);
    if err.is_unique_violation() {
        AppError::Validation("Barcode sudah digunakan produk lain".into())
    } else {
        err
    }
}

pub(crate) async fn find_product(state: &AppState, id: i64) -> AppResult<Product> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Produk ID {}", id)))
}

pub(crate) async fn find_by_barcode(state: &AppState, barcode: &str) -> AppResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE barcode = ?")
        .bind(barcode.trim())
        .fetch_optional(&state.db)
        .await?;
    Ok(product)
}

pub(crate) async fn search(state: &AppState, query: &str) -> AppResult<Vec<Product>> {
    let term = format!("%{}%", query.trim().to_lowercase());
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products
         WHERE LOWER(name) LIKE ? OR LOWER(category) LIKE ?
         ORDER BY name ASC",
    )
    .bind(&term)
    .bind(&term)
    .fetch_all(&state.db)
    .await?;
    Ok(products)
}

/// Insert tanpa cek session, dipakai juga oleh keranjang (produk baru dari scan).
pub(crate) async fn insert_product(state: &AppState, payload: &ProductPayload) -> AppResult<Product> {
    let payload = clean_payload(payload)?;
    let now = now_timestamp();

    let id = sqlx::query(
        "INSERT INTO products (name, category, price, stock, barcode, image_path, description, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.name)
    .bind(&payload.category)
    .bind(payload.price)
    .bind(payload.stock)
    .bind(&payload.barcode)
    .bind(&payload.image_path)
    .bind(&payload.description)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(map_unique_barcode)?
    .last_insert_rowid();

    // Produk sudah tersimpan; kegagalan notifikasi cukup dicatat
    if let Err(e) = notify(
        &state.db,
        NotificationKind::ProductAdded,
        "Produk Baru Ditambahkan",
        &format!("{} berhasil ditambahkan ke katalog", payload.name),
    )
    .await
    {
        log_error!("PRODUCT", "Failed to post notification", e.to_string());
    }

    log_info!("PRODUCT", "Product created", serde_json::json!({
        "id": id,
        "name": payload.name,
    }));

    find_product(state, id).await
}

/// Ambil semua produk, urut nama.
pub async fn get_products(state: &AppState, session_token: &str) -> AppResult<Vec<Product>> {
    validate_session(state, session_token)?;

    let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name ASC")
        .fetch_all(&state.db)
        .await?;
    Ok(products)
}

pub async fn get_product(state: &AppState, session_token: &str, id: i64) -> AppResult<Product> {
    validate_session(state, session_token)?;
    find_product(state, id).await
}

/// Ambil 1 produk via barcode untuk kasir.
pub async fn get_product_by_barcode(
    state: &AppState,
    session_token: &str,
    barcode: &str,
) -> AppResult<Product> {
    validate_session(state, session_token)?;
    find_by_barcode(state, barcode)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Barcode {}", barcode.trim())))
}

/// Cari produk berdasarkan nama atau kategori (case-insensitive).
pub async fn search_products(state: &AppState, session_token: &str, query: &str) -> AppResult<Vec<Product>> {
    validate_session(state, session_token)?;
    search(state, query).await
}

/// Produk dengan stok <= threshold. Tanpa threshold dipakai pengaturan toko.
pub async fn get_low_stock_products(
    state: &AppState,
    session_token: &str,
    threshold: Option<i64>,
) -> AppResult<Vec<Product>> {
    validate_session(state, session_token)?;

    let threshold = match threshold {
        Some(t) => t,
        None => low_stock_threshold(&state.db).await?,
    };
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE stock <= ? ORDER BY stock ASC, name ASC",
    )
    .bind(threshold)
    .fetch_all(&state.db)
    .await?;
    Ok(products)
}

pub async fn count_products(state: &AppState, session_token: &str) -> AppResult<i64> {
    validate_session(state, session_token)?;

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(&state.db)
        .await?;
    Ok(count.0)
}

/// Daftar kategori + jumlah produk.
pub async fn get_categories(state: &AppState, session_token: &str) -> AppResult<Vec<CategoryWithCount>> {
    validate_session(state, session_token)?;

    let categories = sqlx::query_as::<_, CategoryWithCount>(
        "SELECT category AS name, COUNT(*) AS product_count
         FROM products
         GROUP BY category
         ORDER BY category ASC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(categories)
}

pub async fn create_product(
    state: &AppState,
    session_token: &str,
    payload: ProductPayload,
) -> AppResult<Product> {
    validate_session(state, session_token)?;
    insert_product(state, &payload).await
}

pub async fn update_product(
    state: &AppState,
    session_token: &str,
    id: i64,
    payload: ProductPayload,
) -> AppResult<Product> {
    validate_session(state, session_token)?;
    let payload = clean_payload(&payload)?;

    let res = sqlx::query(
        "UPDATE products
         SET name = ?, category = ?, price = ?, stock = ?, barcode = ?, image_path = ?, description = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&payload.name)
    .bind(&payload.category)
    .bind(payload.price)
    .bind(payload.stock)
    .bind(&payload.barcode)
    .bind(&payload.image_path)
    .bind(&payload.description)
    .bind(now_timestamp())
    .bind(id)
    .execute(&state.db)
    .await
    .map_err(map_unique_barcode)?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Produk ID {}", id)));
    }

    log_info!("PRODUCT", "Product updated", serde_json::json!({ "id": id, "name": payload.name }));
    find_product(state, id).await
}

/// Hapus produk permanen. Riwayat transaksi tetap utuh karena item disimpan sebagai JSON.
pub async fn delete_product(state: &AppState, session_token: &str, id: i64) -> AppResult<()> {
    validate_session(state, session_token)?;

    let res = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Produk ID {}", id)));
    }

    state.with_cart(|cart| cart.remove_item(id))?;

    log_info!("PRODUCT", "Product deleted", serde_json::json!({ "id": id }));
    Ok(())
}

pub async fn delete_all_products(state: &AppState, session_token: &str) -> AppResult<u64> {
    validate_session(state, session_token)?;

    let deleted = sqlx::query("DELETE FROM products").execute(&state.db).await?.rows_affected();
    state.with_cart(|cart| cart.clear())?;

    log_info!("PRODUCT", "All products deleted", serde_json::json!({ "deleted": deleted }));
    Ok(deleted)
}

/// Tambah/kurangi stok. Stok akhir tidak boleh negatif.
pub async fn adjust_stock(state: &AppState, session_token: &str, id: i64, delta: i64) -> AppResult<i64> {
    validate_session(state, session_token)?;

    if delta == 0 {
        return Err(AppError::Validation("Nilai penyesuaian harus selain 0".into()));
    }

    let product = find_product(state, id).await?;
    let new_stock = product.stock + delta;
    if new_stock < 0 {
        return Err(AppError::InsufficientStock(product.name));
    }

    // Kondisi stok lama mencegah lost update bila ada checkout di antaranya
    let res = sqlx::query("UPDATE products SET stock = ?, updated_at = ? WHERE id = ? AND stock = ?")
        .bind(new_stock)
        .bind(now_timestamp())
        .bind(id)
        .bind(product.stock)
        .execute(&state.db)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::Internal("Stok berubah, silakan coba lagi".into()));
    }

    log_info!("PRODUCT", "Stock adjusted", serde_json::json!({
        "id": id,
        "delta": delta,
        "stock": new_stock,
    }));
    Ok(new_stock)
}

/// Generate barcode EAN-13 unik.
/// Format: 200 (in-store prefix) + product_id (7 digit) + acak (2 digit) + check digit
pub async fn generate_barcode(state: &AppState, session_token: &str, id: i64) -> AppResult<String> {
    validate_session(state, session_token)?;
    find_product(state, id).await?;

    let mut barcode = None;
    for _ in 0..MAX_BARCODE_ATTEMPTS {
        let base = format!("200{:07}{:02}", id % 10_000_000, rand::thread_rng().gen_range(0..100));
        let candidate = format!("{}{}", base, ean13_check_digit(&base));

        let dup: Option<(i64,)> = sqlx::query_as("SELECT id FROM products WHERE barcode = ? AND id != ?")
            .bind(&candidate)
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
        if dup.is_none() {
            barcode = Some(candidate);
            break;
        }
    }
    let barcode = barcode
        .ok_or_else(|| AppError::Internal("Gagal membuat barcode unik, silakan coba lagi".into()))?;

    sqlx::query("UPDATE products SET barcode = ?, updated_at = ? WHERE id = ?")
        .bind(&barcode)
        .bind(now_timestamp())
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(barcode)
}

/// Hitung check digit EAN-13 dari 12 digit pertama
fn ean13_check_digit(digits: &str) -> u32 {
    let sum: u32 = digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d } else { d * 3 })
        .sum();
    (10 - (sum % 10)) % 10
}

/// Copy gambar produk ke `<data_dir>/products/` dan simpan path-nya.
pub async fn save_product_image(
    state: &AppState,
    session_token: &str,
    id: i64,
    file_path: &str,
) -> AppResult<String> {
    validate_session(state, session_token)?;
    find_product(state, id).await?;
    validate_file_path(file_path).map_err(AppError::Validation)?;

    let source = Path::new(file_path);
    if !source.is_file() {
        return Err(AppError::NotFound(format!("File {}", file_path)));
    }

    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "webp") {
        return Err(AppError::Validation("Format file harus PNG, JPG, atau WEBP".into()));
    }

    if tokio::fs::metadata(source).await?.len() > MAX_IMAGE_BYTES {
        return Err(AppError::Validation("Ukuran file maksimal 5MB".into()));
    }

    let img_dir = state.data_dir.join("products");
    tokio::fs::create_dir_all(&img_dir).await?;
    let dest_path = img_dir.join(format!("{}.{}", id, ext));
    tokio::fs::copy(source, &dest_path).await?;

    let dest_str = dest_path.to_string_lossy().to_string();
    sqlx::query("UPDATE products SET image_path = ?, updated_at = ? WHERE id = ?")
        .bind(&dest_str)
        .bind(now_timestamp())
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(dest_str)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::test_support::logged_in_state;

    pub(crate) fn payload(name: &str, price: f64, stock: i64, barcode: Option<&str>) -> ProductPayload {
        ProductPayload {
            name: name.into(),
            category: "Makanan".into(),
            price,
            stock,
            barcode: barcode.map(String::from),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_product_posts_notification() {
        let (state, token, _dir) = logged_in_state().await;
        let product = create_product(&state, &token, payload("Indomie", 3500.0, 20, Some("8991002101")))
            .await
            .unwrap();

        assert_eq!(product.name, "Indomie");
        assert_eq!(product.barcode.as_deref(), Some("8991002101"));

        let (kind,): (String,) = sqlx::query_as("SELECT kind FROM notifications")
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert_eq!(kind, "PRODUCT_ADDED");
    }

    #[tokio::test]
    async fn invalid_payload_is_rejected() {
        let (state, token, _dir) = logged_in_state().await;

        for bad in [
            payload("", 1000.0, 1, None),
            payload("Teh", -1.0, 1, None),
            payload("Teh", 1000.0, -5, None),
            payload("Teh", 1000.0, 1, Some("abc def")),
        ] {
            assert!(matches!(
                create_product(&state, &token, bad).await,
                Err(AppError::Validation(_))
            ));
        }
        assert_eq!(count_products(&state, &token).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_barcode_is_rejected() {
        let (state, token, _dir) = logged_in_state().await;
        create_product(&state, &token, payload("Teh", 3000.0, 5, Some("111"))).await.unwrap();

        let err = create_product(&state, &token, payload("Kopi", 4000.0, 5, Some("111")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Tanpa barcode boleh lebih dari satu
        create_product(&state, &token, payload("Gula", 15000.0, 5, None)).await.unwrap();
        create_product(&state, &token, payload("Garam", 5000.0, 5, Some("  "))).await.unwrap();
    }

    #[tokio::test]
    async fn lookup_and_search() {
        let (state, token, _dir) = logged_in_state().await;
        create_product(&state, &token, payload("Indomie Goreng", 3500.0, 20, Some("123"))).await.unwrap();
        let mut minuman = payload("Teh Botol", 5000.0, 3, None);
        minuman.category = "Minuman".into();
        create_product(&state, &token, minuman).await.unwrap();

        assert_eq!(
            get_product_by_barcode(&state, &token, "123").await.unwrap().name,
            "Indomie Goreng"
        );
        assert!(matches!(
            get_product_by_barcode(&state, &token, "999").await,
            Err(AppError::NotFound(_))
        ));

        assert_eq!(search_products(&state, &token, "INDO").await.unwrap().len(), 1);
        assert_eq!(search_products(&state, &token, "minum").await.unwrap().len(), 1);

        let low = get_low_stock_products(&state, &token, None).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Teh Botol");

        let categories = get_categories(&state, &token).await.unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].name, "Makanan");
    }

    #[tokio::test]
    async fn update_and_delete() {
        let (state, token, _dir) = logged_in_state().await;
        let p = create_product(&state, &token, payload("Roti", 8000.0, 4, None)).await.unwrap();

        let mut changed = payload("Roti Tawar", 9000.0, 6, None);
        changed.description = Some("Roti gandum".into());
        let updated = update_product(&state, &token, p.id, changed).await.unwrap();
        assert_eq!(updated.name, "Roti Tawar");
        assert_eq!(updated.price, 9000.0);
        assert_eq!(updated.description.as_deref(), Some("Roti gandum"));

        delete_product(&state, &token, p.id).await.unwrap();
        assert!(matches!(get_product(&state, &token, p.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            update_product(&state, &token, p.id, payload("X", 1.0, 1, None)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn adjust_stock_never_goes_negative() {
        let (state, token, _dir) = logged_in_state().await;
        let p = create_product(&state, &token, payload("Susu", 6000.0, 3, None)).await.unwrap();

        assert_eq!(adjust_stock(&state, &token, p.id, 7).await.unwrap(), 10);
        assert_eq!(adjust_stock(&state, &token, p.id, -4).await.unwrap(), 6);
        assert!(matches!(
            adjust_stock(&state, &token, p.id, -7).await,
            Err(AppError::InsufficientStock(_))
        ));
        assert_eq!(get_product(&state, &token, p.id).await.unwrap().stock, 6);
    }

    #[tokio::test]
    async fn generated_barcode_is_valid_ean13() {
        let (state, token, _dir) = logged_in_state().await;
        let p = create_product(&state, &token, payload("Kopi", 2000.0, 10, None)).await.unwrap();

        let barcode = generate_barcode(&state, &token, p.id).await.unwrap();
        assert_eq!(barcode.len(), 13);
        assert!(barcode.starts_with("200"));
        assert_eq!(
            ean13_check_digit(&barcode[..12]),
            barcode[12..].parse::<u32>().unwrap()
        );
        assert_eq!(get_product(&state, &token, p.id).await.unwrap().barcode, Some(barcode));
    }

    #[test]
    fn ean13_check_digit_matches_known_code() {
        // 4006381333931 adalah EAN-13 valid
        assert_eq!(ean13_check_digit("400638133393"), 1);
    }

    #[tokio::test]
    async fn save_product_image_copies_into_data_dir() {
        let (state, token, dir) = logged_in_state().await;
        let p = create_product(&state, &token, payload("Kopi", 2000.0, 10, None)).await.unwrap();

        let src = dir.path().join("foto.PNG");
        std::fs::write(&src, b"fake png").unwrap();
        let saved = save_product_image(&state, &token, p.id, src.to_str().unwrap()).await.unwrap();

        assert!(saved.ends_with(&format!("{}.png", p.id)));
        assert!(Path::new(&saved).exists());

        let txt = dir.path().join("catatan.txt");
        std::fs::write(&txt, b"x").unwrap();
        assert!(matches!(
            save_product_image(&state, &token, p.id, txt.to_str().unwrap()).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn generate_barcode_gives_up_when_candidates_are_taken() {
        let (state, token, _dir) = logged_in_state().await;
        let p = create_product(&state, &token, payload("Gula", 15000.0, 5, None)).await.unwrap();

        for n in 0..100 {
            let base = format!("200{:07}{:02}", p.id, n);
            let taken = format!("{}{}", base, ean13_check_digit(&base));
            sqlx::query("INSERT INTO products (name, category, price, stock, barcode) VALUES (?, 'Lainnya', 1000, 1, ?)")
                .bind(format!("Produk {}", n))
                .bind(taken)
                .execute(&state.db)
                .await
                .unwrap();
        }

        assert!(matches!(
            generate_barcode(&state, &token, p.id).await,
            Err(AppError::Internal(_))
        ));
        assert_eq!(get_product(&state, &token, p.id).await.unwrap().barcode, None);
    }

    #[tokio::test]
    async fn product_is_created_even_if_notification_fails() {
        let (state, token, _dir) = logged_in_state().await;
        sqlx::query("DROP TABLE notifications").execute(&state.db).await.unwrap();

        let p = create_product(&state, &token, payload("Beras", 12000.0, 30, None)).await.unwrap();
        assert_eq!(get_product(&state, &token, p.id).await.unwrap().name, "Beras");
        assert_eq!(count_products(&state, &token).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_all_products_empties_catalog_and_cart() {
        let (state, token, _dir) = logged_in_state().await;
        let a = create_product(&state, &token, payload("Sabun", 4000.0, 10, None)).await.unwrap();
        create_product(&state, &token, payload("Sampo", 9000.0, 10, None)).await.unwrap();
        crate::commands::cart_cmd::add_product_to_cart(&state, &token, a.id).await.unwrap();

        assert_eq!(delete_all_products(&state, &token).await.unwrap(), 2);
        assert!(get_products(&state, &token).await.unwrap().is_empty());
        assert!(state.with_cart(|c| c.is_empty()).unwrap());
    }
}
