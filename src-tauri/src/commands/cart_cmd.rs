use super::product_cmd::{find_by_barcode, find_product, insert_product, search};
use crate::auth::guard::validate_session;
use crate::cart::CartSnapshot;
use crate::errors::{AppError, AppResult};
use crate::models::product::{Product, ProductPayload};
use crate::models::transaction::LineItem;
use crate::validation::{validate_amount, validate_quantity};
use crate::{log_debug, AppState};

/// Tambah 1 unit produk ke keranjang, harga diambil dari katalog saat ini.
fn add_one(state: &AppState, product: &Product) -> AppResult<CartSnapshot> {
    let snapshot = state.with_cart(|cart| {
        cart.add_item(LineItem::new(product.id, product.name.clone(), product.price, 1));
        cart.snapshot()
    })?;

    log_debug!("CART", "Item added", serde_json::json!({
        "product_id": product.id,
        "total": snapshot.total,
    }));
    Ok(snapshot)
}

pub fn get_cart(state: &AppState, session_token: &str) -> AppResult<CartSnapshot> {
    validate_session(state, session_token)?;
    state.with_cart(|cart| cart.snapshot())
}

pub async fn add_product_to_cart(
    state: &AppState,
    session_token: &str,
    product_id: i64,
) -> AppResult<CartSnapshot> {
    validate_session(state, session_token)?;
    let product = find_product(state, product_id).await?;
    add_one(state, &product)
}

/// Hasil scan barcode. Barcode yang tidak dikenal dikembalikan di error
/// supaya UI bisa menawarkan tambah produk baru.
pub async fn add_product_by_barcode(
    state: &AppState,
    session_token: &str,
    barcode: &str,
) -> AppResult<CartSnapshot> {
    validate_session(state, session_token)?;
    let product = find_by_barcode(state, barcode)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Barcode {}", barcode.trim())))?;
    add_one(state, &product)
}

/// Tambah hasil pencarian pertama (nama atau kategori).
pub async fn search_and_add(state: &AppState, session_token: &str, query: &str) -> AppResult<CartSnapshot> {
    validate_session(state, session_token)?;
    if query.trim().is_empty() {
        return Err(AppError::Validation("Kata kunci tidak boleh kosong".into()));
    }

    let product = search(state, query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Produk '{}'", query.trim())))?;
    add_one(state, &product)
}

/// Produk baru dari barcode yang belum terdaftar, langsung masuk keranjang.
pub async fn create_product_and_add_to_cart(
    state: &AppState,
    session_token: &str,
    payload: ProductPayload,
) -> AppResult<CartSnapshot> {
    validate_session(state, session_token)?;
    let product = insert_product(state, &payload).await?;
    add_one(state, &product)
}

pub fn update_cart_quantity(
    state: &AppState,
    session_token: &str,
    product_id: i64,
    quantity: i64,
) -> AppResult<CartSnapshot> {
    validate_session(state, session_token)?;
    if quantity > 0 {
        validate_quantity(quantity, Some(1), None).map_err(AppError::Validation)?;
    }
    state.with_cart(|cart| {
        cart.update_quantity(product_id, quantity);
        cart.snapshot()
    })
}

pub fn remove_from_cart(state: &AppState, session_token: &str, product_id: i64) -> AppResult<CartSnapshot> {
    validate_session(state, session_token)?;
    state.with_cart(|cart| {
        cart.remove_item(product_id);
        cart.snapshot()
    })
}

pub fn set_cash_received(state: &AppState, session_token: &str, amount: f64) -> AppResult<CartSnapshot> {
    validate_session(state, session_token)?;
    validate_amount(amount, Some(0.0), None).map_err(AppError::Validation)?;
    state.with_cart(|cart| {
        cart.set_cash_received(amount);
        cart.snapshot()
    })
}

pub fn clear_cart(state: &AppState, session_token: &str) -> AppResult<CartSnapshot> {
    validate_session(state, session_token)?;
    state.with_cart(|cart| {
        cart.clear();
        cart.snapshot()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::product_cmd::{create_product, tests::payload};
    use crate::test_support::logged_in_state;

    #[tokio::test]
    async fn scanning_same_barcode_twice_merges_line() {
        let (state, token, _dir) = logged_in_state().await;
        create_product(&state, &token, payload("Indomie", 3500.0, 20, Some("899"))).await.unwrap();

        add_product_by_barcode(&state, &token, "899").await.unwrap();
        let cart = add_product_by_barcode(&state, &token, " 899 ").await.unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
        assert_eq!(cart.total, 7000.0);
    }

    #[tokio::test]
    async fn unknown_barcode_reports_the_barcode() {
        let (state, token, _dir) = logged_in_state().await;
        match add_product_by_barcode(&state, &token, "404404").await {
            Err(AppError::NotFound(msg)) => assert!(msg.contains("404404")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_barcode_can_be_registered_and_added() {
        let (state, token, _dir) = logged_in_state().await;
        let cart = create_product_and_add_to_cart(&state, &token, payload("Kerupuk", 2000.0, 10, Some("777")))
            .await
            .unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].product_name, "Kerupuk");
        assert!(find_by_barcode(&state, "777").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn search_and_add_takes_first_match() {
        let (state, token, _dir) = logged_in_state().await;
        create_product(&state, &token, payload("Teh Manis", 4000.0, 5, None)).await.unwrap();
        create_product(&state, &token, payload("Teh Botol", 5000.0, 5, None)).await.unwrap();

        let cart = search_and_add(&state, &token, "teh").await.unwrap();
        assert_eq!(cart.items[0].product_name, "Teh Botol");
        assert!(matches!(
            search_and_add(&state, &token, "sabun").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn quantity_cash_and_clear() {
        let (state, token, _dir) = logged_in_state().await;
        let p = create_product(&state, &token, payload("Roti", 8000.0, 10, None)).await.unwrap();
        add_product_to_cart(&state, &token, p.id).await.unwrap();

        let cart = update_cart_quantity(&state, &token, p.id, 3).unwrap();
        assert_eq!(cart.total, 24_000.0);

        let cart = set_cash_received(&state, &token, 30_000.0).unwrap();
        assert_eq!(cart.change, 6_000.0);
        assert!(cart.can_checkout);
        assert!(set_cash_received(&state, &token, -1.0).is_err());

        let cart = update_cart_quantity(&state, &token, p.id, 0).unwrap();
        assert!(cart.items.is_empty());

        add_product_to_cart(&state, &token, p.id).await.unwrap();
        let cart = clear_cart(&state, &token).unwrap();
        assert_eq!(cart.total, 0.0);
        assert_eq!(cart.cash_received, 0.0);
    }

    #[tokio::test]
    async fn cart_requires_session() {
        let (state, _token, _dir) = logged_in_state().await;
        assert!(matches!(get_cart(&state, "bogus"), Err(AppError::Auth(_))));
    }
}
