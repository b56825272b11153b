//! End-to-end tests for the cart → checkout → sale flow, run against an
//! in-memory database.

use chrono::Utc;
use uuid::Uuid;

use tillpoint_core::{Principal, Product};
use tillpoint_db::{Database, DbConfig};
use tillpoint_service::{CartService, CheckoutEngine, CheckoutRequest, ErrorCode};

struct Harness {
    db: Database,
    carts: CartService,
    engine: CheckoutEngine,
}

async fn harness() -> Harness {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    Harness {
        carts: CartService::new(db.clone()),
        engine: CheckoutEngine::new(db.clone()),
        db,
    }
}

async fn seed_product(db: &Database, name: &str, price_cents: i64, stock: i64) -> Product {
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        sku: format!("SKU-{}", name.replace(' ', "-").to_uppercase()),
        quantity: stock,
        price_cents,
        category: "test".to_string(),
        cover_image: format!("images/{}.jpg", name.replace(' ', "-").to_lowercase()),
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.unwrap();
    product
}

fn checkout_request(
    cart_id: &str,
    method: Option<&str>,
    amount_paid_cents: Option<i64>,
) -> CheckoutRequest {
    CheckoutRequest {
        cart_id: cart_id.to_string(),
        payment_method: method.map(str::to_string),
        amount_paid_cents,
        customer: None,
    }
}

// =============================================================================
// Happy path
// =============================================================================

/// The worked example: one line of 2 × $10.00 at 7.5% tax, paid with $22.00
/// cash. Totals reconcile, change is exact, stock drops, the cart is gone.
#[tokio::test]
async fn cash_checkout_happy_path() {
    let h = harness().await;
    let cashier = Principal::cashier("cashier-1");
    let product = seed_product(&h.db, "Basmati Rice 5kg", 1000, 5).await;

    let view = h.carts.add_item(&cashier, &product.id, Some(2)).await.unwrap();
    let cart_id = view.cart_id.clone().unwrap();
    assert_eq!(view.summary.subtotal_cents, 2000);
    assert_eq!(view.summary.tax_cents, 150);
    assert_eq!(view.summary.total_cents, 2150);

    let outcome = h
        .engine
        .checkout(&cashier, checkout_request(&cart_id, Some("cash"), Some(2200)))
        .await
        .unwrap();

    assert_eq!(outcome.sale.subtotal_cents, 2000);
    assert_eq!(outcome.sale.tax_cents, 150);
    assert_eq!(outcome.sale.total_cents, 2150);
    assert_eq!(outcome.sale.amount_paid_cents, 2200);
    assert_eq!(outcome.sale.change_cents, 50);
    assert_eq!(outcome.sale.customer, "Walk-in customer");
    assert_eq!(outcome.sale.cashier_id, "cashier-1");

    // Receipt mirrors the sale
    assert_eq!(outcome.receipt.sale_id, outcome.sale.id);
    assert_eq!(outcome.receipt.items.len(), 1);
    assert_eq!(outcome.receipt.items[0].quantity, 2);
    assert_eq!(outcome.receipt.change_cents, 50);

    // Stock reduced by exactly the checked-out quantity
    let live = h.db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(live.quantity, 3);

    // Cart is consumed
    assert!(h.db.carts().get_by_id(&cart_id).await.unwrap().is_none());

    // Sale is recorded with its item snapshot
    let items = h.db.sales().get_items(&outcome.sale.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, product.id);
    assert_eq!(items[0].line_total_cents, 2000);
}

#[tokio::test]
async fn non_cash_defaults_amount_paid_to_total() {
    let h = harness().await;
    let product = seed_product(&h.db, "Olive Oil 1L", 750, 12).await;

    // A fresh cashier (and thus a fresh cart) per non-cash method
    for (i, method) in ["card", "mobile money", "bank transfer"].into_iter().enumerate() {
        let cashier = Principal::cashier(format!("cashier-{}", i));
        let view = h.carts.add_item(&cashier, &product.id, Some(2)).await.unwrap();
        let cart_id = view.cart_id.unwrap();

        let outcome = h
            .engine
            .checkout(&cashier, checkout_request(&cart_id, Some(method), None))
            .await
            .unwrap();

        assert_eq!(outcome.sale.amount_paid_cents, outcome.sale.total_cents);
        assert_eq!(outcome.sale.change_cents, 0);
        assert_eq!(outcome.sale.payment_method.as_str(), method);
    }

    // 3 checkouts × 2 units each
    let live = h.db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(live.quantity, 6);
}

#[tokio::test]
async fn checkout_records_custom_customer() {
    let h = harness().await;
    let cashier = Principal::cashier("cashier-1");
    let product = seed_product(&h.db, "Green Tea", 320, 10).await;

    let view = h.carts.add_item(&cashier, &product.id, None).await.unwrap();
    let mut request = checkout_request(&view.cart_id.unwrap(), Some("card"), None);
    request.customer = Some("  Ada Obi  ".to_string());

    let outcome = h.engine.checkout(&cashier, request).await.unwrap();
    assert_eq!(outcome.sale.customer, "Ada Obi");
}

// =============================================================================
// Validation failures (nothing mutated)
// =============================================================================

#[tokio::test]
async fn empty_cart_checkout_fails() {
    let h = harness().await;
    let cart = h.carts.get_or_create_open_cart("cashier-1").await.unwrap();

    let err = h
        .engine
        .checkout(
            &Principal::cashier("cashier-1"),
            checkout_request(&cart.id, Some("cash"), Some(1000)),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidState);
    assert_eq!(err.message, "Cart is empty");
}

#[tokio::test]
async fn missing_cart_checkout_fails() {
    let h = harness().await;

    let err = h
        .engine
        .checkout(
            &Principal::cashier("cashier-1"),
            checkout_request("no-such-cart", Some("cash"), Some(1000)),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn missing_or_unknown_payment_method_fails() {
    let h = harness().await;
    let cashier = Principal::cashier("cashier-1");
    let product = seed_product(&h.db, "Brown Sugar", 450, 9).await;

    let view = h.carts.add_item(&cashier, &product.id, None).await.unwrap();
    let cart_id = view.cart_id.unwrap();

    let err = h
        .engine
        .checkout(&cashier, checkout_request(&cart_id, None, None))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert_eq!(err.message, "Payment method is required");

    let err = h
        .engine
        .checkout(&cashier, checkout_request(&cart_id, Some("cheque"), None))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    // The cart survived both failures untouched
    let cart = h.db.carts().get_by_id(&cart_id).await.unwrap().unwrap();
    assert_eq!(cart.items.len(), 1);
}

#[tokio::test]
async fn insufficient_cash_fails_and_mutates_nothing() {
    let h = harness().await;
    let cashier = Principal::cashier("cashier-1");
    let product = seed_product(&h.db, "Corn Flakes", 1000, 5).await;

    let view = h.carts.add_item(&cashier, &product.id, Some(2)).await.unwrap();
    let cart_id = view.cart_id.unwrap();

    // Total is 2150; 2000 cash is not enough
    let err = h
        .engine
        .checkout(&cashier, checkout_request(&cart_id, Some("cash"), Some(2000)))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ValidationError);
    assert!(err.message.contains("Insufficient cash"));

    // No stock was touched, the cart is still open
    let live = h.db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(live.quantity, 5);
    assert!(h.db.carts().get_by_id(&cart_id).await.unwrap().is_some());
    assert_eq!(h.db.sales().count().await.unwrap(), 0);
}

// =============================================================================
// Stock invariants
// =============================================================================

/// A stock failure on the second line must leave the first line's product
/// untouched as well: the whole decrement phase is one transaction.
#[tokio::test]
async fn insufficient_stock_rolls_back_all_decrements() {
    let h = harness().await;
    let cashier = Principal::cashier("cashier-1");
    let plenty = seed_product(&h.db, "Bottled Water", 100, 50).await;
    let scarce = seed_product(&h.db, "Truffle Jar", 4500, 1).await;

    h.carts.add_item(&cashier, &plenty.id, Some(3)).await.unwrap();
    let view = h.carts.add_item(&cashier, &scarce.id, Some(2)).await.unwrap();
    let cart_id = view.cart_id.unwrap();

    let err = h
        .engine
        .checkout(&cashier, checkout_request(&cart_id, Some("card"), None))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InsufficientStock);
    assert!(err.message.contains("Truffle Jar"));
    assert!(err.message.contains("available 1"));

    // Both products keep their pre-checkout stock
    let plenty_live = h.db.products().get_by_id(&plenty.id).await.unwrap().unwrap();
    let scarce_live = h.db.products().get_by_id(&scarce.id).await.unwrap().unwrap();
    assert_eq!(plenty_live.quantity, 50);
    assert_eq!(scarce_live.quantity, 1);

    // The cart is still open for correction, and no sale was written
    let cart = h.db.carts().get_by_id(&cart_id).await.unwrap().unwrap();
    assert_eq!(cart.items.len(), 2);
    assert_eq!(h.db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn checkout_is_not_idempotent() {
    let h = harness().await;
    let cashier = Principal::cashier("cashier-1");
    let product = seed_product(&h.db, "Espresso Beans", 1200, 10).await;

    let view = h.carts.add_item(&cashier, &product.id, None).await.unwrap();
    let cart_id = view.cart_id.unwrap();

    h.engine
        .checkout(&cashier, checkout_request(&cart_id, Some("card"), None))
        .await
        .unwrap();

    // The cart was consumed; a second attempt cannot find it
    let err = h
        .engine
        .checkout(&cashier, checkout_request(&cart_id, Some("card"), None))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    // Stock was decremented exactly once
    let live = h.db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(live.quantity, 9);
    assert_eq!(h.db.sales().count().await.unwrap(), 1);
}

#[tokio::test]
async fn concurrent_checkouts_of_same_cart_settle_once() {
    let h = harness().await;
    let cashier = Principal::cashier("cashier-1");
    let product = seed_product(&h.db, "Dark Chocolate", 600, 10).await;

    let view = h.carts.add_item(&cashier, &product.id, Some(2)).await.unwrap();
    let cart_id = view.cart_id.unwrap();

    let (a, b) = tokio::join!(
        h.engine
            .checkout(&cashier, checkout_request(&cart_id, Some("card"), None)),
        h.engine
            .checkout(&cashier, checkout_request(&cart_id, Some("card"), None)),
    );

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    // The loser saw the cart as consumed or already claimed
    let loser = if a.is_ok() { b.unwrap_err() } else { a.unwrap_err() };
    assert!(matches!(
        loser.code,
        ErrorCode::NotFound | ErrorCode::InvalidState
    ));

    // One sale, one decrement
    assert_eq!(h.db.sales().count().await.unwrap(), 1);
    let live = h.db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(live.quantity, 8);
}

/// Two cashiers race for the last unit of the same product: exactly one
/// checkout succeeds, the other reports insufficient stock, and the final
/// stock is zero, never negative.
#[tokio::test]
async fn concurrent_checkouts_contend_for_last_unit() {
    let h = harness().await;
    let c1 = Principal::cashier("cashier-1");
    let c2 = Principal::cashier("cashier-2");
    let product = seed_product(&h.db, "Saffron 1g", 9900, 1).await;

    let cart1 = h.carts.add_item(&c1, &product.id, None).await.unwrap().cart_id.unwrap();
    let cart2 = h.carts.add_item(&c2, &product.id, None).await.unwrap().cart_id.unwrap();

    let (a, b) = tokio::join!(
        h.engine
            .checkout(&c1, checkout_request(&cart1, Some("card"), None)),
        h.engine
            .checkout(&c2, checkout_request(&cart2, Some("card"), None)),
    );

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let loser = if a.is_ok() { b.unwrap_err() } else { a.unwrap_err() };
    assert_eq!(loser.code, ErrorCode::InsufficientStock);

    let live = h.db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(live.quantity, 0);
    assert_eq!(h.db.sales().count().await.unwrap(), 1);
}

// =============================================================================
// Snapshots
// =============================================================================

/// Product edits between add-to-cart and checkout must not leak into the
/// cart or the recorded sale.
#[tokio::test]
async fn sale_keeps_price_frozen_at_add_time() {
    let h = harness().await;
    let cashier = Principal::cashier("cashier-1");
    let mut product = seed_product(&h.db, "House Blend Coffee", 500, 10).await;

    let view = h.carts.add_item(&cashier, &product.id, Some(2)).await.unwrap();
    let cart_id = view.cart_id.unwrap();

    // Admin repricing while the cart is open
    product.price_cents = 900;
    h.db.products().update(&product).await.unwrap();

    let outcome = h
        .engine
        .checkout(&cashier, checkout_request(&cart_id, Some("card"), None))
        .await
        .unwrap();

    assert_eq!(outcome.items[0].price_cents, 500);
    assert_eq!(outcome.sale.subtotal_cents, 1000);
}
