//! Order factory: turns the cart plus checkout inputs into an immutable
//! pickup order.
//!
//! Validation is all-or-nothing: every rejection happens before the cart,
//! the order collection, or anything else is touched. On success the order
//! is prepended locally, the cart is cleared, and the push to the backend is
//! fired without blocking (a push failure never rolls the order back).

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::currency;
use crate::error::ShopError;
use crate::models::{screenshot_payload_is_plausible, Order, OrderStatus, PushAction};
use crate::state::{lock, ShopState};
use crate::sync::SyncGateway;

/// Customer inputs collected by the checkout form.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub wechat_name: String,
    pub pickup_date: String,
    pub pickup_time: String,
    /// Inline base64 (or data URL) payment screenshot. Required.
    pub payment_screenshot: String,
}

const PICKUP_CODE_LEN: usize = 6;
const PICKUP_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Fresh order id, unique per process lifetime.
fn new_order_id() -> String {
    format!("ord_{}", Uuid::new_v4().simple())
}

/// Fresh pickup code: 6 uppercase alphanumeric characters. Independent of
/// the order id scheme; collisions are accepted as negligible at shop scale.
fn new_pickup_code() -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(PICKUP_CODE_LEN)
        .map(|b| PICKUP_CODE_ALPHABET[*b as usize % PICKUP_CODE_ALPHABET.len()] as char)
        .collect()
}

fn validate(request: &CheckoutRequest, cart_is_empty: bool) -> Result<(), ShopError> {
    if cart_is_empty {
        return Err(ShopError::validation("cart is empty"));
    }
    if request.wechat_name.trim().is_empty() {
        return Err(ShopError::validation("missing wechat name"));
    }
    if request.pickup_date.trim().is_empty() {
        return Err(ShopError::validation("missing pickup date"));
    }
    if request.pickup_time.trim().is_empty() {
        return Err(ShopError::validation("missing pickup time"));
    }
    if !screenshot_payload_is_plausible(&request.payment_screenshot) {
        return Err(ShopError::validation(
            "missing or unreadable payment screenshot",
        ));
    }
    Ok(())
}

/// Create the order locally: validate, snapshot the cart, freeze the totals
/// and rate, prepend to the order collection, clear the cart.
pub fn place_order(shop: &ShopState, request: &CheckoutRequest) -> Result<Order, ShopError> {
    // Rate first: the settings mutex is not held while the cart is locked.
    let rate = shop.exchange_rate();

    let mut cart = lock(&shop.cart, "cart")?;
    validate(request, cart.is_empty())?;

    let items = cart.snapshot();
    let totals = cart.totals();
    let order = Order {
        id: new_order_id(),
        pickup_code: new_pickup_code(),
        wechat_name: request.wechat_name.trim().to_string(),
        items,
        total_price_jpy: totals.total_jpy,
        total_price_cny: currency::to_cny(totals.total_jpy, rate),
        exchange_rate: rate,
        pickup_date: request.pickup_date.trim().to_string(),
        pickup_time: request.pickup_time.trim().to_string(),
        status: OrderStatus::Pending,
        created_at: Utc::now().timestamp_millis(),
        payment_screenshot: Some(request.payment_screenshot.clone()),
        storage_area: None,
    };
    cart.clear();
    drop(cart);

    lock(&shop.orders, "orders")?.insert(0, order.clone());

    info!(
        order_id = %order.id,
        pickup_code = %order.pickup_code,
        total_jpy = order.total_price_jpy,
        total_cny = order.total_price_cny,
        "order created"
    );
    Ok(order)
}

/// Checkout entry point: local order creation plus the fire-and-forget push
/// to the backend. Must run inside a Tokio runtime (the push is spawned).
pub fn checkout(
    shop: &ShopState,
    gateway: &SyncGateway,
    request: &CheckoutRequest,
) -> Result<Order, ShopError> {
    let order = place_order(shop, request)?;
    gateway.spawn_push(
        shop,
        PushAction::AddOrder {
            order: order.clone(),
        },
    );
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_shop;
    use std::collections::HashSet;

    const SCREENSHOT: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAAB";

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            wechat_name: "wxid_demo".to_string(),
            pickup_date: "2026-08-10".to_string(),
            pickup_time: "14:30".to_string(),
            payment_screenshot: SCREENSHOT.to_string(),
        }
    }

    #[test]
    fn test_rejects_empty_cart() {
        let shop = test_shop();
        let err = place_order(&shop, &request()).unwrap_err();
        assert!(matches!(err, ShopError::Validation(_)));
        assert!(shop.orders_snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_missing_fields_without_touching_cart() {
        let shop = test_shop();
        shop.cart_add("p1").unwrap();
        shop.cart_add("p1").unwrap();
        let before = shop.cart_items().unwrap();

        for broken in [
            CheckoutRequest {
                wechat_name: "  ".to_string(),
                ..request()
            },
            CheckoutRequest {
                pickup_date: String::new(),
                ..request()
            },
            CheckoutRequest {
                pickup_time: String::new(),
                ..request()
            },
            CheckoutRequest {
                payment_screenshot: String::new(),
                ..request()
            },
            CheckoutRequest {
                payment_screenshot: "not base64 at all !!".to_string(),
                ..request()
            },
        ] {
            let err = place_order(&shop, &broken).unwrap_err();
            assert!(matches!(err, ShopError::Validation(_)));
            assert_eq!(
                shop.cart_items().unwrap(),
                before,
                "rejection must leave the cart unmodified"
            );
            assert!(shop.orders_snapshot().unwrap().is_empty());
        }
    }

    #[test]
    fn test_successful_order_freezes_totals_and_clears_cart() {
        let shop = test_shop();
        // 500x2 + 750x1 = 1750 JPY at the default 0.048 rate.
        shop.cart_add("p1").unwrap();
        shop.cart_add("p1").unwrap();
        shop.cart_add("p2").unwrap();

        let order = place_order(&shop, &request()).expect("place order");

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_price_jpy, 1750);
        assert_eq!(order.total_price_cny, 84.0);
        assert_eq!(order.exchange_rate, 0.048);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.wechat_name, "wxid_demo");
        assert!(order.payment_screenshot.is_some());
        assert!(order.created_at > 0);

        assert!(shop.cart_totals().unwrap().item_count == 0);
        let orders = shop.orders_snapshot().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, order.id);
    }

    #[test]
    fn test_order_snapshot_survives_later_cart_mutation() {
        let shop = test_shop();
        shop.cart_add("p1").unwrap();
        let order = place_order(&shop, &request()).unwrap();

        shop.cart_add("p2").unwrap();
        shop.cart_add("p2").unwrap();

        let stored = shop.order_by_id(&order.id).unwrap().unwrap();
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items[0].product.id, "p1");
    }

    #[test]
    fn test_pickup_code_shape() {
        for _ in 0..50 {
            let code = new_pickup_code();
            assert_eq!(code.len(), PICKUP_CODE_LEN);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_order_ids_unique_across_checkouts() {
        let shop = test_shop();
        let mut ids = HashSet::new();
        for _ in 0..20 {
            shop.cart_add("p1").unwrap();
            let order = place_order(&shop, &request()).unwrap();
            assert!(ids.insert(order.id.clone()), "duplicate order id");
        }
    }

    #[tokio::test]
    async fn test_checkout_without_backend_skips_push() {
        let shop = test_shop();
        let gateway = SyncGateway::new();
        shop.cart_add("p1").unwrap();

        let order = checkout(&shop, &gateway, &request()).expect("checkout");
        assert_eq!(shop.orders_snapshot().unwrap()[0].id, order.id);
        // No backend configured: the push is a no-op and nothing is in flight.
        assert!(!gateway.state.is_syncing());
    }
}
