//! Admin controller: order status transitions, product CRUD, and settings
//! updates.
//!
//! Every operation applies locally first (optimistic), then mirrors the
//! change to the backend fire-and-forget. There is no verification that the
//! remote acknowledged anything.

use chrono::Utc;
use tracing::info;

use crate::error::ShopError;
use crate::models::{Order, OrderStatus, OrderUpdate, Product, PushAction};
use crate::settings::{parse_exchange_rate, Settings};
use crate::state::{lock, ShopState};
use crate::sync::SyncGateway;

/// Explicit user decision for destructive actions. Declining aborts with no
/// side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

// ---------------------------------------------------------------------------
// Order status
// ---------------------------------------------------------------------------

/// Apply a partial update to an order, validating any status transition.
/// Only the named fields change; items, totals, and timestamps are left
/// untouched.
fn apply_order_update(
    shop: &ShopState,
    order_id: &str,
    update: &OrderUpdate,
) -> Result<Order, ShopError> {
    let mut orders = lock(&shop.orders, "orders")?;
    let order = orders
        .iter_mut()
        .find(|o| o.id == order_id)
        .ok_or_else(|| ShopError::validation(format!("order not found: {order_id}")))?;

    if let Some(next) = update.status {
        if !order.status.can_become(next) {
            return Err(ShopError::validation(format!(
                "illegal status transition {:?} -> {:?}",
                order.status, next
            )));
        }
        order.status = next;
    }
    if let Some(area) = &update.storage_area {
        order.storage_area = Some(area.clone());
    }
    Ok(order.clone())
}

fn push_order_update(
    shop: &ShopState,
    gateway: &SyncGateway,
    order_id: &str,
    update: OrderUpdate,
) {
    gateway.spawn_push(
        shop,
        PushAction::UpdateOrder {
            order_id: order_id.to_string(),
            updates: update,
        },
    );
}

/// Move an order to `status` (forward transitions only), then mirror the
/// change to the backend.
pub fn update_order_status(
    shop: &ShopState,
    gateway: &SyncGateway,
    order_id: &str,
    status: OrderStatus,
) -> Result<Order, ShopError> {
    let update = OrderUpdate {
        status: Some(status),
        storage_area: None,
    };
    let order = apply_order_update(shop, order_id, &update)?;
    info!(order_id = %order.id, status = ?status, "order status updated");
    push_order_update(shop, gateway, order_id, update);
    Ok(order)
}

/// Cancel an order. Legal from any non-terminal state.
pub fn cancel_order(
    shop: &ShopState,
    gateway: &SyncGateway,
    order_id: &str,
) -> Result<Order, ShopError> {
    update_order_status(shop, gateway, order_id, OrderStatus::Cancelled)
}

/// Tag an order with the storage area it is parked in.
pub fn set_storage_area(
    shop: &ShopState,
    gateway: &SyncGateway,
    order_id: &str,
    area: &str,
) -> Result<Order, ShopError> {
    let update = OrderUpdate {
        status: None,
        storage_area: Some(area.trim().to_string()),
    };
    let order = apply_order_update(shop, order_id, &update)?;
    push_order_update(shop, gateway, order_id, update);
    Ok(order)
}

// ---------------------------------------------------------------------------
// Product CRUD
// ---------------------------------------------------------------------------

/// Mint a fresh product id: a time-based token, assigned client-side.
pub fn new_product_id() -> String {
    format!("p_{}", Utc::now().timestamp_millis())
}

fn validate_product(product: &Product) -> Result<(), ShopError> {
    if product.id.trim().is_empty() {
        return Err(ShopError::validation("product id is empty"));
    }
    if product.name.zh.trim().is_empty() || product.name.ja.trim().is_empty() {
        return Err(ShopError::validation(
            "product name requires both zh and ja",
        ));
    }
    if product.price < 0 {
        return Err(ShopError::validation(format!(
            "product price must be >= 0, got {}",
            product.price
        )));
    }
    Ok(())
}

/// Create or update a product: replace by id, or prepend when new. Mirrored
/// to the backend after the local apply.
pub fn save_product(
    shop: &ShopState,
    gateway: &SyncGateway,
    product: Product,
) -> Result<(), ShopError> {
    validate_product(&product)?;

    let replaced = lock(&shop.catalog, "catalog")?.upsert(product.clone());
    info!(product_id = %product.id, replaced, "product saved");
    gateway.spawn_push(shop, PushAction::SaveProduct { product });
    Ok(())
}

/// Delete a product. Gated on an explicit confirmation: `Declined` aborts
/// with no side effects. Existing orders keep their item snapshots
/// regardless. Returns whether a local entry was actually removed.
pub fn delete_product(
    shop: &ShopState,
    gateway: &SyncGateway,
    id: &str,
    confirmation: Confirmation,
) -> Result<bool, ShopError> {
    if confirmation == Confirmation::Declined {
        return Ok(false);
    }

    let removed = lock(&shop.catalog, "catalog")?.remove(id);
    info!(product_id = %id, removed, "product deleted");
    // The delete is mirrored even when the id was only present remotely.
    gateway.spawn_push(shop, PushAction::DeleteProduct { id: id.to_string() });
    Ok(removed)
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Partial settings change from the admin form. The exchange rate arrives as
/// the raw text input and is validated here.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub backend_url: Option<String>,
    pub exchange_rate: Option<String>,
    pub shop_note: Option<String>,
}

/// Apply a settings change: validate first (all-or-nothing), then mutate and
/// write through to the database. On a rejected exchange rate nothing
/// changes and the prior value is retained. Callers typically re-pull after
/// a successful save.
pub fn update_settings(shop: &ShopState, update: SettingsUpdate) -> Result<Settings, ShopError> {
    let parsed_rate = match &update.exchange_rate {
        Some(raw) => Some(parse_exchange_rate(raw)?),
        None => None,
    };

    let mut settings = lock(&shop.settings, "settings")?;
    if let Some(url) = update.backend_url {
        settings.backend_url = url.trim().to_string();
    }
    if let Some(rate) = parsed_rate {
        settings.exchange_rate = rate;
    }
    if let Some(note) = update.shop_note {
        settings.shop_note = note;
    }
    settings.persist(&shop.db)?;
    info!(
        exchange_rate = settings.exchange_rate,
        backend_configured = !settings.backend_url.is_empty(),
        "settings updated"
    );
    Ok(settings.clone())
}
