//! Remote sync gateway.
//!
//! One-directional pull from, and fire-and-forget pushes to, the spreadsheet
//! backend. Local state is always updated optimistically before (or
//! independent of) the network result; a push that fails is logged and
//! swallowed, never rolled back; the shop stays fully usable offline. A
//! pull that races an in-flight push may observe stale remote state; the
//! policy is "last full pull wins" with no conflict detection.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api;
use crate::error::ShopError;
use crate::models::{PushAction, RemoteSnapshot};
use crate::state::{lock, ShopState};

// ---------------------------------------------------------------------------
// Sync engine state
// ---------------------------------------------------------------------------

/// Shared sync indicator state. `is_syncing` gates a busy indicator only;
/// it does not serialize operations, and several pulls/pushes may be in
/// flight at once.
pub struct SyncState {
    is_syncing: Arc<AtomicBool>,
    last_sync: Arc<Mutex<Option<String>>>,
}

impl SyncState {
    pub fn new() -> Self {
        Self {
            is_syncing: Arc::new(AtomicBool::new(false)),
            last_sync: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.is_syncing.load(Ordering::SeqCst)
    }

    /// RFC 3339 timestamp of the last applied pull, if any.
    pub fn last_sync(&self) -> Option<String> {
        self.last_sync.lock().ok().and_then(|g| g.clone())
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a single push attempt, delivered to the observer hook. The
/// acknowledgment itself is discardable by design.
pub type PushResult = Result<(), ShopError>;

/// Observer invoked after every push attempt. This is the extension point
/// for a stricter deployment (retry, delivery confirmation) without changing
/// the calling contract of the push operations.
pub type PushObserver = Arc<dyn Fn(&PushAction, &PushResult) + Send + Sync>;

pub struct SyncGateway {
    pub state: SyncState,
    observer: Mutex<Option<PushObserver>>,
}

impl SyncGateway {
    pub fn new() -> Self {
        Self {
            state: SyncState::new(),
            observer: Mutex::new(None),
        }
    }

    /// Install (or clear) the push observer.
    pub fn set_push_observer(&self, observer: Option<PushObserver>) {
        if let Ok(mut slot) = self.observer.lock() {
            *slot = observer;
        }
    }

    /// Fire-and-forget push: spawn the POST and return immediately. Returns
    /// `None` without touching the network when no backend is configured.
    /// Failures are logged at warn level and otherwise swallowed; local
    /// state was already applied by the caller and is not rolled back.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_push(&self, shop: &ShopState, action: PushAction) -> Option<JoinHandle<()>> {
        let url = shop.backend_url();
        if url.trim().is_empty() {
            debug!("push skipped: no backend configured");
            return None;
        }
        let observer = self.observer.lock().ok().and_then(|slot| slot.clone());
        let is_syncing = self.state.is_syncing.clone();

        Some(tokio::spawn(async move {
            is_syncing.store(true, Ordering::SeqCst);
            let result = api::post_action(&url, &action).await;
            is_syncing.store(false, Ordering::SeqCst);

            if let Err(error) = &result {
                warn!(error = %error, "push failed (local state already applied)");
            }
            if let Some(observer) = observer {
                observer(&action, &result);
            }
        }))
    }
}

impl Default for SyncGateway {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Pull + reconciliation
// ---------------------------------------------------------------------------

/// What a pull actually changed, for logging and the admin surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullSummary {
    pub products_replaced: bool,
    pub orders_replaced: bool,
    pub exchange_rate_updated: bool,
    pub shop_note_updated: bool,
}

/// Pull the full remote state and reconcile it into the shop. Returns a
/// no-change summary immediately when no backend is configured.
pub async fn pull(shop: &ShopState, sync: &SyncState) -> Result<PullSummary, ShopError> {
    let url = shop.backend_url();
    if url.trim().is_empty() {
        debug!("pull skipped: no backend configured");
        return Ok(PullSummary::default());
    }

    sync.is_syncing.store(true, Ordering::SeqCst);
    let fetched = api::fetch_remote_state(&url).await;
    sync.is_syncing.store(false, Ordering::SeqCst);

    let snapshot = fetched?;
    let summary = apply_remote_snapshot(shop, snapshot)?;

    if let Ok(mut last) = sync.last_sync.lock() {
        *last = Some(Utc::now().to_rfc3339());
    }
    info!(
        products_replaced = summary.products_replaced,
        orders_replaced = summary.orders_replaced,
        exchange_rate_updated = summary.exchange_rate_updated,
        shop_note_updated = summary.shop_note_updated,
        "pull applied"
    );
    Ok(summary)
}

/// Reconciliation rules for a pulled snapshot:
///
/// - a NON-EMPTY remote product list replaces the catalog; an empty or
///   absent one means "sheet not yet migrated" and the local catalog is kept
/// - a present remote order list (even an empty one) replaces the order
///   collection; an absent field leaves it alone
/// - settings fields apply partially; an out-of-range exchange rate or a
///   blank shop note is ignored, and accepted values are persisted
pub fn apply_remote_snapshot(
    shop: &ShopState,
    snapshot: RemoteSnapshot,
) -> Result<PullSummary, ShopError> {
    let mut summary = PullSummary::default();

    if let Some(products) = snapshot.products {
        if !products.is_empty() {
            lock(&shop.catalog, "catalog")?.replace_all(products);
            summary.products_replaced = true;
        }
    }

    if let Some(orders) = snapshot.orders {
        *lock(&shop.orders, "orders")? = orders;
        summary.orders_replaced = true;
    }

    if let Some(remote) = snapshot.settings {
        let mut settings = lock(&shop.settings, "settings")?;
        if let Some(rate) = remote.exchange_rate {
            if rate.is_finite() && rate > 0.0 {
                settings.exchange_rate = rate;
                summary.exchange_rate_updated = true;
            } else {
                warn!(rate, "ignoring non-positive exchange rate from backend");
            }
        }
        if let Some(note) = remote.shop_note {
            if !note.trim().is_empty() {
                settings.shop_note = note;
                summary.shop_note_updated = true;
            }
        }
        if summary.exchange_rate_updated || summary.shop_note_updated {
            settings.persist(&shop.db)?;
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LocalizedText, Order, OrderStatus, Product, RemoteSettings};
    use crate::state::test_support::test_shop;

    fn remote_product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: LocalizedText::new("云端商品", "クラウド商品"),
            price: 300,
            category: "Remote".to_string(),
            image: String::new(),
            description: LocalizedText::default(),
        }
    }

    fn remote_order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            pickup_code: "AB12CD".to_string(),
            wechat_name: "remote".to_string(),
            items: vec![],
            total_price_jpy: 0,
            total_price_cny: 0.0,
            exchange_rate: 0.048,
            pickup_date: "2026-08-10".to_string(),
            pickup_time: "10:00".to_string(),
            status: OrderStatus::Pending,
            created_at: 1,
            payment_screenshot: None,
            storage_area: None,
        }
    }

    #[test]
    fn test_empty_remote_catalog_keeps_local_defaults() {
        let shop = test_shop();
        let summary = apply_remote_snapshot(
            &shop,
            RemoteSnapshot {
                products: Some(vec![]),
                orders: None,
                settings: None,
            },
        )
        .unwrap();

        assert!(!summary.products_replaced);
        assert_eq!(shop.products_snapshot().unwrap().len(), 4);
    }

    #[test]
    fn test_non_empty_remote_catalog_replaces_local_exactly() {
        let shop = test_shop();
        let summary = apply_remote_snapshot(
            &shop,
            RemoteSnapshot {
                products: Some(vec![remote_product("r1"), remote_product("r2")]),
                orders: None,
                settings: None,
            },
        )
        .unwrap();

        assert!(summary.products_replaced);
        let products = shop.products_snapshot().unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id, "r1");
        assert!(shop.product_by_id("p1").unwrap().is_none());
    }

    #[test]
    fn test_present_remote_orders_replace_unconditionally() {
        let shop = test_shop();
        lock(&shop.orders, "orders")
            .unwrap()
            .push(remote_order("local-1"));

        let summary = apply_remote_snapshot(
            &shop,
            RemoteSnapshot {
                products: None,
                orders: Some(vec![remote_order("remote-1")]),
                settings: None,
            },
        )
        .unwrap();
        assert!(summary.orders_replaced);
        let orders = shop.orders_snapshot().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, "remote-1");

        // Present-but-empty also replaces (the field was provided).
        apply_remote_snapshot(
            &shop,
            RemoteSnapshot {
                products: None,
                orders: Some(vec![]),
                settings: None,
            },
        )
        .unwrap();
        assert!(shop.orders_snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_absent_orders_field_leaves_local_alone() {
        let shop = test_shop();
        lock(&shop.orders, "orders")
            .unwrap()
            .push(remote_order("local-1"));

        let summary = apply_remote_snapshot(&shop, RemoteSnapshot::default()).unwrap();
        assert!(!summary.orders_replaced);
        assert_eq!(shop.orders_snapshot().unwrap().len(), 1);
    }

    #[test]
    fn test_settings_apply_partially_and_persist() {
        let shop = test_shop();
        let summary = apply_remote_snapshot(
            &shop,
            RemoteSnapshot {
                products: None,
                orders: None,
                settings: Some(RemoteSettings {
                    exchange_rate: Some(0.052),
                    shop_note: None,
                }),
            },
        )
        .unwrap();

        assert!(summary.exchange_rate_updated);
        assert!(!summary.shop_note_updated);
        assert_eq!(shop.exchange_rate(), 0.052);
        // Note untouched, catalog untouched.
        assert_eq!(
            shop.settings_snapshot().unwrap().shop_note,
            crate::settings::DEFAULT_SHOP_NOTE
        );
        assert_eq!(shop.products_snapshot().unwrap().len(), 4);

        // Accepted values were written through; a reload sees them.
        let reloaded = crate::settings::Settings::load(&shop.db);
        assert_eq!(reloaded.exchange_rate, 0.052);
    }

    #[test]
    fn test_bad_remote_settings_values_ignored() {
        let shop = test_shop();
        let summary = apply_remote_snapshot(
            &shop,
            RemoteSnapshot {
                products: None,
                orders: None,
                settings: Some(RemoteSettings {
                    exchange_rate: Some(0.0),
                    shop_note: Some("   ".to_string()),
                }),
            },
        )
        .unwrap();

        assert_eq!(summary, PullSummary::default());
        assert_eq!(shop.exchange_rate(), crate::settings::DEFAULT_EXCHANGE_RATE);
    }

    #[tokio::test]
    async fn test_pull_without_backend_is_a_no_op() {
        let shop = test_shop();
        let sync = SyncState::new();

        let summary = pull(&shop, &sync).await.expect("pull");
        assert_eq!(summary, PullSummary::default());
        assert!(!sync.is_syncing());
        assert!(sync.last_sync().is_none());
    }

    #[tokio::test]
    async fn test_spawn_push_without_backend_is_a_no_op() {
        let shop = test_shop();
        let gateway = SyncGateway::new();

        let handle = gateway.spawn_push(
            &shop,
            PushAction::DeleteProduct {
                id: "p1".to_string(),
            },
        );
        assert!(handle.is_none());
    }
}
