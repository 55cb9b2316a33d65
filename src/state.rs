//! Top-level application state.
//!
//! Owns the catalog, the order collection, the cart, and the settings, each
//! behind its own mutex. There is one logical thread of control (the UI);
//! the mutexes exist because fire-and-forget network tasks read cloned data
//! concurrently, not to coordinate writers. No component mutates another's
//! state directly; everything goes through the entry points here and in
//! `orders`/`admin`/`sync`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use tracing::error;

use crate::cart::{Cart, CartTotals};
use crate::catalog::Catalog;
use crate::db::{self, DbState};
use crate::error::ShopError;
use crate::models::{CartItem, Order, Product};
use crate::settings::Settings;

pub struct ShopState {
    pub db: DbState,
    pub catalog: Mutex<Catalog>,
    pub orders: Mutex<Vec<Order>>,
    pub cart: Mutex<Cart>,
    pub settings: Mutex<Settings>,
}

pub(crate) fn lock<'a, T>(
    mutex: &'a Mutex<T>,
    what: &str,
) -> Result<MutexGuard<'a, T>, ShopError> {
    mutex
        .lock()
        .map_err(|e| ShopError::state(format!("{what} lock: {e}")))
}

impl ShopState {
    /// Open (or create) the local database under `data_dir`, load persisted
    /// settings, and seed the catalog with the built-in defaults. Orders and
    /// cart start empty; the caller typically runs `sync::pull` next.
    pub fn init(data_dir: &Path) -> Result<Self, ShopError> {
        let db = db::init(data_dir)?;
        let settings = Settings::load(&db);
        Ok(Self {
            db,
            catalog: Mutex::new(Catalog::with_defaults()),
            orders: Mutex::new(Vec::new()),
            cart: Mutex::new(Cart::new()),
            settings: Mutex::new(settings),
        })
    }

    // -- Settings accessors --------------------------------------------------

    /// The configured backend URL; empty when remote sync is disabled.
    pub fn backend_url(&self) -> String {
        match self.settings.lock() {
            Ok(s) => s.backend_url.clone(),
            Err(e) => {
                error!("settings lock failed: {e}");
                String::new()
            }
        }
    }

    /// The current JPY→CNY rate.
    pub fn exchange_rate(&self) -> f64 {
        match self.settings.lock() {
            Ok(s) => s.exchange_rate,
            Err(e) => {
                error!("settings lock failed: {e}");
                crate::settings::DEFAULT_EXCHANGE_RATE
            }
        }
    }

    pub fn settings_snapshot(&self) -> Result<Settings, ShopError> {
        Ok(lock(&self.settings, "settings")?.clone())
    }

    // -- Catalog entry points ------------------------------------------------

    pub fn products_snapshot(&self) -> Result<Vec<Product>, ShopError> {
        Ok(lock(&self.catalog, "catalog")?.list().to_vec())
    }

    pub fn product_by_id(&self, id: &str) -> Result<Option<Product>, ShopError> {
        Ok(lock(&self.catalog, "catalog")?.get(id).cloned())
    }

    // -- Order collection entry points ---------------------------------------

    pub fn orders_snapshot(&self) -> Result<Vec<Order>, ShopError> {
        Ok(lock(&self.orders, "orders")?.clone())
    }

    pub fn order_by_id(&self, id: &str) -> Result<Option<Order>, ShopError> {
        Ok(lock(&self.orders, "orders")?
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    // -- Cart entry points ---------------------------------------------------

    /// Add one unit of a cataloged product to the cart.
    pub fn cart_add(&self, product_id: &str) -> Result<CartTotals, ShopError> {
        let product = self
            .product_by_id(product_id)?
            .ok_or_else(|| ShopError::validation(format!("unknown product: {product_id}")))?;
        let mut cart = lock(&self.cart, "cart")?;
        cart.add(&product);
        Ok(cart.totals())
    }

    /// Remove one unit; no-op when the id is not in the cart.
    pub fn cart_remove(&self, product_id: &str) -> Result<CartTotals, ShopError> {
        let mut cart = lock(&self.cart, "cart")?;
        cart.remove(product_id);
        Ok(cart.totals())
    }

    pub fn cart_items(&self) -> Result<Vec<CartItem>, ShopError> {
        Ok(lock(&self.cart, "cart")?.snapshot())
    }

    pub fn cart_totals(&self) -> Result<CartTotals, ShopError> {
        Ok(lock(&self.cart, "cart")?.totals())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use rusqlite::Connection;
    use std::path::PathBuf;

    /// A `ShopState` over an in-memory database, seeded with the default
    /// catalog, the unit-test counterpart of `ShopState::init`.
    pub(crate) fn test_shop() -> ShopState {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        crate::db::run_migrations_for_test(&conn);
        let db = DbState {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        };
        let settings = Settings::load(&db);
        ShopState {
            db,
            catalog: Mutex::new(Catalog::with_defaults()),
            orders: Mutex::new(Vec::new()),
            cart: Mutex::new(Cart::new()),
            settings: Mutex::new(settings),
        }
    }
}
