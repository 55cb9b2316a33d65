//! QuickPick - bilingual pre-order pickup storefront core.
//!
//! Customers browse a catalog, build a cart, check out with a payment
//! screenshot, and receive a pickup code; the admin surface manages order
//! statuses, products, the JPY→CNY exchange rate, and the spreadsheet
//! backend connection. This crate is the core only: pages, forms, and
//! navigation are an embedding UI's problem; it drives everything through
//! [`ShopState`], the `orders`/`admin` operations, and the sync gateway.
//!
//! Startup flow: [`init_logging`], [`ShopState::init`] (opens the local
//! database and loads persisted settings), then [`sync::pull`] to reconcile
//! against the backend. All pushes are optimistic and fire-and-forget; the
//! shop keeps working offline against local state when the backend is
//! unreachable or unconfigured.

use std::path::Path;

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod admin;
pub mod api;
pub mod cart;
pub mod catalog;
pub mod currency;
pub mod db;
pub mod error;
pub mod models;
pub mod orders;
pub mod settings;
pub mod state;
pub mod sync;

pub use error::ShopError;
pub use models::{CartItem, LocalizedText, Order, OrderStatus, Product};
pub use orders::CheckoutRequest;
pub use settings::Settings;
pub use state::ShopState;
pub use sync::{SyncGateway, SyncState};

/// Initialize structured logging (console + rolling file). Call once, before
/// anything else; log files land in `{data_dir}/logs`.
pub fn init_logging(data_dir: &Path) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,quickpick=debug"));

    // Rolling file appender: creates daily log files in the logs directory
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&log_dir, "quickpick");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    // Keep the guard alive for the lifetime of the app; dropping it flushes
    // logs. We leak it intentionally since the process runs until exit.
    std::mem::forget(guard);

    info!("QuickPick core v{} logging initialized", env!("CARGO_PKG_VERSION"));
}
