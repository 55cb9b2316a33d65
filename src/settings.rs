//! Durable shop settings.
//!
//! Backend URL, JPY→CNY exchange rate, and the shop note live in the
//! `local_settings` table under category `shop`. They are read once at
//! startup and written through synchronously on every accepted change.

use tracing::warn;

use crate::db::{self, DbState};
use crate::error::ShopError;

pub const DEFAULT_EXCHANGE_RATE: f64 = 0.048;
pub const DEFAULT_SHOP_NOTE: &str = "欢迎光临！请扫码支付并上传截图。";

const CATEGORY: &str = "shop";
const KEY_BACKEND_URL: &str = "backend_url";
const KEY_EXCHANGE_RATE: &str = "exchange_rate";
const KEY_SHOP_NOTE: &str = "shop_note";

/// Process-wide shop configuration. An empty `backend_url` means remote sync
/// is disabled and the shop runs purely against local state.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend_url: String,
    pub exchange_rate: f64,
    pub shop_note: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            exchange_rate: DEFAULT_EXCHANGE_RATE,
            shop_note: DEFAULT_SHOP_NOTE.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the database, falling back to defaults for absent
    /// keys. A persisted exchange rate that no longer parses as a positive
    /// float is discarded (logged) and the default used instead.
    pub fn load(db: &DbState) -> Settings {
        let conn = match db.conn.lock() {
            Ok(c) => c,
            Err(e) => {
                warn!("settings load: db lock failed: {e}");
                return Settings::default();
            }
        };

        let mut settings = Settings::default();
        if let Some(url) = db::get_setting(&conn, CATEGORY, KEY_BACKEND_URL) {
            settings.backend_url = url;
        }
        if let Some(raw) = db::get_setting(&conn, CATEGORY, KEY_EXCHANGE_RATE) {
            match parse_exchange_rate(&raw) {
                Ok(rate) => settings.exchange_rate = rate,
                Err(e) => warn!(raw = %raw, error = %e, "ignoring persisted exchange rate"),
            }
        }
        if let Some(note) = db::get_setting(&conn, CATEGORY, KEY_SHOP_NOTE) {
            settings.shop_note = note;
        }
        settings
    }

    /// Write all three settings through to the database.
    pub fn persist(&self, db: &DbState) -> Result<(), ShopError> {
        let conn = db
            .conn
            .lock()
            .map_err(|e| ShopError::state(format!("db lock: {e}")))?;
        db::set_setting(&conn, CATEGORY, KEY_BACKEND_URL, &self.backend_url)?;
        db::set_setting(
            &conn,
            CATEGORY,
            KEY_EXCHANGE_RATE,
            &self.exchange_rate.to_string(),
        )?;
        db::set_setting(&conn, CATEGORY, KEY_SHOP_NOTE, &self.shop_note)?;
        Ok(())
    }
}

/// Parse an exchange-rate input. Rejects non-numeric, non-finite, and
/// non-positive values; on rejection the caller keeps the prior rate.
pub fn parse_exchange_rate(input: &str) -> Result<f64, ShopError> {
    let rate: f64 = input
        .trim()
        .parse()
        .map_err(|_| ShopError::validation(format!("exchange rate is not a number: {input:?}")))?;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(ShopError::validation(format!(
            "exchange rate must be a positive number, got {rate}"
        )));
    }
    Ok(rate)
}
