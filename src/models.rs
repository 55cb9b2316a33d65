//! Data model for the QuickPick core.
//!
//! Every type here serializes to the camelCase wire shapes the spreadsheet
//! backend script expects, so a pulled snapshot and a pushed order are
//! byte-compatible with rows written by other clients of the same sheet.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// A Chinese/Japanese display-string pair. Both languages are required for
/// customer-facing product fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    pub zh: String,
    pub ja: String,
}

impl LocalizedText {
    pub fn new(zh: impl Into<String>, ja: impl Into<String>) -> Self {
        Self {
            zh: zh.into(),
            ja: ja.into(),
        }
    }
}

/// A purchasable catalog entry. `price` is an integer amount in JPY.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: LocalizedText,
    pub price: i64,
    pub category: String,
    pub image: String,
    pub description: LocalizedText,
}

/// A product snapshot plus a quantity. Serializes flattened (product fields
/// alongside `quantity`), matching the sheet's row shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: i64,
}

/// Order lifecycle states. Forward transitions run PENDING through
/// COMPLETED; CANCELLED is reachable from any non-terminal state via the
/// admin cancel operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// COMPLETED and CANCELLED accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    fn rank(self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Preparing => 1,
            OrderStatus::Ready => 2,
            OrderStatus::Completed => 3,
            OrderStatus::Cancelled => 4,
        }
    }

    /// Whether the transition `self -> next` is legal.
    ///
    /// Re-applying the current status is an accepted no-op (the admin surface
    /// fires the same update on a double-press). Forward jumps may skip
    /// intermediate states; backward moves are rejected.
    pub fn can_become(self, next: OrderStatus) -> bool {
        if next == self {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match next {
            OrderStatus::Cancelled => true,
            _ => next.rank() > self.rank(),
        }
    }
}

/// An immutable pickup order. `items` is a deep snapshot of the cart at
/// checkout; later catalog or cart edits never reach it. The CNY total and
/// the rate it was derived from are frozen at creation for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub pickup_code: String,
    pub wechat_name: String,
    pub items: Vec<CartItem>,
    #[serde(rename = "totalPriceJPY")]
    pub total_price_jpy: i64,
    #[serde(rename = "totalPriceCNY")]
    pub total_price_cny: f64,
    pub exchange_rate: f64,
    pub pickup_date: String,
    pub pickup_time: String,
    pub status: OrderStatus,
    /// Creation time, epoch milliseconds.
    pub created_at: i64,
    /// Inline base64 data URL of the customer's payment screenshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_area: Option<String>,
}

/// Partial order update pushed to the backend (`updateOrder` action) and
/// applied locally by the admin controller. Absent fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_area: Option<String>,
}

/// Remote settings section of a pulled snapshot. Missing fields leave the
/// local values unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSettings {
    #[serde(default)]
    pub exchange_rate: Option<f64>,
    #[serde(default)]
    pub shop_note: Option<String>,
}

/// Full remote state returned by `GET {url}?action=getData`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteSnapshot {
    #[serde(default)]
    pub products: Option<Vec<Product>>,
    #[serde(default)]
    pub orders: Option<Vec<Order>>,
    #[serde(default)]
    pub settings: Option<RemoteSettings>,
}

/// Write operation POSTed to the backend. The tag and field names are the
/// contract of the spreadsheet script's `doPost` dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PushAction {
    AddOrder {
        order: Order,
    },
    UpdateOrder {
        #[serde(rename = "orderId")]
        order_id: String,
        updates: OrderUpdate,
    },
    SaveProduct {
        product: Product,
    },
    DeleteProduct {
        id: String,
    },
}

/// Cheap plausibility check for an inline payment screenshot.
///
/// Accepts either a raw base64 string or a `data:<mime>;base64,` URL and
/// verifies the head of the payload actually decodes. This is a gate against
/// garbage form input, not an image validation.
pub fn screenshot_payload_is_plausible(payload: &str) -> bool {
    let trimmed = payload.trim();
    let body = match trimmed.strip_prefix("data:") {
        Some(rest) => match rest.split_once(";base64,") {
            Some((_, body)) => body,
            None => return false,
        },
        None => trimmed,
    };
    if body.len() < 16 {
        return false;
    }
    // base64 decodes in 4-byte groups; check a bounded prefix only.
    let head_len = body.len().min(512) / 4 * 4;
    BASE64_STANDARD.decode(&body[..head_len]).is_ok()
}
