//! Order data models and API request/response types.
//!
//! This module defines:
//! - `Order`: the stored order document with its embedded items and status history
//! - `OrderStatus`: the five-state delivery lifecycle
//! - Request bodies for creating, editing, and re-statusing orders
//! - `OrderResponse`: the order as returned to staff and customers
//!
//! Stored documents keep timestamps as epoch milliseconds; everything that
//! leaves the API carries RFC 3339 strings.
//!
//! # Money
//!
//! All amounts are `i64` centavos (₱1.00 is stored as 100), following the
//! same minor-unit convention everywhere in the service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::store::{Collection, Record};

/// Delivery lifecycle of an order.
///
/// The standard progression is strictly linear:
/// `pending → preparing → ready → out-for-delivery → delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    /// Canonical lifecycle order.
    pub const LIFECYCLE: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    /// Zero-based position in [`Self::LIFECYCLE`].
    pub fn position(self) -> usize {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Preparing => 1,
            OrderStatus::Ready => 2,
            OrderStatus::OutForDelivery => 3,
            OrderStatus::Delivered => 4,
        }
    }

    /// Next status on the standard path, `None` once delivered.
    pub fn next(self) -> Option<OrderStatus> {
        Self::LIFECYCLE.get(self.position() + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::OutForDelivery => "out-for-delivery",
            OrderStatus::Delivered => "delivered",
        }
    }
}

/// Drink size. `Large` carries the upsize surcharge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    #[default]
    Regular,
    Large,
}

/// Add-on copied into an order line at the time it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonSnapshot {
    pub name: String,
    pub price_cents: i64,
}

/// One line of an order.
///
/// Product name, price, and add-ons are snapshots: later menu edits do not
/// change existing orders. `drink_name` labels the whole line regardless of
/// quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub addons: Vec<AddonSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drink_name: Option<String>,
}

/// Entry in the append-only status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChange {
    pub status: OrderStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Who the order is for and where it goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
}

/// Stored order document.
///
/// # Invariants
///
/// - `items` is never empty
/// - `total_amount_cents == subtotal_cents + delivery_fee_cents`
/// - `status_history[0]` records `pending` at creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(skip)]
    pub id: String,

    /// Store revision this copy was read at.
    #[serde(skip)]
    pub revision: i64,

    #[serde(flatten)]
    pub customer: CustomerDetails,

    pub subtotal_cents: i64,

    #[serde(default)]
    pub delivery_fee_cents: i64,

    pub total_amount_cents: i64,

    pub status: OrderStatus,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub items: Vec<OrderItem>,

    #[serde(default)]
    pub status_history: Vec<OrderStatusChange>,

    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub estimated_delivery_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_notes: Option<String>,
}

impl Record for Order {
    const COLLECTION: Collection = Collection::Orders;

    fn assign_identity(&mut self, id: String, revision: i64) {
        self.id = id;
        self.revision = revision;
    }
}

/// A product chosen by staff or a customer, before it is snapshotted.
///
/// # JSON Example
///
/// ```json
/// {
///   "product_id": "5f0c...",
///   "quantity": 2,
///   "size": "large",
///   "addon_ids": ["a91e..."],
///   "drink_name": "Ana"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ItemSelection {
    pub product_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub addon_ids: Vec<String>,
    pub drink_name: Option<String>,
}

/// Request body for creating an order.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(flatten)]
    pub customer: CustomerDetails,
    pub notes: Option<String>,
    pub items: Vec<ItemSelection>,
}

/// Keeps an explicit `null` apart from an absent field.
fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Request body for staff edits. Every field is optional.
///
/// `revision` guards against overwriting a concurrent edit; omit it to
/// apply the patch to the latest copy.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrderRequest {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub items: Option<Vec<ItemSelection>>,
    pub delivery_fee_cents: Option<i64>,
    pub notes: Option<String>,
    /// `Some(Some(eta))` = set, `Some(None)` = clear, `None` = no change.
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub estimated_delivery_time: Option<Option<DateTime<Utc>>>,
    pub tracking_notes: Option<String>,
    pub revision: Option<i64>,
}

/// Request body for `POST /api/v1/orders/{id}/advance`.
#[derive(Debug, Default, Deserialize)]
pub struct AdvanceRequest {
    pub notes: Option<String>,
    pub revision: Option<i64>,
}

/// Request body for `PUT /api/v1/orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub revision: Option<i64>,
}

/// Query string for `GET /api/v1/orders`.
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersParams {
    pub status: Option<OrderStatus>,
}

/// History entry as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChangeResponse {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<OrderStatusChange> for StatusChangeResponse {
    fn from(change: OrderStatusChange) -> Self {
        Self {
            status: change.status,
            timestamp: change.timestamp,
            notes: change.notes,
        }
    }
}

/// Order as returned by the API, with its id and revision.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub revision: i64,
    #[serde(flatten)]
    pub customer: CustomerDetails,
    pub subtotal_cents: i64,
    pub delivery_fee_cents: i64,
    pub total_amount_cents: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub items: Vec<OrderItem>,
    pub status_history: Vec<StatusChangeResponse>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub tracking_notes: Option<String>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            revision: order.revision,
            customer: order.customer,
            subtotal_cents: order.subtotal_cents,
            delivery_fee_cents: order.delivery_fee_cents,
            total_amount_cents: order.total_amount_cents,
            status: order.status,
            created_at: order.created_at,
            notes: order.notes,
            items: order.items,
            status_history: order
                .status_history
                .into_iter()
                .map(StatusChangeResponse::from)
                .collect(),
            estimated_delivery_time: order.estimated_delivery_time,
            tracking_notes: order.tracking_notes,
        }
    }
}
