//! Read-only views assembled for customers and the dashboard.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{
    customer_token::CustomerPrefill,
    order::{OrderItem, OrderResponse, OrderStatus, StatusChangeResponse},
    product::MenuResponse,
};

/// One row of the tracking checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingStep {
    pub status: OrderStatus,
    pub label: &'static str,
    pub completed: bool,
    pub current: bool,
}

/// What a customer sees at `<origin>/track/<orderId>`.
#[derive(Debug, Serialize)]
pub struct TrackingView {
    pub order_id: String,
    pub customer_name: String,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub progress_percent: u8,
    pub estimated_delivery_message: String,
    pub steps: Vec<TrackingStep>,
    pub status_history: Vec<StatusChangeResponse>,
    pub items: Vec<OrderItem>,
    pub subtotal_cents: i64,
    pub delivery_fee_cents: i64,
    pub total_amount_cents: i64,
    pub tracking_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Response for `GET /customer/{token}` when the link is usable.
#[derive(Debug, Serialize)]
pub struct CustomerLinkPage {
    pub valid: bool,
    #[serde(flatten)]
    pub prefill: CustomerPrefill,
    pub expires_at: DateTime<Utc>,
    pub menu: MenuResponse,
}

/// Response for a customer's submitted order.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order: OrderResponse,
    pub tracking_url: String,
}

/// Aggregates for today's orders in the business timezone.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub today_orders: usize,
    pub total_sales_cents: i64,
    pub pending_deliveries: usize,
    pub completed_orders: usize,
    pub recent_orders: Vec<OrderResponse>,
}
