//! Customer-facing order tracking.
//!
//! Everything here is a read-only projection of an [`Order`]: labels,
//! progress, and the delivery estimate shown at `<origin>/track/<orderId>`.
//! Nothing is written back.

use chrono::{DateTime, FixedOffset, Utc};
use url::Url;

use crate::models::{
    order::{Order, OrderStatus, StatusChangeResponse},
    views::{TrackingStep, TrackingView},
};

/// ETAs at most this far out are shown as "in N minutes".
const RELATIVE_ETA_LIMIT_MINUTES: i64 = 120;

pub fn display_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Order Received",
        OrderStatus::Preparing => "Preparing Your Order",
        OrderStatus::Ready => "Ready for Pickup/Delivery",
        OrderStatus::OutForDelivery => "Out for Delivery",
        OrderStatus::Delivered => "Delivered",
    }
}

pub fn progress_percent(status: OrderStatus) -> u8 {
    match status {
        OrderStatus::Pending => 20,
        OrderStatus::Preparing => 40,
        OrderStatus::Ready => 60,
        OrderStatus::OutForDelivery => 80,
        OrderStatus::Delivered => 100,
    }
}

/// Whether `candidate` should be ticked off when the order is at `current`.
///
/// Position-based, so a status skipped through the staff override still
/// shows as done.
pub fn is_completed(candidate: OrderStatus, current: OrderStatus) -> bool {
    candidate.position() <= current.position()
}

fn status_message(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "We'll start preparing your order soon",
        OrderStatus::Preparing => "Your order is being prepared",
        OrderStatus::Ready => "Your order is ready for pickup/delivery",
        OrderStatus::OutForDelivery => "Your order is on the way",
        OrderStatus::Delivered => "Your order has been delivered",
    }
}

/// Whole minutes until `eta`, rounded up.
fn minutes_until(eta: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (eta - now).num_milliseconds();
    let minutes = millis.div_euclid(60_000);
    if millis.rem_euclid(60_000) > 0 {
        minutes + 1
    } else {
        minutes
    }
}

/// Delivery estimate for the tracking page.
///
/// Near ETAs read "in N minutes", far ones show the clock time in the
/// business timezone, and a missing or past ETA falls back to a message for
/// the current status.
pub fn estimated_delivery_message(order: &Order, now: DateTime<Utc>, tz: FixedOffset) -> String {
    if let Some(eta) = order.estimated_delivery_time {
        let minutes = minutes_until(eta, now);
        if (1..=RELATIVE_ETA_LIMIT_MINUTES).contains(&minutes) {
            return format!("Estimated delivery in {minutes} minutes");
        }
        if minutes > RELATIVE_ETA_LIMIT_MINUTES {
            return format!(
                "Estimated delivery at {}",
                eta.with_timezone(&tz).format("%I:%M %p")
            );
        }
    }

    status_message(order.status).to_string()
}

pub fn tracking_view(order: Order, now: DateTime<Utc>, tz: FixedOffset) -> TrackingView {
    let current = order.status;
    let estimated_delivery_message = estimated_delivery_message(&order, now, tz);
    let steps = OrderStatus::LIFECYCLE
        .iter()
        .map(|&status| TrackingStep {
            status,
            label: display_label(status),
            completed: is_completed(status, current),
            current: status == current,
        })
        .collect();

    TrackingView {
        order_id: order.id,
        customer_name: order.customer.customer_name,
        status: current,
        status_label: display_label(current),
        progress_percent: progress_percent(current),
        estimated_delivery_message,
        steps,
        status_history: order
            .status_history
            .into_iter()
            .map(StatusChangeResponse::from)
            .collect(),
        items: order.items,
        subtotal_cents: order.subtotal_cents,
        delivery_fee_cents: order.delivery_fee_cents,
        total_amount_cents: order.total_amount_cents,
        tracking_notes: order.tracking_notes,
        created_at: order.created_at,
    }
}

/// Builds the two customer-facing URLs from the public origin.
#[derive(Debug, Clone)]
pub struct Links {
    origin: Url,
}

impl Links {
    pub fn new(origin: Url) -> Self {
        Self { origin }
    }

    /// `<origin>/customer/<token>`
    pub fn customer(&self, token: &str) -> String {
        self.under("customer", token)
    }

    /// `<origin>/track/<orderId>`
    pub fn tracking(&self, order_id: &str) -> String {
        self.under("track", order_id)
    }

    fn under(&self, section: &str, value: &str) -> String {
        let mut url = self.origin.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(section).push(value);
        }
        url.to_string()
    }
}
