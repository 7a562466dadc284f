//! Order lifecycle service - creation, status changes, edits, deletion.
//!
//! This service handles:
//! - Validating and creating orders with their first history entry
//! - The standard `advance` path and the staff status override
//! - Staff corrections to customer details, items, and fees
//! - Dashboard aggregates
//!
//! # Consistency
//!
//! Every write is a single-document update guarded by the revision the
//! caller read. Two staff members editing the same order cannot silently
//! drop each other's history entries: the second write fails with a
//! conflict and must be retried against fresh state. Validation happens
//! before any write, so a rejected request changes nothing.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use serde_json::json;

use crate::{
    clock::Clock,
    error::AppError,
    models::{
        order::{CustomerDetails, Order, OrderItem, OrderResponse, OrderStatus, OrderStatusChange},
        views::DashboardStats,
    },
    services::pricing::Pricing,
    store::{self, Direction, DocumentStore, FilterOp, Query, Record, StoreError, patch},
};

/// Staff correction to an existing order. `None` leaves a field untouched.
#[derive(Debug, Default, Clone)]
pub struct OrderPatch {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub items: Option<Vec<OrderItem>>,
    pub delivery_fee_cents: Option<i64>,
    pub notes: Option<String>,
    /// `Some(None)` clears the ETA.
    pub estimated_delivery_time: Option<Option<DateTime<Utc>>>,
    pub tracking_notes: Option<String>,
}

pub struct OrderLifecycle {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    pricing: Pricing,
}

/// Trimmed, non-empty required text.
fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Trimmed optional text, with blank treated as absent.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_customer(customer: &CustomerDetails) -> Result<CustomerDetails, AppError> {
    Ok(CustomerDetails {
        customer_name: required("customer_name", &customer.customer_name)?,
        customer_phone: required("customer_phone", &customer.customer_phone)?,
        customer_address: required("customer_address", &customer.customer_address)?,
    })
}

fn validate_items(items: &[OrderItem]) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::validation("An order needs at least one item"));
    }

    for item in items {
        if item.quantity < 1 {
            return Err(AppError::validation(format!(
                "Quantity for {} must be at least 1",
                item.product_name
            )));
        }
        if item.unit_price_cents < 0 || item.addons.iter().any(|a| a.price_cents < 0) {
            return Err(AppError::validation(format!(
                "Prices for {} must not be negative",
                item.product_name
            )));
        }
    }

    Ok(())
}

fn validate_delivery_fee(fee: i64) -> Result<(), AppError> {
    if fee < 0 {
        return Err(AppError::validation("delivery_fee_cents must not be negative"));
    }
    Ok(())
}

impl OrderLifecycle {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, pricing: Pricing) -> Self {
        Self {
            store,
            clock,
            pricing,
        }
    }

    /// `(subtotal, total)` for the given lines and fee.
    fn totals(&self, items: &[OrderItem], delivery_fee_cents: i64) -> Result<(i64, i64), AppError> {
        let too_large = || AppError::validation("Order total is too large");
        let subtotal = self.pricing.subtotal(items).ok_or_else(too_large)?;
        let total = self
            .pricing
            .total(items, delivery_fee_cents)
            .ok_or_else(too_large)?;
        Ok((subtotal, total))
    }

    /// Validate and store a new order in the `pending` state.
    ///
    /// # Errors
    ///
    /// - `Validation`: no items, blank customer fields, bad quantity or price
    /// - `Store`: the insert failed
    pub async fn create(
        &self,
        customer: CustomerDetails,
        items: Vec<OrderItem>,
        notes: Option<String>,
    ) -> Result<Order, AppError> {
        let customer = validate_customer(&customer)?;
        validate_items(&items)?;

        let (subtotal, total) = self.totals(&items, 0)?;
        let now = self.clock.now();
        let mut order = Order {
            id: String::new(),
            revision: 0,
            customer,
            subtotal_cents: subtotal,
            delivery_fee_cents: 0,
            total_amount_cents: total,
            status: OrderStatus::Pending,
            created_at: now,
            notes: optional(notes),
            items,
            status_history: vec![OrderStatusChange {
                status: OrderStatus::Pending,
                timestamp: now,
                notes: None,
            }],
            estimated_delivery_time: None,
            tracking_notes: None,
        };

        let id = self
            .store
            .insert(Order::COLLECTION, store::encode(&order)?)
            .await?;
        order.assign_identity(id, 1);

        tracing::info!(
            order_id = %order.id,
            items = order.items.len(),
            total_cents = order.total_amount_cents,
            "Order created"
        );
        Ok(order)
    }

    pub async fn find(&self, id: &str) -> Result<Option<Order>, AppError> {
        Ok(store::load::<Order>(self.store.as_ref(), id).await?)
    }

    /// # Errors
    ///
    /// `NotFound` if no order has this id.
    pub async fn get(&self, id: &str) -> Result<Order, AppError> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {id}")))
    }

    /// Orders newest first, optionally limited to one status.
    pub async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, AppError> {
        let mut query = Query::new().order_by("created_at", Direction::Desc);
        if let Some(status) = status {
            query = query.eq("status", status.as_str());
        }
        Ok(store::load_all(self.store.as_ref(), &query).await?)
    }

    /// Move to the next status on the standard path.
    ///
    /// A delivered order is returned unchanged and nothing is written.
    ///
    /// # Errors
    ///
    /// - `Conflict`: the order changed since `order` was read
    /// - `NotFound`: the order was deleted meanwhile
    pub async fn advance(&self, order: Order, notes: Option<String>) -> Result<Order, AppError> {
        match order.status.next() {
            Some(next) => self.append_status(order, next, notes).await,
            None => {
                tracing::debug!(order_id = %order.id, "Order already delivered, nothing to advance");
                Ok(order)
            }
        }
    }

    /// Staff override: jump to any status, forwards or backwards.
    ///
    /// The change is still recorded in the status history.
    pub async fn set_status(
        &self,
        order: Order,
        status: OrderStatus,
        notes: Option<String>,
    ) -> Result<Order, AppError> {
        self.append_status(order, status, notes).await
    }

    async fn append_status(
        &self,
        mut order: Order,
        status: OrderStatus,
        notes: Option<String>,
    ) -> Result<Order, AppError> {
        let previous = order.status;
        order.status = status;
        order.status_history.push(OrderStatusChange {
            status,
            timestamp: self.clock.now(),
            notes: optional(notes),
        });

        let history = serde_json::to_value(&order.status_history).map_err(StoreError::from)?;
        let changes = patch([("status", json!(status)), ("status_history", history)]);
        order.revision = self
            .store
            .update(Order::COLLECTION, &order.id, changes, Some(order.revision))
            .await?;

        tracing::info!(
            order_id = %order.id,
            from = previous.as_str(),
            to = status.as_str(),
            "Order status changed"
        );
        Ok(order)
    }

    /// Apply a staff correction and recompute totals.
    ///
    /// # Errors
    ///
    /// - `Validation`: the result would have no items, blank customer
    ///   fields, a negative fee, or a total past `i64`
    /// - `Conflict`: the order changed since `order` was read
    pub async fn update(&self, mut order: Order, changes: OrderPatch) -> Result<Order, AppError> {
        if let Some(name) = changes.customer_name {
            order.customer.customer_name = name;
        }
        if let Some(phone) = changes.customer_phone {
            order.customer.customer_phone = phone;
        }
        if let Some(address) = changes.customer_address {
            order.customer.customer_address = address;
        }
        order.customer = validate_customer(&order.customer)?;

        if let Some(items) = changes.items {
            validate_items(&items)?;
            order.items = items;
        }
        if let Some(fee) = changes.delivery_fee_cents {
            validate_delivery_fee(fee)?;
            order.delivery_fee_cents = fee;
        }
        if changes.notes.is_some() {
            order.notes = optional(changes.notes);
        }
        if let Some(eta) = changes.estimated_delivery_time {
            order.estimated_delivery_time = eta;
        }
        if changes.tracking_notes.is_some() {
            order.tracking_notes = optional(changes.tracking_notes);
        }

        (order.subtotal_cents, order.total_amount_cents) =
            self.totals(&order.items, order.delivery_fee_cents)?;

        let mut fields = store::encode_fields(&order)?;
        // Cleared optional text must overwrite the stored value.
        for key in ["notes", "tracking_notes"] {
            fields.entry(key).or_insert(serde_json::Value::Null);
        }
        order.revision = self
            .store
            .update(Order::COLLECTION, &order.id, fields, Some(order.revision))
            .await?;

        tracing::info!(
            order_id = %order.id,
            total_cents = order.total_amount_cents,
            "Order updated"
        );
        Ok(order)
    }

    /// Remove an order permanently.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.store.delete(Order::COLLECTION, id).await?;
        tracing::info!(order_id = %id, "Order deleted");
        Ok(())
    }

    /// Counts and sales for orders created today in the business timezone.
    pub async fn dashboard(&self, utc_offset: FixedOffset) -> Result<DashboardStats, AppError> {
        let now = self.clock.now();
        let since_midnight = now
            .with_timezone(&utc_offset)
            .time()
            .signed_duration_since(NaiveTime::MIN);
        let start = now - since_midnight;
        let end = start + Duration::days(1);

        let query = Query::new()
            .filter("created_at", FilterOp::Gte, start.timestamp_millis())
            .filter("created_at", FilterOp::Lt, end.timestamp_millis())
            .order_by("created_at", Direction::Desc);
        let orders: Vec<Order> = store::load_all(self.store.as_ref(), &query).await?;

        let completed_orders = orders
            .iter()
            .filter(|order| order.status == OrderStatus::Delivered)
            .count();

        Ok(DashboardStats {
            today_orders: orders.len(),
            total_sales_cents: orders
                .iter()
                .fold(0i64, |sum, order| sum.saturating_add(order.total_amount_cents)),
            pending_deliveries: orders.len() - completed_orders,
            completed_orders,
            recent_orders: orders.into_iter().take(5).map(OrderResponse::from).collect(),
        })
    }
}
