//! Customer checkout through a single-use link.
//!
//! # Flow
//!
//! 1. Validate the link token
//! 2. Resolve the customer's selections into priced snapshots
//! 3. Create the order
//! 4. Consume the token at the revision seen in step 1
//!
//! If step 4 loses a race with another submission of the same link, the
//! order from step 3 is deleted again and the caller is told the link was
//! already used. A crash between steps 3 and 4 can still leave the token
//! unconsumed.

use crate::{
    error::AppError,
    models::{
        customer_token::{CustomerPrefill, CustomerToken, InvalidReason},
        order::{CreateOrderRequest, CustomerDetails, Order},
        product::MenuResponse,
    },
    services::{menu_service::Menu, order_service::OrderLifecycle, token_service::CustomerLinks},
};

/// Validate a link for display, returning its record and the orderable menu.
///
/// # Errors
///
/// `CustomerLink` with the reason the link cannot be used.
pub async fn open_link(
    links: &CustomerLinks,
    menu: &Menu,
    token: &str,
) -> Result<(CustomerToken, MenuResponse), AppError> {
    let record = usable_token(links, token).await?;
    let menu = menu.available().await?;
    Ok((record, menu))
}

async fn usable_token(links: &CustomerLinks, token: &str) -> Result<CustomerToken, AppError> {
    let validation = links.validate(token).await?;
    match (validation.valid, validation.token, validation.reason) {
        (true, Some(record), _) => Ok(record),
        (_, _, Some(reason)) => Err(AppError::CustomerLink(reason)),
        _ => Err(AppError::CustomerLink(InvalidReason::NotFound)),
    }
}

/// Blank customer fields fall back to what staff pre-filled on the link.
fn with_prefill(customer: CustomerDetails, prefill: &CustomerPrefill) -> CustomerDetails {
    let pick = |given: String, fallback: &Option<String>| {
        if given.trim().is_empty() {
            fallback.clone().unwrap_or(given)
        } else {
            given
        }
    };

    CustomerDetails {
        customer_name: pick(customer.customer_name, &prefill.customer_name),
        customer_phone: pick(customer.customer_phone, &prefill.customer_phone),
        customer_address: pick(customer.customer_address, &prefill.customer_address),
    }
}

/// Place an order through a customer link.
///
/// # Errors
///
/// - `CustomerLink`: the link is unknown, expired, or was used, including
///   by a concurrent submission
/// - `NotFound` / `Validation`: a selected product or add-on is unknown or
///   unavailable, or the order itself is invalid
pub async fn place_order(
    links: &CustomerLinks,
    menu: &Menu,
    orders: &OrderLifecycle,
    token: &str,
    request: CreateOrderRequest,
) -> Result<Order, AppError> {
    let record = usable_token(links, token).await?;
    let items = menu.snapshot_items(&request.items).await?;
    let customer = with_prefill(request.customer, &record.prefill);

    let order = orders.create(customer, items, request.notes).await?;
    bind_token(links, orders, record, order).await
}

async fn bind_token(
    links: &CustomerLinks,
    orders: &OrderLifecycle,
    record: CustomerToken,
    order: Order,
) -> Result<Order, AppError> {
    let token_id = record.id.clone();
    match links.consume_record(record, &order.id).await {
        Ok(_) => {
            tracing::info!(order_id = %order.id, token_id = %token_id, "Customer order placed");
            Ok(order)
        }
        Err(e) => {
            tracing::warn!(
                order_id = %order.id,
                token_id = %token_id,
                error = %e,
                "Customer link could not be consumed, removing order"
            );
            if let Err(cleanup) = orders.delete(&order.id).await {
                tracing::error!(order_id = %order.id, error = %cleanup, "Failed to remove orphaned order");
            }
            match e {
                AppError::Conflict(_) => Err(AppError::CustomerLink(InvalidReason::AlreadyUsed)),
                other => Err(other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::models::order::{ItemSelection, OrderStatus, Size};
    use crate::services::menu_service::tests::{extra_shot_request, latte_request, menu_with};
    use crate::services::order_service::tests::customer;
    use crate::services::pricing::Pricing;
    use crate::store::{DocumentStore, MemoryDocumentStore};
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    struct Shop {
        links: CustomerLinks,
        menu: Menu,
        orders: OrderLifecycle,
        clock: Arc<ManualClock>,
        selection: ItemSelection,
    }

    async fn shop() -> Shop {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 14, 2, 0, 0).unwrap(),
        ));
        let menu = menu_with(store.clone());
        let latte = menu.create_product(latte_request()).await.unwrap();
        let shot = menu.create_addon(extra_shot_request()).await.unwrap();

        Shop {
            links: CustomerLinks::new(store.clone(), clock.clone(), 48),
            orders: OrderLifecycle::new(store, clock.clone(), Pricing::new(1000)),
            menu,
            clock,
            selection: ItemSelection {
                product_id: latte.id,
                quantity: 2,
                size: Size::Large,
                addon_ids: vec![shot.id],
                drink_name: None,
            },
        }
    }

    fn request(shop: &Shop) -> CreateOrderRequest {
        CreateOrderRequest {
            customer: customer(),
            notes: None,
            items: vec![shop.selection.clone()],
        }
    }

    #[tokio::test]
    async fn order_through_link_consumes_it() {
        let shop = shop().await;
        let link = shop
            .links
            .issue("staff-1", CustomerPrefill::default(), None)
            .await
            .unwrap();

        let order = place_order(&shop.links, &shop.menu, &shop.orders, &link.token, request(&shop))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount_cents, 30000);
        let validation = shop.links.validate(&link.token).await.unwrap();
        assert_eq!(validation.reason, Some(InvalidReason::AlreadyUsed));
        assert_eq!(
            validation.token.unwrap().order_id.as_deref(),
            Some(order.id.as_str())
        );
    }

    #[tokio::test]
    async fn second_submission_is_rejected() {
        let shop = shop().await;
        let link = shop
            .links
            .issue("staff-1", CustomerPrefill::default(), None)
            .await
            .unwrap();
        place_order(&shop.links, &shop.menu, &shop.orders, &link.token, request(&shop))
            .await
            .unwrap();

        let err = place_order(&shop.links, &shop.menu, &shop.orders, &link.token, request(&shop))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::CustomerLink(InvalidReason::AlreadyUsed)
        ));
        assert_eq!(shop.orders.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn expired_link_places_nothing() {
        let shop = shop().await;
        let link = shop
            .links
            .issue("staff-1", CustomerPrefill::default(), Some(1))
            .await
            .unwrap();
        shop.clock.advance(Duration::hours(2));

        let err = place_order(&shop.links, &shop.menu, &shop.orders, &link.token, request(&shop))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::CustomerLink(InvalidReason::Expired)));
        assert!(shop.orders.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn losing_the_consume_race_removes_the_order() {
        let shop = shop().await;
        let link = shop
            .links
            .issue("staff-1", CustomerPrefill::default(), None)
            .await
            .unwrap();
        let seen = usable_token(&shop.links, &link.token).await.unwrap();

        // Another submission consumes the link after this one validated it.
        shop.links.consume(&link.id, "someone-else").await.unwrap();
        let items = shop.menu.snapshot_items(&[shop.selection.clone()]).await.unwrap();
        let order = shop.orders.create(customer(), items, None).await.unwrap();
        let order_id = order.id.clone();

        let err = bind_token(&shop.links, &shop.orders, seen, order)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::CustomerLink(InvalidReason::AlreadyUsed)
        ));
        assert!(shop.orders.find(&order_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn blank_fields_use_the_prefill() {
        let shop = shop().await;
        let prefill = CustomerPrefill {
            customer_name: Some("Ana Reyes".to_string()),
            customer_phone: None,
            customer_address: Some("12 Mabini St".to_string()),
        };
        let link = shop.links.issue("staff-1", prefill, None).await.unwrap();
        let mut body = request(&shop);
        body.customer.customer_name = String::new();
        body.customer.customer_address = " ".to_string();

        let order = place_order(&shop.links, &shop.menu, &shop.orders, &link.token, body)
            .await
            .unwrap();

        assert_eq!(order.customer.customer_name, "Ana Reyes");
        assert_eq!(order.customer.customer_address, "12 Mabini St");
        assert!(order.created_at <= shop.clock.now());
    }

    #[tokio::test]
    async fn open_link_returns_menu_for_valid_links_only() {
        let shop = shop().await;
        let link = shop
            .links
            .issue("staff-1", CustomerPrefill::default(), None)
            .await
            .unwrap();

        let (record, menu) = open_link(&shop.links, &shop.menu, &link.token).await.unwrap();
        assert_eq!(record.id, link.id);
        assert_eq!(menu.products.len(), 1);

        let err = open_link(&shop.links, &shop.menu, "unknown").await.unwrap_err();
        assert!(matches!(err, AppError::CustomerLink(InvalidReason::NotFound)));
    }
}
