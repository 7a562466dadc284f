//! Shared application state handed to every handler.

use std::sync::Arc;

use chrono::FixedOffset;

use crate::{
    clock::Clock,
    config::Config,
    services::{
        auth_service::AuthProvider, menu_service::Menu, order_service::OrderLifecycle,
        pricing::Pricing, token_service::CustomerLinks, tracking::Links,
    },
    store::DocumentStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub clock: Arc<dyn Clock>,
    pub auth: Arc<dyn AuthProvider>,
    pub orders: Arc<OrderLifecycle>,
    pub links: Arc<CustomerLinks>,
    pub menu: Arc<Menu>,
    pub urls: Links,
    /// Business timezone used for "today" and displayed clock times.
    pub timezone: FixedOffset,
}

impl AppState {
    /// Wire up every manager over one store and clock.
    pub fn new(
        config: &Config,
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        auth: Arc<dyn AuthProvider>,
    ) -> anyhow::Result<Self> {
        let timezone = FixedOffset::east_opt(config.business_utc_offset_hours * 3600)
            .ok_or_else(|| anyhow::anyhow!("BUSINESS_UTC_OFFSET_HOURS is out of range"))?;

        Ok(Self {
            orders: Arc::new(OrderLifecycle::new(
                store.clone(),
                clock.clone(),
                Pricing::new(config.upsize_surcharge_cents),
            )),
            links: Arc::new(CustomerLinks::new(
                store.clone(),
                clock.clone(),
                config.customer_link_ttl_hours,
            )),
            menu: Arc::new(Menu::new(store.clone(), clock.clone())),
            urls: Links::new(config.public_origin()?),
            timezone,
            store,
            clock,
            auth,
        })
    }
}
