//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They own validation, pricing, and every read-modify-write against the
//! document store.

pub mod auth_service;
pub mod checkout;
pub mod menu_service;
pub mod order_service;
pub mod pricing;
pub mod token_service;
pub mod tracking;
