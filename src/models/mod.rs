//! Data models representing stored documents and API payloads.

/// Customer link tokens
pub mod customer_token;
/// Orders, items, and status history
pub mod order;
/// Products and add-ons
pub mod product;
/// Staff accounts and sessions
pub mod staff;
/// Tracking and dashboard views
pub mod views;
