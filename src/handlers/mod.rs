//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Calls into the services
//! 3. Returns HTTP response (JSON, status code)

/// Staff sign-in and sessions
pub mod auth;
/// Public customer link and tracking endpoints
pub mod customer;
/// Customer link issuing
pub mod customer_links;
pub mod health;
/// Products and add-ons
pub mod menu;
/// Staff order management and dashboard
pub mod orders;
