//! Public customer-facing endpoints.
//!
//! These routes are reachable without a staff session. The link token and
//! the order id are the only credentials a customer holds.
//!
//! - GET /customer/{token} - Validate a link and show the menu
//! - POST /customer/{token}/orders - Place the link's one order
//! - GET /track/{order_id} - Live tracking view

use crate::{
    error::AppError,
    models::{
        order::CreateOrderRequest,
        views::{CheckoutResponse, CustomerLinkPage, TrackingView},
    },
    services::{checkout, tracking},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// Open a customer link.
///
/// # Response
///
/// - **Success (200 OK)**: pre-filled details, expiry, and the available menu
/// - **Error (404)**: unknown link
/// - **Error (410)**: link already used or expired
pub async fn open_link(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<CustomerLinkPage>, AppError> {
    let (record, menu) = checkout::open_link(&state.links, &state.menu, &token).await?;

    Ok(Json(CustomerLinkPage {
        valid: true,
        prefill: record.prefill,
        expires_at: record.expires_at,
        menu,
    }))
}

/// Place an order through a customer link.
///
/// # Request Body
///
/// Same shape as `POST /api/v1/orders`. Blank customer fields are taken
/// from the link's pre-filled details.
///
/// # Response (201 Created)
///
/// ```json
/// {
///   "order": { "id": "...", "status": "pending", "total_amount_cents": 30000, ... },
///   "tracking_url": "https://shop.example.ph/track/..."
/// }
/// ```
pub async fn place_order(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), AppError> {
    let order =
        checkout::place_order(&state.links, &state.menu, &state.orders, &token, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            tracking_url: state.urls.tracking(&order.id),
            order: order.into(),
        }),
    ))
}

/// Tracking view for one order.
pub async fn track_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<TrackingView>, AppError> {
    let order = state.orders.get(&order_id).await?;
    Ok(Json(tracking::tracking_view(
        order,
        state.clock.now(),
        state.timezone,
    )))
}
