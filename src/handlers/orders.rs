//! Staff order management HTTP handlers.
//!
//! - POST /api/v1/orders - Create an order from menu selections
//! - GET /api/v1/orders - List orders, newest first
//! - GET /api/v1/orders/{id} - Get one order
//! - PATCH /api/v1/orders/{id} - Correct details, items, fee, or tracking info
//! - DELETE /api/v1/orders/{id} - Delete an order
//! - POST /api/v1/orders/{id}/advance - Move to the next status
//! - PUT /api/v1/orders/{id}/status - Set any status
//! - GET /api/v1/dashboard - Today's aggregates

use crate::{
    error::AppError,
    models::{
        order::{
            AdvanceRequest, CreateOrderRequest, ListOrdersParams, Order, OrderResponse,
            SetStatusRequest, UpdateOrderRequest,
        },
        views::DashboardStats,
    },
    services::order_service::OrderPatch,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

/// Load an order, optionally pinned to the revision the client last saw.
///
/// With a revision the subsequent write is rejected if anyone changed the
/// order in between; without one it applies to the latest copy.
async fn load_for_write(
    state: &AppState,
    id: &str,
    revision: Option<i64>,
) -> Result<Order, AppError> {
    let order = state.orders.get(id).await?;
    match revision {
        Some(revision) if revision != order.revision => Err(AppError::Conflict(format!(
            "Order {id} is at revision {}, not {revision}; reload and try again",
            order.revision
        ))),
        _ => Ok(order),
    }
}

/// Create an order.
///
/// # Request Body
///
/// ```json
/// {
///   "customer_name": "Ana Reyes",
///   "customer_phone": "0917 123 4567",
///   "customer_address": "12 Mabini St, Makati",
///   "notes": "Gate code 1234",
///   "items": [
///     { "product_id": "5f0c...", "quantity": 2, "size": "large", "addon_ids": ["a91e..."] }
///   ]
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: The stored order in `pending`
/// - **Error (400)**: No items, blank customer fields, unavailable products
/// - **Error (404)**: Unknown product or add-on id
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let items = state.menu.snapshot_items(&request.items).await?;
    let order = state
        .orders
        .create(request.customer, items, request.notes)
        .await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// List orders newest first.
///
/// # Query Parameters
///
/// - `status` (optional): only orders currently in this status
pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let orders = state.orders.list(params.status).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state.orders.get(&id).await?;
    Ok(Json(order.into()))
}

/// Apply a staff correction.
///
/// Totals are recomputed from the resulting items and delivery fee. Item
/// selections are re-priced from the current menu.
///
/// # Response
///
/// - **Success (200 OK)**: The updated order with its new revision
/// - **Error (400)**: The correction would leave the order invalid
/// - **Error (409)**: `revision` is stale
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = load_for_write(&state, &id, request.revision).await?;
    let items = match &request.items {
        Some(selections) => Some(state.menu.snapshot_items(selections).await?),
        None => None,
    };

    let changes = OrderPatch {
        customer_name: request.customer_name,
        customer_phone: request.customer_phone,
        customer_address: request.customer_address,
        items,
        delivery_fee_cents: request.delivery_fee_cents,
        notes: request.notes,
        estimated_delivery_time: request.estimated_delivery_time,
        tracking_notes: request.tracking_notes,
    };
    let order = state.orders.update(order, changes).await?;

    Ok(Json(order.into()))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.orders.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move an order one step along the standard path.
///
/// A delivered order is returned unchanged.
pub async fn advance_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Option<Json<AdvanceRequest>>,
) -> Result<Json<OrderResponse>, AppError> {
    let Json(request) = request.unwrap_or_default();
    let order = load_for_write(&state, &id, request.revision).await?;
    let order = state.orders.advance(order, request.notes).await?;

    Ok(Json(order.into()))
}

/// Staff override: set any status, forwards or backwards.
///
/// # Request Body
///
/// ```json
/// { "status": "out-for-delivery", "notes": "Rider: Jun" }
/// ```
pub async fn set_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = load_for_write(&state, &id, request.revision).await?;
    let order = state
        .orders
        .set_status(order, request.status, request.notes)
        .await?;

    Ok(Json(order.into()))
}

pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    let stats = state.orders.dashboard(state.timezone).await?;
    Ok(Json(stats))
}
