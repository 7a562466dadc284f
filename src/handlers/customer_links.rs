//! Staff endpoints for single-use customer links.
//!
//! - POST /api/v1/customer-links - Issue a link
//! - GET /api/v1/customer-links - List active links

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::customer_token::{
        ActiveLinkResponse, IssueLinkRequest, IssuedLinkResponse, ListLinksParams,
    },
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};

/// Issue a customer link on behalf of the signed-in staff member.
///
/// # Request Body
///
/// ```json
/// {
///   "customer_name": "Ana Reyes",
///   "customer_phone": "0917 123 4567",
///   "ttl_hours": 24
/// }
/// ```
///
/// Every field is optional; `ttl_hours` defaults to the configured lifetime.
///
/// # Response (201 Created)
///
/// ```json
/// {
///   "token": "9f86d081884c7d659a2feaa0c55ad015",
///   "url": "https://shop.example.ph/customer/9f86d081884c7d659a2feaa0c55ad015",
///   "expires_at": "2025-03-16T02:00:00Z"
/// }
/// ```
pub async fn issue_link(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    request: Option<Json<IssueLinkRequest>>,
) -> Result<(StatusCode, Json<IssuedLinkResponse>), AppError> {
    let Json(request) = request.unwrap_or_default();
    let record = state
        .links
        .issue(&auth.uid, request.prefill, request.ttl_hours)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(IssuedLinkResponse {
            url: state.urls.customer(&record.token),
            token: record.token,
            expires_at: record.expires_at,
        }),
    ))
}

/// Unused, unexpired links, newest first.
///
/// # Query Parameters
///
/// - `mine=true`: only links issued by the caller
pub async fn list_links(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListLinksParams>,
) -> Result<Json<Vec<ActiveLinkResponse>>, AppError> {
    let created_by = params.mine.then_some(auth.uid.as_str());
    let links = state.links.list_active(created_by).await?;

    Ok(Json(
        links
            .into_iter()
            .map(|record| ActiveLinkResponse {
                url: state.urls.customer(&record.token),
                token: record.token,
                prefill: record.prefill,
                created_by: record.created_by,
                created_at: record.created_at,
                expires_at: record.expires_at,
            })
            .collect(),
    ))
}
