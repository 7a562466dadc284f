//! Staff session authentication middleware.
//!
//! This middleware intercepts every staff request to:
//! 1. Extract the session secret from the Authorization header
//! 2. Resolve it through the auth provider
//! 3. Inject the staff member's [`AuthContext`] into the request
//! 4. Reject unauthenticated requests with HTTP 401

pub use crate::models::staff::AuthContext;
use crate::{error::AppError, services::auth_service::AuthError, state::AppState};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

/// Session secret from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::Unauthenticated)
}

/// Session authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <session>` header from request
/// 2. Ask the auth provider who owns the session
/// 3. If found: inject `AuthContext` into request, call next handler
/// 4. If not found or expired: return 401 Unauthorized error
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = bearer_token(request.headers())?;
    let auth_context = state.auth.current_user(session).await?;

    // Route handlers can now extract this using Extension<AuthContext>
    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}
