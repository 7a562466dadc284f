//! Staff sign-in and session endpoints.
//!
//! - POST /api/v1/auth/sign-in - Exchange credentials for a session token
//! - POST /api/v1/auth/sign-out - Revoke the current session
//! - GET /api/v1/auth/me - Who is signed in

use crate::{
    error::AppError,
    middleware::auth::{AuthContext, bearer_token},
    models::staff::{CurrentUserResponse, SignInRequest, SignInResponse},
    state::AppState,
};
use axum::{Extension, Json, extract::State, http::HeaderMap, http::StatusCode};

/// Sign in as staff.
///
/// # Request Body
///
/// ```json
/// { "email": "barista@example.com", "password": "..." }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: `{ "session_token", "uid", "email", "expires_at" }`.
///   The session token is only ever shown here.
/// - **Error (401)**: Unknown email or wrong password
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, AppError> {
    let session = state.auth.sign_in(&request.email, &request.password).await?;
    Ok(Json(session))
}

/// Revoke the session used for this request.
pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let session = bearer_token(&headers)?;
    state.auth.sign_out(session).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(Extension(auth): Extension<AuthContext>) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        uid: auth.uid,
        email: auth.email,
    })
}
