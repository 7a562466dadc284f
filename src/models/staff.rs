//! Staff account and session models.
//!
//! Staff sign in with email and password. A session is a random bearer
//! secret handed out once at sign-in; only its SHA-256 hash is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Collection, Record};

/// Staff account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffUser {
    /// Stable uid, recorded as `created_by` on customer links.
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub revision: i64,

    /// Lower-cased at creation.
    pub email: String,

    /// Argon2 PHC string.
    pub password_hash: String,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for StaffUser {
    const COLLECTION: Collection = Collection::Staff;

    fn assign_identity(&mut self, id: String, revision: i64) {
        self.id = id;
        self.revision = revision;
    }
}

/// Stored staff session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub revision: i64,

    /// SHA-256 hash of the bearer secret (64 hex characters).
    pub token_hash: String,

    pub uid: String,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl Record for Session {
    const COLLECTION: Collection = Collection::Sessions;

    fn assign_identity(&mut self, id: String, revision: i64) {
        self.id = id;
        self.revision = revision;
    }
}

/// Request body for `POST /api/v1/auth/sign-in`.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Response for a successful sign-in. `session_token` is only shown once.
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub session_token: String,
    pub uid: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Response for `GET /api/v1/auth/me`.
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub uid: String,
    pub email: String,
}

/// Signed-in staff member, attached to authenticated requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub uid: String,
    pub email: String,
}
