//! Staff authentication.
//!
//! # Security Model
//!
//! - Passwords are stored as Argon2 PHC strings, never in plain text
//! - A sign-in hands out a random 256-bit session secret exactly once
//! - Only the SHA-256 hash of that secret is stored, so a leaked document
//!   store cannot be replayed as bearer tokens
//! - Unknown email and wrong password are indistinguishable to the caller

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use sha2::{Digest, Sha256};

use crate::{
    clock::Clock,
    error::AppError,
    models::staff::{AuthContext, Session, SignInResponse, StaffUser},
    store::{self, DocumentStore, Query, Record, StoreError},
};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Missing, unknown, or expired session.
    #[error("Missing or invalid session")]
    Unauthenticated,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Session lifetime of {0} hours is out of range")]
    SessionTtl(u32),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Identity backend used by the HTTP layer.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange credentials for a new session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResponse, AuthError>;

    /// Resolve a bearer session secret to the signed-in staff member.
    async fn current_user(&self, session_token: &str) -> Result<AuthContext, AuthError>;

    /// End the session. The secret stops working immediately.
    async fn sign_out(&self, session_token: &str) -> Result<(), AuthError>;
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;
    use argon2::{Argon2, PasswordHasher};
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// SHA-256 of a session secret as lowercase hex.
fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Auth provider backed by the document store.
pub struct StoreAuthProvider {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    session_ttl_hours: u32,
}

impl StoreAuthProvider {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, session_ttl_hours: u32) -> Self {
        Self {
            store,
            clock,
            session_ttl_hours,
        }
    }

    async fn find_staff(&self, email: &str) -> Result<Option<StaffUser>, StoreError> {
        let query = Query::new().eq("email", email);
        Ok(store::load_all::<StaffUser>(self.store.as_ref(), &query)
            .await?
            .into_iter()
            .next())
    }

    async fn find_session(&self, session_token: &str) -> Result<Option<Session>, StoreError> {
        let query = Query::new().eq("token_hash", hash_session_token(session_token));
        Ok(store::load_all::<Session>(self.store.as_ref(), &query)
            .await?
            .into_iter()
            .next())
    }

    /// Create a staff account.
    ///
    /// # Errors
    ///
    /// - `Validation`: malformed email or a password shorter than 8 characters
    /// - `Conflict`: the email is already registered
    pub async fn create_staff(&self, email: &str, password: &str) -> Result<StaffUser, AppError> {
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(AppError::validation("A valid email is required"));
        }
        if password.chars().count() < 8 {
            return Err(AppError::validation(
                "Password must be at least 8 characters",
            ));
        }
        if self.find_staff(&email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Staff account {email} already exists"
            )));
        }

        let mut staff = StaffUser {
            id: String::new(),
            revision: 0,
            email,
            password_hash: hash_password(password)?,
            created_at: self.clock.now(),
        };
        let id = self
            .store
            .insert(StaffUser::COLLECTION, store::encode(&staff)?)
            .await?;
        staff.assign_identity(id, 1);

        tracing::info!(uid = %staff.id, email = %staff.email, "Staff account created");
        Ok(staff)
    }

    /// Seed a staff account at startup unless it already exists.
    pub async fn ensure_staff(&self, email: &str, password: &str) -> Result<(), AppError> {
        if self.find_staff(&normalize_email(email)).await?.is_some() {
            tracing::debug!("Bootstrap staff account already present");
            return Ok(());
        }
        self.create_staff(email, password).await.map(|_| ())
    }
}

#[async_trait]
impl AuthProvider for StoreAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResponse, AuthError> {
        let staff = self
            .find_staff(&normalize_email(email))
            .await?
            .filter(|staff| verify_password(password, &staff.password_hash))
            .ok_or(AuthError::InvalidCredentials)?;

        let now = self.clock.now();
        let expires_at = Duration::try_hours(i64::from(self.session_ttl_hours))
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(AuthError::SessionTtl(self.session_ttl_hours))?;

        let secret = hex::encode(rand::random::<[u8; 32]>());
        let session = Session {
            id: String::new(),
            revision: 0,
            token_hash: hash_session_token(&secret),
            uid: staff.id.clone(),
            created_at: now,
            expires_at,
        };
        self.store
            .insert(Session::COLLECTION, store::encode(&session)?)
            .await?;

        tracing::info!(uid = %staff.id, "Staff signed in");
        Ok(SignInResponse {
            session_token: secret,
            uid: staff.id,
            email: staff.email,
            expires_at: session.expires_at,
        })
    }

    async fn current_user(&self, session_token: &str) -> Result<AuthContext, AuthError> {
        let session = self
            .find_session(session_token)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        if session.expires_at <= self.clock.now() {
            if let Err(e) = self.store.delete(Session::COLLECTION, &session.id).await {
                tracing::warn!(error = %e, "Failed to remove expired session");
            }
            return Err(AuthError::Unauthenticated);
        }

        let staff = store::load::<StaffUser>(self.store.as_ref(), &session.uid)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        Ok(AuthContext {
            uid: staff.id,
            email: staff.email,
        })
    }

    async fn sign_out(&self, session_token: &str) -> Result<(), AuthError> {
        let session = self
            .find_session(session_token)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        self.store.delete(Session::COLLECTION, &session.id).await?;
        tracing::info!(uid = %session.uid, "Staff signed out");
        Ok(())
    }
}
