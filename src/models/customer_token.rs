//! Customer link token models.
//!
//! A customer token is a single-use capability: whoever holds the link
//! `<origin>/customer/<token>` may submit exactly one order. There is no
//! customer account behind it.
//!
//! # Lifecycle
//!
//! 1. Staff issue a token (`is_used = false`), optionally pre-filling the
//!    customer's details
//! 2. The customer opens the link and the token is validated
//! 3. After the order is stored, the token is consumed: `is_used`,
//!    `used_at`, and `order_id` are set together and never change again

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Collection, Record};

/// Customer details staff can fill in ahead of time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPrefill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_address: Option<String>,
}

/// Stored customer token.
///
/// # Invariant
///
/// `is_used == true` implies both `used_at` and `order_id` are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerToken {
    /// Internal record id; never shown to customers.
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub revision: i64,

    /// Opaque random value forming the customer link.
    pub token: String,

    #[serde(flatten)]
    pub prefill: CustomerPrefill,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,

    /// Staff uid that issued the link.
    pub created_by: String,

    pub is_used: bool,

    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub used_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

impl Record for CustomerToken {
    const COLLECTION: Collection = Collection::CustomerTokens;

    fn assign_identity(&mut self, id: String, revision: i64) {
        self.id = id;
        self.revision = revision;
    }
}

/// Why a token cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidReason {
    #[serde(rename = "not found")]
    NotFound,
    #[serde(rename = "already used")]
    AlreadyUsed,
    #[serde(rename = "expired")]
    Expired,
}

impl InvalidReason {
    pub fn as_str(self) -> &'static str {
        match self {
            InvalidReason::NotFound => "not found",
            InvalidReason::AlreadyUsed => "already used",
            InvalidReason::Expired => "expired",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating a token value.
///
/// The record is returned for used and expired tokens too, so callers can
/// show what the link was for.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenValidation {
    pub valid: bool,
    pub token: Option<CustomerToken>,
    pub reason: Option<InvalidReason>,
}

impl TokenValidation {
    pub fn valid(token: CustomerToken) -> Self {
        Self {
            valid: true,
            token: Some(token),
            reason: None,
        }
    }

    pub fn invalid(reason: InvalidReason, token: Option<CustomerToken>) -> Self {
        Self {
            valid: false,
            token,
            reason: Some(reason),
        }
    }
}

/// Request body for `POST /api/v1/customer-links`.
///
/// # JSON Example
///
/// ```json
/// {
///   "customer_name": "Ana Reyes",
///   "customer_phone": "0917 123 4567",
///   "ttl_hours": 24
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct IssueLinkRequest {
    #[serde(flatten)]
    pub prefill: CustomerPrefill,
    pub ttl_hours: Option<u32>,
}

/// Response for a freshly issued link. The token value is the secret.
#[derive(Debug, Serialize)]
pub struct IssuedLinkResponse {
    pub token: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Query string for `GET /api/v1/customer-links`.
#[derive(Debug, Default, Deserialize)]
pub struct ListLinksParams {
    /// Only links issued by the caller.
    #[serde(default)]
    pub mine: bool,
}

/// Active link as listed for staff.
#[derive(Debug, Serialize)]
pub struct ActiveLinkResponse {
    pub token: String,
    pub url: String,
    #[serde(flatten)]
    pub prefill: CustomerPrefill,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
