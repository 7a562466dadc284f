//! Customer link tokens - single-use, time-boxed order links.
//!
//! # Flow
//!
//! 1. Staff `issue` a token; the raw value becomes `<origin>/customer/<token>`
//! 2. The customer's page calls `validate` with the raw value
//! 3. Once the order is stored, `consume` binds the token to it
//!
//! # Security
//!
//! - Token values carry 128 bits of randomness and no structure
//! - Lookups are exact equality on the token value; there is no listing or
//!   prefix search reachable without staff authentication
//! - The internal record id is never part of a customer-facing link

use std::sync::Arc;

use chrono::Duration;
use serde_json::json;

use crate::{
    clock::Clock,
    error::AppError,
    models::customer_token::{CustomerPrefill, CustomerToken, InvalidReason, TokenValidation},
    services::order_service::optional,
    store::{self, Direction, DocumentStore, FilterOp, Query, Record, patch},
};

pub struct CustomerLinks {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    default_ttl_hours: u32,
}

/// Generate an opaque token value (16 random bytes = 32 hex chars).
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

impl CustomerLinks {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, default_ttl_hours: u32) -> Self {
        Self {
            store,
            clock,
            default_ttl_hours,
        }
    }

    /// Issue a new unused token expiring `ttl_hours` from now.
    ///
    /// The returned record's `token` is the only value that should leave
    /// the staff side.
    pub async fn issue(
        &self,
        created_by: &str,
        prefill: CustomerPrefill,
        ttl_hours: Option<u32>,
    ) -> Result<CustomerToken, AppError> {
        let ttl_hours = ttl_hours.unwrap_or(self.default_ttl_hours);
        let now = self.clock.now();
        let expires_at = Duration::try_hours(i64::from(ttl_hours))
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| AppError::validation("ttl_hours is too large"))?;

        let mut record = CustomerToken {
            id: String::new(),
            revision: 0,
            token: generate_token(),
            prefill: CustomerPrefill {
                customer_name: optional(prefill.customer_name),
                customer_phone: optional(prefill.customer_phone),
                customer_address: optional(prefill.customer_address),
            },
            created_at: now,
            expires_at,
            created_by: created_by.to_string(),
            is_used: false,
            used_at: None,
            order_id: None,
        };

        let id = self
            .store
            .insert(CustomerToken::COLLECTION, store::encode(&record)?)
            .await?;
        record.assign_identity(id, 1);

        tracing::info!(
            token_id = %record.id,
            created_by = %record.created_by,
            ttl_hours,
            "Customer link issued"
        );
        Ok(record)
    }

    /// Check whether a raw token value can still be used.
    ///
    /// First match wins: unknown, already used, expired (`expires_at <= now`),
    /// otherwise valid.
    pub async fn validate(&self, token: &str) -> Result<TokenValidation, AppError> {
        let query = Query::new().eq("token", token);
        let record = store::load_all::<CustomerToken>(self.store.as_ref(), &query)
            .await?
            .into_iter()
            .next();

        let Some(record) = record else {
            return Ok(TokenValidation::invalid(InvalidReason::NotFound, None));
        };
        if record.is_used {
            return Ok(TokenValidation::invalid(InvalidReason::AlreadyUsed, Some(record)));
        }
        if record.expires_at <= self.clock.now() {
            return Ok(TokenValidation::invalid(InvalidReason::Expired, Some(record)));
        }

        Ok(TokenValidation::valid(record))
    }

    /// Mark the token record as used by `order_id`.
    ///
    /// # Errors
    ///
    /// - `NotFound`: the record no longer exists
    /// - `Conflict`: the token was consumed by someone else first
    pub async fn consume(&self, token_id: &str, order_id: &str) -> Result<CustomerToken, AppError> {
        let record = store::load::<CustomerToken>(self.store.as_ref(), token_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Customer link {token_id}")))?;

        self.consume_record(record, order_id).await
    }

    /// Consume a record as it was read, failing if it changed since.
    pub async fn consume_record(
        &self,
        mut record: CustomerToken,
        order_id: &str,
    ) -> Result<CustomerToken, AppError> {
        if record.is_used {
            return Err(AppError::Conflict(format!(
                "Customer link was already used for order {}",
                record.order_id.as_deref().unwrap_or("unknown")
            )));
        }

        let now = self.clock.now();
        let changes = patch([
            ("is_used", json!(true)),
            ("used_at", json!(now.timestamp_millis())),
            ("order_id", json!(order_id)),
        ]);
        record.revision = self
            .store
            .update(
                CustomerToken::COLLECTION,
                &record.id,
                changes,
                Some(record.revision),
            )
            .await?;
        record.is_used = true;
        record.used_at = Some(now);
        record.order_id = Some(order_id.to_string());

        tracing::info!(token_id = %record.id, order_id, "Customer link consumed");
        Ok(record)
    }

    /// Unused, unexpired tokens, newest first, optionally for one issuer.
    pub async fn list_active(&self, created_by: Option<&str>) -> Result<Vec<CustomerToken>, AppError> {
        let mut query = Query::new()
            .eq("is_used", false)
            .filter("expires_at", FilterOp::Gt, self.clock.now().timestamp_millis())
            .order_by("created_at", Direction::Desc);
        if let Some(created_by) = created_by {
            query = query.eq("created_by", created_by);
        }

        Ok(store::load_all(self.store.as_ref(), &query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryDocumentStore;
    use chrono::{TimeZone, Utc};

    fn setup() -> (CustomerLinks, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 14, 8, 0, 0).unwrap(),
        ));
        let links = CustomerLinks::new(Arc::new(MemoryDocumentStore::new()), clock.clone(), 48);
        (links, clock)
    }

    #[tokio::test]
    async fn issued_token_is_opaque_and_unused() {
        let (links, clock) = setup();
        let prefill = CustomerPrefill {
            customer_name: Some(" Ana ".to_string()),
            customer_phone: Some("".to_string()),
            customer_address: None,
        };

        let record = links.issue("staff-1", prefill, None).await.unwrap();

        assert_eq!(record.token.len(), 32);
        assert!(record.token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(record.token, record.id);
        assert!(!record.is_used);
        assert_eq!(record.expires_at, clock.now() + Duration::hours(48));
        assert_eq!(record.prefill.customer_name.as_deref(), Some("Ana"));
        assert_eq!(record.prefill.customer_phone, None);
    }

    #[tokio::test]
    async fn ttl_past_the_calendar_is_rejected() {
        let (links, _) = setup();

        let err = links
            .issue("staff-1", CustomerPrefill::default(), Some(u32::MAX))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(links.list_active(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn tokens_are_unique() {
        let (links, _) = setup();
        let a = links
            .issue("staff-1", CustomerPrefill::default(), None)
            .await
            .unwrap();
        let b = links
            .issue("staff-1", CustomerPrefill::default(), None)
            .await
            .unwrap();

        assert_ne!(a.token, b.token);
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let (links, _) = setup();

        let result = links.validate("deadbeef").await.unwrap();

        assert_eq!(
            result,
            TokenValidation {
                valid: false,
                token: None,
                reason: Some(InvalidReason::NotFound),
            }
        );
    }

    #[tokio::test]
    async fn valid_until_ttl_then_expired() {
        let (links, clock) = setup();
        let record = links
            .issue("staff-1", CustomerPrefill::default(), Some(48))
            .await
            .unwrap();

        let fresh = links.validate(&record.token).await.unwrap();
        assert!(fresh.valid);
        assert_eq!(fresh.reason, None);

        clock.advance(Duration::hours(49));
        let stale = links.validate(&record.token).await.unwrap();
        assert!(!stale.valid);
        assert_eq!(stale.reason, Some(InvalidReason::Expired));
        assert_eq!(stale.token.map(|t| t.id), Some(record.id));
    }

    #[tokio::test]
    async fn zero_ttl_is_expired_immediately() {
        let (links, _) = setup();
        let record = links
            .issue("staff-1", CustomerPrefill::default(), Some(0))
            .await
            .unwrap();

        let result = links.validate(&record.token).await.unwrap();

        assert!(!result.valid);
        assert_eq!(result.reason, Some(InvalidReason::Expired));
    }

    #[tokio::test]
    async fn consumed_token_reports_already_used_before_expiry() {
        let (links, clock) = setup();
        let record = links
            .issue("staff-1", CustomerPrefill::default(), Some(1))
            .await
            .unwrap();

        let consumed = links.consume(&record.id, "order-9").await.unwrap();
        assert!(consumed.is_used);
        assert_eq!(consumed.used_at, Some(clock.now()));
        assert_eq!(consumed.order_id.as_deref(), Some("order-9"));

        let result = links.validate(&record.token).await.unwrap();
        assert_eq!(result.reason, Some(InvalidReason::AlreadyUsed));
        let stored = result.token.unwrap();
        assert!(stored.is_used && stored.used_at.is_some() && stored.order_id.is_some());

        // Used takes precedence over expired.
        clock.advance(Duration::hours(2));
        let result = links.validate(&record.token).await.unwrap();
        assert_eq!(result.reason, Some(InvalidReason::AlreadyUsed));
    }

    #[tokio::test]
    async fn consume_missing_record_is_not_found() {
        let (links, _) = setup();

        let err = links.consume("missing", "order-1").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn second_consumer_of_same_read_conflicts() {
        let (links, _) = setup();
        let record = links
            .issue("staff-1", CustomerPrefill::default(), None)
            .await
            .unwrap();
        let validation = links.validate(&record.token).await.unwrap();
        let seen_by_a = validation.token.clone().unwrap();
        let seen_by_b = validation.token.unwrap();

        links.consume_record(seen_by_a, "order-a").await.unwrap();
        let err = links.consume_record(seen_by_b, "order-b").await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        let err = links.consume(&record.id, "order-c").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_active_skips_used_and_expired_and_scopes_by_issuer() {
        let (links, clock) = setup();
        let short = links
            .issue("staff-1", CustomerPrefill::default(), Some(1))
            .await
            .unwrap();
        let used = links
            .issue("staff-1", CustomerPrefill::default(), None)
            .await
            .unwrap();
        let mine = links
            .issue("staff-1", CustomerPrefill::default(), None)
            .await
            .unwrap();
        clock.advance(Duration::minutes(5));
        let theirs = links
            .issue("staff-2", CustomerPrefill::default(), None)
            .await
            .unwrap();
        links.consume(&used.id, "order-1").await.unwrap();
        clock.advance(Duration::hours(1));

        let all: Vec<String> = links
            .list_active(None)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(all, vec![theirs.id.clone(), mine.id.clone()]);
        assert!(!all.contains(&short.id));

        let scoped = links.list_active(Some("staff-1")).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].id, mine.id);
    }
}
