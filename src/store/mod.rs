//! Document store abstraction.
//!
//! Every entity in the service (orders, customer tokens, menu entries, staff
//! accounts, sessions) lives as a JSON document in a named collection. The
//! managers only talk to the [`DocumentStore`] trait:
//!
//! - `get` / `query` read documents, with equality and ordering predicates
//! - `insert` stores a new document and returns its generated id
//! - `update` shallow-merges a patch, optionally guarded by a revision
//! - `delete` removes a document for good
//!
//! Records are decoded into typed entities at this boundary with
//! [`Document::decode`]; nothing above the store handles raw JSON bodies.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// Named group of documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Orders,
    CustomerTokens,
    Products,
    Addons,
    Staff,
    Sessions,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Orders => "orders",
            Collection::CustomerTokens => "customer_tokens",
            Collection::Products => "products",
            Collection::Addons => "addons",
            Collection::Staff => "staff",
            Collection::Sessions => "sessions",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by a document store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend unavailable or the statement failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{collection} document {id} not found")]
    NotFound { collection: Collection, id: String },

    /// The document changed since it was read.
    #[error("{collection} document {id} was modified concurrently")]
    Conflict { collection: Collection, id: String },

    /// A stored record does not match the shape of its entity.
    #[error("{collection} document {id} is malformed: {source}")]
    Malformed {
        collection: Collection,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Raw document as held by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    /// Incremented on every successful update, starting at 1.
    pub revision: i64,
    pub data: Value,
}

/// Typed entity persisted in a collection.
///
/// The entity's own serde shape is the document body; identity and revision
/// are carried outside the body and assigned on decode.
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn assign_identity(&mut self, id: String, revision: i64);
}

impl Document {
    /// Decode the body into its typed entity.
    pub fn decode<T: Record>(self) -> Result<T, StoreError> {
        let mut record: T =
            serde_json::from_value(self.data).map_err(|source| StoreError::Malformed {
                collection: T::COLLECTION,
                id: self.id.clone(),
                source,
            })?;
        record.assign_identity(self.id, self.revision);
        Ok(record)
    }
}

/// Decode a query result, logging and skipping records that do not parse.
pub fn decode_all<T: Record>(documents: Vec<Document>) -> Vec<T> {
    documents
        .into_iter()
        .filter_map(|document| match document.decode::<T>() {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed record");
                None
            }
        })
        .collect()
}

/// Serialize an entity into a document body.
pub fn encode<T: Record>(record: &T) -> Result<Value, StoreError> {
    Ok(serde_json::to_value(record)?)
}

/// Serialize an entity into the top-level fields of its document body.
pub fn encode_fields<T: Record>(record: &T) -> Result<Map<String, Value>, StoreError> {
    match encode(record)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(StoreError::Serialization(serde::ser::Error::custom(
            "record did not serialize to a JSON object",
        ))),
    }
}

/// Build a patch object from `(field, value)` pairs.
pub fn patch<I>(fields: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    fields
        .into_iter()
        .map(|(field, value)| (field.to_string(), value))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl FilterOp {
    pub fn sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
        }
    }
}

/// Predicate on a top-level body field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: &'static str,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: &'static str,
    pub direction: Direction,
}

/// Conjunction of filters with an optional sort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: &'static str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field,
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, field: &'static str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    pub fn order_by(mut self, field: &'static str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy { field, direction });
        self
    }
}

/// Storage contract consumed by every manager.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    async fn query(&self, collection: Collection, query: &Query)
    -> Result<Vec<Document>, StoreError>;

    /// Store a new document, returning the generated id.
    async fn insert(&self, collection: Collection, data: Value) -> Result<String, StoreError>;

    /// Shallow-merge `patch` into the document body and return the new revision.
    ///
    /// With `expected_revision` set the write only lands if the stored
    /// revision still matches; otherwise it fails with
    /// [`StoreError::Conflict`].
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Map<String, Value>,
        expected_revision: Option<i64>,
    ) -> Result<i64, StoreError>;

    /// Remove a document. Fails with [`StoreError::NotFound`] if absent.
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;

    /// Cheap round-trip used by the health check.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Fetch and decode a single record.
pub async fn load<T: Record>(store: &dyn DocumentStore, id: &str) -> Result<Option<T>, StoreError> {
    store
        .get(T::COLLECTION, id)
        .await?
        .map(Document::decode)
        .transpose()
}

/// Run a query and decode the results, skipping malformed records.
pub async fn load_all<T: Record>(
    store: &dyn DocumentStore,
    query: &Query,
) -> Result<Vec<T>, StoreError> {
    tracing::debug!(collection = %T::COLLECTION, ?query, "Querying documents");
    let documents = store.query(T::COLLECTION, query).await?;
    Ok(decode_all(documents))
}

/// Generate a fresh document id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
