//! In-process document store.
//!
//! Used when no database is configured and by the unit tests. Holds the
//! same revision semantics as the Postgres backend.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{
    Collection, Direction, Document, DocumentStore, Filter, FilterOp, Query, StoreError, new_id,
};

#[derive(Debug, Clone)]
struct Entry {
    revision: i64,
    // Insertion sequence keeps unordered queries stable.
    seq: u64,
    body: Value,
}

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<(Collection, String), Entry>,
    next_seq: u64,
}

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    inner: RwLock<Inner>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compare two JSON scalars of the same kind.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn matches(body: &Value, filter: &Filter) -> bool {
    let Some(field) = body.get(filter.field) else {
        return false;
    };
    if filter.op == FilterOp::Eq {
        return *field == filter.value;
    }
    match compare(field, &filter.value) {
        Some(ordering) => match filter.op {
            FilterOp::Lt => ordering == Ordering::Less,
            FilterOp::Lte => ordering != Ordering::Greater,
            FilterOp::Gt => ordering == Ordering::Greater,
            FilterOp::Gte => ordering != Ordering::Less,
            FilterOp::Eq => ordering == Ordering::Equal,
        },
        None => false,
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .get(&(collection, id.to_string()))
            .map(|entry| Document {
                id: id.to_string(),
                revision: entry.revision,
                data: entry.body.clone(),
            }))
    }

    async fn query(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        let inner = self.inner.read().await;
        let mut hits: Vec<(&String, &Entry)> = inner
            .documents
            .iter()
            .filter(|((c, _), entry)| {
                *c == collection && query.filters.iter().all(|f| matches(&entry.body, f))
            })
            .map(|((_, id), entry)| (id, entry))
            .collect();

        hits.sort_by_key(|(_, entry)| entry.seq);
        if let Some(order) = &query.order_by {
            hits.sort_by(|(_, a), (_, b)| {
                let ordering = match (a.body.get(order.field), b.body.get(order.field)) {
                    (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        Ok(hits
            .into_iter()
            .map(|(id, entry)| Document {
                id: id.clone(),
                revision: entry.revision,
                data: entry.body.clone(),
            })
            .collect())
    }

    async fn insert(&self, collection: Collection, data: Value) -> Result<String, StoreError> {
        let mut inner = self.inner.write().await;
        let id = new_id();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.documents.insert(
            (collection, id.clone()),
            Entry {
                revision: 1,
                seq,
                body: data,
            },
        );
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Map<String, Value>,
        expected_revision: Option<i64>,
    ) -> Result<i64, StoreError> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .documents
            .get_mut(&(collection, id.to_string()))
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })?;

        if expected_revision.is_some_and(|expected| expected != entry.revision) {
            return Err(StoreError::Conflict {
                collection,
                id: id.to_string(),
            });
        }

        match &mut entry.body {
            Value::Object(body) => body.extend(patch),
            other => *other = Value::Object(patch),
        }
        entry.revision += 1;
        Ok(entry.revision)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .documents
            .remove(&(collection, id.to_string()))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::patch;
    use serde_json::json;

    #[tokio::test]
    async fn update_merges_top_level_fields_and_bumps_revision() {
        let store = MemoryDocumentStore::new();
        let id = store
            .insert(Collection::Orders, json!({"status": "pending", "notes": "x"}))
            .await
            .unwrap();

        let revision = store
            .update(
                Collection::Orders,
                &id,
                patch([("status", json!("preparing"))]),
                Some(1),
            )
            .await
            .unwrap();

        assert_eq!(revision, 2);
        let doc = store.get(Collection::Orders, &id).await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"status": "preparing", "notes": "x"}));
    }

    #[tokio::test]
    async fn stale_revision_is_a_conflict() {
        let store = MemoryDocumentStore::new();
        let id = store
            .insert(Collection::Orders, json!({"status": "pending"}))
            .await
            .unwrap();
        store
            .update(Collection::Orders, &id, Map::new(), Some(1))
            .await
            .unwrap();

        let err = store
            .update(Collection::Orders, &id, Map::new(), Some(1))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn missing_documents_are_not_found() {
        let store = MemoryDocumentStore::new();

        let update = store
            .update(Collection::Orders, "nope", Map::new(), None)
            .await
            .unwrap_err();
        let delete = store.delete(Collection::Orders, "nope").await.unwrap_err();

        assert!(matches!(update, StoreError::NotFound { .. }));
        assert!(matches!(delete, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn query_filters_and_orders() {
        let store = MemoryDocumentStore::new();
        for (n, used) in [(3, false), (1, false), (2, true), (5, false)] {
            store
                .insert(Collection::CustomerTokens, json!({"n": n, "is_used": used}))
                .await
                .unwrap();
        }
        store
            .insert(Collection::Orders, json!({"n": 4, "is_used": false}))
            .await
            .unwrap();

        let query = Query::new()
            .eq("is_used", false)
            .filter("n", FilterOp::Gt, 1)
            .order_by("n", Direction::Desc);
        let found = store
            .query(Collection::CustomerTokens, &query)
            .await
            .unwrap();

        let ns: Vec<i64> = found.iter().map(|d| d.data["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![5, 3]);
    }
}
