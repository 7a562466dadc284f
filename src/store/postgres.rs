//! Postgres-backed document store.
//!
//! All collections share one `documents` table:
//!
//! | column       | type        | notes                              |
//! |--------------|-------------|------------------------------------|
//! | `collection` | TEXT        | part of the primary key            |
//! | `id`         | TEXT        | part of the primary key            |
//! | `revision`   | BIGINT      | bumped on every update             |
//! | `body`       | JSONB       | the entity's serde shape           |
//!
//! Predicates compare `body -> field` against a JSONB literal, so numeric
//! fields (timestamps are epoch milliseconds) order numerically.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{Postgres, QueryBuilder, types::Json};

use super::{Collection, Direction, Document, DocumentStore, Query, StoreError, new_id};
use crate::db::DbPool;

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: String,
    revision: i64,
    body: Json<Value>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            revision: row.revision,
            data: row.body.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: DbPool,
}

impl PgDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE collection = $1 AND id = $2)",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, revision, body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Document::from))
    }

    async fn query(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id, revision, body FROM documents WHERE collection = ");
        builder.push_bind(collection.as_str());

        for filter in &query.filters {
            builder
                .push(" AND (body -> ")
                .push_bind(filter.field)
                .push(") ")
                .push(filter.op.sql())
                .push(" ")
                .push_bind(Json(filter.value.clone()));
        }

        match &query.order_by {
            Some(order) => {
                builder.push(" ORDER BY body -> ").push_bind(order.field);
                builder.push(match order.direction {
                    Direction::Asc => " ASC",
                    Direction::Desc => " DESC",
                });
            }
            None => {
                builder.push(" ORDER BY created_at ASC");
            }
        }

        let rows = builder
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn insert(&self, collection: Collection, data: Value) -> Result<String, StoreError> {
        let id = new_id();
        sqlx::query("INSERT INTO documents (collection, id, revision, body) VALUES ($1, $2, 1, $3)")
            .bind(collection.as_str())
            .bind(&id)
            .bind(Json(data))
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Map<String, Value>,
        expected_revision: Option<i64>,
    ) -> Result<i64, StoreError> {
        // `||` on jsonb objects replaces top-level keys, matching the
        // shallow-merge contract.
        let revision: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE documents
            SET body = body || $3,
                revision = revision + 1,
                updated_at = NOW()
            WHERE collection = $1
              AND id = $2
              AND ($4::BIGINT IS NULL OR revision = $4)
            RETURNING revision
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(Value::Object(patch)))
        .bind(expected_revision)
        .fetch_optional(&self.pool)
        .await?;

        match revision {
            Some(revision) => Ok(revision),
            None if self.exists(collection, id).await? => Err(StoreError::Conflict {
                collection,
                id: id.to_string(),
            }),
            None => Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            }),
        }
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
