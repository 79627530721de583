use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info};

use super::{parse_numeric_key, DocumentId, DocumentStore, RawDocument, StoreError};

static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();

/// True for names that are safe to splice into SQL unquoted-equivalent.
pub(crate) fn is_sql_identifier(name: &str) -> bool {
    IDENTIFIER_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"))
        .is_match(name)
}

/// Escape LIKE wildcards so the query matches literally.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `mode.base.prim` -> `["mode", "base", "prim"]`, for the `#>>` operator.
fn json_path(field: &str) -> Vec<String> {
    field.split('.').map(str::to_string).collect()
}

fn to_key(id: &DocumentId) -> Option<i64> {
    parse_numeric_key(id).and_then(|key| i64::try_from(key).ok())
}

fn to_id(key: i64) -> DocumentId {
    DocumentId::from(key.to_string())
}

fn to_documents(rows: Vec<(i64, Json<Value>)>) -> Vec<RawDocument> {
    rows.into_iter()
        .map(|(key, Json(doc))| RawDocument {
            id: to_id(key),
            doc,
        })
        .collect()
}

/// PostgreSQL backend: each collection is a `(id BIGSERIAL, doc JSONB)`
/// table inside one schema.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: String,
    collections: Vec<String>,
}

impl PgStore {
    /// Connect and create the schema and collection tables if missing.
    pub async fn connect(
        database_url: &str,
        schema: &str,
        max_connections: u32,
        collections: &[&str],
    ) -> Result<Self, StoreError> {
        for name in std::iter::once(&schema).chain(collections) {
            if !is_sql_identifier(name) {
                return Err(StoreError::InvalidName(name.to_string()));
            }
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::query(&format!(r#"CREATE SCHEMA IF NOT EXISTS "{}""#, schema))
            .execute(&pool)
            .await?;

        for collection in collections {
            sqlx::query(&format!(
                r#"CREATE TABLE IF NOT EXISTS "{}"."{}" (
                    id BIGSERIAL PRIMARY KEY,
                    doc JSONB NOT NULL
                )"#,
                schema, collection
            ))
            .execute(&pool)
            .await?;
        }

        info!(
            "Connected to PostgreSQL (schema '{}', {} collections)",
            schema,
            collections.len()
        );

        Ok(Self {
            pool,
            schema: schema.to_string(),
            collections: collections.iter().map(|c| c.to_string()).collect(),
        })
    }

    /// Qualified table name for a known collection.
    fn table(&self, collection: &str) -> Result<String, StoreError> {
        if !self.collections.iter().any(|c| c == collection) {
            return Err(StoreError::UnknownCollection(collection.to_string()));
        }
        Ok(format!(r#""{}"."{}""#, self.schema, collection))
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn insert(&self, collection: &str, doc: Value) -> Result<DocumentId, StoreError> {
        let table = self.table(collection)?;
        let key = sqlx::query_scalar::<_, i64>(&format!(
            "INSERT INTO {} (doc) VALUES ($1) RETURNING id",
            table
        ))
        .bind(Json(doc))
        .fetch_one(&self.pool)
        .await?;

        Ok(to_id(key))
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<Value>, StoreError> {
        let table = self.table(collection)?;
        let Some(key) = to_key(id) else {
            debug!("Malformed identifier '{}' in {}", id, collection);
            return Ok(None);
        };

        let sql = format!("SELECT doc FROM {} WHERE id = $1", table);
        let doc = sqlx::query_scalar::<_, Json<Value>>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(doc.map(|Json(doc)| doc))
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError> {
        let table = self.table(collection)?;
        let sql = format!("SELECT id, doc FROM {} ORDER BY id", table);
        let rows = sqlx::query_as::<_, (i64, Json<Value>)>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(to_documents(rows))
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<RawDocument>, StoreError> {
        let table = self.table(collection)?;
        let rows = sqlx::query_as::<_, (i64, Json<Value>)>(&format!(
            "SELECT id, doc FROM {} WHERE doc #>> $1 = $2 ORDER BY id",
            table
        ))
        .bind(json_path(field))
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        Ok(to_documents(rows))
    }

    async fn search(
        &self,
        collection: &str,
        fields: &[&str],
        query: &str,
    ) -> Result<Vec<RawDocument>, StoreError> {
        let table = self.table(collection)?;
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        // $1 is the pattern, $2.. the field paths.
        let conditions = (0..fields.len())
            .map(|i| format!(r"doc #>> ${} ILIKE $1 ESCAPE '\'", i + 2))
            .collect::<Vec<_>>()
            .join(" OR ");
        let sql = format!(
            "SELECT id, doc FROM {} WHERE {} ORDER BY id",
            table, conditions
        );

        let mut statement =
            sqlx::query_as::<_, (i64, Json<Value>)>(&sql).bind(like_pattern(query));
        for field in fields {
            statement = statement.bind(json_path(field));
        }
        let rows = statement.fetch_all(&self.pool).await?;

        Ok(to_documents(rows))
    }

    async fn replace(
        &self,
        collection: &str,
        id: &DocumentId,
        expected: &Value,
        doc: Value,
    ) -> Result<bool, StoreError> {
        let table = self.table(collection)?;
        let Some(key) = to_key(id) else {
            return Ok(false);
        };

        let sql = format!("UPDATE {} SET doc = $3 WHERE id = $1 AND doc = $2", table);
        let result = sqlx::query(&sql)
            .bind(key)
            .bind(Json(expected))
            .bind(Json(doc))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError> {
        let table = self.table(collection)?;
        let Some(key) = to_key(id) else {
            return Ok(false);
        };

        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table))
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Closed PostgreSQL connection pool");
    }
}
