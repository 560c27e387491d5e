//! 数据库基础设施
//!
//! PostgreSQL 上的文档存储：每个容器是一张 `(id TEXT PRIMARY KEY, doc JSONB)` 表。

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{
    postgres::{PgConnectOptions, PgPool, PgPoolOptions},
    Connection, PgConnection, Postgres, QueryBuilder, Row,
};
use tracing::{debug, error, info};

use super::config::{is_identifier, DatabaseConfig};
use super::store::{Document, DocumentQuery, DocumentStore, Page, PatchOperation, StoreError};

/// 维护库，用于检查和创建目标数据库
const MAINTENANCE_DATABASE: &str = "postgres";

pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// 连接到配置的数据库；数据库不存在时先创建
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let options = PgConnectOptions::from_str(&config.endpoint)?;
        let options = if config.key.is_empty() {
            options
        } else {
            options.password(&config.key)
        };

        ensure_database(&options, &config.database_name).await?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(8))
            .connect_with(options.database(&config.database_name))
            .await?;

        info!("数据库连接池已建立: {}", config.database_name);
        Ok(Self { pool })
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn ensure_database(options: &PgConnectOptions, database_name: &str) -> Result<(), sqlx::Error> {
    if !is_identifier(database_name) {
        return Err(sqlx::Error::Configuration(
            format!("invalid database name: {}", database_name).into(),
        ));
    }

    let mut conn = PgConnection::connect_with(&options.clone().database(MAINTENANCE_DATABASE)).await?;
    let exists = sqlx::query("SELECT 1 FROM pg_database WHERE datname = $1")
        .bind(database_name)
        .fetch_optional(&mut conn)
        .await?
        .is_some();

    if !exists {
        info!("创建数据库: {}", database_name);
        sqlx::query(&format!("CREATE DATABASE \"{}\"", database_name))
            .execute(&mut conn)
            .await?;
    }

    conn.close().await
}

/// PostgreSQL JSONB 文档存储
pub struct PgDocumentStore {
    pool: PgPool,
    table: String,
}

impl PgDocumentStore {
    /// 绑定到容器表，不存在时创建
    pub async fn open(pool: PgPool, container_name: &str) -> Result<Self, sqlx::Error> {
        if !is_identifier(container_name) {
            return Err(sqlx::Error::Configuration(
                format!("invalid container name: {}", container_name).into(),
            ));
        }

        let table = format!("\"{}\"", container_name);
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY, doc JSONB NOT NULL)",
            table
        ))
        .execute(&pool)
        .await?;

        info!("文档容器就绪: {}", container_name);
        Ok(Self { pool, table })
    }
}

fn fault(operation: &str, err: sqlx::Error) -> StoreError {
    error!("文档存储 {} 失败: {}", operation, err);
    StoreError::Fault(err.to_string())
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create(&self, id: &str, document: Document) -> Result<Document, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING RETURNING doc",
            self.table
        ))
        .bind(id)
        .bind(&document)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| fault("create", e))?;

        match row {
            Some(row) => {
                debug!("创建文档: {}", id);
                row.try_get("doc").map_err(|e| fault("create", e))
            }
            None => Err(StoreError::Conflict(id.to_string())),
        }
    }

    async fn read(&self, id: &str) -> Result<Document, StoreError> {
        let row = sqlx::query(&format!("SELECT doc FROM {} WHERE id = $1", self.table))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| fault("read", e))?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        row.try_get("doc").map_err(|e| fault("read", e))
    }

    async fn patch(&self, id: &str, operations: &[PatchOperation]) -> Result<Document, StoreError> {
        let replacements = operations
            .iter()
            .map(|operation| match operation {
                PatchOperation::Replace { field, value } => (field.clone(), value.clone()),
            })
            .collect::<Map<String, Value>>();

        // `||` 对 JSONB 对象做顶层合并，同名字段被替换
        let row = sqlx::query(&format!(
            "UPDATE {} SET doc = doc || $2 WHERE id = $1 RETURNING doc",
            self.table
        ))
        .bind(id)
        .bind(Value::Object(replacements))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| fault("patch", e))?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        debug!("更新文档: {} ({} 个字段)", id, operations.len());
        row.try_get("doc").map_err(|e| fault("patch", e))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", self.table))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| fault("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        debug!("删除文档: {}", id);
        Ok(())
    }

    async fn query(
        &self,
        query: &DocumentQuery,
        continuation: Option<&str>,
    ) -> Result<Page, StoreError> {
        let page_size = query.page_size.max(1);

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT id, doc FROM {} WHERE TRUE", self.table));
        for (field, value) in &query.equals {
            builder.push(" AND doc ->> ");
            builder.push_bind(field.clone());
            builder.push(" = ");
            builder.push_bind(value.clone());
        }
        if let Some(after) = continuation {
            builder.push(" AND id COLLATE \"C\" > ");
            builder.push_bind(after.to_string());
        }
        // 多取一条用于判断是否还有下一页
        builder.push(" ORDER BY id COLLATE \"C\" LIMIT ");
        builder.push_bind(page_size as i64 + 1);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| fault("query", e))?;

        let has_more = rows.len() > page_size;
        let mut last_id = None;
        let mut documents = Vec::with_capacity(rows.len().min(page_size));
        for row in rows.into_iter().take(page_size) {
            last_id = Some(row.try_get::<String, _>("id").map_err(|e| fault("query", e))?);
            documents.push(row.try_get::<Value, _>("doc").map_err(|e| fault("query", e))?);
        }

        Ok(Page {
            documents,
            continuation: if has_more { last_id } else { None },
        })
    }
}
