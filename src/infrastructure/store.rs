//! 文档存储端口
//!
//! 外部文档数据库的能力集合：按键读取、按键删除、按字段替换、
//! 创建、带分页的条件查询。每个方法对应一次远程调用。

use async_trait::async_trait;
use serde_json::Value;

/// 存储中的一条文档（JSON 对象）
pub type Document = Value;

/// 存储层错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("document with id '{0}' was not found")]
    NotFound(String),
    #[error("document with id '{0}' already exists")]
    Conflict(String),
    #[error("document store fault: {0}")]
    Fault(String),
}

/// 顶层字段替换操作
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOperation {
    Replace { field: String, value: Value },
}

impl PatchOperation {
    pub fn replace(field: impl Into<String>, value: impl Into<Value>) -> Self {
        PatchOperation::Replace {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// 结构化查询：字段等值过滤 + 页大小
///
/// 字段名和值都作为绑定参数传给存储，从不拼接进查询文本。
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    pub equals: Vec<(String, String)>,
    pub page_size: usize,
}

impl DocumentQuery {
    /// 查询全部文档
    pub fn all(page_size: usize) -> Self {
        Self {
            equals: Vec::new(),
            page_size,
        }
    }

    pub fn with_equal(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }

    /// 文档是否满足全部等值条件（内存实现使用）
    pub fn matches(&self, document: &Document) -> bool {
        self.equals.iter().all(|(field, expected)| {
            document
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|actual| actual == expected)
        })
    }
}

/// 一页查询结果
///
/// `continuation` 为下一页的起点（上一页最后一个 id），`None` 表示已到末尾。
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub documents: Vec<Document>,
    pub continuation: Option<String>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 以 `id` 为键创建文档；键已存在时返回 [`StoreError::Conflict`]
    async fn create(&self, id: &str, document: Document) -> Result<Document, StoreError>;

    async fn read(&self, id: &str) -> Result<Document, StoreError>;

    /// 原子地替换顶层字段并返回更新后的文档
    async fn patch(&self, id: &str, operations: &[PatchOperation]) -> Result<Document, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// 读取一页按 id 排序的结果
    async fn query(
        &self,
        query: &DocumentQuery,
        continuation: Option<&str>,
    ) -> Result<Page, StoreError>;
}
