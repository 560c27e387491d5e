//! 内存文档存储
//!
//! 用于测试和本地运行；语义与 PostgreSQL 实现保持一致。

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::store::{Document, DocumentQuery, DocumentStore, Page, PatchOperation, StoreError};

#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<BTreeMap<String, Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, id: &str, document: Document) -> Result<Document, StoreError> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(id) {
            return Err(StoreError::Conflict(id.to_string()));
        }

        documents.insert(id.to_string(), document.clone());
        debug!("内存存储创建文档: {}", id);
        Ok(document)
    }

    async fn read(&self, id: &str) -> Result<Document, StoreError> {
        self.documents
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn patch(&self, id: &str, operations: &[PatchOperation]) -> Result<Document, StoreError> {
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let Some(fields) = document.as_object_mut() else {
            return Err(StoreError::Fault(format!("document '{}' is not an object", id)));
        };

        for operation in operations {
            match operation {
                PatchOperation::Replace { field, value } => {
                    fields.insert(field.clone(), value.clone());
                }
            }
        }

        debug!("内存存储更新文档: {} ({} 个字段)", id, operations.len());
        Ok(document.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        match self.documents.write().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    async fn query(
        &self,
        query: &DocumentQuery,
        continuation: Option<&str>,
    ) -> Result<Page, StoreError> {
        let documents = self.documents.read().await;
        let page_size = query.page_size.max(1);

        let mut matched = documents
            .iter()
            .filter(|(id, _)| continuation.map_or(true, |after| id.as_str() > after))
            .filter(|(_, document)| query.matches(document))
            .take(page_size + 1)
            .map(|(id, document)| (id.clone(), document.clone()))
            .collect::<Vec<_>>();

        let has_more = matched.len() > page_size;
        matched.truncate(page_size);

        let continuation = if has_more {
            matched.last().map(|(id, _)| id.clone())
        } else {
            None
        };

        Ok(Page {
            documents: matched.into_iter().map(|(_, document)| document).collect(),
            continuation,
        })
    }
}
