//! 用户业务服务
//!
//! [`UserService`] 是路由层依赖的能力集合；[`DocumentUserService`] 把每个能力
//! 翻译成一次文档存储调用，并把存储错误转换成失败信封。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::model::{validation_message, CreateUserRequest, UpdateUserRequest, User, UserFilter};
use crate::core::response::ApiResponse;
use crate::infrastructure::store::{DocumentQuery, DocumentStore, PatchOperation, StoreError};

/// 未配置时的列表单页大小
pub const DEFAULT_PAGE_SIZE: usize = 100;

#[async_trait]
pub trait UserService: Send + Sync {
    async fn add(&self, request: CreateUserRequest) -> ApiResponse<User>;

    async fn get_by_id(&self, id: &str) -> ApiResponse<User>;

    /// 列出全部匹配的用户；没有匹配时返回空列表，仍然视为成功
    async fn list(&self, filter: &UserFilter) -> ApiResponse<Vec<User>>;

    async fn update(&self, id: &str, request: UpdateUserRequest) -> ApiResponse<User>;

    async fn delete(&self, id: &str) -> ApiResponse<()>;
}

/// 基于文档存储的用户服务
///
/// 所有操作都以 `id` 作为查找键和分区键。
#[derive(Clone)]
pub struct DocumentUserService {
    store: Arc<dyn DocumentStore>,
    page_size: usize,
}

impl DocumentUserService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

fn decode_user(document: Value) -> Result<User, StoreError> {
    serde_json::from_value(document)
        .map_err(|e| StoreError::Fault(format!("malformed user document: {}", e)))
}

fn encode_user(user: &User) -> Result<Value, StoreError> {
    serde_json::to_value(user).map_err(|e| StoreError::Fault(e.to_string()))
}

/// 更新请求中真正需要替换的字段
fn patch_operations(request: UpdateUserRequest) -> Result<Vec<PatchOperation>, StoreError> {
    let mut operations = Vec::new();

    let name = request.name.trim();
    if !name.is_empty() {
        operations.push(PatchOperation::replace("name", name));
    }

    let email = request.email.trim();
    if !email.is_empty() {
        operations.push(PatchOperation::replace("email", email));
    }

    if let Some(api_keys) = request.api_keys.filter(|keys| !keys.is_empty()) {
        let value = serde_json::to_value(api_keys).map_err(|e| StoreError::Fault(e.to_string()))?;
        operations.push(PatchOperation::replace("apiKeys", value));
    }

    Ok(operations)
}

fn not_found_message(id: &str) -> String {
    format!("User with id '{}' was not found", id)
}

#[async_trait]
impl UserService for DocumentUserService {
    async fn add(&self, request: CreateUserRequest) -> ApiResponse<User> {
        if let Err(errors) = request.validate() {
            return ApiResponse::failure(validation_message(&errors));
        }

        let id = request
            .supplied_id()
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let user = request.into_user(id);

        let result = match encode_user(&user) {
            Ok(document) => self.store.create(&user.id, document).await,
            Err(e) => Err(e),
        };

        match result.and_then(decode_user) {
            Ok(created) => {
                info!("创建用户: {}", created.id);
                ApiResponse::success(created, "Created")
            }
            Err(e) => {
                warn!("创建用户失败: {}", e);
                ApiResponse::failure(e.to_string())
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> ApiResponse<User> {
        match self.store.read(id).await.and_then(decode_user) {
            Ok(user) => ApiResponse::success(user, "User fetched successfully"),
            Err(StoreError::NotFound(_)) => ApiResponse::failure(not_found_message(id)),
            Err(e) => {
                warn!("读取用户 {} 失败: {}", id, e);
                ApiResponse::failure(e.to_string())
            }
        }
    }

    async fn list(&self, filter: &UserFilter) -> ApiResponse<Vec<User>> {
        let mut query = DocumentQuery::all(self.page_size);
        if let Some(user_id) = &filter.user_id {
            query = query.with_equal("userId", user_id.as_str());
        }
        if let Some(email) = &filter.email {
            query = query.with_equal("email", email.as_str());
        }

        let mut users = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let page = match self.store.query(&query, continuation.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("列出用户失败（已读取 {} 条）: {}", users.len(), e);
                    return ApiResponse::failure(e.to_string());
                }
            };

            for document in page.documents {
                match decode_user(document) {
                    Ok(user) => users.push(user),
                    Err(e) => return ApiResponse::failure(e.to_string()),
                }
            }

            match page.continuation {
                Some(next) => continuation = Some(next),
                None => break,
            }
        }

        ApiResponse::success(users, "Users fetched successfully")
    }

    async fn update(&self, id: &str, request: UpdateUserRequest) -> ApiResponse<User> {
        let operations = match patch_operations(request) {
            Ok(operations) => operations,
            Err(e) => return ApiResponse::failure(e.to_string()),
        };

        match self.store.patch(id, &operations).await.and_then(decode_user) {
            Ok(user) => {
                info!("更新用户: {} ({} 个字段)", id, operations.len());
                ApiResponse::success(user, "User updated successfully")
            }
            Err(StoreError::NotFound(_)) => ApiResponse::failure(not_found_message(id)),
            Err(e) => {
                warn!("更新用户 {} 失败: {}", id, e);
                ApiResponse::failure(e.to_string())
            }
        }
    }

    async fn delete(&self, id: &str) -> ApiResponse<()> {
        match self.store.delete(id).await {
            Ok(()) => {
                info!("删除用户: {}", id);
                ApiResponse::success_empty("User deleted successfully")
            }
            Err(StoreError::NotFound(_)) => ApiResponse::failure(not_found_message(id)),
            Err(e) => {
                warn!("删除用户 {} 失败: {}", id, e);
                ApiResponse::failure(e.to_string())
            }
        }
    }
}
