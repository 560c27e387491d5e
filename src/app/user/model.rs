//! 用户数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError, ValidationErrors};

/// 持久化的用户记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// 主键，创建后不可变
    pub id: String,
    /// 逻辑所属者标识，不保证唯一
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub api_keys: Option<Vec<ApiKey>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    pub key: String,
    pub created_at: DateTime<Utc>,
    /// 为空表示永不过期
    pub expires_at: Option<DateTime<Utc>>,
}

/// 创建用户请求
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// 省略或为空白时由服务生成
    #[serde(default)]
    pub id: Option<String>,
    #[validate(custom(function = "not_blank", message = "userId must not be blank"))]
    pub user_id: String,
    #[validate(custom(function = "not_blank", message = "name must not be blank"))]
    pub name: String,
    #[validate(custom(function = "not_blank", message = "email must not be blank"))]
    pub email: String,
    #[serde(default)]
    pub api_keys: Option<Vec<ApiKey>>,
}

/// 更新用户请求
///
/// 空白的 `name`/`email` 以及缺省或为空的 `apiKeys` 保持原值不变。
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub api_keys: Option<Vec<ApiKey>>,
}

/// 列表过滤条件（空条件即查询全部）
#[derive(Debug, Clone, Default, PartialEq, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserFilter {
    /// 按 `userId` 精确匹配
    pub user_id: Option<String>,
    /// 按 `email` 精确匹配
    pub email: Option<String>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

impl CreateUserRequest {
    /// 请求携带的 id；空白只用于判断是否需要生成，原值按原样保存
    pub fn supplied_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// 转换为持久化记录
    pub fn into_user(self, id: String) -> User {
        User {
            id,
            user_id: self.user_id,
            name: self.name,
            email: self.email,
            api_keys: self.api_keys,
        }
    }
}

/// 把校验错误拼成一条可读消息
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}
