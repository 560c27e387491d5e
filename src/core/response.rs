//! 核心响应处理模块
//!
//! 所有用户操作都返回统一的 [`ApiResponse`] 信封，无论成功还是失败。

use serde::{Deserialize, Serialize};

/// API 响应信封
///
/// `result` 仅在成功时存在；删除操作成功时也没有结果。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub result: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(result: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            result: Some(result),
        }
    }

    /// 成功但没有结果负载（删除）
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            result: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            result: None,
        }
    }
}
