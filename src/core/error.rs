//! 核心错误处理模块
//!
//! 边界错误（请求体解析失败、存储故障）同样以失败信封的形式返回。

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use super::response::ApiResponse;

/// 核心错误类型
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    InternalServerError(String),
}

impl CoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            CoreError::BadRequest(_) => StatusCode::BAD_REQUEST,
            CoreError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("请求处理失败: {}", self);
        }

        let envelope: ApiResponse<()> = ApiResponse::failure(self.to_string());
        (status, Json(envelope)).into_response()
    }
}

// 框架层的 JSON 解析失败统一映射为 400
impl From<JsonRejection> for CoreError {
    fn from(rejection: JsonRejection) -> Self {
        CoreError::BadRequest(rejection.body_text())
    }
}

// 路径参数缺失属于路由配置错误（5xx），其余解析失败是 400
impl From<PathRejection> for CoreError {
    fn from(rejection: PathRejection) -> Self {
        if rejection.status().is_server_error() {
            CoreError::InternalServerError(rejection.body_text())
        } else {
            CoreError::BadRequest(rejection.body_text())
        }
    }
}

impl From<QueryRejection> for CoreError {
    fn from(rejection: QueryRejection) -> Self {
        CoreError::BadRequest(rejection.body_text())
    }
}
