//! 用户处理器
//!
//! 把信封映射为 HTTP 状态码；响应体始终是信封本身。

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
};

use super::{
    model::{CreateUserRequest, UpdateUserRequest, User, UserFilter},
    service::UserService,
};
use crate::app::docs::{EmptyEnvelope, UserEnvelope, UserListEnvelope};
use crate::core::{error::CoreError, response::ApiResponse};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserService>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserService>) -> Self {
        Self { users }
    }
}

type EnvelopeResponse<T> = (StatusCode, Json<ApiResponse<T>>);

fn respond<T>(envelope: ApiResponse<T>, failure: StatusCode) -> EnvelopeResponse<T> {
    let status = if envelope.success {
        StatusCode::OK
    } else {
        failure
    };
    (status, Json(envelope))
}

/// 创建用户
#[utoipa::path(
    post,
    path = "/user",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "用户已创建", body = UserEnvelope),
        (status = 400, description = "校验失败、id 重复或存储故障", body = UserEnvelope)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<EnvelopeResponse<User>, CoreError> {
    let Json(request) = payload?;
    let envelope = state.users.add(request).await;
    Ok(respond(envelope, StatusCode::BAD_REQUEST))
}

/// 获取用户列表
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(UserFilter),
    responses(
        (status = 200, description = "匹配的全部用户（可能为空）", body = UserListEnvelope),
        (status = 500, description = "存储故障", body = UserListEnvelope)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    filter: Result<Query<UserFilter>, QueryRejection>,
) -> Result<EnvelopeResponse<Vec<User>>, CoreError> {
    let Query(filter) = filter?;
    let envelope = state.users.list(&filter).await;
    Ok(respond(envelope, StatusCode::INTERNAL_SERVER_ERROR))
}

/// 获取特定用户
#[utoipa::path(
    get,
    path = "/user/{id}",
    tag = "users",
    params(("id" = String, Path, description = "用户 id")),
    responses(
        (status = 200, description = "找到用户", body = UserEnvelope),
        (status = 404, description = "用户不存在", body = UserEnvelope)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<EnvelopeResponse<User>, CoreError> {
    let Path(id) = id?;
    let envelope = state.users.get_by_id(&id).await;
    Ok(respond(envelope, StatusCode::NOT_FOUND))
}

/// 更新用户
#[utoipa::path(
    put,
    path = "/user/{id}",
    tag = "users",
    params(("id" = String, Path, description = "用户 id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "用户已更新", body = UserEnvelope),
        (status = 400, description = "用户不存在或存储故障", body = UserEnvelope)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<EnvelopeResponse<User>, CoreError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let envelope = state.users.update(&id, request).await;
    Ok(respond(envelope, StatusCode::BAD_REQUEST))
}

/// 删除用户
#[utoipa::path(
    delete,
    path = "/user/{id}",
    tag = "users",
    params(("id" = String, Path, description = "用户 id")),
    responses(
        (status = 200, description = "用户已删除", body = EmptyEnvelope),
        (status = 400, description = "用户不存在或存储故障", body = EmptyEnvelope)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<EnvelopeResponse<()>, CoreError> {
    let Path(id) = id?;
    let envelope = state.users.delete(&id).await;
    Ok(respond(envelope, StatusCode::BAD_REQUEST))
}
