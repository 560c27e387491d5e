//! OpenAPI 文档与 Swagger UI
//!
//! 信封在文档中用具体类型描述，领域模型不依赖泛型 schema。

use axum::response::Redirect;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use super::user::model::{ApiKey, CreateUserRequest, UpdateUserRequest, User};

pub const SWAGGER_UI_PATH: &str = "/swagger-ui";
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// 结果为单个用户的信封
#[derive(ToSchema)]
pub struct UserEnvelope {
    pub success: bool,
    pub message: String,
    pub result: Option<User>,
}

/// 结果为用户列表的信封
#[derive(ToSchema)]
pub struct UserListEnvelope {
    pub success: bool,
    pub message: String,
    pub result: Option<Vec<User>>,
}

/// 没有结果负载的信封（删除）
#[derive(ToSchema)]
pub struct EmptyEnvelope {
    pub success: bool,
    pub message: String,
    /// 始终为 null
    #[schema(value_type = Option<Object>)]
    pub result: Option<()>,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "User facade API",
        description = "CRUD operations for user records stored in a document database."
    ),
    paths(
        crate::app::user::handler::create_user,
        crate::app::user::handler::list_users,
        crate::app::user::handler::get_user,
        crate::app::user::handler::update_user,
        crate::app::user::handler::delete_user,
    ),
    components(schemas(
        User,
        ApiKey,
        CreateUserRequest,
        UpdateUserRequest,
        UserEnvelope,
        UserListEnvelope,
        EmptyEnvelope
    )),
    tags((name = "users", description = "User management"))
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new(SWAGGER_UI_PATH).url(OPENAPI_JSON_PATH, ApiDoc::openapi())
}

/// `GET /` 跳转到交互式文档
pub async fn redirect_to_docs() -> Redirect {
    Redirect::to(SWAGGER_UI_PATH)
}
