//! # 用户 CRUD 门面
//!
//! 在文档数据库之上提供用户的增删改查 HTTP 接口，所有操作返回统一信封：
//! - `app`：模型、服务、处理器、路由与 API 文档
//! - `core`：响应信封、错误处理、中间件
//! - `infrastructure`：配置、日志、文档存储（PostgreSQL / 内存）

pub mod app;
pub mod core;
pub mod infrastructure;

pub use app::router;
pub use app::user::handler::AppState;
pub use app::user::service::{DocumentUserService, UserService};
pub use crate::core::response::ApiResponse;
