//! 用户模块：模型、服务、处理器

pub mod handler;
pub mod model;
pub mod service;
