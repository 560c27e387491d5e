//! 配置加载
//!
//! 启动时读取一次：配置文件（TOML）→ 环境变量覆盖 → 校验。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "USER_FACADE_CONFIG";

/// 服务配置结构
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP 服务配置
    pub http: HttpConfig,
    /// 文档数据库配置
    pub database: DatabaseConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// 绑定地址
    pub bind_address: String,
    /// HTTP 服务端口
    pub port: u16,
}

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// 文档数据库配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// 连接地址，例如 `postgres://user@host:5432`
    pub endpoint: String,
    /// 访问凭据（数据库密码）
    pub key: String,
    /// 逻辑数据库名
    pub database_name: String,
    /// 逻辑容器名（文档表）
    pub container_name: String,
    /// 连接池最大连接数
    pub max_connections: u32,
    /// 列表查询的单页大小
    pub page_size: usize,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Postgres,
            endpoint: "postgres://localhost:5432".to_string(),
            key: String::new(),
            database_name: "users".to_string(),
            container_name: "users".to_string(),
            max_connections: 20,
            page_size: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl HttpConfig {
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Config {
    /// 从配置文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::FileRead(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 用环境变量覆盖配置项
    ///
    /// `lookup` 通常是 `std::env::var(..).ok()`，测试中可替换。
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("DATABASE_ENDPOINT") {
            self.database.endpoint = endpoint;
        }
        if let Some(key) = lookup("DATABASE_KEY") {
            self.database.key = key;
        }
        if let Some(name) = lookup("DATABASE_NAME") {
            self.database.database_name = name;
        }
        if let Some(container) = lookup("DATABASE_CONTAINER") {
            self.database.container_name = container;
        }
        if let Some(port) = lookup("HTTP_PORT") {
            self.http.port = port
                .parse()
                .map_err(|_| ConfigError::Validation(format!("无效的 HTTP_PORT: {}", port)))?;
        }
        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证HTTP配置
        if self.http.port == 0 {
            return Err(ConfigError::Validation("HTTP端口必须大于0".to_string()));
        }
        if self.http.bind_address.is_empty() {
            return Err(ConfigError::Validation("绑定地址不能为空".to_string()));
        }

        // 验证数据库配置
        if self.database.backend == StorageBackend::Postgres {
            if self.database.endpoint.is_empty() {
                return Err(ConfigError::Validation("数据库地址不能为空".to_string()));
            }
            if self.database.max_connections == 0 {
                return Err(ConfigError::Validation("最大连接数必须大于0".to_string()));
            }
        }
        if !is_identifier(&self.database.database_name) {
            return Err(ConfigError::Validation(format!(
                "无效的数据库名: {:?}",
                self.database.database_name
            )));
        }
        if !is_identifier(&self.database.container_name) {
            return Err(ConfigError::Validation(format!(
                "无效的容器名: {:?}",
                self.database.container_name
            )));
        }
        if self.database.page_size == 0 {
            return Err(ConfigError::Validation("页大小必须大于0".to_string()));
        }

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "无效的日志级别: {}，有效值: {:?}",
                self.logging.level, valid_levels
            )));
        }

        Ok(())
    }
}

/// 名称会被拼进 DDL，只允许 `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("文件读取错误: {0}")]
    FileRead(String),
    #[error("配置解析错误: {0}")]
    Parse(String),
    #[error("配置验证错误: {0}")]
    Validation(String),
}

/// 决定使用的配置文件：显式指定的路径优先，其次是默认位置
pub fn config_source(explicit: Option<String>) -> Option<String> {
    if explicit.is_some() {
        return explicit;
    }

    ["config.toml", "./config/config.toml"]
        .into_iter()
        .find(|path| Path::new(path).exists())
        .map(str::to_string)
}

/// 从文件或默认值加载配置，应用环境变量覆盖并校验
///
/// 同时返回所用的配置文件路径（`None` 表示使用默认配置），由调用方在日志初始化后记录。
pub fn load_config() -> Result<(Config, Option<String>), ConfigError> {
    let source = config_source(std::env::var(CONFIG_PATH_ENV).ok());
    let mut config = match &source {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    config.apply_overrides(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok((config, source))
}
