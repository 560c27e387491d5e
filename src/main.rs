use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use user_facade::infrastructure::{
    config::{self, Config, StorageBackend},
    logger::Logger,
    memory::MemoryDocumentStore,
    store::DocumentStore,
};
use user_facade::{router, AppState, DocumentUserService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, source) = config::load_config().context("加载配置失败")?;
    Logger::init(&config.logging.level);

    match &source {
        Some(path) => info!("从配置文件加载: {}", path),
        None => info!("未找到配置文件，使用默认配置"),
    }

    info!(
        "启动用户服务... 存储后端: {:?}, 容器: {}",
        config.database.backend, config.database.container_name
    );

    let store = open_store(&config).await?;
    let users = DocumentUserService::new(store).with_page_size(config.database.page_size);
    let app = router(AppState::new(Arc::new(users)));

    let address = config.http.socket_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("无法绑定到 {}", address))?;

    info!("🚀 用户服务运行在 http://{}", address);
    info!("📖 API 文档: http://{}/swagger-ui", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("服务器运行失败")?;

    info!("服务已停止");
    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.database.backend {
        StorageBackend::Memory => {
            info!("使用内存文档存储");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
        StorageBackend::Postgres => open_postgres(config).await,
    }
}

#[cfg(feature = "database")]
async fn open_postgres(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    use user_facade::infrastructure::database::{DatabaseManager, PgDocumentStore};

    let manager = DatabaseManager::connect(&config.database)
        .await
        .context("连接数据库失败")?;
    let store = PgDocumentStore::open(manager.get_pool().clone(), &config.database.container_name)
        .await
        .context("初始化文档容器失败")?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "database"))]
async fn open_postgres(_config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    anyhow::bail!("postgres 后端需要启用 `database` 特性")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("监听 Ctrl-C 失败: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("监听 SIGTERM 失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("收到停止信号，正在关闭...");
}
