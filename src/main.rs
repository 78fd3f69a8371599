//! 烘焙店管理系统主入口

use bakery_api::{
    config::AppConfig, db, handlers::health, middleware::AppState, routes, telemetry,
};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("bakery-api {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境）
    // 按优先级加载：.env.local > .env.development > .env
    if let Ok(env) = std::env::var("BAKERY_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::from_filename(".env.development").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志与指标
    telemetry::init_telemetry(&config);
    telemetry::init_metrics();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Bakery API starting...");

    if config.uses_default_jwt_secret() {
        tracing::warn!(
            "Using the built-in default JWT secret; set BAKERY_SECURITY__JWT_SECRET or JWT_SECRET"
        );
    }

    // 3. 存储（PostgreSQL 不可用时回退到内存）
    let stores = db::connect_stores(&config.database).await;

    tracing::info!(backend = stores.backend_name(), "Store initialized");

    // 4. 构建应用状态与路由
    let app_state = Arc::new(AppState::new(config.clone(), stores)?);
    let app = routes::create_router(app_state);

    // 5. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    // 6. 优雅关闭：收到信号后停止接收新连接，在超时内等待存量请求完成
    let shutdown_timeout = Duration::from_secs(config.server.graceful_shutdown_timeout_secs);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    tokio::select! {
        result = server => result?,
        _ = drain_deadline(shutdown_timeout) => {
            tracing::warn!("Graceful shutdown timeout reached, forcing exit");
        }
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }
}

/// 收到关闭信号后开始计时，超时即强制退出
async fn drain_deadline(timeout: Duration) {
    shutdown_signal().await;
    tokio::time::sleep(timeout).await;
}

/// 打印帮助信息
fn print_help() {
    println!("bakery-api {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: bakery-api [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  BAKERY_SERVER__ADDR            监听地址（默认 0.0.0.0:5000，兼容 PORT）");
    println!("  BAKERY_DATABASE__URL           PostgreSQL 连接串（兼容 DATABASE_URL，未设置时使用内存存储）");
    println!("  BAKERY_SECURITY__JWT_SECRET    JWT 签名密钥，至少 32 字符（兼容 JWT_SECRET）");
    println!("  BAKERY_LOGGING__LEVEL          日志级别（trace/debug/info/warn/error）");
    println!("  BAKERY_LOGGING__FORMAT         日志格式（json/pretty）");
}
