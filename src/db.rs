//! 数据库连接池、迁移与存储选择
//! 配置了 PostgreSQL 且可连接时使用数据库，否则回退到内存存储

use crate::config::DatabaseConfig;
use crate::repository::{
    MemoryStore, ProductRepository, ProductStore, UserRepository, UserStore,
};
use secrecy::ExposeSecret;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;

/// 创建数据库连接池
pub async fn create_pool(config: &DatabaseConfig, db_url: &str) -> Result<PgPool, DbError> {
    tracing::debug!("Creating database connection pool...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
        .connect(db_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create database pool: {}", e);
            DbError::ConnectionFailed(e.to_string())
        })?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database pool created successfully"
    );

    Ok(pool)
}

/// 运行数据库迁移
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running database migrations...");

    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        tracing::error!("Migration failed: {}", e);
        DbError::MigrationFailed(e.to_string())
    })?;

    tracing::info!("Migrations completed successfully");
    Ok(())
}

/// 数据库健康检查
pub async fn health_check(pool: &PgPool) -> HealthStatus {
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => {
            tracing::debug!("Database health check: OK");
            HealthStatus::Healthy
        }
        Err(e) => {
            tracing::warn!("Database health check failed: {}", e);
            HealthStatus::Unhealthy(e.to_string())
        }
    }
}

/// 记录数据库连接池指标
pub fn record_pool_metrics(pool: &PgPool) {
    metrics::gauge!("db.pool.size").set(pool.size() as f64);
    metrics::gauge!("db.pool.idle").set(pool.num_idle() as f64);
}

/// 数据库错误类型
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// 健康状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

/// 当前使用的存储后端
#[derive(Clone)]
pub enum StoreBackend {
    Postgres(PgPool),
    Memory,
}

/// 注入到各处理器的存储句柄
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub backend: StoreBackend,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            products: Arc::new(ProductRepository::new(pool.clone())),
            backend: StoreBackend::Postgres(pool),
        }
    }

    /// 使用给定的内存存储（测试中可保留句柄直接操作）
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            products: store,
            backend: StoreBackend::Memory,
        }
    }

    pub fn in_memory() -> Self {
        Self::memory(Arc::new(MemoryStore::new()))
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            StoreBackend::Postgres(_) => "postgres",
            StoreBackend::Memory => "memory",
        }
    }

    /// 存储健康检查，内存存储总是健康
    pub async fn health(&self) -> HealthStatus {
        match &self.backend {
            StoreBackend::Postgres(pool) => {
                record_pool_metrics(pool);
                health_check(pool).await
            }
            StoreBackend::Memory => HealthStatus::Healthy,
        }
    }
}

/// 连接 PostgreSQL 并迁移；未配置或失败时回退到内存存储
pub async fn connect_stores(config: &DatabaseConfig) -> Stores {
    let Some(url) = config.url.as_ref() else {
        tracing::warn!("No database URL configured, using in-memory store");
        return Stores::in_memory();
    };

    match connect_postgres(config, url.expose_secret()).await {
        Ok(pool) => {
            tracing::info!("PostgreSQL store connected");
            Stores::postgres(pool)
        }
        Err(e) => {
            tracing::warn!(error = %e, "PostgreSQL unavailable, falling back to in-memory store");
            Stores::in_memory()
        }
    }
}

async fn connect_postgres(config: &DatabaseConfig, db_url: &str) -> Result<PgPool, DbError> {
    let pool = create_pool(config, db_url).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
