//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

/// 令牌有效期下限（秒）
const MIN_TOKEN_TTL_SECS: u64 = 60;
/// 令牌有效期上限（30 天）
const MAX_TOKEN_TTL_SECS: u64 = 2_592_000;
/// 未配置签名密钥时使用的公开默认值，仅适用于本地开发
pub const DEFAULT_JWT_SECRET: &str = "change-this-secret-in-production-min-32-chars!";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:5000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
    /// 单个请求的处理超时（秒）
    pub request_timeout_secs: u64,
    /// 请求体大小上限（字节）
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL 连接 URL；未配置时使用内存存储
    pub url: Option<Secret<String>>,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小连接数
    pub min_connections: u32,
    /// 获取连接超时时间（秒）
    pub acquire_timeout_secs: u64,
    /// 空闲连接超时时间（秒）
    pub idle_timeout_secs: u64,
    /// 连接最大生命周期（秒）
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// JWT 签名密钥
    pub jwt_secret: Secret<String>,
    /// 访问令牌有效期（秒），默认一天
    pub token_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .set_default("server.addr", "0.0.0.0:5000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("server.request_timeout_secs", 30)?
            .set_default("server.body_limit_bytes", 1_048_576)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.acquire_timeout_secs", 5)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.jwt_secret", DEFAULT_JWT_SECRET)?
            .set_default("security.token_ttl_secs", 86_400)?;

        // 兼容部署脚本里的通用变量名，BAKERY_ 前缀的变量优先
        if let Ok(port) = std::env::var("PORT") {
            settings = settings.set_default("server.addr", format!("0.0.0.0:{}", port))?;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            settings = settings.set_default("security.jwt_secret", secret)?;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            settings = settings.set_default("database.url", url)?;
        }

        // 从环境变量加载配置（前缀为 BAKERY_）
        settings = settings.add_source(
            Environment::with_prefix("BAKERY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// 是否仍在使用公开的默认 JWT 密钥
    pub fn uses_default_jwt_secret(&self) -> bool {
        self.security.jwt_secret.expose_secret() == DEFAULT_JWT_SECRET
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                // 端口 0 表示由系统分配
                if port != 0 && port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        if self.database.max_connections < self.database.min_connections {
            return Err(ConfigError::Message(
                "max_connections must be >= min_connections".to_string(),
            ));
        }

        // HS256 密钥至少 32 字符
        if self.security.jwt_secret.expose_secret().len() < 32 {
            return Err(ConfigError::Message(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        if !(MIN_TOKEN_TTL_SECS..=MAX_TOKEN_TTL_SECS).contains(&self.security.token_ttl_secs) {
            return Err(ConfigError::Message(format!(
                "token_ttl_secs must be between {} and {} (1 minute to 30 days)",
                MIN_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS
            )));
        }

        Ok(())
    }
}
