//! 健康检查处理器
//! 提供 /、/health 和 /ready 端点

use axum::{extract::State, Json};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

use crate::{db::HealthStatus, middleware::AppState};

pub const WELCOME_MESSAGE: &str = "Welcome to the Bakery Management System API 🍰";

/// 存活探针响应
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// 就绪探针响应
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub backend: &'static str,
    pub checks: Vec<HealthCheck>,
}

/// 健康检查项
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 应用启动时间，首次访问时记录
static APP_START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

/// 记录应用启动时间（在 main.rs 中尽早调用）
pub fn set_start_time() {
    Lazy::force(&APP_START_TIME);
}

/// 获取应用运行时间（秒）
pub fn get_uptime() -> u64 {
    APP_START_TIME.elapsed().as_secs()
}

/// 欢迎横幅，兼作最简单的存活指示
pub async fn welcome() -> Json<Value> {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

/// 存活探针
/// 快速响应，不检查依赖
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: get_uptime(),
    })
}

/// 就绪探针
/// 检查存储后端
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> Json<ReadinessResponse> {
    let store_health = state.stores.health().await;

    let checks = vec![HealthCheck {
        name: "store".to_string(),
        status: match &store_health {
            HealthStatus::Healthy => "healthy".to_string(),
            HealthStatus::Unhealthy(_) => "unhealthy".to_string(),
        },
        message: match store_health {
            HealthStatus::Healthy => None,
            HealthStatus::Unhealthy(msg) => Some(msg),
        },
    }];

    let all_healthy = checks.iter().all(|c| c.status == "healthy");

    Json(ReadinessResponse {
        ready: all_healthy,
        backend: state.stores.backend_name(),
        checks,
    })
}
