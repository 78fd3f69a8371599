//! 测试公共模块
//! 提供测试辅助函数和测试工具

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bakery_api::{
    config::{AppConfig, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig},
    db::Stores,
    middleware::AppState,
    repository::MemoryStore,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only-min-32-chars";
pub const TEST_PASSWORD: &str = "Croissant123";

/// 创建测试配置（不配置数据库，使用内存存储）
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(), // 使用随机端口
            graceful_shutdown_timeout_secs: 5,
            request_timeout_secs: 30,
            body_limit_bytes: 1024 * 1024,
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            jwt_secret: Secret::new(TEST_SECRET.to_string()),
            token_ttl_secs: 86_400,
        },
    }
}

/// 测试应用：路由、状态以及内存存储句柄
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
}

pub fn create_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(
        AppState::new(create_test_config(), Stores::memory(store.clone()))
            .expect("Failed to build app state"),
    );
    let router = bakery_api::routes::create_router(state.clone());

    TestApp {
        router,
        state,
        store,
    }
}

impl TestApp {
    /// 发送请求并返回状态码与 JSON 响应体
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    pub async fn register(&self, name: &str, email: &str, role: Option<&str>) -> StatusCode {
        let mut body = json!({
            "name": name,
            "email": email,
            "phone": "555-0100",
            "password": TEST_PASSWORD,
        });
        if let Some(role) = role {
            body["role"] = json!(role);
        }

        let (status, _) = self.send("POST", "/api/users/register", None, Some(body)).await;
        status
    }

    /// 注册并登录，返回 (token, 登录响应)
    pub async fn register_and_login(&self, name: &str, email: &str) -> (String, Value) {
        assert_eq!(self.register(name, email, None).await, StatusCode::CREATED);

        let (status, json) = self
            .send(
                "POST",
                "/api/users/login",
                None,
                Some(json!({ "email": email, "password": TEST_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let token = json["token"].as_str().unwrap().to_string();
        (token, json)
    }
}

/// 测试用产品请求体
pub fn sample_product() -> Value {
    json!({
        "name": "Chocolate Cake",
        "description": "Rich dark chocolate sponge",
        "price": 24.5,
        "category": "Cakes",
        "countInStock": 6
    })
}
