//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::{BoxError, ServiceBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::middleware::jwt_auth_middleware, config::ServerConfig, error::AppError, handlers,
    middleware::AppState,
};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    let server = state.config.server.clone();

    // 公开端点（欢迎横幅与健康检查）
    let public_routes = Router::new()
        .route("/", get(handlers::health::welcome))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 用户注册与登录（无需认证）
    let account_routes = Router::new()
        .route("/api/users/register", post(handlers::user::register))
        .route("/api/users/login", post(handlers::user::login));

    // 需要认证的路由
    let profile_routes = Router::new()
        .route(
            "/api/users/profile",
            get(handlers::user::get_profile).put(handlers::user::update_profile),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    // 产品目录
    let product_routes = Router::new()
        .route(
            "/api/products",
            get(handlers::product::list_products).post(handlers::product::create_product),
        )
        .route(
            "/api/products/{id}",
            put(handlers::product::update_product).delete(handlers::product::delete_product),
        );

    // 组合所有路由
    let router = Router::new()
        .merge(public_routes)
        .merge(account_routes)
        .merge(profile_routes)
        .merge(product_routes);

    with_http_layers(router, &server)
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}

/// 超时、CORS、访问追踪与请求体上限
///
/// 超时经 `HandleErrorLayer` 转为 `AppError`，请求体上限由 JSON 提取器以 413 报告。
fn with_http_layers<S>(router: Router<S>, server: &ServerConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(HandleErrorLayer::new(handle_layer_error))
                .timeout(Duration::from_secs(server.request_timeout_secs)),
        )
        .layer(DefaultBodyLimit::max(server.body_limit_bytes))
}

async fn handle_layer_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Timeout("request took too long".to_string())
    } else {
        AppError::Internal(format!("Unhandled middleware error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn server_config(request_timeout_secs: u64) -> ServerConfig {
        ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            graceful_shutdown_timeout_secs: 5,
            request_timeout_secs,
            body_limit_bytes: 1024,
        }
    }

    #[tokio::test]
    async fn test_slow_request_times_out_with_message() {
        let router: Router = with_http_layers(
            Router::new().route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    "done"
                }),
            ),
            &server_config(1),
        );

        let response = router
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["message"], "Request timeout: request took too long");
    }

    #[tokio::test]
    async fn test_fast_request_passes_through() {
        let router: Router = with_http_layers(
            Router::new().route("/fast", get(|| async { "done" })),
            &server_config(1),
        );

        let response = router
            .oneshot(Request::builder().uri("/fast").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
