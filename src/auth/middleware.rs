//! JWT 认证中间件
//!
//! 每个请求只有三种结局：未携带令牌、令牌无效、认证通过。
//! 网关在放行前总是重新加载用户，已删除用户的令牌视为无效。

use crate::{
    auth::jwt::TokenError,
    error::{AppError, AuthFailure},
    middleware::AppState,
    models::user::Role,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::Unauthorized(AuthFailure::NoToken))
    }
}

/// Authorization 头的解析结果
#[derive(Debug, PartialEq, Eq)]
pub enum Credential<'a> {
    /// 没有头，或者不是 Bearer 方案
    Missing,
    /// Bearer 方案但缺少令牌部分
    Malformed,
    Bearer(&'a str),
}

/// 从 Authorization 头提取令牌
pub fn extract_token(headers: &HeaderMap) -> Credential<'_> {
    let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return Credential::Missing;
    };

    if !value.starts_with("Bearer") {
        return Credential::Missing;
    }

    match value.split(' ').nth(1) {
        Some(token) if !token.is_empty() => Credential::Bearer(token),
        _ => Credential::Malformed,
    }
}

/// 令牌被拒绝的内部原因，仅用于日志
#[derive(Debug, Error)]
pub enum RejectReason {
    #[error("{0}")]
    Token(#[from] TokenError),

    #[error("token subject no longer exists")]
    UnknownSubject,
}

/// 网关判定结果
#[derive(Debug)]
pub enum GateOutcome {
    NoToken,
    TokenFailed(RejectReason),
    Authenticated(AuthContext),
}

/// 校验凭证并解析用户。存储故障以 Err 返回，不会被当作令牌无效。
pub async fn evaluate(state: &AppState, headers: &HeaderMap) -> Result<GateOutcome, AppError> {
    let token = match extract_token(headers) {
        Credential::Missing => return Ok(GateOutcome::NoToken),
        Credential::Malformed => {
            return Ok(GateOutcome::TokenFailed(TokenError::Malformed.into()))
        }
        Credential::Bearer(token) => token,
    };

    let user_id = match state.jwt_service.verify(token).and_then(|claims| claims.user_id()) {
        Ok(user_id) => user_id,
        Err(e) => return Ok(GateOutcome::TokenFailed(e.into())),
    };

    let outcome = match state.stores.users.find_by_id(user_id).await? {
        Some(user) => GateOutcome::Authenticated(AuthContext {
            user_id: user.id,
            role: user.role,
        }),
        None => GateOutcome::TokenFailed(RejectReason::UnknownSubject),
    };

    Ok(outcome)
}

/// JWT 认证中间件 - 必须认证
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match evaluate(&state, req.headers()).await? {
        GateOutcome::NoToken => Err(AppError::Unauthorized(AuthFailure::NoToken)),
        GateOutcome::TokenFailed(reason) => {
            tracing::warn!(%reason, "Bearer token rejected");
            Err(AppError::Unauthorized(AuthFailure::TokenFailed))
        }
        GateOutcome::Authenticated(auth_context) => {
            tracing::debug!(user_id = %auth_context.user_id, role = %auth_context.role, "Request authenticated");
            req.extensions_mut().insert(auth_context);
            Ok(next.run(req).await)
        }
    }
}
