//! 用户相关的 HTTP 处理器

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    extract::{UpdateJson, ValidatedJson},
    middleware::AppState,
    models::{
        auth::LoginRequest,
        user::{
            ProfileUpdatedResponse, RegisterRequest, UpdateProfileRequest, UserProfile,
            USER_NOT_FOUND_MESSAGE,
        },
    },
};

pub const REGISTERED_MESSAGE: &str = "User registered successfully! ✅";
pub const PROFILE_UPDATED_MESSAGE: &str = "Profile updated successfully! ✅";

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.register(req).await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": REGISTERED_MESSAGE }))))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(req).await?;

    Ok(Json(response))
}

/// 获取当前用户资料（总是重新读取存储）
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<Json<UserProfile>, AppError> {
    let user = state
        .stores
        .users
        .find_by_id(auth_context.user_id)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND_MESSAGE))?;

    Ok(Json(UserProfile::from(&user)))
}

/// 更新当前用户资料
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    UpdateJson(req): UpdateJson<UpdateProfileRequest>,
) -> Result<Json<ProfileUpdatedResponse>, AppError> {
    let user = state
        .auth_service
        .update_profile(auth_context.user_id, req)
        .await?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(ProfileUpdatedResponse {
        message: PROFILE_UPDATED_MESSAGE,
        profile: UserProfile::from(&user),
    }))
}
