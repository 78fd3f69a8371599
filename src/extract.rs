//! 请求体提取器
//! JSON 解析失败与字段校验失败都以 `{"message"}` 的 400 返回，请求体过大保留 413

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

pub const BODY_TOO_LARGE_MESSAGE: &str = "Request body too large";

/// 解析 JSON 并执行 `validator` 校验
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

/// 部分更新的请求体；没有 JSON 请求体时视为空更新
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateJson<T>(pub T);

impl<T, S> FromRequest<S> for UpdateJson<T>
where
    T: DeserializeOwned + Validate + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !req.headers().contains_key(CONTENT_TYPE) {
            return Ok(UpdateJson(T::default()));
        }

        let ValidatedJson(value) = ValidatedJson::<T>::from_request(req, state).await?;
        Ok(UpdateJson(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => {
            AppError::PayloadTooLarge(BODY_TOO_LARGE_MESSAGE.to_string())
        }
        _ => AppError::bad_request(format!("Invalid JSON: {}", rejection.body_text())),
    }
}
