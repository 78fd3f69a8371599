//! 产品相关的 HTTP 处理器

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppError,
    extract::{UpdateJson, ValidatedJson},
    middleware::AppState,
    models::product::{
        CreateProductRequest, NewProduct, Product, ProductResponse, UpdateProductRequest,
        PRODUCT_NOT_FOUND_MESSAGE,
    },
};

pub const PRODUCT_ADDED_MESSAGE: &str = "Product added successfully! 🎂";
pub const PRODUCT_UPDATED_MESSAGE: &str = "Product updated successfully! 🔄";
pub const PRODUCT_DELETED_MESSAGE: &str = "Product deleted successfully! 🗑️";

/// 路径中的 id 不是 UUID 时视为不存在
fn parse_product_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found(PRODUCT_NOT_FOUND_MESSAGE))
}

/// 新增产品
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.stores.products.create(NewProduct::from(req)).await?;

    tracing::info!(product_id = %product.id, category = %product.category, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            message: PRODUCT_ADDED_MESSAGE,
            product,
        }),
    ))
}

/// 产品列表（按创建时间升序）
pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = state.stores.products.list().await?;
    Ok(Json(products))
}

/// 更新产品
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    UpdateJson(req): UpdateJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let id = parse_product_id(&id)?;

    let mut product = state
        .stores
        .products
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(PRODUCT_NOT_FOUND_MESSAGE))?;

    req.apply(&mut product);

    let product = state
        .stores
        .products
        .update(&product)
        .await?
        .ok_or_else(|| AppError::not_found(PRODUCT_NOT_FOUND_MESSAGE))?;

    tracing::info!(product_id = %product.id, "Product updated");

    Ok(Json(ProductResponse {
        message: PRODUCT_UPDATED_MESSAGE,
        product,
    }))
}

/// 删除产品
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_product_id(&id)?;

    if !state.stores.products.delete(id).await? {
        return Err(AppError::not_found(PRODUCT_NOT_FOUND_MESSAGE));
    }

    tracing::info!(product_id = %id, "Product deleted");

    Ok(Json(json!({ "message": PRODUCT_DELETED_MESSAGE })))
}
