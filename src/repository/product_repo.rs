//! Product repository (PostgreSQL)

use super::ProductStore;
use crate::{
    error::AppError,
    models::product::{NewProduct, Product},
};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, category, image, count_in_stock, created_at, updated_at";

pub struct ProductRepository {
    db: PgPool,
}

impl ProductRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn list(&self) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(product)
    }

    async fn create(&self, product: NewProduct) -> Result<Product, AppError> {
        let created = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (id, name, description, price, category, image, count_in_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.category.as_str())
        .bind(&product.image)
        .bind(product.count_in_stock)
        .fetch_one(&self.db)
        .await?;

        Ok(created)
    }

    async fn update(&self, product: &Product) -> Result<Option<Product>, AppError> {
        let updated = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET
                name = $2,
                description = $3,
                price = $4,
                category = $5,
                image = $6,
                count_in_stock = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.category.as_str())
        .bind(&product.image)
        .bind(product.count_in_stock)
        .fetch_optional(&self.db)
        .await?;

        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
