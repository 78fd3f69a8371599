//! Product catalogue models

use super::{merge_text, UnknownVariant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_PRODUCT_IMAGE: &str = "default-product.jpg";
pub const PRODUCT_NOT_FOUND_MESSAGE: &str = "Product not found!";

/// Closed set of bakery categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Cakes,
    Bread,
    Pastries,
    Beverages,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cakes => "Cakes",
            Category::Bread => "Bread",
            Category::Pastries => "Pastries",
            Category::Beverages => "Beverages",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cakes" => Ok(Category::Cakes),
            "Bread" => Ok(Category::Bread),
            "Pastries" => Ok(Category::Pastries),
            "Beverages" => Ok(Category::Beverages),
            "Other" => Ok(Category::Other),
            other => Err(UnknownVariant {
                kind: "category",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = UnknownVariant;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Catalogue item
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[sqlx(try_from = "String")]
    pub category: Category,
    pub image: String,
    pub count_in_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a product; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub image: String,
    pub count_in_stock: i32,
}

/// Create product request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Product description is required"))]
    pub description: String,
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,
    pub category: Category,
    pub image: Option<String>,
    #[validate(range(min = 0, message = "Stock count must not be negative"))]
    pub count_in_stock: Option<i32>,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(req: CreateProductRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            price: req.price,
            category: req.category,
            image: req
                .image
                .filter(|image| !image.is_empty())
                .unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE.to_string()),
            count_in_stock: req.count_in_stock.unwrap_or(0),
        }
    }
}

/// Update product request; omitted fields keep their stored values
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: Option<f64>,
    pub category: Option<Category>,
    pub image: Option<String>,
    #[validate(range(min = 0, message = "Stock count must not be negative"))]
    pub count_in_stock: Option<i32>,
}

impl UpdateProductRequest {
    /// Text fields are replaced only when non-empty. Numeric fields are
    /// replaced whenever present, so an explicit 0 is applied.
    pub fn apply(&self, product: &mut Product) {
        merge_text(&mut product.name, &self.name);
        merge_text(&mut product.description, &self.description);
        merge_text(&mut product.image, &self.image);

        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(count) = self.count_in_stock {
            product.count_in_stock = count;
        }
    }
}

/// Response wrapping a single product with a status message
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub message: &'static str,
    pub product: Product,
}
