//! In-memory store
//!
//! Ephemeral fallback used when no database is configured or reachable, and
//! the store behind the integration tests. Guards are never held across an
//! `.await`.

use super::{ProductStore, UserStore};
use crate::{
    error::AppError,
    models::{
        product::{NewProduct, Product},
        user::{NewUser, User, DUPLICATE_EMAIL_MESSAGE},
    },
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    products: RwLock<HashMap<Uuid, Product>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a user record. Not reachable over HTTP; lets tests simulate an
    /// account that disappears while its token is still valid.
    pub async fn remove_user(&self, id: Uuid) -> bool {
        self.users.write().await.remove(&id).is_some()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::conflict(DUPLICATE_EMAIL_MESSAGE));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            phone: user.phone,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(AppError::conflict(DUPLICATE_EMAIL_MESSAGE));
        }

        let Some(stored) = users.get_mut(&user.id) else {
            return Ok(None);
        };

        stored.name = user.name.clone();
        stored.email = user.email.clone();
        stored.phone = user.phone.clone();
        stored.password_hash = user.password_hash.clone();
        stored.role = user.role;
        stored.updated_at = Utc::now();

        Ok(Some(stored.clone()))
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Product>, AppError> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn create(&self, product: NewProduct) -> Result<Product, AppError> {
        let now = Utc::now();
        let created = Product {
            id: Uuid::new_v4(),
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            image: product.image,
            count_in_stock: product.count_in_stock,
            created_at: now,
            updated_at: now,
        };

        self.products.write().await.insert(created.id, created.clone());

        Ok(created)
    }

    async fn update(&self, product: &Product) -> Result<Option<Product>, AppError> {
        let mut products = self.products.write().await;

        let Some(stored) = products.get_mut(&product.id) else {
            return Ok(None);
        };

        let created_at = stored.created_at;
        *stored = Product {
            created_at,
            updated_at: Utc::now(),
            ..product.clone()
        };

        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.products.write().await.remove(&id).is_some())
    }
}
