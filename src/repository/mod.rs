//! Persistence layer
//!
//! Handlers depend on the [`UserStore`] and [`ProductStore`] traits; the
//! Postgres repositories and the in-memory store both implement them.

pub mod memory;
pub mod product_repo;
pub mod user_repo;

pub use memory::MemoryStore;
pub use product_repo::ProductRepository;
pub use user_repo::UserRepository;

use crate::{
    error::AppError,
    models::{
        product::{NewProduct, Product},
        user::{NewUser, User},
    },
};
use async_trait::async_trait;
use uuid::Uuid;

/// Credential store
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Exact, case-sensitive match
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Fails with [`AppError::Conflict`] when the email is already taken
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    /// Persist every mutable field of `user`. `Ok(None)` if the id is unknown;
    /// [`AppError::Conflict`] if the new email belongs to someone else.
    async fn update(&self, user: &User) -> Result<Option<User>, AppError>;
}

/// Product store
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products, oldest first
    async fn list(&self) -> Result<Vec<Product>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError>;

    async fn create(&self, product: NewProduct) -> Result<Product, AppError>;

    /// `Ok(None)` if the id is unknown
    async fn update(&self, product: &Product) -> Result<Option<Product>, AppError>;

    /// `Ok(false)` if nothing was deleted
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Map a unique-constraint violation to a conflict, anything else to a database error
pub(crate) fn map_unique_violation(e: sqlx::Error, message: &str) -> AppError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return AppError::conflict(message);
        }
    }
    AppError::Database(e)
}
