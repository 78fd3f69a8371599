//! 存储层测试
//!
//! 内存存储测试总是运行；PostgreSQL 测试需要设置 TEST_DATABASE_URL 并使用
//! `cargo test -- --ignored` 运行。

use bakery_api::{
    config::DatabaseConfig,
    db,
    error::AppError,
    models::{
        product::{Category, NewProduct},
        user::{NewUser, Role},
    },
    repository::{MemoryStore, ProductRepository, ProductStore, UserRepository, UserStore},
};
use secrecy::Secret;
use sqlx::PgPool;
use uuid::Uuid;

fn new_user(email: &str) -> NewUser {
    NewUser {
        name: "Test Baker".to_string(),
        email: email.to_string(),
        phone: "555-0142".to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        role: Role::Customer,
    }
}

fn new_product(name: &str, count_in_stock: i32) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: "Test product".to_string(),
        price: 5.5,
        category: Category::Pastries,
        image: "default-product.jpg".to_string(),
        count_in_stock,
    }
}

/// 唯一的测试邮箱，避免共享数据库中的冲突
fn unique_email() -> String {
    format!("{}@bakery.test", Uuid::new_v4())
}

async fn exercise_user_store(store: &dyn UserStore) {
    let email = unique_email();
    let created = store.create(new_user(&email)).await.unwrap();

    let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, email);
    assert_eq!(by_id.role, Role::Customer);

    let by_email = store.find_by_email(&email).await.unwrap().unwrap();
    assert_eq!(by_email.id, created.id);
    assert!(store
        .find_by_email(&email.to_uppercase())
        .await
        .unwrap()
        .is_none());

    let duplicate = store.create(new_user(&email)).await.unwrap_err();
    assert!(matches!(duplicate, AppError::Conflict(_)));

    let mut changed = by_id.clone();
    changed.name = "Renamed".to_string();
    changed.role = Role::Admin;
    let updated = store.update(&changed).await.unwrap().unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.role, Role::Admin);
    assert_eq!(updated.created_at, created.created_at);

    changed.id = Uuid::new_v4();
    changed.email = unique_email();
    assert!(store.update(&changed).await.unwrap().is_none());
}

async fn exercise_product_store(store: &dyn ProductStore) {
    let created = store.create(new_product("Eclair", 3)).await.unwrap();
    assert_eq!(created.count_in_stock, 3);

    let listed = store.list().await.unwrap();
    assert!(listed.iter().any(|p| p.id == created.id));

    let mut changed = created.clone();
    changed.count_in_stock = 0;
    changed.category = Category::Other;
    let updated = store.update(&changed).await.unwrap().unwrap();
    assert_eq!(updated.count_in_stock, 0);
    assert_eq!(updated.category, Category::Other);

    let fetched = store.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.count_in_stock, 0);

    assert!(store.delete(created.id).await.unwrap());
    assert!(!store.delete(created.id).await.unwrap());
    assert!(store.find_by_id(created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_memory_user_store() {
    exercise_user_store(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_memory_product_store() {
    exercise_product_store(&MemoryStore::new()).await;
}

async fn setup_test_db() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for database tests");

    let config = DatabaseConfig {
        url: Some(Secret::new(url.clone())),
        max_connections: 5,
        min_connections: 1,
        acquire_timeout_secs: 5,
        idle_timeout_secs: 300,
        max_lifetime_secs: 1800,
    };

    let pool = db::create_pool(&config, &url)
        .await
        .expect("Failed to create test database pool");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_postgres_user_repository() {
    let pool = setup_test_db().await;
    exercise_user_store(&UserRepository::new(pool)).await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_postgres_product_repository() {
    let pool = setup_test_db().await;
    exercise_product_store(&ProductRepository::new(pool)).await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_postgres_health_check() {
    let pool = setup_test_db().await;
    assert_eq!(db::health_check(&pool).await, db::HealthStatus::Healthy);
}
