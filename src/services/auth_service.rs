//! 认证服务：注册、登录、资料更新

use crate::{
    auth::{jwt::JwtService, password::PasswordHasher},
    error::AppError,
    models::{
        auth::{LoginRequest, LoginResponse},
        user::{
            NewUser, RegisterRequest, UpdateProfileRequest, User, UserSummary,
            DUPLICATE_EMAIL_MESSAGE, USER_NOT_FOUND_MESSAGE,
        },
    },
    repository::UserStore,
};
use std::sync::Arc;
use uuid::Uuid;

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful! 🎉";
pub const NO_SUCH_EMAIL_MESSAGE: &str = "No user found with this email!";
pub const INVALID_PASSWORD_MESSAGE: &str = "Invalid password!";

pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_service: Arc<JwtService>,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt_service: Arc<JwtService>) -> Self {
        Self {
            users,
            jwt_service,
            hasher: PasswordHasher::new(),
        }
    }

    /// 注册新用户，邮箱重复时返回 Conflict
    pub async fn register(&self, req: RegisterRequest) -> Result<User, AppError> {
        if self.users.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::conflict(DUPLICATE_EMAIL_MESSAGE));
        }

        let password_hash = self.hasher.hash_async(req.password).await?;

        // 并发注册同一邮箱时由存储层的唯一约束兜底
        let user = self
            .users
            .create(NewUser {
                name: req.name,
                email: req.email,
                phone: req.phone,
                password_hash,
                role: req.role.unwrap_or_default(),
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");

        Ok(user)
    }

    /// 用户登录，成功时签发令牌
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let user = self
            .users
            .find_by_email(&req.email)
            .await?
            .ok_or_else(|| AppError::bad_request(NO_SUCH_EMAIL_MESSAGE))?;

        let matches = self
            .hasher
            .verify_async(req.password, user.password_hash.clone())
            .await?;
        if !matches {
            tracing::info!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AppError::bad_request(INVALID_PASSWORD_MESSAGE));
        }

        let token = self.jwt_service.issue(&user.id, user.role)?;

        tracing::info!(user_id = %user.id, "Login succeeded");

        Ok(LoginResponse {
            message: LOGIN_SUCCESS_MESSAGE,
            token,
            user: UserSummary::from(&user),
        })
    }

    /// 选择性覆盖资料字段；仅在提供了新密码时重新哈希
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<User, AppError> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(USER_NOT_FOUND_MESSAGE))?;

        req.apply(&mut user);

        if let Some(password) = req.new_password() {
            user.password_hash = self.hasher.hash_async(password.to_string()).await?;
        }

        self.users
            .update(&user)
            .await?
            .ok_or_else(|| AppError::not_found(USER_NOT_FOUND_MESSAGE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::user::Role, repository::MemoryStore};

    const SECRET: &str = "test_secret_key_32_characters_long!";

    fn service() -> AuthService {
        let store: Arc<dyn UserStore> = Arc::new(MemoryStore::new());
        AuthService::new(store, Arc::new(JwtService::new(SECRET, 86_400).unwrap()))
    }

    fn register_request(email: &str, role: Option<Role>) -> RegisterRequest {
        RegisterRequest {
            name: "Baker".to_string(),
            email: email.to_string(),
            phone: "555-0123".to_string(),
            password: "flour-and-water".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_register_defaults_role_and_hashes_password() {
        let service = service();
        let user = service.register(register_request("a@bakery.test", None)).await.unwrap();

        assert_eq!(user.role, Role::Customer);
        assert_ne!(user.password_hash, "flour-and-water");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let service = service();
        service.register(register_request("a@bakery.test", None)).await.unwrap();

        let err = service
            .register(register_request("a@bakery.test", Some(Role::Admin)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login_token_carries_stored_role() {
        let service = service();
        service
            .register(register_request("admin@bakery.test", Some(Role::Admin)))
            .await
            .unwrap();

        let response = service
            .login(LoginRequest {
                email: "admin@bakery.test".to_string(),
                password: "flour-and-water".to_string(),
            })
            .await
            .unwrap();

        let claims = service.jwt_service.verify(&response.token).unwrap();
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.user_id().unwrap(), response.user.id);
    }

    #[tokio::test]
    async fn test_login_failures_are_bad_requests() {
        let service = service();
        service.register(register_request("a@bakery.test", None)).await.unwrap();

        let wrong_password = service
            .login(LoginRequest {
                email: "a@bakery.test".to_string(),
                password: "rye".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_email = service
            .login(LoginRequest {
                email: "nobody@bakery.test".to_string(),
                password: "flour-and-water".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong_password.code(), 400);
        assert_eq!(unknown_email.code(), 400);
    }

    #[tokio::test]
    async fn test_update_profile_rehashes_only_new_password() {
        let service = service();
        let user = service.register(register_request("a@bakery.test", None)).await.unwrap();

        let unchanged = service
            .update_profile(
                user.id,
                UpdateProfileRequest {
                    phone: Some("555-9999".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(unchanged.password_hash, user.password_hash);
        assert_eq!(unchanged.phone, "555-9999");

        let changed = service
            .update_profile(
                user.id,
                UpdateProfileRequest {
                    password: Some("sourdough".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_ne!(changed.password_hash, user.password_hash);
    }
}
