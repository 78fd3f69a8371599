//! JWT token issuance and verification
//! Stateless HS256 bearer tokens carrying the user id and role

use crate::{config::AppConfig, error::AppError, models::user::Role};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Role at the time of issuance
    pub role: Role,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Malformed)
    }
}

/// Why a token was refused. Callers map every kind to the same 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("signature does not match")]
    Tampered,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl_secs: u64,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(
            config.security.jwt_secret.expose_secret(),
            config.security.token_ttl_secs,
        )
    }

    pub fn new(secret: &str, token_ttl_secs: u64) -> Result<Self, AppError> {
        // Ensure secret is at least 32 bytes for HS256
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        // Expiry is checked by hand in `verify_at` so tests can pin the clock
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            token_ttl_secs,
        })
    }

    /// Issue a token for the user, valid for the configured ttl from now
    pub fn issue(&self, user_id: &Uuid, role: Role) -> Result<String, AppError> {
        self.issue_at(user_id, role, Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `issued_at` (unix seconds)
    pub fn issue_at(&self, user_id: &Uuid, role: Role, issued_at: i64) -> Result<String, AppError> {
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: issued_at,
            exp: issued_at + self.token_ttl_secs as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode token: {:?}", e);
            AppError::Internal(format!("Failed to encode token: {}", e))
        })
    }

    /// Validate and decode a token against the current time
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Validate and decode a token as if the current time were `now`
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                match e.kind() {
                    ErrorKind::InvalidSignature => TokenError::Tampered,
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed,
                }
            })?
            .claims;

        if now > claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_key_32_characters_long!";

    #[test]
    fn test_issue_and_verify() {
        let service = JwtService::new(SECRET, 86_400).unwrap();
        let user_id = Uuid::new_v4();

        let token = service.issue(&user_id, Role::Admin).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 86_400);
    }

    #[test]
    fn test_secret_too_short() {
        assert!(JwtService::new("short", 86_400).is_err());
    }

    #[test]
    fn test_expiry_boundary() {
        let service = JwtService::new(SECRET, 86_400).unwrap();
        let issued_at = 1_700_000_000;
        let token = service.issue_at(&Uuid::new_v4(), Role::Customer, issued_at).unwrap();

        assert!(service.verify_at(&token, issued_at + 86_400).is_ok());
        assert_eq!(
            service.verify_at(&token, issued_at + 86_400 + 1),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        let service = JwtService::new(SECRET, 86_400).unwrap();
        assert_eq!(service.verify("invalid_token"), Err(TokenError::Malformed));
        assert_eq!(service.verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_foreign_secret_is_tampered() {
        let ours = JwtService::new(SECRET, 86_400).unwrap();
        let theirs = JwtService::new("another_secret_key_that_is_32_chars!", 86_400).unwrap();

        let token = theirs.issue(&Uuid::new_v4(), Role::Admin).unwrap();
        assert_eq!(ours.verify(&token), Err(TokenError::Tampered));
    }
}
