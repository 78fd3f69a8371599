//! Authentication and authorization module

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, JwtService, TokenError};
pub use middleware::{extract_token, jwt_auth_middleware, AuthContext, Credential, GateOutcome};
pub use password::PasswordHasher;
