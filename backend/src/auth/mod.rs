//! Authentication module
//!
//! Provides JWT-based authentication with argon2 password hashing.

mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, JwtService};
pub use middleware::{authenticate, bearer_token, AuthUser, INVALID_TOKEN, NOT_LOGGED_IN, USER_GONE};
pub use password::PasswordService;
