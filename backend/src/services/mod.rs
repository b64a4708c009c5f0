//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! the credential store, the hasher and the token service.

pub mod user;

pub use user::UserService;
