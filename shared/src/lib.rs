//! BandSync Shared Library
//!
//! This crate contains the wire types, public models and validation
//! utilities shared between the backend and its Rust clients.

pub mod errors;
pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use models::{Band, BandMembership, User, UserWithMemberships};
pub use types::*;
