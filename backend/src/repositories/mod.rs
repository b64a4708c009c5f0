//! Credential store
//!
//! Handlers talk to persistence through the [`UserStore`] trait. The store
//! handle is built once at startup and injected into [`crate::state::AppState`].

pub mod memory;
pub mod user;

use async_trait::async_trait;
use bandsync_shared::models::BandMembership;
use thiserror::Error;
use uuid::Uuid;

pub use memory::InMemoryUserStore;
pub use user::{PgUserStore, UserRecord};

/// Errors surfaced by a [`UserStore`]
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the constraint name
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("record not found")]
    NotFound,

    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::UniqueViolation(db.constraint().unwrap_or("record").to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Input for creating a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
}

/// Non-credential profile fields; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateUserProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub timezone: Option<String>,
    pub profile_image_url: Option<String>,
}

/// Persistence for user records and their band memberships
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with [`StoreError::UniqueViolation`] on a taken email.
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    /// Apply profile updates. Fails with [`StoreError::NotFound`] for an unknown id.
    async fn update_profile(
        &self,
        id: Uuid,
        updates: UpdateUserProfile,
    ) -> Result<UserRecord, StoreError>;

    /// Replace the stored password digest
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError>;

    /// Memberships of a user, oldest first, each with its band
    async fn memberships_for_user(&self, user_id: Uuid) -> Result<Vec<BandMembership>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;

    /// Release underlying resources at shutdown
    async fn close(&self) {}
}
