//! In-memory user store
//!
//! Enforces the same email uniqueness as the `users_email_key` constraint.
//! Used by router tests and local experiments without PostgreSQL.

use super::{NewUser, StoreError, UpdateUserProfile, UserRecord, UserStore};
use async_trait::async_trait;
use bandsync_shared::models::{Band, BandMembership};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, UserRecord>,
    memberships: Vec<(Uuid, BandMembership)>,
}

/// User store holding records in process memory
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a user and their memberships, returning whether it existed
    pub async fn remove_user(&self, id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        inner.memberships.retain(|(user_id, _)| *user_id != id);
        inner.users.remove(&id).is_some()
    }

    /// Attach a user to a band
    pub async fn add_membership(&self, user_id: Uuid, band: Band, role: &str) -> BandMembership {
        let membership = BandMembership {
            id: Uuid::new_v4(),
            band_id: band.id,
            role: role.to_string(),
            joined_at: Utc::now(),
            band,
        };
        self.inner
            .write()
            .await
            .memberships
            .push((user_id, membership.clone()));
        membership
    }

    pub async fn user_count(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            profile_image_url: None,
            timezone: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        updates: UpdateUserProfile,
    ) -> Result<UserRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(&id).ok_or(StoreError::NotFound)?;

        if let Some(first_name) = updates.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = updates.last_name {
            user.last_name = last_name;
        }
        if updates.phone_number.is_some() {
            user.phone_number = updates.phone_number;
        }
        if updates.timezone.is_some() {
            user.timezone = updates.timezone;
        }
        if updates.profile_image_url.is_some() {
            user.profile_image_url = updates.profile_image_url;
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn memberships_for_user(&self, user_id: Uuid) -> Result<Vec<BandMembership>, StoreError> {
        let inner = self.inner.read().await;
        let mut memberships: Vec<BandMembership> = inner
            .memberships
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, m)| m.clone())
            .collect();
        memberships.sort_by_key(|m| m.joined_at);
        Ok(memberships)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
