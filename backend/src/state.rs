//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! # Design Principles
//!
//! 1. **Pre-compute expensive resources**: JWT keys and the hasher are built once
//! 2. **Cheap cloning**: All fields use Arc or are already Clone-cheap
//! 3. **Immutable after creation**: State is read-only during request handling

use crate::auth::{JwtService, PasswordService};
use crate::config::AppConfig;
use crate::middleware::IpRateLimiter;
use crate::repositories::UserStore;
use anyhow::Result;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Credential store handle, owned for the lifetime of the app
    pub store: Arc<dyn UserStore>,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Pre-initialized JWT service with cached keys
    pub jwt: JwtService,
    /// Argon2 hasher configured with the work factor
    pub passwords: PasswordService,
    /// Per-IP limiter, absent when rate limiting is disabled
    pub rate_limiter: Option<Arc<IpRateLimiter>>,
}

impl AppState {
    /// Create a new application state
    ///
    /// Fails if the configured hashing or rate limit parameters are invalid.
    pub fn new(store: Arc<dyn UserStore>, config: AppConfig) -> Result<Self> {
        let jwt = JwtService::new(&config.jwt.secret, config.jwt.expiry_secs);
        let passwords = PasswordService::new(&config.hashing)?;
        let rate_limiter = IpRateLimiter::from_config(&config.rate_limit)?.map(Arc::new);

        Ok(Self {
            store,
            config: Arc::new(config),
            jwt,
            passwords,
            rate_limiter,
        })
    }

    /// Get a reference to the credential store
    #[inline]
    pub fn store(&self) -> &dyn UserStore {
        self.store.as_ref()
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a reference to the JWT service
    #[inline]
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// Get a reference to the password hasher
    #[inline]
    pub fn passwords(&self) -> &PasswordService {
        &self.passwords
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HashingConfig;
    use crate::repositories::InMemoryUserStore;

    #[test]
    fn test_state_clone_shares_store() {
        let store = Arc::new(InMemoryUserStore::new());
        let state = AppState::new(store, AppConfig::default()).unwrap();

        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.store, &cloned.store));
    }

    #[test]
    fn test_jwt_service_is_precomputed() {
        let store = Arc::new(InMemoryUserStore::new());
        let state = AppState::new(store, AppConfig::default()).unwrap();

        let user_id = uuid::Uuid::new_v4();
        let token = state.jwt().issue(user_id).unwrap();
        assert_eq!(state.jwt().verify(&token).unwrap(), user_id);
    }

    #[test]
    fn test_invalid_hashing_config_fails() {
        let mut config = AppConfig::default();
        config.hashing = HashingConfig {
            memory_kib: 0,
            iterations: 0,
            parallelism: 0,
        };
        let store = Arc::new(InMemoryUserStore::new());
        assert!(AppState::new(store, config).is_err());
    }

    #[test]
    fn test_rate_limiter_follows_config() {
        let store = Arc::new(InMemoryUserStore::new());
        let state = AppState::new(store.clone(), AppConfig::default()).unwrap();
        assert!(state.rate_limiter.is_some());

        let mut config = AppConfig::default();
        config.rate_limit.enabled = false;
        let state = AppState::new(store, config).unwrap();
        assert!(state.rate_limiter.is_none());
    }
}
