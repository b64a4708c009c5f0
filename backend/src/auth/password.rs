//! Password hashing using argon2
//!
//! Provides salted Argon2id hashing with a configurable work factor.
//!
//! # Performance Considerations
//!
//! Argon2 is intentionally CPU-intensive. Handlers use the `_async`
//! variants, which run on the blocking thread pool.

use crate::config::HashingConfig;
use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::Arc;

/// Input for the placeholder digest checked on logins for unknown accounts
const DUMMY_PASSWORD: &str = "bandsync-placeholder-password";

/// Password hashing service
///
/// Uses Argon2id which is the recommended variant for password hashing.
/// Verification reads the salt and parameters embedded in the stored digest,
/// so digests made under an older work factor keep verifying.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    /// Digest under the configured work factor, matching nobody's password
    dummy_hash: Arc<str>,
}

impl PasswordService {
    /// Build a hasher with the given work factor
    pub fn new(config: &HashingConfig) -> Result<Self> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid argon2 parameters: {}", e))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2
            .hash_password(DUMMY_PASSWORD.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash placeholder password: {}", e))?
            .to_string();

        Ok(Self {
            argon2,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Hash a password (blocking operation)
    ///
    /// A fresh random salt is drawn per call, so equal inputs give different digests.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
        Ok(hash.to_string())
    }

    /// Hash a password asynchronously (non-blocking)
    pub async fn hash_async(&self, password: String) -> Result<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Verify a password against a stored digest (blocking operation)
    ///
    /// Returns `Ok(false)` on mismatch and `Err` only for a malformed digest.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid hash format: {}", e))?;
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Verify a password asynchronously (non-blocking)
    pub async fn verify_async(&self, password: String, hash: String) -> Result<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Run a full verification against the placeholder digest and discard the outcome
    pub async fn verify_dummy_async(&self, password: String) -> Result<()> {
        let hash = self.dummy_hash.to_string();
        self.verify_async(password, hash).await.map(|_| ())
    }
}
