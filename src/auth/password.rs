use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

use crate::{auth::error::AuthError, config::HashConfig};

/// Argon2id hasher with configured cost.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Hash of a throwaway secret, verified against when no user matched so
    /// both login failure paths cost the same.
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    pub fn new(cfg: HashConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
        let mut hasher = Self {
            params,
            dummy_hash: Arc::from(""),
        };
        let dummy = hasher
            .hash("announceit-dummy-password")
            .map_err(|e| anyhow::anyhow!("could not build dummy hash: {e}"))?;
        hasher.dummy_hash = Arc::from(dummy);
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plain: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                AuthError::HashFailure(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Wrong passwords and unreadable stored hashes both yield `false`.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "stored password hash could not be parsed");
                return false;
            }
        };
        // Params come from the PHC string, not from self.
        self.argon2()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    /// Runs [`Self::hash`] on the blocking pool.
    pub async fn hash_blocking(&self, plain: String) -> Result<String, AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| AuthError::HashFailure(e.to_string()))?
    }

    /// Runs [`Self::verify`] on the blocking pool. A panicked task counts as a mismatch.
    pub async fn verify_blocking(&self, plain: String, hash: String) -> bool {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "password verification task failed");
                false
            })
    }

    /// Burns one verification against the dummy hash. Always `false`.
    pub async fn verify_dummy_blocking(&self, plain: String) -> bool {
        let hash = self.dummy_hash.to_string();
        self.verify_blocking(plain, hash).await;
        false
    }
}
