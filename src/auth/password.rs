use std::sync::Arc;

use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

use crate::config::HashingConfig;

/// Argon2id hashing with parameters fixed at startup.
#[derive(Clone)]
pub struct Credentials {
    argon2: Argon2<'static>,
    dummy_hash: Arc<str>,
}

impl Credentials {
    pub fn new(cfg: HashingConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!(e.to_string()))
            .context("invalid argon2 parameters")?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut creds = Self {
            argon2,
            dummy_hash: Arc::from(""),
        };
        // Hashed once so unknown-email logins cost the same as wrong passwords.
        creds.dummy_hash = Arc::from(creds.hash("dummy-password-for-timing")?);
        Ok(creds)
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Fails closed: a hash that cannot be parsed never verifies.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "argon2 parse hash error");
                return false;
            }
        };
        // The digest comparison inside is constant-time.
        self.argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    pub fn verify_dummy(&self, plain: &str) -> bool {
        self.verify(plain, &self.dummy_hash)
    }

    pub async fn hash_blocking(&self, plain: String) -> anyhow::Result<String> {
        let creds = self.clone();
        tokio::task::spawn_blocking(move || creds.hash(&plain))
            .await
            .context("hash task panicked")?
    }

    /// `hash` of `None` burns a dummy verification and returns false.
    pub async fn verify_blocking(&self, plain: String, hash: Option<String>) -> anyhow::Result<bool> {
        let creds = self.clone();
        tokio::task::spawn_blocking(move || match hash {
            Some(h) => creds.verify(&plain, &h),
            None => {
                creds.verify_dummy(&plain);
                false
            }
        })
        .await
        .context("verify task panicked")
    }
}

#[cfg(test)]
pub(crate) fn fast_credentials() -> Credentials {
    Credentials::new(HashingConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .expect("fast argon2 params are valid")
}
