//! One-way hashing for OTP codes and passwords.
//!
//! Argon2id behind a small wrapper so the engines see only `hash`/`compare`.
//! The digest is a self-describing PHC string, so `compare` works regardless
//! of the cost the digest was created with.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use tracing::error;

const MEMORY_COST_KIB: u32 = 19 * 1024;
const PARALLELISM: u32 = 1;

#[derive(Clone)]
pub struct SecretHasher {
    time_cost: u32,
}

impl SecretHasher {
    /// Build a hasher with the given time-cost work factor (iterations).
    ///
    /// # Errors
    /// Returns an error if the cost does not form valid Argon2 parameters.
    pub fn new(time_cost: u32) -> Result<Self> {
        // Validate eagerly so a bad cost fails at startup, not per-request.
        Params::new(MEMORY_COST_KIB, time_cost, PARALLELISM, None)
            .map_err(|err| anyhow!("Invalid hash cost {time_cost}: {err}"))?;
        Ok(Self { time_cost })
    }

    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(MEMORY_COST_KIB, self.time_cost, PARALLELISM, None)
            .map_err(|err| anyhow!("Invalid hash parameters: {err}"))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a plaintext secret into a PHC-format digest.
    ///
    /// # Errors
    /// Returns an error if hashing fails.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = self
            .argon2()?
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| anyhow!("Failed to hash secret: {err}"))?;
        Ok(digest.to_string())
    }

    /// Compare a plaintext secret against a stored digest.
    ///
    /// A malformed digest is logged and treated as a mismatch rather than
    /// surfaced to the caller.
    #[must_use]
    pub fn compare(&self, plaintext: &str, digest: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(err) => {
                error!("Stored digest failed to parse: {err}");
                return false;
            }
        };
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
