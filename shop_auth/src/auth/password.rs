//! Argon2id credential hashing.
//!
//! Hashing takes tens of milliseconds; callers on an async runtime go
//! through [`CredentialHasher::hash_blocking`] and
//! [`CredentialHasher::verify_blocking`], which move the work onto the
//! blocking pool.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::RngCore;
use std::sync::Arc;

use super::errors::{AuthError, AuthResult};

/// Argon2 work factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl HashingConfig {
    /// Check the parameters against Argon2's limits
    ///
    /// # Errors
    ///
    /// * `AuthError::Configuration` - Argon2 rejected the parameters
    pub fn validate(&self) -> AuthResult<()> {
        self.params().map(|_| ())
    }

    fn params(&self) -> AuthResult<Params> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| AuthError::Configuration(format!("argon2 parameters: {e}")))
    }

    /// Cheap parameters for tests only
    pub fn for_tests() -> Self {
        Self {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl Default for HashingConfig {
    /// Argon2id defaults: 19 MiB, 2 passes, 1 lane (tens of milliseconds per hash)
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Salted, adaptive one-way password hasher
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    /// Hash of a random value, verified against when no account exists so
    /// both login failure paths cost the same
    dummy_hash: String,
}

impl CredentialHasher {
    /// Create a hasher with the given work factor
    ///
    /// # Errors
    ///
    /// * `AuthError::Configuration` - Argon2 rejected the parameters
    pub fn new(config: HashingConfig) -> AuthResult<Self> {
        let params = config.params()?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut hasher = Self {
            argon2,
            dummy_hash: String::new(),
        };
        let mut filler = [0_u8; 32];
        rand::rng().fill_bytes(&mut filler);
        hasher.dummy_hash = hasher.hash(&hex::encode(filler))?;
        Ok(hasher)
    }

    /// Hash a plaintext password with a fresh random salt
    pub fn hash(&self, plaintext: &str) -> AuthResult<String> {
        let mut salt_bytes = [0_u8; 16];
        rand::rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| AuthError::Internal(format!("salt encoding failed: {e}")))?;
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("password hashing failed: {e}")))
    }

    /// Check a plaintext candidate against a stored hash
    ///
    /// Never errors: a malformed hash is simply a mismatch. The cost
    /// parameters embedded in the stored hash are the ones applied.
    pub fn verify(&self, plaintext: &str, credential_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(credential_hash) else {
            return false;
        };
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burn one verification's worth of CPU against the dummy hash
    pub fn verify_dummy(&self, plaintext: &str) -> bool {
        self.verify(plaintext, &self.dummy_hash)
    }

    /// [`Self::hash`] on the blocking thread pool
    pub async fn hash_blocking(self: &Arc<Self>, plaintext: String) -> AuthResult<String> {
        let hasher = Arc::clone(self);
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AuthError::Internal(format!("hashing task failed: {e}")))?
    }

    /// [`Self::verify`] on the blocking thread pool; `None` hash runs the dummy check
    pub async fn verify_blocking(
        self: &Arc<Self>,
        plaintext: String,
        credential_hash: Option<String>,
    ) -> AuthResult<bool> {
        let hasher = Arc::clone(self);
        tokio::task::spawn_blocking(move || match credential_hash {
            Some(hash) => hasher.verify(&plaintext, &hash),
            None => {
                hasher.verify_dummy(&plaintext);
                false
            }
        })
        .await
        .map_err(|e| AuthError::Internal(format!("verification task failed: {e}")))
    }
}
