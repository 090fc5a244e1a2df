//! Salted Argon2id password hashing with a fixed work factor

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::fmt::Debug;

use crate::domain::DomainError;

/// Memory cost in KiB. Together with the two constants below this is the
/// work factor every stored hash is produced with.
pub const MEMORY_COST_KIB: u32 = 19 * 1024;
/// Number of passes over memory
pub const TIME_COST: u32 = 2;
/// Lanes
pub const PARALLELISM: u32 = 1;

pub trait PasswordHasher: Send + Sync + Debug {
    /// Hash a password with a fresh random salt
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    /// Check `password` against a stored PHC string
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2id v19 hasher pinned to [`MEMORY_COST_KIB`], [`TIME_COST`] and [`PARALLELISM`]
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new() -> Result<Self, DomainError> {
        Self::with_cost(MEMORY_COST_KIB, TIME_COST, PARALLELISM)
    }

    /// Hasher with an explicit cost, rejected if argon2 considers it out of range
    pub fn with_cost(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, DomainError> {
        let params = Params::new(memory_kib, iterations, parallelism, None).map_err(|e| {
            DomainError::configuration(format!("Invalid Argon2 parameters: {}", e))
        })?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::hashing(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        // The cost stored in the hash is used, so older hashes keep verifying
        PasswordHash::new(hash)
            .map(|parsed| self.argon2().verify_password(password.as_bytes(), &parsed).is_ok())
            .unwrap_or(false)
    }
}
