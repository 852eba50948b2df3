//! Salted access-code hashing.
//!
//! Organizations are joined with a shared access code. Only a salted
//! digest is kept; verification recomputes it. Access codes are short,
//! so the default is the memory-hard Argon2id.

use argon2::Argon2;
use blake3::Hasher as Blake3Hasher;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Domain separator so these digests cannot collide with other uses.
const ACCESS_CODE_DOMAIN: &[u8] = b"campus-gate-access-code-v1";

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// Supported hash algorithms for access codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// Argon2id with the crate's default cost parameters.
    #[default]
    Argon2id,
    /// BLAKE3 - fast digest, for codes with plenty of entropy.
    Blake3,
    /// SHA-256 - fast digest, for codes with plenty of entropy.
    Sha256,
}

impl HashAlgorithm {
    fn label(self) -> &'static str {
        match self {
            HashAlgorithm::Argon2id => "argon2id",
            HashAlgorithm::Blake3 => "blake3",
            HashAlgorithm::Sha256 => "sha256",
        }
    }

    fn digest(self, salt: &[u8], code: &str) -> Result<[u8; 32], argon2::Error> {
        let digest = match self {
            HashAlgorithm::Argon2id => {
                let mut out = [0u8; 32];
                Argon2::default().hash_password_into(code.as_bytes(), salt, &mut out)?;
                out
            }
            HashAlgorithm::Blake3 => {
                let mut hasher = Blake3Hasher::new();
                hasher.update(ACCESS_CODE_DOMAIN);
                hasher.update(salt);
                hasher.update(code.as_bytes());
                *hasher.finalize().as_bytes()
            }
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(ACCESS_CODE_DOMAIN);
                hasher.update(salt);
                hasher.update(code.as_bytes());
                let result = hasher.finalize();
                let mut data = [0u8; 32];
                data.copy_from_slice(&result);
                data
            }
        };
        Ok(digest)
    }
}

/// A salted access-code digest.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCodeHash {
    algorithm: HashAlgorithm,
    salt: [u8; SALT_LEN],
    digest: [u8; 32],
}

impl AccessCodeHash {
    /// Hashes `code` with a fresh random salt.
    pub fn new(code: &str, algorithm: HashAlgorithm) -> Result<Self, argon2::Error> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        Self::with_salt(code, algorithm, salt)
    }

    /// Hashes `code` with a caller-supplied salt.
    pub fn with_salt(
        code: &str,
        algorithm: HashAlgorithm,
        salt: [u8; SALT_LEN],
    ) -> Result<Self, argon2::Error> {
        Ok(Self {
            algorithm,
            salt,
            digest: algorithm.digest(&salt, code)?,
        })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Checks a candidate code.
    pub fn verify(&self, code: &str) -> bool {
        let Ok(candidate) = self.algorithm.digest(&self.salt, code) else {
            return false;
        };
        // Compare every byte regardless of where the first mismatch is.
        candidate
            .iter()
            .zip(self.digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

impl std::fmt::Display for AccessCodeHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}${}${}",
            self.algorithm.label(),
            hex(&self.salt),
            hex(&self.digest)
        )
    }
}

impl std::fmt::Debug for AccessCodeHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCodeHash")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}
