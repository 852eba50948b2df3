//! Portal session tokens.
//!
//! Tokens come from a ChaCha20 CSPRNG seeded from OS entropy.

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

/// Token length in bytes before hex encoding.
const TOKEN_BYTES: usize = 32;

/// Opaque portal session token.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PortalToken(String);

impl PortalToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PortalToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for PortalToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Debug for PortalToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Enough to correlate log lines, not enough to replay.
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "PortalToken({prefix}…)")
    }
}

/// Generates unguessable portal tokens.
pub struct TokenGenerator {
    rng: ChaCha20Rng,
    issued: u64,
}

impl TokenGenerator {
    /// Creates a generator seeded from the OS entropy source.
    pub fn from_os_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
            issued: 0,
        }
    }

    /// Creates a generator from a known seed (for testing only).
    #[cfg(test)]
    pub(crate) fn from_seed_for_testing(seed: [u8; 32]) -> Self {
        Self {
            rng: ChaCha20Rng::from_seed(seed),
            issued: 0,
        }
    }

    /// Issues the next token.
    pub fn next_token(&mut self) -> PortalToken {
        let mut bytes = [0u8; TOKEN_BYTES];
        self.rng.fill_bytes(&mut bytes);
        self.issued += 1;
        PortalToken(bytes.iter().map(|b| format!("{:02x}", b)).collect())
    }

    /// Tokens issued so far.
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::from_os_entropy()
    }
}

impl std::fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGenerator")
            .field("issued", &self.issued)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_hex_and_distinct() {
        let mut tokens = TokenGenerator::from_os_entropy();
        let a = tokens.next_token();
        let b = tokens.next_token();

        assert_eq!(a.as_str().len(), TOKEN_BYTES * 2);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
        assert_eq!(tokens.issued(), 2);
    }

    #[test]
    fn test_seeded_generator_is_deterministic() {
        let mut a = TokenGenerator::from_seed_for_testing([7; 32]);
        let mut b = TokenGenerator::from_seed_for_testing([7; 32]);
        assert_eq!(a.next_token(), b.next_token());
    }

    #[test]
    fn test_debug_truncates() {
        let token = PortalToken::from("0123456789abcdef");
        assert_eq!(format!("{:?}", token), "PortalToken(01234567…)");
    }
}
