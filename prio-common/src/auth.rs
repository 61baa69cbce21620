//! Shared-secret authentication gate
//!
//! A single boolean gate on an externally supplied shared secret, orthogonal
//! to record data. An empty or `"0"` secret disables the gate entirely so
//! development setups run without credentials.

use sha2::{Digest, Sha256};

/// Boolean gate over a configured shared secret
#[derive(Debug, Clone)]
pub struct SecretGate {
    /// Digest of the configured secret; None when the gate is disabled
    digest: Option<[u8; 32]>,
}

impl SecretGate {
    /// Build a gate from the configured secret. Empty and `"0"` disable it.
    pub fn new(secret: &str) -> Self {
        let digest = if secret.is_empty() || secret == "0" {
            None
        } else {
            Some(Sha256::digest(secret.as_bytes()).into())
        };
        Self { digest }
    }

    /// Whether the gate rejects unauthenticated access at all
    pub fn enabled(&self) -> bool {
        self.digest.is_some()
    }

    /// Check a presented secret
    ///
    /// Digests are compared instead of the raw strings so the comparison
    /// does not leak the secret's length.
    pub fn verify(&self, presented: &str) -> bool {
        match &self.digest {
            None => true,
            Some(expected) => {
                let got: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
                // Fixed-width comparison over the digests.
                got.iter().zip(expected).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_gate_accepts_anything() {
        let gate = SecretGate::new("");
        assert!(!gate.enabled());
        assert!(gate.verify("whatever"));

        let gate = SecretGate::new("0");
        assert!(!gate.enabled());
        assert!(gate.verify(""));
    }

    #[test]
    fn test_enabled_gate_matches_exact_secret_only() {
        let gate = SecretGate::new("hunter2");
        assert!(gate.enabled());
        assert!(gate.verify("hunter2"));
        assert!(!gate.verify("hunter3"));
        assert!(!gate.verify(""));
    }
}
