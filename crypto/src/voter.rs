//! Voter hash derivation.
//!
//! A voter hash is the one-way identifier that replaces the voter's real
//! identity in ledger payloads. The registration flow that calls this lives
//! outside the core; only the derivation rule is defined here so that every
//! component agrees on it.

use ballot_types::Hash256;
use rand::RngCore;

use crate::sha256_str;

/// A derived voter identity plus the salt it was derived with.
///
/// The salt must be stored by the caller — re-deriving the same hash later
/// (e.g. for vote verification) requires it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoterHash {
    pub hash: Hash256,
    pub salt: String,
}

/// Derive a voter hash from a voter card number and constituency code.
///
/// When `salt` is `None` a fresh 16-byte random salt is generated.
pub fn derive_voter_hash(
    voter_card_number: &str,
    constituency_code: &str,
    salt: Option<&str>,
) -> VoterHash {
    let salt = match salt {
        Some(s) => s.to_string(),
        None => {
            let mut bytes = [0u8; 16];
            rand::thread_rng().fill_bytes(&mut bytes);
            hex::encode(bytes)
        }
    };
    let combined = format!("{voter_card_number}:{constituency_code}:{salt}");
    VoterHash {
        hash: sha256_str(&combined),
        salt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_salt_same_hash() {
        let a = derive_voter_hash("ABC1234567", "KA-01", Some("fixed"));
        let b = derive_voter_hash("ABC1234567", "KA-01", Some("fixed"));
        assert_eq!(a, b);
    }

    #[test]
    fn fresh_salts_differ() {
        let a = derive_voter_hash("ABC1234567", "KA-01", None);
        let b = derive_voter_hash("ABC1234567", "KA-01", None);
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn constituency_changes_hash() {
        let a = derive_voter_hash("ABC1234567", "KA-01", Some("s"));
        let b = derive_voter_hash("ABC1234567", "KA-02", Some("s"));
        assert_ne!(a.hash, b.hash);
    }
}
