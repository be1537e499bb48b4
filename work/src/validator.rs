//! PoW validation.

use ballot_types::Hash256;

/// Whether a hash has at least `difficulty` leading `'0'` hex digits.
pub fn meets_difficulty(hash: &Hash256, difficulty: u8) -> bool {
    hash.leading_zero_digits() >= difficulty
}

/// Validate a stored proof of work.
///
/// Both conditions must hold: the hash recomputed from the block's fields
/// equals the stored hash, and the stored hash meets the difficulty. A
/// correct-looking hash that was never actually derived from the fields
/// fails the first check; an honestly-derived hash below target fails the
/// second.
pub fn validate_proof(recomputed: &Hash256, stored: &Hash256, difficulty: u8) -> bool {
    recomputed == stored && meets_difficulty(stored, difficulty)
}
