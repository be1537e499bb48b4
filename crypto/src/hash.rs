//! SHA-256 hashing over raw bytes and canonically serialized JSON.

use ballot_types::Hash256;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of arbitrary bytes.
pub fn sha256_hex(data: &[u8]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    Hash256::new(output)
}

/// Compute the SHA-256 hash of a UTF-8 string.
pub fn sha256_str(data: &str) -> Hash256 {
    sha256_hex(data.as_bytes())
}

/// Canonical JSON encoding: object keys sorted, compact separators.
///
/// `serde_json`'s default `Map` is a `BTreeMap`, so object keys come out
/// sorted at every nesting level; `to_string` emits no whitespace. The
/// resulting byte string is the hash preimage every node must agree on —
/// changing this function is a protocol break, not a refactor.
pub fn canonical_json(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Hash a JSON value through its canonical encoding.
pub fn canonical_hash(value: &Value) -> Hash256 {
    sha256_str(&canonical_json(value))
}
