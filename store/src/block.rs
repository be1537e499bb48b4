//! Block storage trait.

use crate::StoreError;
use ballot_types::Hash256;

/// Storage for the ordered block sequence of each ledger.
///
/// Implementations must keep `(ledger_id, index)` unique and return blocks
/// in ascending index order from [`load_blocks`](Self::load_blocks).
pub trait BlockStore {
    /// Persist a block's serialized bytes. Fails with
    /// [`StoreError::Duplicate`] when the index is already occupied.
    fn save_block(
        &self,
        ledger_id: &str,
        index: u64,
        hash: &Hash256,
        block_bytes: &[u8],
    ) -> Result<(), StoreError>;

    /// All blocks of a ledger, ascending by index.
    fn load_blocks(&self, ledger_id: &str) -> Result<Vec<Vec<u8>>, StoreError>;

    /// Whether a block with this exact `(hash, index)` pair exists.
    fn block_exists(&self, ledger_id: &str, hash: &Hash256, index: u64)
        -> Result<bool, StoreError>;

    /// Delete a single block — only used to roll back a failed append.
    fn delete_block(&self, ledger_id: &str, hash: &Hash256) -> Result<(), StoreError>;

    /// Delete every block of a ledger — only used during chain replacement.
    /// Returns the number of blocks removed.
    fn delete_blocks(&self, ledger_id: &str) -> Result<u64, StoreError>;

    /// Number of blocks stored for a ledger.
    fn block_count(&self, ledger_id: &str) -> Result<u64, StoreError>;
}
