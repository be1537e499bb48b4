use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    #[error("cannot build a Merkle tree over zero leaves")]
    EmptyInput,
}
