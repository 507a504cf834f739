//! # Merkle Proof Verification
//!
//! Inclusion proofs against a header's Merkle root.
//!
//! Leaves and proof siblings travel in wire byte order (the raw double-SHA-256
//! digests). Roots are identifiers, held reversed like every other hash in
//! the crate.
//!
//! # Algorithm
//!
//! 1. Start with the transaction id as the running value
//! 2. For each step:
//!    - `Left`: running = SHA256d(sibling || running)
//!    - `Right`: running = SHA256d(running || sibling)
//!    - `SelfPair`: running = SHA256d(running || running)
//! 3. The reversed result must equal the root
//!
//! # Time Complexity: O(log n)

use super::header_codec::{reverse, sha256d};
use crate::domain::{invariant_proof_shape, Direction, Hash, MerkleProof, RelayError};

/// Verify that `leaf` folds up to `root` along `proof`.
///
/// Returns `Ok(false)` on a mismatch; only a shape mismatch is an error.
pub fn verify(
    proof: &[Hash],
    directions: &[Direction],
    root: &Hash,
    leaf: &Hash,
) -> Result<bool, RelayError> {
    invariant_proof_shape(proof.len(), directions.len())?;

    let running = proof
        .iter()
        .zip(directions)
        .fold(*leaf, |running, (sibling, direction)| match direction {
            Direction::Left => hash_pair(sibling, &running),
            Direction::Right => hash_pair(&running, sibling),
            Direction::SelfPair => hash_pair(&running, &running),
        });

    Ok(reverse(&running) == *root)
}

/// Verify a [`MerkleProof`] for `leaf`.
pub fn verify_proof(proof: &MerkleProof, root: &Hash, leaf: &Hash) -> Result<bool, RelayError> {
    verify(&proof.path, &proof.directions, root, leaf)
}

/// Merkle root (identifier order) of wire-order transaction ids.
///
/// An odd node at any level is paired with itself. An empty list has no
/// root.
pub fn compute_merkle_root(tx_ids: &[Hash]) -> Option<Hash> {
    let mut level: Vec<Hash> = tx_ids.to_vec();
    if level.is_empty() {
        return None;
    }

    while level.len() > 1 {
        level = next_level(&level);
    }

    Some(reverse(&level[0]))
}

/// Build the inclusion proof for `tx_ids[tx_index]`.
pub fn build_merkle_proof(tx_ids: &[Hash], tx_index: usize) -> Result<MerkleProof, RelayError> {
    if tx_index >= tx_ids.len() {
        return Err(RelayError::Format(format!(
            "transaction index {} out of range for {} transactions",
            tx_index,
            tx_ids.len()
        )));
    }

    let mut proof = MerkleProof::default();
    let mut level: Vec<Hash> = tx_ids.to_vec();
    let mut index = tx_index;

    while level.len() > 1 {
        let (sibling, direction) = if index % 2 == 1 {
            (level[index - 1], Direction::Left)
        } else if index + 1 < level.len() {
            (level[index + 1], Direction::Right)
        } else {
            // Last node of an odd level
            (level[index], Direction::SelfPair)
        };
        proof.path.push(sibling);
        proof.directions.push(direction);

        level = next_level(&level);
        index /= 2;
    }

    Ok(proof)
}

fn next_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            hash_pair(left, right)
        })
        .collect()
}

fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(left);
    data[32..].copy_from_slice(right);
    sha256d(&data)
}
