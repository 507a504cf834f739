//! # Chain View
//!
//! Read access to stored (or staged) block records and the canonical index.

use crate::domain::{BlockRecord, Hash, RelayError, RelayResult, StorageError};

/// Read-only view over block records and the canonical height index.
pub trait ChainView {
    /// Record stored under `hash`.
    fn block(&self, hash: &Hash) -> RelayResult<Option<BlockRecord>>;

    /// Canonical hash at `height`.
    fn canonical_hash(&self, height: u64) -> RelayResult<Option<Hash>>;

    /// Is `record` a member of the canonical chain?
    fn is_canonical(&self, record: &BlockRecord) -> RelayResult<bool> {
        Ok(self.canonical_hash(record.height)? == Some(record.hash))
    }
}

/// Writable canonical height index, used by fork choice.
pub trait CanonicalIndex: ChainView {
    /// Point `height` at `hash`.
    fn set_canonical(&mut self, height: u64, hash: Hash);

    /// Remove the entry at `height`.
    fn clear_canonical(&mut self, height: u64);
}

/// Parent of `record`, checking the height link.
pub fn parent_of<V: ChainView + ?Sized>(
    view: &V,
    record: &BlockRecord,
) -> RelayResult<BlockRecord> {
    let parent = view
        .block(&record.header.prev_hash)?
        .ok_or(RelayError::UnknownAncestor(record.header.prev_hash))?;

    if parent.height + 1 != record.height {
        return Err(StorageError::CorruptAncestry { from: record.hash }.into());
    }
    Ok(parent)
}

/// Ancestor of `from` at `height` along `from`'s own branch.
///
/// Canonical records resolve through the height index; forks walk parent
/// links. Heights strictly decrease on every step.
pub fn ancestor_at<V: ChainView + ?Sized>(
    view: &V,
    from: &BlockRecord,
    height: u64,
) -> RelayResult<BlockRecord> {
    if height > from.height {
        return Err(StorageError::CorruptAncestry { from: from.hash }.into());
    }

    if view.is_canonical(from)? {
        if let Some(hash) = view.canonical_hash(height)? {
            if let Some(record) = view.block(&hash)? {
                return Ok(record);
            }
        }
    }

    let mut cursor = from.clone();
    while cursor.height > height {
        cursor = parent_of(view, &cursor)?;
    }
    Ok(cursor)
}
