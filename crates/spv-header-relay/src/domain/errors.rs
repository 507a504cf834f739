//! # Domain Errors
//!
//! Error types for the SPV header relay.
//!
//! Every rejection is synchronous and local. A rejected header or batch
//! leaves the chain store untouched.

use thiserror::Error;

/// Block identifier (32 bytes, big-endian numeric order).
pub type Hash = [u8; 32];

/// Short hex rendering used in error and log messages.
pub(crate) fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..8])
}

/// Key-value store and record encoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    Io {
        /// Underlying error message
        message: String,
    },

    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    Corruption {
        /// What was found
        message: String,
    },

    /// Record could not be encoded or decoded.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Underlying error message
        message: String,
    },

    /// Ancestor links loop or run past the bootstrap block.
    #[error("Corrupt ancestry while walking back from {}", short_hex(.from))]
    CorruptAncestry {
        /// Tip the walk started from
        from: Hash,
    },
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Relay error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// Malformed input: raw header length, proof shape, batch shape.
    #[error("Format error: {0}")]
    Format(String),

    /// Parent block is not stored.
    #[error("Unknown ancestor: {}", short_hex(.0))]
    UnknownAncestor(Hash),

    /// Declared bits do not match the target required at this height.
    #[error(
        "Difficulty mismatch at height {height}: expected {expected:#010x}, got {actual:#010x}"
    )]
    DifficultyMismatch {
        /// Height of the rejected header
        height: u64,
        /// Compact target required by chain history
        expected: u32,
        /// Compact target declared by the header
        actual: u32,
    },

    /// Header hash is above its target.
    #[error("Insufficient work: hash {} exceeds target", short_hex(.0))]
    InsufficientWork(Hash),

    /// Header time is not above the Median Time Past.
    #[error("Stale timestamp: {time} <= median time past {median}")]
    StaleTimestamp {
        /// Header time
        time: u32,
        /// Median of the preceding timestamps
        median: u32,
    },

    /// Header time is too far ahead of the host clock.
    #[error("Timestamp too far in future: {time}, now {now}, allowed drift {max_drift}s")]
    FutureTimestamp {
        /// Header time
        time: u32,
        /// Host clock reading
        now: u64,
        /// Configured bound in seconds
        max_drift: u32,
    },

    /// Hash already stored.
    #[error("Duplicate block: {}", short_hex(.0))]
    DuplicateBlock(Hash),

    /// Batch element does not extend the previous batch element.
    #[error(
        "Non-contiguous batch at index {index}: expected parent {}, got {}",
        short_hex(.expected_prev),
        short_hex(.actual_prev)
    )]
    NonContiguousBatch {
        /// Offending position in the batch
        index: usize,
        /// Hash of the previous batch element
        expected_prev: Hash,
        /// Parent declared by the offending element
        actual_prev: Hash,
    },

    /// Bootstrap height is not zero or a retarget boundary.
    #[error("Invalid bootstrap height {height}: must be 0 or a multiple of {interval}")]
    InvalidBootstrapHeight {
        /// Requested height
        height: u64,
        /// Retarget interval
        interval: u64,
    },

    /// The store already holds a bootstrap block.
    #[error("Relay already bootstrapped")]
    AlreadyBootstrapped,

    /// No bootstrap block has been stored yet.
    #[error("Relay not bootstrapped")]
    NotBootstrapped,

    /// Queried block is not stored.
    #[error("Unknown block: {}", short_hex(.0))]
    UnknownBlock(Hash),

    /// Queried block is stored but not canonical.
    #[error("Block not in mainchain: {}", short_hex(.0))]
    NotInMainchain(Hash),

    /// Block is canonical but not buried deep enough.
    #[error("Insufficient confirmations: {got} < {required}")]
    InsufficientConfirmations {
        /// Confirmations observed
        got: u64,
        /// Confirmations required
        required: u64,
    },

    /// A batch element failed; nothing from the batch was stored.
    #[error("Batch rejected at index {index}: {source}")]
    Batch {
        /// Position of the failing header
        index: usize,
        /// Why it failed
        source: Box<RelayError>,
    },

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RelayError {
    /// The underlying rule violation, unwrapping batch context.
    pub fn root_cause(&self) -> &RelayError {
        match self {
            RelayError::Batch { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
