use crate::types::{BlockId, Phase};

pub type Result<T> = std::result::Result<T, SwapError>;

#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    #[error(
        "sub-range size mismatch in round {round} at block {gid} (partner {partner}): expected {expected} elements, got {actual}"
    )]
    SizeMismatch {
        round: u32,
        gid: BlockId,
        partner: BlockId,
        expected: usize,
        actual: usize,
    },

    #[error(
        "malformed round schedule for {total_blocks} blocks: k-values {k_values:?} multiply to {product}"
    )]
    MalformedSchedule {
        total_blocks: u32,
        product: u64,
        k_values: Vec<u32>,
    },

    #[error(
        "unexpected {phase} message at block {gid} in round {round} from block {sender} (expected one of {expected:?})"
    )]
    UnexpectedPartner {
        phase: Phase,
        round: u32,
        gid: BlockId,
        sender: BlockId,
        expected: Vec<BlockId>,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("slice of {len} elements does not hold whole items of {item_size} elements")]
    MisalignedItems { len: usize, item_size: usize },

    #[error("element type {element} does not support operation {op}")]
    UnsupportedElement {
        element: &'static str,
        op: &'static str,
    },

    #[error("range [{start}, {start}+{len}) exceeds buffer of {buffer_len} elements")]
    RangeOutOfBounds {
        start: usize,
        len: usize,
        buffer_len: usize,
    },

    #[error("bit-reversal redistribution requires a power-of-two block count, got {total_blocks}")]
    NotPowerOfTwo { total_blocks: u32 },

    #[error("block {gid} is not known to this transport")]
    UnknownBlock { gid: BlockId },

    #[error("peer block {gid} disconnected before delivering its message")]
    PeerDisconnected { gid: BlockId },

    #[error("frame decode failed: {0}")]
    DecodeFailed(String),

    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{phase} round {round} failed at block {gid} (peer {peer}): {reason}")]
    RoundFailed {
        phase: Phase,
        round: u32,
        gid: BlockId,
        peer: BlockId,
        reason: String,
    },

    #[error("internal lock poisoned: {0}")]
    LockPoisoned(&'static str),

    #[error("swap task for block {gid} failed: {reason}")]
    TaskFailed { gid: BlockId, reason: String },
}

impl SwapError {
    /// Create a `Transport` error with just a message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a `Transport` error with a message and a source error.
    pub fn transport_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True for the contract violations that indicate divergent state
    /// between blocks rather than a failed peer.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::SizeMismatch { .. } | Self::MalformedSchedule { .. } | Self::UnexpectedPartner { .. }
        )
    }
}
