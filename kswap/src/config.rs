//! Run configuration for a swap reduction.
//!
//! All values have defaults. Override via environment variables
//! (prefixed `KSWAP_`) or by constructing a custom `SwapConfig`.

use crate::error::{Result, SwapError};
use crate::types::{FactorPolicy, MergeKind};
use std::time::Duration;

/// Parameters every block of one run must agree on.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapConfig {
    /// Total number of blocks taking part in the reduction.
    pub total_blocks: u32,

    /// Desired group size per round.
    pub target_k: u32,

    /// Operator combining incoming sub-ranges into the owned one.
    pub merge: MergeKind,

    /// Run the closing redistribution so block `i` ends up owning the
    /// `i`-th contiguous slice of the dataset.
    pub contiguous_final_layout: bool,

    /// Fallback behaviour of the round factorization.
    pub factor_policy: FactorPolicy,

    /// Number of elements forming one indivisible item (4 for RGBA pixels).
    /// Sub-ranges are always split on item boundaries.
    pub item_size: usize,

    /// Upper bound on waiting for one partner's sub-range. `None` waits
    /// indefinitely and leaves failure detection to the transport.
    pub recv_timeout: Option<Duration>,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            total_blocks: 1,
            target_k: 2,
            merge: MergeKind::Sum,
            contiguous_final_layout: false,
            factor_policy: FactorPolicy::Consistent,
            item_size: 1,
            recv_timeout: None,
        }
    }
}

impl SwapConfig {
    /// Config for `total_blocks` blocks and the given target k, defaults elsewhere.
    pub fn new(total_blocks: u32, target_k: u32) -> Self {
        Self {
            total_blocks,
            target_k,
            ..Self::default()
        }
    }

    pub fn with_merge(mut self, merge: MergeKind) -> Self {
        self.merge = merge;
        if merge == MergeKind::AlphaOver && self.item_size == 1 {
            self.item_size = 4;
        }
        self
    }

    pub fn with_contiguous_final_layout(mut self, contiguous: bool) -> Self {
        self.contiguous_final_layout = contiguous;
        self
    }

    pub fn with_factor_policy(mut self, policy: FactorPolicy) -> Self {
        self.factor_policy = policy;
        self
    }

    pub fn with_item_size(mut self, item_size: usize) -> Self {
        self.item_size = item_size;
        self
    }

    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = Some(timeout);
        self
    }

    /// Load config from environment variables, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `KSWAP_TOTAL_BLOCKS`
    /// - `KSWAP_TARGET_K`
    /// - `KSWAP_MERGE` (`sum`, `alpha_over`, `overwrite`)
    /// - `KSWAP_CONTIGUOUS` (`true`/`false`)
    /// - `KSWAP_FACTOR_POLICY` (`consistent`, `legacy`)
    /// - `KSWAP_ITEM_SIZE`
    /// - `KSWAP_RECV_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(n) = env_parse::<u32>("KSWAP_TOTAL_BLOCKS") {
            cfg.total_blocks = n;
        }
        if let Some(k) = env_parse::<u32>("KSWAP_TARGET_K") {
            cfg.target_k = k;
        }
        if let Some(merge) = env_parse::<MergeKind>("KSWAP_MERGE") {
            cfg = cfg.with_merge(merge);
        }
        if let Some(c) = env_parse::<bool>("KSWAP_CONTIGUOUS") {
            cfg.contiguous_final_layout = c;
        }
        if let Some(p) = env_parse::<FactorPolicy>("KSWAP_FACTOR_POLICY") {
            cfg.factor_policy = p;
        }
        if let Some(n) = env_parse::<usize>("KSWAP_ITEM_SIZE") {
            cfg.item_size = n;
        }
        if let Some(s) = env_parse::<u64>("KSWAP_RECV_TIMEOUT_SECS") {
            cfg.recv_timeout = Some(Duration::from_secs(s));
        }

        cfg
    }

    /// Reject values no schedule or split can be derived from.
    pub fn validate(&self) -> Result<()> {
        if self.total_blocks == 0 {
            return Err(SwapError::InvalidConfig(
                "total_blocks must be at least 1".into(),
            ));
        }
        if self.target_k < 2 {
            return Err(SwapError::InvalidConfig(format!(
                "target_k must be at least 2, got {}",
                self.target_k
            )));
        }
        if self.item_size == 0 {
            return Err(SwapError::InvalidConfig(
                "item_size must be at least 1".into(),
            ));
        }
        if self.merge == MergeKind::AlphaOver && self.item_size % 4 != 0 {
            return Err(SwapError::InvalidConfig(format!(
                "alpha_over needs items made of whole 4-channel pixels, item_size is {}",
                self.item_size
            )));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}
