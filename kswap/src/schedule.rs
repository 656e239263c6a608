//! Factorization of the block count into per-round group sizes.
//!
//! Every block derives the same schedule from `(total_blocks, target_k)`
//! alone, so no coordination is needed before the first round.

use crate::config::SwapConfig;
use crate::error::{Result, SwapError};
use crate::types::FactorPolicy;

/// Ordered group sizes ("k-values"), one per round, whose product is the
/// total block count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSchedule {
    total_blocks: u32,
    k_values: Vec<u32>,
}

/// Raw factorization, before validation.
///
/// Prefers `target_k`; otherwise takes the largest `j` in `[2, target_k)`
/// dividing the remainder; otherwise appends the whole remainder as a final
/// round. Under [`FactorPolicy::Legacy`] the remainder is divided by
/// `target_k` even when `j` was appended, which can leave the product short.
pub fn factor_k_values(total_blocks: u32, target_k: u32, policy: FactorPolicy) -> Vec<u32> {
    let mut k_values = Vec::new();
    if target_k < 2 {
        return k_values;
    }
    let mut remaining = total_blocks;

    while remaining > 1 {
        if remaining % target_k == 0 {
            k_values.push(target_k);
            remaining /= target_k;
            continue;
        }
        match (2..target_k).rev().find(|j| remaining % j == 0) {
            Some(j) => {
                k_values.push(j);
                remaining /= match policy {
                    FactorPolicy::Consistent => j,
                    FactorPolicy::Legacy => target_k,
                };
            }
            None => {
                k_values.push(remaining);
                remaining = 1;
            }
        }
    }

    k_values
}

impl RoundSchedule {
    /// Factor `total_blocks` with the consistent policy.
    pub fn new(total_blocks: u32, target_k: u32) -> Result<Self> {
        Self::with_policy(total_blocks, target_k, FactorPolicy::Consistent)
    }

    /// Factor `total_blocks` with an explicit fallback policy.
    pub fn with_policy(total_blocks: u32, target_k: u32, policy: FactorPolicy) -> Result<Self> {
        if target_k < 2 {
            return Err(SwapError::InvalidConfig(format!(
                "target_k must be at least 2, got {target_k}"
            )));
        }
        let k_values = factor_k_values(total_blocks, target_k, policy);
        Self::from_k_values(total_blocks, k_values)
    }

    pub fn from_config(config: &SwapConfig) -> Result<Self> {
        config.validate()?;
        Self::with_policy(config.total_blocks, config.target_k, config.factor_policy)
    }

    /// Validate a caller-provided schedule.
    ///
    /// Rounds of size 1 are accepted; no block exchanges anything in them.
    pub fn from_k_values(total_blocks: u32, k_values: Vec<u32>) -> Result<Self> {
        if total_blocks == 0 {
            return Err(SwapError::InvalidConfig(
                "total_blocks must be at least 1".into(),
            ));
        }
        if k_values.contains(&0) {
            return Err(SwapError::InvalidConfig(format!(
                "k-values must be positive, got {k_values:?}"
            )));
        }
        let product = k_values
            .iter()
            .try_fold(1u64, |acc, &k| acc.checked_mul(u64::from(k)))
            .unwrap_or(u64::MAX);
        if product != u64::from(total_blocks) {
            return Err(SwapError::MalformedSchedule {
                total_blocks,
                product,
                k_values,
            });
        }
        Ok(Self {
            total_blocks,
            k_values,
        })
    }

    pub fn total_blocks(&self) -> u32 {
        self.total_blocks
    }

    /// Number of rounds.
    pub fn rounds(&self) -> usize {
        self.k_values.len()
    }

    pub fn k_values(&self) -> &[u32] {
        &self.k_values
    }

    /// Group size of `round`.
    ///
    /// # Panics
    /// If `round >= self.rounds()`.
    pub fn k(&self, round: usize) -> u32 {
        self.k_values[round]
    }

    /// Distance between consecutive group members in `round`: the product of
    /// all earlier k-values (1 for round 0).
    pub fn step(&self, round: usize) -> u32 {
        self.k_values[..round].iter().product()
    }

    /// True when every round pairs blocks two by two.
    pub fn is_radix_two(&self) -> bool {
        self.k_values.iter().all(|&k| k == 2)
    }
}

impl std::fmt::Display for RoundSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} blocks as {:?}", self.total_blocks, self.k_values)
    }
}
