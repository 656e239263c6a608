//! Closing redistribution after the last swap round.
//!
//! After the rounds, the block with gid `g = d0 + d1*k0 + d2*k0*k1 + ...`
//! owns slice number `d0*(k1*...*k_{R-1}) + d1*(k2*...*k_{R-1}) + ... + d_{R-1}`
//! of the dataset: its mixed-radix digits reversed. One exchange moves
//! every slice to the block whose gid equals the slice number, so gids and
//! ranges ascend together. With every k-value equal to 2 this is the
//! bit-reversal pairing, where each active block swaps with exactly one
//! partner.

use crate::block::Block;
use crate::element::Element;
use crate::error::{Result, SwapError};
use crate::protocol::{decode_handoff, encode_handoff};
use crate::schedule::RoundSchedule;
use crate::swap::helpers::{check_strays, round_recv, round_send};
use crate::transport::SwapTransport;
use crate::types::{BlockId, MessageTag};
use std::time::Duration;

/// Reverse the low `bits` bits of `gid`, keeping the higher ones.
pub fn reverse_bits(gid: BlockId, bits: u32) -> BlockId {
    let bits = bits.min(32);
    if bits == 0 {
        return gid;
    }
    let mask = if bits >= 32 { u32::MAX } else { (1u32 << bits) - 1 };
    let low = (gid & mask).reverse_bits() >> (32 - bits);
    (gid & !mask) | low
}

/// Permutation taking each block's post-swap slice to its contiguous owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalRedistributor {
    total_blocks: u32,
    radices: Vec<u32>,
}

impl FinalRedistributor {
    /// Digit reversal over the k-values of `schedule`.
    pub fn for_schedule(schedule: &RoundSchedule) -> Self {
        Self {
            total_blocks: schedule.total_blocks(),
            radices: schedule.k_values().to_vec(),
        }
    }

    /// Plain bit reversal over `log2(total_blocks)` bits.
    ///
    /// Two or fewer blocks need no exchange, so no bits are reversed.
    pub fn bit_reversal(total_blocks: u32) -> Result<Self> {
        if !total_blocks.is_power_of_two() {
            return Err(SwapError::NotPowerOfTwo { total_blocks });
        }
        let rounds = if total_blocks <= 2 {
            0
        } else {
            total_blocks.trailing_zeros()
        };
        Ok(Self {
            total_blocks,
            radices: vec![2; rounds as usize],
        })
    }

    pub fn total_blocks(&self) -> u32 {
        self.total_blocks
    }

    /// Number of reversed digits; 0 means every block is already in place.
    pub fn rounds(&self) -> usize {
        self.radices.len()
    }

    fn span(&self) -> u32 {
        self.radices.iter().product()
    }

    /// Block that receives `gid`'s slice.
    pub fn destination(&self, gid: BlockId) -> BlockId {
        let mut rest = gid;
        let mut slice = 0;
        for &k in &self.radices {
            slice = slice * k + rest % k;
            rest /= k;
        }
        rest * self.span() + slice
    }

    /// Block whose slice `gid` receives.
    pub fn source(&self, gid: BlockId) -> BlockId {
        let span = self.span();
        let mut low = gid % span;
        let mut digits = Vec::with_capacity(self.radices.len());
        for &k in self.radices.iter().rev() {
            digits.push(low % k);
            low /= k;
        }
        let low = digits
            .iter()
            .zip(self.radices.iter().rev())
            .fold(0, |acc, (&d, &k)| acc * k + d);
        (gid / span) * span + low
    }

    /// A block whose slice is already in place neither sends nor receives.
    pub fn is_active(&self, gid: BlockId) -> bool {
        self.destination(gid) != gid
    }

    /// True when every active block sends to the block it receives from.
    pub fn is_involution(&self) -> bool {
        (0..self.total_blocks).all(|g| self.destination(g) == self.source(g))
    }

    /// Apply the permutation to per-block states indexed by gid.
    pub fn permute<S: Clone>(&self, states: &[S]) -> Vec<S> {
        (0..states.len() as u32)
            .map(|g| states[self.source(g) as usize].clone())
            .collect()
    }

    /// Run the exchange for `block`: hand its owned range and data to
    /// [`destination`](Self::destination) and adopt what arrives from
    /// [`source`](Self::source).
    pub async fn run<T: Element>(
        &self,
        block: &mut Block<T>,
        transport: &dyn SwapTransport,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let gid = block.gid();
        if gid >= self.total_blocks {
            return Err(SwapError::UnknownBlock { gid });
        }
        let tag = MessageTag::final_exchange();
        if !self.is_active(gid) {
            tracing::debug!(gid, range = %block.owned_range(), "final exchange: already in place");
            return check_strays(transport, tag, gid, &[]);
        }

        let dest = self.destination(gid);
        let src = self.source(gid);
        let payload = encode_handoff(block.owned_range(), block.owned());
        let (_, bytes) = tokio::try_join!(
            round_send(transport, tag, gid, dest, payload, timeout),
            round_recv(transport, tag, gid, src, timeout)
        )?;
        let (range, data) = decode_handoff::<T>(&bytes)?;
        block.adopt(range, &data)?;
        check_strays(transport, tag, gid, &[src])?;

        tracing::debug!(gid, dest, src, range = %range, "final exchange complete");
        Ok(())
    }
}
