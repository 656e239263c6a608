//! Per-block, per-round execution of the swap.
//!
//! A round walks `ComputePartners -> SendSubranges -> ReceiveSubranges ->
//! Merge -> Narrow -> RoundComplete`. Rounds with no partners skip straight
//! from `ComputePartners` to `Narrow`. Sends and receives of one round are
//! driven concurrently so two partners never wait on each other.

use crate::block::Block;
use crate::element::Element;
use crate::error::{Result, SwapError};
use crate::merge::{MergeContext, MergeOperator, merge_order};
use crate::partners::PartnerLocator;
use crate::protocol::{decode_elements, encode_elements};
use crate::schedule::RoundSchedule;
use crate::swap::helpers::{check_strays, round_recv, round_send};
use crate::transport::SwapTransport;
use crate::types::{BlockId, MessageTag};
use futures::future::try_join_all;
use std::time::Duration;

/// Where a block stands within its current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    ComputePartners,
    SendSubranges,
    ReceiveSubranges,
    Merge,
    Narrow,
    RoundComplete,
}

/// Runs the swap rounds of one block in order.
///
/// The executor remembers the next round to run; a round that fails leaves
/// it in the phase where the failure happened and the round is not counted.
pub struct SwapRoundExecutor<'a, T: Element> {
    locator: PartnerLocator<'a>,
    operator: &'a dyn MergeOperator<T>,
    transport: &'a dyn SwapTransport,
    timeout: Option<Duration>,
    phase: RoundPhase,
    next_round: usize,
}

impl<'a, T: Element> SwapRoundExecutor<'a, T> {
    pub fn new(
        schedule: &'a RoundSchedule,
        operator: &'a dyn MergeOperator<T>,
        transport: &'a dyn SwapTransport,
    ) -> Self {
        Self {
            locator: PartnerLocator::new(schedule),
            operator,
            transport,
            timeout: None,
            phase: RoundPhase::RoundComplete,
            next_round: 0,
        }
    }

    /// Bound every send and receive of a round.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Index of the round `run_round` will execute next.
    pub fn next_round(&self) -> usize {
        self.next_round
    }

    pub fn is_finished(&self) -> bool {
        self.next_round >= self.locator.schedule().rounds()
    }

    /// Run every remaining round.
    pub async fn run_all(&mut self, block: &mut Block<T>) -> Result<()> {
        while !self.is_finished() {
            self.run_round(block).await?;
        }
        Ok(())
    }

    /// Run the next round for `block`.
    pub async fn run_round(&mut self, block: &mut Block<T>) -> Result<()> {
        let round = self.next_round;
        if self.is_finished() {
            return Err(SwapError::InvalidConfig(format!(
                "block {} already ran all {round} rounds",
                block.gid()
            )));
        }
        let gid = block.gid();
        let tag = MessageTag::swap(round as u32);

        self.phase = RoundPhase::ComputePartners;
        let at = self.locator.locate(round, gid);
        let partners = self.locator.partners(round, gid);
        let partner_gids: Vec<BlockId> = partners.iter().map(|p| p.gid).collect();
        tracing::debug!(
            gid,
            round,
            k = at.k,
            position = at.position,
            range = %block.owned_range(),
            "swap round start"
        );

        if !partners.is_empty() {
            self.phase = RoundPhase::SendSubranges;
            let sends: Vec<_> = partners
                .iter()
                .map(|p| {
                    let range = block.tracker().send_range(p.position, at.k);
                    let payload = encode_elements(block.slice(range));
                    round_send(self.transport, tag, gid, p.gid, payload, self.timeout)
                })
                .collect();

            self.phase = RoundPhase::ReceiveSubranges;
            let recvs: Vec<_> = partners
                .iter()
                .map(|p| round_recv(self.transport, tag, gid, p.gid, self.timeout))
                .collect();
            let (_, received) = tokio::try_join!(try_join_all(sends), try_join_all(recvs))?;

            self.phase = RoundPhase::Merge;
            let mut incoming: Vec<Option<Vec<T>>> = (0..at.k).map(|_| None).collect();
            for (p, bytes) in partners.iter().zip(received) {
                incoming[p.position as usize] = Some(decode_elements(&bytes)?);
            }
            let mine = block.tracker().send_range(at.position, at.k);
            let first = gid - at.position * at.step;
            // Order only matters for operators that do not commute.
            let order: Vec<u32> = if self.operator.is_commutative() {
                (0..at.k).filter(|&p| p != at.position).collect()
            } else {
                merge_order(at.position, at.k).collect()
            };
            for position in order {
                let Some(data) = incoming[position as usize].as_deref() else {
                    continue;
                };
                let ctx = MergeContext {
                    round: round as u32,
                    gid,
                    partner: first + position * at.step,
                    my_position: at.position,
                    partner_position: position,
                };
                self.operator.merge(&ctx, block.slice_mut(mine), data)?;
            }
        }
        check_strays(self.transport, tag, gid, &partner_gids)?;

        self.phase = RoundPhase::Narrow;
        let owned = block.tracker_mut().narrow(at.position, at.k);

        self.phase = RoundPhase::RoundComplete;
        self.next_round += 1;
        tracing::debug!(gid, round, range = %owned, "swap round complete");
        Ok(())
    }
}
