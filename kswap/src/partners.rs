//! Group and partner arithmetic for the swap rounds.
//!
//! Everything here is a pure function of the schedule, the round index and
//! a gid, so any block can compute its partners without communication and
//! nothing needs to be cached between rounds.

use crate::schedule::RoundSchedule;
use crate::types::BlockId;

/// Where a block sits in one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupPosition {
    pub round: usize,
    /// Group size of this round.
    pub k: u32,
    /// Gid distance between consecutive group members.
    pub step: u32,
    /// Group number; shared by exactly the members of one group.
    pub group: u32,
    /// Position in the group, `0..k`.
    pub position: u32,
}

/// One other member of a block's group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partner {
    pub gid: BlockId,
    pub position: u32,
}

/// Maps `(round, gid)` to the block's group, position and partners.
#[derive(Debug, Clone, Copy)]
pub struct PartnerLocator<'a> {
    schedule: &'a RoundSchedule,
}

impl<'a> PartnerLocator<'a> {
    pub fn new(schedule: &'a RoundSchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &'a RoundSchedule {
        self.schedule
    }

    /// Group number and position of `gid` in `round`.
    ///
    /// `group = gid % step + (gid / (step * k)) * step` and
    /// `position = (gid / step) % k`, where `step` is the product of the
    /// k-values of all earlier rounds. The integer division in the group
    /// term truncates on purpose.
    pub fn locate(&self, round: usize, gid: BlockId) -> GroupPosition {
        let k = self.schedule.k(round);
        let step = self.schedule.step(round);
        GroupPosition {
            round,
            k,
            step,
            group: gid % step + (gid / (step * k)) * step,
            position: (gid / step) % k,
        }
    }

    /// All members of `gid`'s group in `round`, itself included, by
    /// ascending position (and therefore ascending gid).
    pub fn members(&self, round: usize, gid: BlockId) -> Vec<BlockId> {
        let at = self.locate(round, gid);
        let first = gid - at.position * at.step;
        (0..at.k).map(|i| first + i * at.step).collect()
    }

    /// The other members of `gid`'s group in `round`, by ascending position.
    ///
    /// Empty when the round's k-value is 1.
    pub fn partners(&self, round: usize, gid: BlockId) -> Vec<Partner> {
        let at = self.locate(round, gid);
        let first = gid - at.position * at.step;
        (0..at.k)
            .filter(|&i| i != at.position)
            .map(|i| Partner {
                gid: first + i * at.step,
                position: i,
            })
            .collect()
    }
}
