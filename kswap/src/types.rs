/// Global identifier of a block (0-indexed, unique across the run).
pub type BlockId = u32;

/// Identifier of a worker process that hosts one or more blocks.
pub type WorkerId = u32;

/// Which exchange a message belongs to.
///
/// Swap rounds and the closing redistribution use separate tag spaces so a
/// redistribution message can never be mistaken for a swap sub-range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Phase {
    /// One of the radix-k swap rounds.
    Swap = 0,
    /// The single bit/digit-reversal exchange after the last swap round.
    Final = 1,
}

impl Phase {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Phase::Swap),
            1 => Some(Phase::Final),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Phase::Swap => "swap",
            Phase::Final => "final",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Tag carried by every in-flight message: `(phase, round)`.
///
/// Together with the sender's gid this identifies exactly one payload, so a
/// message for a later round can be buffered without disturbing the current one.
/// Ordering is lexicographic: every swap round precedes the final phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageTag {
    pub phase: Phase,
    pub round: u32,
}

impl MessageTag {
    pub const fn swap(round: u32) -> Self {
        Self {
            phase: Phase::Swap,
            round,
        }
    }

    pub const fn final_exchange() -> Self {
        Self {
            phase: Phase::Final,
            round: 0,
        }
    }
}

impl std::fmt::Display for MessageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.phase, self.round)
    }
}

/// Built-in merge operators selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MergeKind {
    /// Element-wise sum.
    #[default]
    Sum,
    /// Premultiplied-alpha "over" compositing on 4-channel items, ordered by gid.
    AlphaOver,
    /// Replace the owned sub-range with the incoming one.
    Overwrite,
}

impl std::fmt::Display for MergeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeKind::Sum => f.write_str("sum"),
            MergeKind::AlphaOver => f.write_str("alpha_over"),
            MergeKind::Overwrite => f.write_str("overwrite"),
        }
    }
}

impl std::str::FromStr for MergeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(MergeKind::Sum),
            "alpha_over" | "over" => Ok(MergeKind::AlphaOver),
            "overwrite" | "noop" => Ok(MergeKind::Overwrite),
            other => Err(format!("unknown merge operator {other:?}")),
        }
    }
}

/// How the round schedule handles a remaining block count that `target_k`
/// does not divide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FactorPolicy {
    /// Append the largest `j < target_k` dividing the remainder and divide by `j`.
    #[default]
    Consistent,
    /// Append `j` but divide the remainder by `target_k`, as the historical
    /// factorization did. The resulting schedule is validated and rejected
    /// with `MalformedSchedule` when its product drifts from the block count.
    Legacy,
}

impl std::fmt::Display for FactorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactorPolicy::Consistent => f.write_str("consistent"),
            FactorPolicy::Legacy => f.write_str("legacy"),
        }
    }
}

impl std::str::FromStr for FactorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "consistent" => Ok(FactorPolicy::Consistent),
            "legacy" => Ok(FactorPolicy::Legacy),
            other => Err(format!("unknown factor policy {other:?}")),
        }
    }
}
