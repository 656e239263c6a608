//! Owned sub-range bookkeeping.
//!
//! A block's owned range narrows once per round in two named phases:
//! [`RangeTracker::send_range`] computes the slice offered to each group
//! position *before* transport, and [`RangeTracker::narrow`] commits the
//! block's own slice *after* the round's merges. The tracker is never
//! mutated between the two, so every slice of one round is cut from the same
//! pre-round range.

use crate::error::{Result, SwapError};
use std::ops::Range;

/// Contiguous range `[start, start + len)` of a block buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SubRange {
    pub start: usize,
    pub len: usize,
}

impl SubRange {
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    pub const fn end(&self) -> usize {
        self.start + self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Slice `position` of `k` equal slices cut on `granularity` boundaries.
    ///
    /// Every slice but the last holds `floor(units / k)` whole units of
    /// `granularity` elements; the last absorbs whatever remains, including
    /// any trailing partial unit. The `k` slices tile `self` exactly.
    pub fn slice(&self, position: u32, k: u32, granularity: usize) -> SubRange {
        debug_assert!(k >= 1 && position < k);
        debug_assert!(granularity >= 1);
        let k = k as usize;
        let position = position as usize;
        let base = (self.len / granularity) / k * granularity;
        let start = self.start + position * base;
        let len = if position == k - 1 {
            self.len - (k - 1) * base
        } else {
            base
        };
        SubRange { start, len }
    }

    /// All `k` slices of `self`, by position.
    pub fn split(&self, k: u32, granularity: usize) -> Vec<SubRange> {
        (0..k).map(|i| self.slice(i, k, granularity)).collect()
    }
}

impl std::fmt::Display for SubRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

/// Tracks the sub-range of its buffer a block currently owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeTracker {
    owned: SubRange,
    granularity: usize,
}

impl RangeTracker {
    /// Own the whole buffer of `len` elements, splitting element by element.
    pub fn new(len: usize) -> Self {
        Self::with_granularity(len, 1)
    }

    /// Own the whole buffer, splitting only on multiples of `granularity`.
    pub fn with_granularity(len: usize, granularity: usize) -> Self {
        Self {
            owned: SubRange::new(0, len),
            granularity: granularity.max(1),
        }
    }

    pub fn owned(&self) -> SubRange {
        self.owned
    }

    pub fn granularity(&self) -> usize {
        self.granularity
    }

    /// Send phase: the slice of the current range destined for the group
    /// member at `position` of `k`.
    pub fn send_range(&self, position: u32, k: u32) -> SubRange {
        self.owned.slice(position, k, self.granularity)
    }

    /// Narrow phase: keep the slice at this block's own position. Applied
    /// exactly once per round; a no-op when `k == 1`.
    pub fn narrow(&mut self, my_position: u32, k: u32) -> SubRange {
        self.owned = self.owned.slice(my_position, k, self.granularity);
        self.owned
    }

    /// Adopt a range handed over by another block (final redistribution).
    pub fn replace(&mut self, range: SubRange, buffer_len: usize) -> Result<()> {
        if range.end() > buffer_len {
            return Err(SwapError::RangeOutOfBounds {
                start: range.start,
                len: range.len,
                buffer_len,
            });
        }
        self.owned = range;
        Ok(())
    }
}
