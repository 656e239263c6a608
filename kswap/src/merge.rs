//! Merge operators: how an incoming sub-range combines into the owned one.
//!
//! Operators are stateless values dispatched through the [`MergeOperator`]
//! trait. The round executor calls [`MergeOperator::merge`] once per partner
//! in [`merge_order`], passing a [`MergeContext`] that says on which side of
//! the owned data (in gid order) the incoming data sits.

use crate::element::Element;
use crate::error::{Result, SwapError};
use crate::types::{BlockId, MergeKind};
use std::sync::Arc;

/// Channels per AlphaOver item: `(x, y, z, a)`.
pub const RGBA_CHANNELS: usize = 4;

/// Position of the incoming sub-range relative to the owned accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The partner precedes this block in gid order: incoming is in front.
    Front,
    /// The partner follows this block: incoming is behind.
    Back,
}

/// Identifies the exchange a merge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeContext {
    pub round: u32,
    pub gid: BlockId,
    pub partner: BlockId,
    pub my_position: u32,
    pub partner_position: u32,
}

impl MergeContext {
    pub fn side(&self) -> Side {
        if self.partner_position < self.my_position {
            Side::Front
        } else {
            Side::Back
        }
    }
}

/// Order in which a block at `my_position` merges its `k - 1` partners.
///
/// Preceding partners come nearest first (descending position), then
/// following partners nearest first (ascending position). Each merge
/// therefore extends a contiguous run of positions around the block's own,
/// which is what a non-commutative operator needs to reproduce ascending
/// gid order. Commutative operators are unaffected.
pub fn merge_order(my_position: u32, k: u32) -> impl Iterator<Item = u32> {
    (0..my_position).rev().chain(my_position + 1..k)
}

/// Combines one incoming sub-range into a block's owned sub-range.
pub trait MergeOperator<T: Element>: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Merge `incoming` into `owned` in place.
    ///
    /// Fails with `SizeMismatch` if the slices differ in length.
    fn merge(&self, ctx: &MergeContext, owned: &mut [T], incoming: &[T]) -> Result<()>;

    /// Whether the result is independent of merge order.
    fn is_commutative(&self) -> bool {
        true
    }

    /// Reject element types or layouts the operator cannot handle, before
    /// any data moves.
    fn validate(&self, _item_size: usize) -> Result<()> {
        Ok(())
    }
}

/// `SizeMismatch` unless both slices have the same length.
pub fn check_lengths<T>(ctx: &MergeContext, owned: &[T], incoming: &[T]) -> Result<()> {
    if owned.len() != incoming.len() {
        return Err(SwapError::SizeMismatch {
            round: ctx.round,
            gid: ctx.gid,
            partner: ctx.partner,
            expected: owned.len(),
            actual: incoming.len(),
        });
    }
    Ok(())
}

/// Element-wise addition. Integers wrap.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

impl<T: Element> MergeOperator<T> for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn merge(&self, ctx: &MergeContext, owned: &mut [T], incoming: &[T]) -> Result<()> {
        check_lengths(ctx, owned, incoming)?;
        for (o, &i) in owned.iter_mut().zip(incoming) {
            *o = T::accumulate(*o, i);
        }
        Ok(())
    }
}

/// Premultiplied-alpha "over" on `(x, y, z, a)` items; lower gids are in front.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphaOver;

impl AlphaOver {
    /// `front over back`, written into `out`.
    fn composite<T: Element>(front: &[T], back: &[T], out: &mut [T]) -> Result<()> {
        let alpha = front[RGBA_CHANNELS - 1];
        for c in 0..RGBA_CHANNELS {
            out[c] = T::over(front[c], back[c], alpha).ok_or(SwapError::UnsupportedElement {
                element: T::NAME,
                op: "alpha_over",
            })?;
        }
        Ok(())
    }
}

impl<T: Element> MergeOperator<T> for AlphaOver {
    fn name(&self) -> &'static str {
        "alpha_over"
    }

    fn merge(&self, ctx: &MergeContext, owned: &mut [T], incoming: &[T]) -> Result<()> {
        check_lengths(ctx, owned, incoming)?;
        if owned.len() % RGBA_CHANNELS != 0 {
            return Err(SwapError::MisalignedItems {
                len: owned.len(),
                item_size: RGBA_CHANNELS,
            });
        }
        let side = ctx.side();
        let mut px = [T::default(); RGBA_CHANNELS];
        for (o, i) in owned
            .chunks_exact_mut(RGBA_CHANNELS)
            .zip(incoming.chunks_exact(RGBA_CHANNELS))
        {
            match side {
                Side::Front => Self::composite(i, o, &mut px)?,
                Side::Back => Self::composite(o, i, &mut px)?,
            }
            o.copy_from_slice(&px);
        }
        Ok(())
    }

    fn is_commutative(&self) -> bool {
        false
    }

    fn validate(&self, item_size: usize) -> Result<()> {
        if !T::BLENDABLE {
            return Err(SwapError::UnsupportedElement {
                element: T::NAME,
                op: "alpha_over",
            });
        }
        if item_size % RGBA_CHANNELS != 0 {
            return Err(SwapError::MisalignedItems {
                len: item_size,
                item_size: RGBA_CHANNELS,
            });
        }
        Ok(())
    }
}

/// Replace the owned sub-range with the incoming one. Checks transport
/// correctness without any merge semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overwrite;

impl<T: Element> MergeOperator<T> for Overwrite {
    fn name(&self) -> &'static str {
        "overwrite"
    }

    fn merge(&self, ctx: &MergeContext, owned: &mut [T], incoming: &[T]) -> Result<()> {
        check_lengths(ctx, owned, incoming)?;
        owned.copy_from_slice(incoming);
        Ok(())
    }

    fn is_commutative(&self) -> bool {
        false
    }
}

impl MergeKind {
    /// The built-in operator for this kind.
    pub fn operator<T: Element>(self) -> Arc<dyn MergeOperator<T>> {
        match self {
            MergeKind::Sum => Arc::new(Sum),
            MergeKind::AlphaOver => Arc::new(AlphaOver),
            MergeKind::Overwrite => Arc::new(Overwrite),
        }
    }
}
