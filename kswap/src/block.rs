use crate::element::Element;
use crate::error::{Result, SwapError};
use crate::range::{RangeTracker, SubRange};
use crate::types::BlockId;

/// One participant of a swap reduction: its gid, its full-length buffer and
/// the sub-range of that buffer it currently owns.
///
/// Elements outside the owned range keep whatever they held before the
/// reduction; only the owned range is meaningful once rounds have run.
#[derive(Debug, Clone)]
pub struct Block<T: Element> {
    gid: BlockId,
    buffer: Vec<T>,
    tracker: RangeTracker,
}

impl<T: Element> Block<T> {
    /// A block owning all of `buffer`, split element by element.
    pub fn new(gid: BlockId, buffer: Vec<T>) -> Self {
        let tracker = RangeTracker::new(buffer.len());
        Self {
            gid,
            buffer,
            tracker,
        }
    }

    /// A block whose buffer holds items of `item_size` elements that must
    /// never be split across blocks.
    pub fn with_item_size(gid: BlockId, buffer: Vec<T>, item_size: usize) -> Result<Self> {
        if item_size == 0 {
            return Err(SwapError::InvalidConfig(
                "item_size must be at least 1".into(),
            ));
        }
        if buffer.len() % item_size != 0 {
            return Err(SwapError::MisalignedItems {
                len: buffer.len(),
                item_size,
            });
        }
        let tracker = RangeTracker::with_granularity(buffer.len(), item_size);
        Ok(Self {
            gid,
            buffer,
            tracker,
        })
    }

    pub fn gid(&self) -> BlockId {
        self.gid
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &[T] {
        &self.buffer
    }

    pub fn into_buffer(self) -> Vec<T> {
        self.buffer
    }

    pub fn tracker(&self) -> &RangeTracker {
        &self.tracker
    }

    pub(crate) fn tracker_mut(&mut self) -> &mut RangeTracker {
        &mut self.tracker
    }

    pub fn owned_range(&self) -> SubRange {
        self.tracker.owned()
    }

    /// The elements of the owned range.
    pub fn owned(&self) -> &[T] {
        &self.buffer[self.tracker.owned().as_range()]
    }

    /// Elements of `range`, which must lie inside the buffer.
    pub(crate) fn slice(&self, range: SubRange) -> &[T] {
        &self.buffer[range.as_range()]
    }

    pub(crate) fn slice_mut(&mut self, range: SubRange) -> &mut [T] {
        &mut self.buffer[range.as_range()]
    }

    /// Take over `range` and fill it with `data` (final redistribution).
    pub(crate) fn adopt(&mut self, range: SubRange, data: &[T]) -> Result<()> {
        if data.len() != range.len {
            return Err(SwapError::DecodeFailed(format!(
                "handoff for {range} carries {} elements",
                data.len()
            )));
        }
        self.tracker.replace(range, self.buffer.len())?;
        self.buffer[range.as_range()].copy_from_slice(data);
        Ok(())
    }
}
