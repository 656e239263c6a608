use crate::block::Block;
use crate::element::Element;
use crate::error::{Result, SwapError};
use crate::types::BlockId;
use std::future::Future;
use tokio::task::JoinHandle;

/// A handle to one block's swap reduction running in the background.
///
/// Call `wait()` to get the block back once its rounds are done, or check
/// `is_finished()` to poll. If dropped without calling `wait()`, the
/// background task is aborted.
pub struct SwapHandle<T: Element> {
    gid: BlockId,
    inner: Option<JoinHandle<Result<Block<T>>>>,
}

impl<T: Element> SwapHandle<T> {
    /// Spawn a future driving block `gid` and return a handle.
    pub(crate) fn spawn(
        gid: BlockId,
        fut: impl Future<Output = Result<Block<T>>> + Send + 'static,
    ) -> Self {
        Self {
            gid,
            inner: Some(tokio::spawn(fut)),
        }
    }

    pub fn gid(&self) -> BlockId {
        self.gid
    }

    /// Wait for the reduction to complete and propagate any error.
    pub async fn wait(mut self) -> Result<Block<T>> {
        let gid = self.gid;
        let handle = self.inner.take().ok_or_else(|| SwapError::TaskFailed {
            gid,
            reason: "handle already consumed".into(),
        })?;
        handle.await.map_err(|e| SwapError::TaskFailed {
            gid,
            reason: format!("swap task panicked: {e}"),
        })?
    }

    /// Check if the reduction has finished (non-blocking).
    pub fn is_finished(&self) -> bool {
        self.inner.as_ref().is_none_or(|h| h.is_finished())
    }
}

impl<T: Element> Drop for SwapHandle<T> {
    fn drop(&mut self) {
        if let Some(handle) = &self.inner {
            handle.abort();
        }
    }
}

/// Blocks of one reduction that can be waited on together.
pub struct SwapGroup<T: Element> {
    handles: Vec<SwapHandle<T>>,
}

impl<T: Element> SwapGroup<T> {
    /// Create an empty group.
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    /// Add a handle to the group.
    pub fn push(&mut self, h: SwapHandle<T>) {
        self.handles.push(h);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every block and return them ordered by gid.
    ///
    /// Returns the first error encountered, if any. All tasks are awaited
    /// regardless of errors.
    pub async fn wait_all(self) -> Result<Vec<Block<T>>> {
        let mut first_err = None;
        let mut blocks = Vec::with_capacity(self.handles.len());
        for h in self.handles {
            match h.wait().await {
                Ok(block) => blocks.push(block),
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => {
                blocks.sort_by_key(Block::gid);
                Ok(blocks)
            }
        }
    }
}

impl<T: Element> Default for SwapGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}
