use crate::error::{Result, SwapError};
use crate::transport::SwapTransport;
use crate::transport::mailbox::Mailbox;
use crate::types::{BlockId, MessageTag};
use futures::future::BoxFuture;
use std::sync::Arc;

/// In-process transport: one mailbox per block, delivery by direct handoff.
///
/// Cheap to clone; clones share the same mailboxes.
#[derive(Clone)]
pub struct LocalNetwork {
    mailboxes: Arc<[Mailbox]>,
}

impl LocalNetwork {
    /// A network connecting blocks `0..total_blocks`.
    pub fn new(total_blocks: u32) -> Self {
        Self {
            mailboxes: (0..total_blocks).map(|_| Mailbox::new()).collect(),
        }
    }

    pub fn total_blocks(&self) -> u32 {
        self.mailboxes.len() as u32
    }

    pub fn mailbox(&self, gid: BlockId) -> Result<&Mailbox> {
        self.mailboxes
            .get(gid as usize)
            .ok_or(SwapError::UnknownBlock { gid })
    }

    /// Mark `gid` as gone for every other block.
    pub fn disconnect(&self, gid: BlockId) -> Result<()> {
        for mb in self.mailboxes.iter() {
            mb.disconnect(&[gid])?;
        }
        Ok(())
    }
}

impl SwapTransport for LocalNetwork {
    fn send<'a>(
        &'a self,
        tag: MessageTag,
        from: BlockId,
        dest: BlockId,
        payload: Vec<u8>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.mailbox(from)?;
            self.mailbox(dest)?.deliver(tag, from, payload)
        })
    }

    fn recv<'a>(
        &'a self,
        tag: MessageTag,
        at: BlockId,
        src: BlockId,
    ) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            self.mailbox(src)?;
            self.mailbox(at)?.recv(tag, src).await
        })
    }

    fn stray_messages(&self, at: BlockId, upto: MessageTag) -> Result<Vec<(MessageTag, BlockId)>> {
        self.mailbox(at)?.stray(upto)
    }
}
