mod local;
pub mod mailbox;
pub mod placement;
mod tcp;

pub use local::LocalNetwork;
pub use mailbox::Mailbox;
pub use placement::{ContiguousPlacement, PlacementOracle, RoundRobinPlacement};
pub use tcp::TcpNetwork;

use crate::error::Result;
use crate::types::{BlockId, MessageTag};
use futures::future::BoxFuture;

/// Message substrate the swap rounds run over.
///
/// One transport may host several blocks, so every call names the local
/// block it acts for. Implementations must keep payloads for distinct
/// `(tag, sender)` pairs apart and must not reorder payloads sharing one.
pub trait SwapTransport: Send + Sync {
    /// Send `payload` from local block `from` to block `dest`.
    fn send<'a>(
        &'a self,
        tag: MessageTag,
        from: BlockId,
        dest: BlockId,
        payload: Vec<u8>,
    ) -> BoxFuture<'a, Result<()>>;

    /// Wait for the payload tagged `tag` that block `src` sent to local
    /// block `at`.
    fn recv<'a>(
        &'a self,
        tag: MessageTag,
        at: BlockId,
        src: BlockId,
    ) -> BoxFuture<'a, Result<Vec<u8>>>;

    /// Messages buffered for local block `at` with a tag at or before `upto`.
    fn stray_messages(&self, at: BlockId, upto: MessageTag) -> Result<Vec<(MessageTag, BlockId)>>;
}
