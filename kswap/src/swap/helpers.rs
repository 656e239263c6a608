use crate::error::{Result, SwapError};
use crate::transport::SwapTransport;
use crate::types::{BlockId, MessageTag};
use std::future::Future;
use std::time::Duration;

/// Await `fut`, bounded by `timeout` when one is configured.
async fn bounded<F, T>(
    fut: F,
    timeout: Option<Duration>,
    tag: MessageTag,
    gid: BlockId,
    peer: BlockId,
    what: &'static str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(res) => res,
            Err(_) => {
                return Err(SwapError::RoundFailed {
                    phase: tag.phase,
                    round: tag.round,
                    gid,
                    peer,
                    reason: format!("{what} timed out after {:?}", limit),
                });
            }
        },
        None => fut.await,
    };
    outcome.map_err(|e| match e {
        // Contract violations and disconnects keep their own kind.
        e @ (SwapError::PeerDisconnected { .. } | SwapError::UnknownBlock { .. }) => e,
        e if e.is_protocol_violation() => e,
        e => SwapError::RoundFailed {
            phase: tag.phase,
            round: tag.round,
            gid,
            peer,
            reason: e.to_string(),
        },
    })
}

/// Send one payload inside a round, wrapping failures as `RoundFailed`.
pub(crate) async fn round_send(
    transport: &dyn SwapTransport,
    tag: MessageTag,
    gid: BlockId,
    dest: BlockId,
    payload: Vec<u8>,
    timeout: Option<Duration>,
) -> Result<()> {
    let len = payload.len();
    bounded(transport.send(tag, gid, dest, payload), timeout, tag, gid, dest, "send").await?;
    tracing::trace!(gid, peer = dest, %tag, len, "sub-range sent");
    Ok(())
}

/// Receive one payload inside a round, wrapping failures as `RoundFailed`.
pub(crate) async fn round_recv(
    transport: &dyn SwapTransport,
    tag: MessageTag,
    gid: BlockId,
    src: BlockId,
    timeout: Option<Duration>,
) -> Result<Vec<u8>> {
    let payload = bounded(transport.recv(tag, gid, src), timeout, tag, gid, src, "recv").await?;
    tracing::trace!(gid, peer = src, %tag, len = payload.len(), "sub-range received");
    Ok(payload)
}

/// Fail with `UnexpectedPartner` if anything tagged at or before `tag` is
/// still buffered for `gid` once the expected messages were consumed.
pub(crate) fn check_strays(
    transport: &dyn SwapTransport,
    tag: MessageTag,
    gid: BlockId,
    expected: &[BlockId],
) -> Result<()> {
    if let Some(&(stray_tag, sender)) = transport.stray_messages(gid, tag)?.first() {
        tracing::error!(
            gid,
            sender,
            %stray_tag,
            ?expected,
            "message from a block outside this round's partner set"
        );
        return Err(SwapError::UnexpectedPartner {
            phase: stray_tag.phase,
            round: stray_tag.round,
            gid,
            sender,
            expected: expected.to_vec(),
        });
    }
    Ok(())
}
