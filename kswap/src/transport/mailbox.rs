use crate::error::{Result, SwapError};
use crate::types::{BlockId, MessageTag};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use tokio::sync::oneshot;

type Key = (MessageTag, BlockId);

/// Shared state between the delivering side and the receiving block.
///
/// When a message arrives before `recv` has been called for its key, it is
/// buffered in `pending`. When a receiver registers first, it parks a
/// oneshot in `waiters` and the next delivery for that key completes it.
#[derive(Default)]
struct MailboxState {
    pending: BTreeMap<Key, VecDeque<Vec<u8>>>,
    waiters: HashMap<Key, oneshot::Sender<Vec<u8>>>,
    disconnected: HashSet<BlockId>,
}

/// Inbound message buffer of one block, keyed by `(tag, sender)`.
///
/// Messages for later rounds are held until the block asks for them, so a
/// fast partner can run ahead without corrupting the current round. Per key,
/// payloads are handed out in arrival order.
#[derive(Default)]
pub struct Mailbox {
    state: Mutex<MailboxState>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MailboxState>> {
        self.state
            .lock()
            .map_err(|_| SwapError::LockPoisoned("mailbox"))
    }

    /// Hand a payload from `sender` to this block.
    pub fn deliver(&self, tag: MessageTag, sender: BlockId, payload: Vec<u8>) -> Result<()> {
        let mut st = self.lock()?;
        let key = (tag, sender);
        let payload = match st.waiters.remove(&key) {
            Some(tx) => match tx.send(payload) {
                Ok(()) => return Ok(()),
                // Receiver gave up (timeout); keep the payload for a retry.
                Err(payload) => payload,
            },
            None => payload,
        };
        st.pending.entry(key).or_default().push_back(payload);
        Ok(())
    }

    /// Wait for the next payload tagged `tag` from `sender`.
    ///
    /// Fails with `PeerDisconnected` if `sender` is marked disconnected and
    /// nothing from it is buffered.
    pub async fn recv(&self, tag: MessageTag, sender: BlockId) -> Result<Vec<u8>> {
        let rx = {
            let mut st = self.lock()?;
            let key = (tag, sender);
            if let Some(queue) = st.pending.get_mut(&key)
                && let Some(payload) = queue.pop_front()
            {
                if queue.is_empty() {
                    st.pending.remove(&key);
                }
                return Ok(payload);
            }
            if st.disconnected.contains(&sender) {
                return Err(SwapError::PeerDisconnected { gid: sender });
            }
            let (tx, rx) = oneshot::channel();
            st.waiters.insert(key, tx);
            rx
        };
        rx.await
            .map_err(|_| SwapError::PeerDisconnected { gid: sender })
    }

    /// Keys of buffered messages tagged at or before `upto`, in tag order.
    pub fn stray(&self, upto: MessageTag) -> Result<Vec<(MessageTag, BlockId)>> {
        let st = self.lock()?;
        Ok(st
            .pending
            .keys()
            .take_while(|(tag, _)| *tag <= upto)
            .copied()
            .collect())
    }

    /// Number of buffered payloads.
    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> Result<usize> {
        Ok(self.lock()?.pending.values().map(VecDeque::len).sum())
    }

    /// Mark `senders` as gone: their parked receivers fail and future
    /// receives fail once their buffered payloads are drained.
    pub fn disconnect(&self, senders: &[BlockId]) -> Result<()> {
        let mut st = self.lock()?;
        st.disconnected.extend(senders.iter().copied());
        // Dropping the oneshot sender wakes the receiver with an error.
        st.waiters.retain(|(_, sender), _| !senders.contains(sender));
        Ok(())
    }
}
