use crate::error::{Result, SwapError};
use crate::protocol::{FrameHeader, HEADER_SIZE, encode_frame};
use crate::transport::SwapTransport;
use crate::transport::mailbox::Mailbox;
use crate::transport::placement::PlacementOracle;
use crate::types::{BlockId, MessageTag, WorkerId};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};

/// Maximum frame payload (4 GiB).
const MAX_FRAME_SIZE: u64 = 4 * 1024 * 1024 * 1024;

type Mailboxes = Arc<HashMap<BlockId, Mailbox>>;

/// Transport between workers over plain TCP.
///
/// Each worker hosts the blocks its [`PlacementOracle`] assigns to it. Every
/// ordered pair of workers shares one connection: the dialing side writes
/// frames (`[FrameHeader][payload]`), the accepting side runs a recv loop
/// that routes each frame into the receiver block's [`Mailbox`]. Messages
/// between two blocks on the same worker never touch a socket.
pub struct TcpNetwork {
    worker: WorkerId,
    placement: Arc<dyn PlacementOracle>,
    mailboxes: Mailboxes,
    writers: HashMap<WorkerId, Mutex<OwnedWriteHalf>>,
    /// Background accept task; owns the per-peer recv loops.
    accept_handle: JoinHandle<()>,
}

impl TcpNetwork {
    /// Join the mesh as `worker`.
    ///
    /// `listener` must already be bound, and so must the listeners behind
    /// every address in `peers` (all workers other than this one).
    pub async fn establish(
        worker: WorkerId,
        listener: TcpListener,
        peers: &HashMap<WorkerId, SocketAddr>,
        placement: Arc<dyn PlacementOracle>,
    ) -> Result<Self> {
        if worker >= placement.workers() {
            return Err(SwapError::InvalidConfig(format!(
                "worker {worker} outside placement of {} workers",
                placement.workers()
            )));
        }
        let mailboxes: Mailboxes = Arc::new(
            placement
                .local_blocks(worker)
                .into_iter()
                .map(|gid| (gid, Mailbox::new()))
                .collect(),
        );

        let accept_handle = tokio::spawn(accept_loop(
            listener,
            peers.len(),
            Arc::clone(&mailboxes),
            Arc::clone(&placement),
        ));

        let mut writers = HashMap::with_capacity(peers.len());
        for (&peer, &addr) in peers {
            let stream = TcpStream::connect(addr)
                .await
                .map_err(|e| {
                    SwapError::transport_with_source(format!("tcp connect to worker {peer}"), e)
                })?;
            stream.set_nodelay(true)?;
            let (_reader, mut writer) = stream.into_split();
            writer
                .write_all(&worker.to_le_bytes())
                .await
                .map_err(|e| SwapError::transport_with_source("tcp handshake", e))?;
            writers.insert(peer, Mutex::new(writer));
        }

        tracing::debug!(
            worker,
            peers = peers.len(),
            blocks = mailboxes.len(),
            "tcp swap network established"
        );
        Ok(Self {
            worker,
            placement,
            mailboxes,
            writers,
            accept_handle,
        })
    }

    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    /// Gids hosted here, ascending.
    pub fn local_blocks(&self) -> Vec<BlockId> {
        let mut gids: Vec<BlockId> = self.mailboxes.keys().copied().collect();
        gids.sort_unstable();
        gids
    }

    fn mailbox(&self, gid: BlockId) -> Result<&Mailbox> {
        self.mailboxes
            .get(&gid)
            .ok_or(SwapError::UnknownBlock { gid })
    }

    /// Write a frame: `[header][payload]`.
    async fn write_frame(&self, peer: WorkerId, header: FrameHeader, payload: &[u8]) -> Result<()> {
        let writer = self.writers.get(&peer).ok_or_else(|| {
            SwapError::transport(format!("no connection to worker {peer}"))
        })?;
        let frame = encode_frame(&header, payload);
        let mut writer = writer.lock().await;
        writer
            .write_all(&frame)
            .await
            .map_err(|e| SwapError::transport_with_source("tcp write frame", e))?;
        writer
            .flush()
            .await
            .map_err(|e| SwapError::transport_with_source("tcp flush", e))?;
        Ok(())
    }
}

impl SwapTransport for TcpNetwork {
    fn send<'a>(
        &'a self,
        tag: MessageTag,
        from: BlockId,
        dest: BlockId,
        payload: Vec<u8>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.mailbox(from)?;
            if dest >= self.placement.total_blocks() {
                return Err(SwapError::UnknownBlock { gid: dest });
            }
            let owner = self.placement.owner_worker(dest);
            if owner == self.worker {
                return self.mailbox(dest)?.deliver(tag, from, payload);
            }
            let header = FrameHeader {
                tag,
                sender: from,
                receiver: dest,
                payload_length: payload.len() as u64,
            };
            self.write_frame(owner, header, &payload).await
        })
    }

    fn recv<'a>(
        &'a self,
        tag: MessageTag,
        at: BlockId,
        src: BlockId,
    ) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move { self.mailbox(at)?.recv(tag, src).await })
    }

    fn stray_messages(&self, at: BlockId, upto: MessageTag) -> Result<Vec<(MessageTag, BlockId)>> {
        self.mailbox(at)?.stray(upto)
    }
}

impl Drop for TcpNetwork {
    fn drop(&mut self) {
        self.accept_handle.abort();
    }
}

/// Accept one inbound connection per peer and run a recv loop for each.
async fn accept_loop(
    listener: TcpListener,
    expected: usize,
    mailboxes: Mailboxes,
    placement: Arc<dyn PlacementOracle>,
) {
    let mut readers = JoinSet::new();
    for _ in 0..expected {
        match accept_peer(&listener).await {
            Ok((peer, reader)) => {
                readers.spawn(recv_loop(
                    reader,
                    peer,
                    Arc::clone(&mailboxes),
                    Arc::clone(&placement),
                ));
            }
            Err(e) => {
                tracing::warn!("tcp swap accept failed: {e}");
                break;
            }
        }
    }
    while readers.join_next().await.is_some() {}
}

async fn accept_peer(listener: &TcpListener) -> Result<(WorkerId, OwnedReadHalf)> {
    let (stream, _addr) = listener
        .accept()
        .await
        .map_err(|e| SwapError::transport_with_source("tcp accept", e))?;
    stream.set_nodelay(true)?;
    let (mut reader, _writer) = stream.into_split();
    let mut id = [0u8; 4];
    reader
        .read_exact(&mut id)
        .await
        .map_err(|e| SwapError::transport_with_source("tcp handshake", e))?;
    Ok((u32::from_le_bytes(id), reader))
}

/// Background loop: read frames from one peer worker and route them to the
/// receiver block's mailbox. When the peer goes away, its blocks are marked
/// disconnected so receivers still waiting on them fail instead of hanging.
async fn recv_loop(
    mut reader: OwnedReadHalf,
    peer: WorkerId,
    mailboxes: Mailboxes,
    placement: Arc<dyn PlacementOracle>,
) {
    let mut header_buf = [0u8; HEADER_SIZE];
    loop {
        if let Err(e) = reader.read_exact(&mut header_buf).await {
            tracing::debug!(peer, "tcp swap recv loop ended: {e}");
            break;
        }
        let Some(header) = FrameHeader::decode(&header_buf) else {
            tracing::warn!(peer, phase = header_buf[0], "tcp swap: invalid frame header, closing connection");
            break;
        };
        if header.payload_length > MAX_FRAME_SIZE {
            tracing::warn!(peer, len = header.payload_length, "tcp swap: frame too large, closing connection");
            break;
        }
        let mut payload = vec![0u8; header.payload_length as usize];
        if let Err(e) = reader.read_exact(&mut payload).await {
            tracing::debug!(peer, "tcp swap recv loop ended reading payload: {e}");
            break;
        }

        let Some(mailbox) = mailboxes.get(&header.receiver) else {
            tracing::warn!(
                peer,
                gid = header.receiver,
                sender = header.sender,
                tag = %header.tag,
                "tcp swap: frame for a block not hosted here, dropping"
            );
            continue;
        };
        tracing::trace!(
            gid = header.receiver,
            sender = header.sender,
            tag = %header.tag,
            len = payload.len(),
            "tcp swap frame received"
        );
        if let Err(e) = mailbox.deliver(header.tag, header.sender, payload) {
            tracing::warn!(peer, "tcp swap: delivery failed: {e}");
            break;
        }
    }

    let gone = placement.local_blocks(peer);
    for mailbox in mailboxes.values() {
        if let Err(e) = mailbox.disconnect(&gone) {
            tracing::warn!(peer, "tcp swap: marking peer blocks disconnected failed: {e}");
        }
    }
}
