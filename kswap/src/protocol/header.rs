use crate::types::{BlockId, MessageTag, Phase};

/// Size of the wire header in bytes.
pub const HEADER_SIZE: usize = 24;

/// 24-byte wire header prepended to every frame on a TCP link.
///
/// ```text
/// [0]      phase: u8
/// [1..4]   reserved (must be 0)
/// [4..8]   round: u32 LE
/// [8..12]  sender gid: u32 LE
/// [12..16] receiver gid: u32 LE
/// [16..24] payload_length: u64 LE
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub tag: MessageTag,
    pub sender: BlockId,
    pub receiver: BlockId,
    /// Length of the payload following this header.
    pub payload_length: u64,
}

impl FrameHeader {
    /// Encode header to 24 bytes (little-endian).
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0] = self.tag.phase as u8;
        buf[4..8].copy_from_slice(&self.tag.round.to_le_bytes());
        buf[8..12].copy_from_slice(&self.sender.to_le_bytes());
        buf[12..16].copy_from_slice(&self.receiver.to_le_bytes());
        buf[16..24].copy_from_slice(&self.payload_length.to_le_bytes());
        buf
    }

    /// Decode header from 24 bytes.
    ///
    /// Returns `None` if the phase byte is invalid.
    pub fn decode(buf: &[u8; HEADER_SIZE]) -> Option<Self> {
        let phase = Phase::from_u8(buf[0])?;
        let round = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let sender = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
        let receiver = u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]);
        let mut len = [0u8; 8];
        len.copy_from_slice(&buf[16..24]);
        Some(FrameHeader {
            tag: MessageTag { phase, round },
            sender,
            receiver,
            payload_length: u64::from_le_bytes(len),
        })
    }
}
