use crate::element::Element;
use crate::error::{Result, SwapError};
use crate::protocol::header::{FrameHeader, HEADER_SIZE};
use crate::range::SubRange;

/// Size of the `(start, len)` prefix of a handoff payload.
pub const HANDOFF_PREFIX: usize = 16;

/// Encode elements as a contiguous little-endian byte payload.
pub fn encode_elements<T: Element>(data: &[T]) -> Vec<u8> {
    let mut buf = vec![0u8; data.len() * T::SIZE];
    for (v, out) in data.iter().zip(buf.chunks_exact_mut(T::SIZE)) {
        v.write_le(out);
    }
    buf
}

/// Decode a little-endian element payload.
pub fn decode_elements<T: Element>(bytes: &[u8]) -> Result<Vec<T>> {
    if bytes.len() % T::SIZE != 0 {
        return Err(SwapError::DecodeFailed(format!(
            "payload of {} bytes is not a whole number of {} elements",
            bytes.len(),
            T::NAME
        )));
    }
    Ok(bytes.chunks_exact(T::SIZE).map(T::read_le).collect())
}

/// Encode a final-phase handoff: `[start: u64 LE][len: u64 LE][elements]`.
pub fn encode_handoff<T: Element>(range: SubRange, data: &[T]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HANDOFF_PREFIX + data.len() * T::SIZE);
    buf.extend_from_slice(&(range.start as u64).to_le_bytes());
    buf.extend_from_slice(&(range.len as u64).to_le_bytes());
    buf.extend_from_slice(&encode_elements(data));
    buf
}

/// Decode a final-phase handoff into the sender's range and data.
pub fn decode_handoff<T: Element>(bytes: &[u8]) -> Result<(SubRange, Vec<T>)> {
    if bytes.len() < HANDOFF_PREFIX {
        return Err(SwapError::DecodeFailed(format!(
            "handoff too short: {} < {HANDOFF_PREFIX}",
            bytes.len()
        )));
    }
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[0..8]);
    let start = u64::from_le_bytes(word) as usize;
    word.copy_from_slice(&bytes[8..16]);
    let len = u64::from_le_bytes(word) as usize;

    let data = decode_elements::<T>(&bytes[HANDOFF_PREFIX..])?;
    if data.len() != len {
        return Err(SwapError::DecodeFailed(format!(
            "handoff announces {len} elements but carries {}",
            data.len()
        )));
    }
    Ok((SubRange::new(start, len), data))
}

/// Encode a framed byte buffer: `[header][payload]`.
pub fn encode_frame(header: &FrameHeader, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(payload);
    buf
}
