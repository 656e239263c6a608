pub(crate) mod codec;
pub(crate) mod header;

pub use codec::{
    HANDOFF_PREFIX, decode_elements, decode_handoff, encode_elements, encode_frame,
    encode_handoff,
};
pub use header::{FrameHeader, HEADER_SIZE};
