use bytes::{Buf, BufMut, BytesMut};

/// Frame header: stream id (4) + payload length (8) = 12 bytes.
pub const HEADER_SIZE: usize = 12;

/// Default maximum payload a reader accepts: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Default largest read a multiplexer issues per source: 32 KiB.
pub const DEFAULT_BLOCK_SIZE: usize = 32 * 1024;

/// Routing information preceding every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Position of the source among the multiplexed streams.
    pub stream_id: u32,
    /// Payload length in bytes.
    pub length: u64,
}

impl FrameHeader {
    pub fn new(stream_id: u32, length: u64) -> Self {
        Self { stream_id, length }
    }

    /// Write the header into the first [`HEADER_SIZE`] bytes of `dst`.
    ///
    /// # Panics
    ///
    /// Panics if `dst` is shorter than [`HEADER_SIZE`].
    pub fn encode_into(&self, dst: &mut [u8]) {
        let mut out = &mut dst[..HEADER_SIZE];
        out.put_u32_le(self.stream_id);
        out.put_u64_le(self.length);
    }

    /// Decode a complete header.
    pub fn from_bytes(src: &[u8; HEADER_SIZE]) -> Self {
        let mut src = &src[..];
        let stream_id = src.get_u32_le();
        let length = src.get_u64_le();
        Self { stream_id, length }
    }

    /// Decode the header at the start of `src`, if there is a whole one.
    pub fn decode(src: &[u8]) -> Option<Self> {
        let header: &[u8; HEADER_SIZE] = src.get(..HEADER_SIZE)?.try_into().ok()?;
        Some(Self::from_bytes(header))
    }

    /// The total wire size of the frame (header + payload).
    pub fn wire_size(&self) -> u64 {
        HEADER_SIZE as u64 + self.length
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────┬──────────────────┐
/// │ Stream ID    │ Length       │ Payload          │
/// │ (4B LE)      │ (8B LE)      │ (Length bytes)   │
/// └──────────────┴──────────────┴──────────────────┘
/// ```
pub fn encode_frame(stream_id: u32, payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32_le(stream_id);
    dst.put_u64_le(payload.len() as u64);
    dst.put_slice(payload);
}

/// Configuration for reading frames.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest payload length accepted from a header. Default: 16 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}
