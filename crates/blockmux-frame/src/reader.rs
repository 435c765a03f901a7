use std::io::Read;

use blockmux_sync::read_full;

use crate::codec::{FrameConfig, FrameHeader, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// A frame borrowed from a [`FrameReader`]'s scratch buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRef<'a> {
    pub header: FrameHeader,
    pub payload: &'a [u8],
}

/// Reads frames one at a time from any `Read` stream.
///
/// Payloads land in a scratch buffer that grows to the largest frame seen and
/// is never shrunk.
pub struct FrameReader<T> {
    inner: T,
    scratch: Vec<u8>,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            scratch: Vec::new(),
            config,
        }
    }

    /// Read the next frame (blocking).
    ///
    /// Returns `Ok(None)` when the stream ends cleanly between frames. Ending
    /// anywhere inside a frame is an error.
    pub fn next_frame(&mut self) -> Result<Option<FrameRef<'_>>> {
        let mut header = [0u8; HEADER_SIZE];
        let got = read_full(&mut self.inner, &mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_SIZE {
            return Err(FrameError::TruncatedHeader { got });
        }
        let header = FrameHeader::from_bytes(&header);

        if header.length > self.config.max_payload_size as u64 {
            return Err(FrameError::PayloadTooLarge {
                size: header.length,
                max: self.config.max_payload_size,
            });
        }
        // Bounded by `max_payload_size`, so it fits in usize.
        let len = header.length as usize;

        if self.scratch.len() < len {
            self.scratch.resize(len, 0);
        }
        let got = read_full(&mut self.inner, &mut self.scratch[..len])?;
        if got < len {
            return Err(FrameError::TruncatedPayload {
                stream_id: header.stream_id,
                expected: header.length,
                got,
            });
        }

        Ok(Some(FrameRef {
            header,
            payload: &self.scratch[..len],
        }))
    }
}
