use std::io::Write;

use crate::codec::HEADER_SIZE;

/// Writes encoded frames to any `Write` stream, one `write_all` per frame.
pub struct FrameWriter<T> {
    inner: T,
    frames: u64,
    bytes: u64,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            frames: 0,
            bytes: 0,
        }
    }

    /// Write a frame whose header is already in place.
    ///
    /// A frame never reaches the stream split across write calls, so a
    /// failed write loses at most the frame being written.
    pub fn write_encoded(&mut self, frame: &[u8]) -> std::io::Result<()> {
        debug_assert!(frame.len() >= HEADER_SIZE);
        self.inner.write_all(frame)?;
        self.frames += 1;
        self.bytes += frame.len() as u64;
        Ok(())
    }

    /// Frames written so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Wire bytes written so far, headers included.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}
