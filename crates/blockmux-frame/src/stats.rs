use crate::codec::HEADER_SIZE;

/// Per-stream counters for a multiplexing or demultiplexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Frames transferred.
    pub frames: u64,
    /// Payload bytes per stream id.
    pub bytes: Vec<u64>,
}

impl StreamStats {
    pub fn new(streams: usize) -> Self {
        Self {
            frames: 0,
            bytes: vec![0; streams],
        }
    }

    pub(crate) fn record(&mut self, stream_id: u32, len: usize) {
        self.frames += 1;
        if let Some(total) = self.bytes.get_mut(stream_id as usize) {
            *total += len as u64;
        }
    }

    /// Payload bytes across all streams.
    pub fn total_bytes(&self) -> u64 {
        self.bytes.iter().sum()
    }

    /// Size of the multiplexed stream, headers included.
    pub fn wire_bytes(&self) -> u64 {
        self.total_bytes() + self.frames * HEADER_SIZE as u64
    }
}
