use std::io::{Read, Write};

use blockmux_sync::CancelToken;
use tracing::{debug, trace};

use crate::codec::FrameConfig;
use crate::error::{FrameError, Result};
use crate::reader::FrameReader;
use crate::stats::StreamStats;

/// Split a multiplexed stream from `src` into `dsts`, indexed by stream id.
pub fn demux<R, W>(src: &mut R, dsts: &mut [W]) -> Result<StreamStats>
where
    R: Read + ?Sized,
    W: Write,
{
    Demultiplexer::new().demux(src, dsts)
}

/// Sequential demultiplexer.
///
/// Frame boundaries are the only way to resynchronise, so frames are consumed
/// strictly in arrival order on the calling thread.
#[derive(Debug, Clone, Default)]
pub struct Demultiplexer {
    config: FrameConfig,
    cancel: CancelToken,
}

impl Demultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: FrameConfig) -> Self {
        self.config = config;
        self
    }

    /// Stop between frames once `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Run until the source ends cleanly or the first failure.
    ///
    /// A frame for a stream id without a destination stops the run with
    /// [`FrameError::InvalidStreamId`]; nothing from that frame or later ones
    /// is written.
    pub fn demux<R, W>(&self, src: &mut R, dsts: &mut [W]) -> Result<StreamStats>
    where
        R: Read + ?Sized,
        W: Write,
    {
        debug!(
            streams = dsts.len(),
            max_payload_size = self.config.max_payload_size,
            "starting demux"
        );
        let mut reader = FrameReader::with_config(src, self.config.clone());
        let mut stats = StreamStats::new(dsts.len());

        loop {
            if self.cancel.is_cancelled() {
                return Err(FrameError::Cancelled);
            }
            let Some(frame) = reader.next_frame()? else {
                break;
            };

            let stream_id = frame.header.stream_id;
            let streams = dsts.len();
            let dst = dsts
                .get_mut(stream_id as usize)
                .ok_or(FrameError::InvalidStreamId {
                    id: stream_id,
                    streams,
                })?;
            dst.write_all(frame.payload)
                .map_err(|source| FrameError::Write { stream_id, source })?;

            trace!(
                stream_id,
                len = frame.payload.len(),
                wire = frame.header.wire_size(),
                "frame delivered"
            );
            stats.record(stream_id, frame.payload.len());
        }

        debug!(
            frames = stats.frames,
            bytes = stats.total_bytes(),
            "demux finished"
        );
        Ok(stats)
    }
}
