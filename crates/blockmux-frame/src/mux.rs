use std::io::{ErrorKind, Read, Write};
use std::thread;

use blockmux_sync::{BlockPool, CancelToken, Pooled, TaskGroup};
use crossbeam::channel::{bounded, select, Receiver, Sender};
use tracing::{debug, trace, warn};

use crate::codec::{FrameHeader, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
use crate::error::MuxError;
use crate::stats::StreamStats;
use crate::writer::FrameWriter;

type FrameBuf = Pooled<Vec<u8>>;

/// Multiplex `srcs` onto `dst`, reading at most `block_size` bytes per frame.
///
/// Stream ids are the sources' positions in `srcs`. Recover the streams with
/// [`demux`](crate::demux) using destinations in the same order.
pub fn mux<W, R>(block_size: usize, dst: &mut W, srcs: &mut [R]) -> Result<StreamStats, MuxError>
where
    W: Write + Send + ?Sized,
    R: Read + Send,
{
    Multiplexer::new(block_size)?.mux(dst, srcs)
}

/// Interleaves several sources onto one writer.
///
/// Each source gets a dedicated reader thread that reads straight into a pooled
/// buffer behind a reserved header, stamps the header, and hands the frame to
/// the single writer thread over a zero-capacity channel. A source that has
/// nothing to say only blocks its own thread.
#[derive(Debug, Clone)]
pub struct Multiplexer {
    block_size: usize,
    pool: BlockPool,
    cancel: CancelToken,
}

impl Multiplexer {
    /// `block_size` must be between 1 and [`DEFAULT_MAX_PAYLOAD`], so every
    /// frame produced stays readable by a default [`demux`](crate::demux).
    pub fn new(block_size: usize) -> Result<Self, MuxError> {
        if block_size == 0 {
            return Err(MuxError::InvalidBlockSize);
        }
        if block_size > DEFAULT_MAX_PAYLOAD {
            return Err(MuxError::BlockSizeTooLarge {
                size: block_size,
                max: DEFAULT_MAX_PAYLOAD,
            });
        }
        Ok(Self {
            block_size,
            pool: BlockPool::blocks(HEADER_SIZE + block_size),
            cancel: CancelToken::new(),
        })
    }

    /// Stop multiplexing when `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Frame buffers, for inspecting reuse.
    pub fn pool(&self) -> &BlockPool {
        &self.pool
    }

    /// Run until every source is exhausted or the first failure.
    pub fn mux<W, R>(&self, dst: &mut W, srcs: &mut [R]) -> Result<StreamStats, MuxError>
    where
        W: Write + Send + ?Sized,
        R: Read + Send,
    {
        let streams = srcs.len();
        if streams as u64 > u64::from(u32::MAX) + 1 {
            return Err(MuxError::TooManyStreams(streams));
        }
        debug!(streams, block_size = self.block_size, "starting mux");
        if self.cancel.is_cancelled() {
            return Err(MuxError::Cancelled);
        }

        let (frame_tx, frame_rx) = bounded::<FrameBuf>(0);
        let group = TaskGroup::new(&self.cancel);

        let stats = thread::scope(|s| {
            let writer = thread::Builder::new()
                .name("mux-writer".to_string())
                .spawn_scoped(s, || {
                    group.run(|| self.write_frames(&mut *dst, &frame_rx, streams, group.token()))
                });
            let writer = match writer {
                Ok(writer) => writer,
                Err(err) => {
                    group.record(MuxError::Spawn(err));
                    return None;
                }
            };

            for (index, src) in srcs.iter_mut().enumerate() {
                let frames = frame_tx.clone();
                let group = &group;
                // Checked against u32::MAX above.
                let stream_id = index as u32;
                let reader = thread::Builder::new()
                    .name(format!("mux-reader-{stream_id}"))
                    .spawn_scoped(s, move || {
                        group.run(|| self.read_stream(stream_id, src, frames, group.token()))
                    });
                if let Err(err) = reader {
                    group.record(MuxError::Spawn(err));
                    break;
                }
            }
            // The writer sees a disconnect once the last reader hangs up.
            drop(frame_tx);

            match writer.join() {
                Ok(stats) => stats,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        });

        if let Err(err) = group.finish() {
            warn!(error = %err, "mux aborted");
            return Err(err);
        }
        let stats = stats.unwrap_or_else(|| StreamStats::new(streams));
        debug!(
            frames = stats.frames,
            bytes = stats.total_bytes(),
            "mux finished"
        );
        Ok(stats)
    }

    fn read_stream<R: Read + ?Sized>(
        &self,
        stream_id: u32,
        src: &mut R,
        frames: Sender<FrameBuf>,
        token: &CancelToken,
    ) -> Result<(), MuxError> {
        loop {
            if token.is_cancelled() {
                return Err(MuxError::Cancelled);
            }

            let mut buf = self.pool.acquire();
            buf.resize(HEADER_SIZE + self.block_size, 0);
            let n = match src.read(&mut buf[HEADER_SIZE..]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(source) => return Err(MuxError::Read { stream_id, source }),
            };

            FrameHeader::new(stream_id, n as u64).encode_into(&mut buf);
            buf.truncate(HEADER_SIZE + n);
            trace!(stream_id, len = n, "frame ready");

            select! {
                send(frames, buf) -> sent => {
                    if sent.is_err() {
                        return Ok(());
                    }
                }
                recv(token.listener()) -> _ => return Err(MuxError::Cancelled),
            }
        }
        debug!(stream_id, "stream exhausted");
        Ok(())
    }

    fn write_frames<W: Write + ?Sized>(
        &self,
        dst: &mut W,
        frames: &Receiver<FrameBuf>,
        streams: usize,
        token: &CancelToken,
    ) -> Result<StreamStats, MuxError> {
        let mut writer = FrameWriter::new(dst);
        let mut stats = StreamStats::new(streams);
        loop {
            let frame = select! {
                recv(frames) -> frame => frame.ok(),
                recv(token.listener()) -> _ => return Err(MuxError::Cancelled),
            };
            let Some(frame) = frame else {
                break;
            };
            writer.write_encoded(&frame).map_err(MuxError::Write)?;
            if let Some(header) = FrameHeader::decode(&frame) {
                stats.record(header.stream_id, frame.len() - HEADER_SIZE);
            }
        }
        debug!(
            frames = writer.frames(),
            wire_bytes = writer.bytes(),
            "mux writer done"
        );
        Ok(stats)
    }
}
