use std::io::{Read, Write};
use std::thread;

use blockmux_sync::{read_full, BlockPool, CancelToken, Pooled, TaskGroup};
use crossbeam::channel::{bounded, select, Receiver, Sender, TryRecvError};
use tracing::{debug, trace, warn};

use crate::config::CopyConfig;
use crate::error::{CopyError, Result};

type Block = Pooled<Vec<u8>>;

/// Counters for a finished copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Bytes written to the destination.
    pub bytes: u64,
    /// Write calls issued, one per block.
    pub blocks: u64,
    /// Drain cycles, counting the final flush when it wrote anything.
    pub drains: u64,
}

/// Copy `src` to `dst` in `block_size` writes, buffering up to `blocks` blocks
/// and starting each drain cycle once `high_water_mark` blocks are queued.
///
/// `high_water_mark` above `blocks` is treated as `blocks`.
pub fn copy<W, R>(
    dst: &mut W,
    src: &mut R,
    blocks: usize,
    block_size: usize,
    high_water_mark: usize,
) -> Result<CopyStats>
where
    W: Write + Send + ?Sized,
    R: Read + Send + ?Sized,
{
    BlockCopier::new(CopyConfig::new(blocks, block_size, high_water_mark)?).copy(dst, src)
}

/// A reusable block copier.
///
/// One reader thread fills pooled blocks and queues them; one writer thread
/// waits for a drain request, then writes queued blocks until it observes the
/// queue empty. Raising a drain request never blocks the reader: a request
/// already pending absorbs new ones, and the writer re-checks the queue depth
/// before draining.
#[derive(Debug, Clone)]
pub struct BlockCopier {
    config: CopyConfig,
    pool: BlockPool,
    cancel: CancelToken,
}

impl BlockCopier {
    /// Create a copier with its own block pool.
    pub fn new(config: CopyConfig) -> Self {
        Self {
            pool: BlockPool::blocks(config.block_size),
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Draw blocks from a shared pool instead.
    pub fn with_pool(mut self, pool: BlockPool) -> Self {
        self.pool = pool;
        self
    }

    /// Stop copying when `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &CopyConfig {
        &self.config
    }

    pub fn pool(&self) -> &BlockPool {
        &self.pool
    }

    /// Run the copy to completion.
    ///
    /// Returns the first read or write error. A worker blocked inside a read
    /// or write call notices cancellation once that call returns.
    pub fn copy<W, R>(&self, dst: &mut W, src: &mut R) -> Result<CopyStats>
    where
        W: Write + Send + ?Sized,
        R: Read + Send + ?Sized,
    {
        let cfg = self.config;
        debug!(
            blocks = cfg.blocks,
            block_size = cfg.block_size,
            high_water_mark = cfg.high_water_mark,
            "starting block copy"
        );
        if self.cancel.is_cancelled() {
            return Err(CopyError::Cancelled);
        }

        let (block_tx, block_rx) = bounded::<Block>(cfg.blocks);
        let (drain_tx, drain_rx) = bounded::<()>(1);
        let group = TaskGroup::new(&self.cancel);

        let written = thread::scope(|s| {
            let writer = thread::Builder::new()
                .name("blockbuf-writer".to_string())
                .spawn_scoped(s, || {
                    group.run(|| self.write_stage(&mut *dst, &block_rx, &drain_rx, group.token()))
                });
            let writer = match writer {
                Ok(writer) => writer,
                Err(err) => {
                    group.record(CopyError::Spawn(err));
                    return None;
                }
            };

            let reader = thread::Builder::new()
                .name("blockbuf-reader".to_string())
                .spawn_scoped(s, || {
                    group.run(|| self.read_stage(&mut *src, block_tx, drain_tx, group.token()))
                });
            if let Err(err) = reader {
                group.record(CopyError::Spawn(err));
            }

            match writer.join() {
                Ok(stats) => stats,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        });

        if let Err(err) = group.finish() {
            warn!(error = %err, "block copy aborted");
            return Err(err);
        }
        let mut stats = written.unwrap_or_default();

        // The writer leaves when the reader hangs up; whatever is still queued
        // (at most one partial drain) goes out here, last block included.
        let mut flushed = false;
        for block in block_rx.try_iter() {
            write_block(&mut *dst, block, &mut stats)?;
            flushed = true;
        }
        if flushed {
            stats.drains += 1;
        }

        debug!(
            bytes = stats.bytes,
            blocks = stats.blocks,
            drains = stats.drains,
            "block copy finished"
        );
        Ok(stats)
    }

    fn read_stage<R: Read + ?Sized>(
        &self,
        src: &mut R,
        blocks: Sender<Block>,
        drain: Sender<()>,
        token: &CancelToken,
    ) -> Result<()> {
        let cfg = &self.config;
        loop {
            if token.is_cancelled() {
                return Err(CopyError::Cancelled);
            }

            let mut block = self.pool.acquire();
            block.resize(cfg.block_size, 0);
            let filled = read_full(src, &mut block).map_err(CopyError::Read)?;
            if filled == 0 {
                break;
            }
            let partial = filled < cfg.block_size;
            block.truncate(filled);

            select! {
                send(blocks, block) -> sent => {
                    if sent.is_err() {
                        // receiver gone: the writer already failed
                        return Ok(());
                    }
                }
                recv(token.listener()) -> _ => return Err(CopyError::Cancelled),
            }

            if partial {
                trace!(len = filled, "queued final partial block");
                break;
            }

            let queued = blocks.len();
            if queued >= cfg.high_water_mark {
                trace!(queued, "high water mark reached");
                // Full means a request is already pending.
                let _ = drain.try_send(());
            }
        }
        // Dropping both senders tells the writer no more blocks are coming.
        Ok(())
    }

    fn write_stage<W: Write + ?Sized>(
        &self,
        dst: &mut W,
        blocks: &Receiver<Block>,
        drain: &Receiver<()>,
        token: &CancelToken,
    ) -> Result<CopyStats> {
        let mut stats = CopyStats::default();
        loop {
            select! {
                recv(drain) -> request => {
                    if request.is_err() {
                        return Ok(stats);
                    }
                }
                recv(token.listener()) -> _ => return Err(CopyError::Cancelled),
            }

            // Requests can outlive the drain that satisfied them.
            if blocks.len() < self.config.high_water_mark {
                continue;
            }

            stats.drains += 1;
            loop {
                if token.is_cancelled() {
                    return Err(CopyError::Cancelled);
                }
                match blocks.try_recv() {
                    Ok(block) => write_block(dst, block, &mut stats)?,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return Ok(stats),
                }
            }
            trace!(drains = stats.drains, blocks = stats.blocks, "drain cycle complete");
        }
    }
}

fn write_block<W: Write + ?Sized>(dst: &mut W, block: Block, stats: &mut CopyStats) -> Result<()> {
    dst.write_all(&block).map_err(CopyError::Write)?;
    stats.bytes += block.len() as u64;
    stats.blocks += 1;
    Ok(())
}
