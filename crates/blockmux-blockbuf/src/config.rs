use crate::error::{CopyError, Result};

/// Default block size used by the `mbuffer` command: 1 MiB.
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

/// Default high water mark as a percentage of the buffer.
pub const DEFAULT_HWM_PERCENT: u8 = 90;

/// Parameters of a block copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyConfig {
    /// Maximum number of blocks buffered in flight.
    pub blocks: usize,
    /// Size in bytes of every write except possibly the last.
    pub block_size: usize,
    /// Number of queued blocks that starts a drain cycle. Never above `blocks`.
    pub high_water_mark: usize,
}

impl CopyConfig {
    /// Validate parameters, clamping `high_water_mark` to `blocks`.
    pub fn new(blocks: usize, block_size: usize, high_water_mark: usize) -> Result<Self> {
        if blocks == 0 {
            return Err(CopyError::InvalidConfig(
                "buffer must hold at least one block".to_string(),
            ));
        }
        if block_size == 0 {
            return Err(CopyError::InvalidConfig(
                "block size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            blocks,
            block_size,
            high_water_mark: high_water_mark.min(blocks),
        })
    }

    /// Derive a configuration from a total buffer size in bytes.
    ///
    /// The block count and high water mark are rounded up to whole blocks, so
    /// a 6 GiB buffer of 1 MiB blocks at 90% yields 6144 blocks and a mark of
    /// 5530.
    pub fn from_buffer_size(buffer_bytes: u64, block_size: usize, hwm_percent: u8) -> Result<Self> {
        if buffer_bytes == 0 {
            return Err(CopyError::InvalidConfig(
                "buffer size must be greater than zero".to_string(),
            ));
        }
        if block_size == 0 {
            return Err(CopyError::InvalidConfig(
                "block size must be greater than zero".to_string(),
            ));
        }
        if hwm_percent > 100 {
            return Err(CopyError::InvalidConfig(format!(
                "high water mark must be a percentage (0-100), got {hwm_percent}"
            )));
        }

        let bs = block_size as u128;
        let buffer = u128::from(buffer_bytes);
        let blocks = buffer.div_ceil(bs);
        let hwm = (buffer * u128::from(hwm_percent) / 100).div_ceil(bs);

        let blocks = usize::try_from(blocks).map_err(|_| {
            CopyError::InvalidConfig(format!("buffer of {buffer_bytes} bytes needs too many blocks"))
        })?;
        // hwm <= blocks, so the conversion cannot fail once `blocks` fit.
        let hwm = usize::try_from(hwm).unwrap_or(blocks);

        Self::new(blocks, block_size, hwm)
    }

    /// Total bytes the buffer can hold.
    pub fn capacity_bytes(&self) -> u64 {
        self.blocks as u64 * self.block_size as u64
    }
}
