//! Block-aligned buffering and stream multiplexing for tape and pipe transports.
//!
//! # Crate Structure
//!
//! - [`sync`]: cancellation, worker groups and buffer pools shared by the engines
//! - [`blockbuf`]: the high-water-mark block copier behind `blockmux mbuffer`
//! - [`frame`]: the frame format plus `mux`/`demux`

/// Re-export worker plumbing.
pub mod sync {
    pub use blockmux_sync::*;
}

/// Re-export the block copier.
pub mod blockbuf {
    pub use blockmux_blockbuf::*;
}

/// Re-export framing, mux and demux.
pub mod frame {
    pub use blockmux_frame::*;
}

pub use blockmux_blockbuf::copy;
pub use blockmux_frame::{demux, mux};
