//! Stream multiplexing over a length-prefixed frame format.
//!
//! [`mux`] interleaves any number of readers onto one writer; [`demux`] splits
//! such a stream back out. Every chunk travels as one frame:
//! - a 4-byte little-endian stream id (the reader's position in the list)
//! - an 8-byte little-endian payload length
//! - the payload
//!
//! Chunks of one stream keep their order. Chunks of different streams are
//! written in whatever order their readers produce them, so a slow source
//! never holds up a fast one.

pub mod codec;
pub mod demux;
pub mod error;
pub mod mux;
pub mod reader;
pub mod stats;
pub mod writer;

pub use codec::{
    encode_frame, FrameConfig, FrameHeader, DEFAULT_BLOCK_SIZE, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
pub use demux::{demux, Demultiplexer};
pub use error::{FrameError, MuxError, Result};
pub use mux::{mux, Multiplexer};
pub use reader::{FrameReader, FrameRef};
pub use stats::StreamStats;
pub use writer::FrameWriter;
