/// Errors that can occur while reading a multiplexed stream.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A frame addressed a stream with no destination.
    #[error("invalid stream id {id} ({streams} destinations)")]
    InvalidStreamId { id: u32, streams: usize },

    /// A frame header declared more payload than allowed.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: u64, max: usize },

    /// The stream ended inside a frame header.
    #[error("truncated frame header ({got} of 12 bytes)")]
    TruncatedHeader { got: usize },

    /// The stream ended before the declared payload length.
    #[error("truncated payload on stream {stream_id} ({got} of {expected} bytes)")]
    TruncatedPayload {
        stream_id: u32,
        expected: u64,
        got: usize,
    },

    /// Reading the multiplexed stream failed.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing a payload to its destination failed.
    #[error("writing to stream {stream_id}: {source}")]
    Write {
        stream_id: u32,
        source: std::io::Error,
    },

    /// The operation was cancelled.
    #[error("demultiplexing cancelled")]
    Cancelled,
}

/// Errors that can occur while multiplexing.
#[derive(Debug, thiserror::Error)]
pub enum MuxError {
    /// The block size must allow at least one payload byte.
    #[error("block size must be greater than zero")]
    InvalidBlockSize,

    /// Frames larger than a default reader accepts could not be demultiplexed.
    #[error("block size {size} exceeds the maximum frame payload ({max} bytes)")]
    BlockSizeTooLarge { size: usize, max: usize },

    /// Stream ids are 32 bits wide.
    #[error("too many input streams ({0}, max 4294967296)")]
    TooManyStreams(usize),

    /// Reading one of the sources failed.
    #[error("reading stream {stream_id}: {source}")]
    Read {
        stream_id: u32,
        source: std::io::Error,
    },

    /// Writing the multiplexed stream failed.
    #[error("writing data: {0}")]
    Write(#[source] std::io::Error),

    /// A worker thread could not be started.
    #[error("spawning mux worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The operation was cancelled.
    #[error("multiplexing cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, FrameError>;
