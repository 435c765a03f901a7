use std::fmt;
use std::io;

use blockmux_blockbuf::CopyError;
use blockmux_frame::{FrameError, MuxError};

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;
/// 128 + SIGINT.
pub const INTERRUPTED: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn io_code(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => {
            FAILURE
        }
        io::ErrorKind::Interrupted => INTERRUPTED,
        _ => INTERNAL,
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(io_code(&err), format!("{context}: {err}"))
}

pub fn copy_error(context: &str, err: CopyError) -> CliError {
    let code = match &err {
        CopyError::InvalidConfig(_) => USAGE,
        CopyError::Read(source) | CopyError::Write(source) => io_code(source),
        CopyError::Spawn(_) => INTERNAL,
        CopyError::Cancelled => INTERRUPTED,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn mux_error(context: &str, err: MuxError) -> CliError {
    let code = match &err {
        MuxError::InvalidBlockSize
        | MuxError::BlockSizeTooLarge { .. }
        | MuxError::TooManyStreams(_) => USAGE,
        MuxError::Read { source, .. } | MuxError::Write(source) => io_code(source),
        MuxError::Spawn(_) => INTERNAL,
        MuxError::Cancelled => INTERRUPTED,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    let code = match &err {
        FrameError::InvalidStreamId { .. }
        | FrameError::PayloadTooLarge { .. }
        | FrameError::TruncatedHeader { .. }
        | FrameError::TruncatedPayload { .. } => DATA_INVALID,
        FrameError::Io(source) | FrameError::Write { source, .. } => io_code(source),
        FrameError::Cancelled => INTERRUPTED,
    };
    CliError::new(code, format!("{context}: {err}"))
}
