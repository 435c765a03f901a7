use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::interrupt::install_handler;

pub mod demux;
pub mod mbuffer;
pub mod mux;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Buffer a stream in memory and write it out in fixed-size blocks.
    Mbuffer(MbufferArgs),
    /// Interleave the inputs onto stdout so demux can recover them.
    Mux(MuxArgs),
    /// Split a multiplexed stdin back into the given files.
    Demux(DemuxArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command) -> CliResult<i32> {
    match command {
        Command::Mbuffer(args) => mbuffer::run(args, install_handler()?),
        Command::Mux(args) => mux::run(args, install_handler()?),
        Command::Demux(args) => demux::run(args, install_handler()?),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct MbufferArgs {
    /// Size of the memory buffer (e.g. 6Gi, 512MiB).
    #[arg(long, short = 'm', value_name = "SIZE")]
    pub buffer_size: String,
    /// Size of every write except possibly the last.
    #[arg(long, short = 'b', value_name = "SIZE", default_value = "1MiB")]
    pub block_size: String,
    /// Percentage of the buffer to fill before writing.
    #[arg(
        long,
        value_name = "PERCENT",
        default_value_t = blockmux_blockbuf::DEFAULT_HWM_PERCENT,
        value_parser = clap::value_parser!(u8).range(0..=100)
    )]
    pub hwm: u8,
    /// Read from a file instead of stdin.
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: Option<PathBuf>,
    /// Write to a file instead of stdout (created or truncated).
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MuxArgs {
    /// Files or pipes to interleave; stream ids follow argument order.
    #[arg(required = true, value_name = "IN")]
    pub inputs: Vec<PathBuf>,
    /// Largest read taken from an input per frame.
    #[arg(long, short = 'b', value_name = "SIZE", default_value = "32KiB")]
    pub block_size: String,
}

#[derive(Args, Debug)]
pub struct DemuxArgs {
    /// Destinations in stream id order; appended to and created if missing.
    #[arg(required = true, value_name = "OUT")]
    pub outputs: Vec<PathBuf>,
    /// Reject frames whose header declares a larger payload.
    #[arg(long, value_name = "SIZE", default_value = "16MiB")]
    pub max_frame_size: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
