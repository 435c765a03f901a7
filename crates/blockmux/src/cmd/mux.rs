use std::fs::File;
use std::io::Write;

use blockmux_frame::Multiplexer;
use blockmux_sync::CancelToken;
use tracing::{debug, info};

use crate::cmd::MuxArgs;
use crate::exit::{io_error, mux_error, CliResult, SUCCESS};
use crate::size::parse_usize;
use crate::stdio;

pub fn run(args: MuxArgs, cancel: CancelToken) -> CliResult<i32> {
    let block_size = parse_usize(&args.block_size, "block size")?;
    let muxer = Multiplexer::new(block_size)
        .map_err(|err| mux_error("mux", err))?
        .with_cancel(cancel);
    info!(
        streams = args.inputs.len(),
        block_size = muxer.block_size(),
        "multiplexing"
    );

    let mut inputs = Vec::with_capacity(args.inputs.len());
    for (stream_id, path) in args.inputs.iter().enumerate() {
        let file = File::open(path)
            .map_err(|err| io_error(&format!("mux input {}", path.display()), err))?;
        debug!(stream_id, path = %path.display(), "opened input");
        inputs.push(file);
    }

    let mut dst = stdio::stdout()?;
    let stats = muxer
        .mux(&mut *dst, &mut inputs)
        .map_err(|err| mux_error("mux", err))?;
    dst.flush().map_err(|err| io_error("flushing output", err))?;

    info!(
        streams = inputs.len(),
        frames = stats.frames,
        bytes = stats.total_bytes(),
        "mux complete"
    );
    Ok(SUCCESS)
}
