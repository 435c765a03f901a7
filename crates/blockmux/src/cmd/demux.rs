use blockmux_frame::{Demultiplexer, FrameConfig};
use blockmux_sync::CancelToken;
use tracing::{debug, info};

use crate::cmd::DemuxArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::size::parse_usize;
use crate::stdio;

pub fn run(args: DemuxArgs, cancel: CancelToken) -> CliResult<i32> {
    let config = FrameConfig {
        max_payload_size: parse_usize(&args.max_frame_size, "max frame size")?,
    };

    let mut outputs = Vec::with_capacity(args.outputs.len());
    for (stream_id, path) in args.outputs.iter().enumerate() {
        outputs.push(stdio::open_append(path)?);
        debug!(stream_id, path = %path.display(), "opened output");
    }

    let demuxer = Demultiplexer::new().with_config(config).with_cancel(cancel);
    info!(
        streams = outputs.len(),
        max_frame_size = demuxer.config().max_payload_size,
        "demultiplexing"
    );

    let mut src = stdio::stdin()?;
    let stats = demuxer
        .demux(&mut *src, &mut outputs)
        .map_err(|err| frame_error("demux", err))?;

    info!(
        streams = outputs.len(),
        frames = stats.frames,
        bytes = stats.total_bytes(),
        "demux complete"
    );
    Ok(SUCCESS)
}
