use std::io::Write;

use blockmux_blockbuf::{BlockCopier, CopyConfig};
use blockmux_sync::CancelToken;
use tracing::info;

use crate::cmd::MbufferArgs;
use crate::exit::{copy_error, io_error, CliResult, SUCCESS};
use crate::size::{parse_size, parse_usize};
use crate::stdio;

pub fn run(args: MbufferArgs, cancel: CancelToken) -> CliResult<i32> {
    let config = config_from_args(&args)?;
    let copier = BlockCopier::new(config).with_cancel(cancel);
    let config = copier.config();
    info!(
        blocks = config.blocks,
        block_size = config.block_size,
        high_water_mark = config.high_water_mark,
        capacity = config.capacity_bytes(),
        "buffering"
    );

    let mut src = stdio::open_input(args.input.as_deref())?;
    let mut dst = stdio::create_output(args.output.as_deref())?;

    let stats = copier
        .copy(&mut *dst, &mut *src)
        .map_err(|err| copy_error("mbuffer", err))?;
    dst.flush().map_err(|err| io_error("flushing output", err))?;

    info!(
        bytes = stats.bytes,
        blocks = stats.blocks,
        drains = stats.drains,
        "copy complete"
    );
    Ok(SUCCESS)
}

fn config_from_args(args: &MbufferArgs) -> CliResult<CopyConfig> {
    let buffer = parse_size(&args.buffer_size)?;
    let block_size = parse_usize(&args.block_size, "block size")?;
    CopyConfig::from_buffer_size(buffer, block_size, args.hwm)
        .map_err(|err| copy_error("mbuffer", err))
}
