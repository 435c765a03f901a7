use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("blockmux {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: blockmux");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("BLOCKMUX_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("BLOCKMUX_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "defaults: mbuffer_block_size={}, hwm={}%, mux_block_size={}, max_frame_size={}",
        blockmux_blockbuf::DEFAULT_BLOCK_SIZE,
        blockmux_blockbuf::DEFAULT_HWM_PERCENT,
        blockmux_frame::DEFAULT_BLOCK_SIZE,
        blockmux_frame::DEFAULT_MAX_PAYLOAD
    );

    Ok(SUCCESS)
}
