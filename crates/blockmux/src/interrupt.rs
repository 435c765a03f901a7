use std::sync::atomic::{AtomicBool, Ordering};

use blockmux_sync::CancelToken;
use tracing::warn;

use crate::exit::{CliError, CliResult, INTERNAL, INTERRUPTED};

/// Route Ctrl-C to a fresh [`CancelToken`].
///
/// The first interrupt cancels the token and lets the running operation wind
/// down; a second one exits right away, for workers stuck in a blocking read.
pub fn install_handler() -> CliResult<CancelToken> {
    let token = CancelToken::new();
    let handler_token = token.clone();
    let interrupted = AtomicBool::new(false);

    ctrlc::set_handler(move || {
        if interrupted.swap(true, Ordering::SeqCst) {
            std::process::exit(INTERRUPTED);
        }
        warn!("interrupted, stopping (interrupt again to exit immediately)");
        handler_token.cancel();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;

    Ok(token)
}
