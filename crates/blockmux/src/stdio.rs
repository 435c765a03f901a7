use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use crate::exit::{io_error, CliResult};

pub type Input = Box<dyn Read + Send>;
pub type Output = Box<dyn Write + Send>;

/// Standard input without the std buffer in between, so reads see whatever
/// the pipe delivers.
#[cfg(unix)]
pub fn stdin() -> CliResult<Input> {
    use std::os::fd::AsFd;

    let fd = std::io::stdin()
        .as_fd()
        .try_clone_to_owned()
        .map_err(|err| io_error("duplicating stdin", err))?;
    Ok(Box::new(File::from(fd)))
}

#[cfg(not(unix))]
pub fn stdin() -> CliResult<Input> {
    Ok(Box::new(std::io::stdin()))
}

/// Standard output as a raw descriptor. Every `write` reaches the device as
/// issued, which keeps block writes intact on tape.
#[cfg(unix)]
pub fn stdout() -> CliResult<Output> {
    use std::os::fd::AsFd;

    let fd = std::io::stdout()
        .as_fd()
        .try_clone_to_owned()
        .map_err(|err| io_error("duplicating stdout", err))?;
    Ok(Box::new(File::from(fd)))
}

#[cfg(not(unix))]
pub fn stdout() -> CliResult<Output> {
    Ok(Box::new(std::io::stdout()))
}

/// Open `path` for reading, or standard input when absent.
pub fn open_input(path: Option<&Path>) -> CliResult<Input> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("opening {}", path.display()), err))?;
            Ok(Box::new(file))
        }
        None => stdin(),
    }
}

/// Create or truncate `path`, or use standard output when absent.
pub fn create_output(path: Option<&Path>) -> CliResult<Output> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .map_err(|err| io_error(&format!("creating {}", path.display()), err))?;
            Ok(Box::new(file))
        }
        None => stdout(),
    }
}

/// Open `path` for appending, creating it if needed.
pub fn open_append(path: &Path) -> CliResult<File> {
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|err| io_error(&format!("opening {}", path.display()), err))
}
