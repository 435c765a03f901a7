use std::io::{ErrorKind, Read};

/// Read until `buf` is full or the reader reports end of input.
///
/// Returns the number of bytes read, which is short of `buf.len()` only at
/// end of input. `Interrupted` reads are retried.
pub fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
