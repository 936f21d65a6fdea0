//! Line oriented content supply for `create`.
//!
//! A source yields lines as raw bytes; the first empty line (or exhaustion)
//! ends the file. Every other line is stored followed by a `\n`. Bytes are
//! stored as given, whether or not they are valid UTF-8.

use super::FsError;
use alloc::vec::Vec;

/// Supplies new-file content one line at a time
pub trait ContentSource {
    /// Next line without its terminator, `None` when the source is exhausted
    fn next_line(&mut self) -> Result<Option<Vec<u8>>, FsError>;
}

impl<I, S> ContentSource for I
where
    I: Iterator<Item = S>,
    S: AsRef<[u8]>,
{
    fn next_line(&mut self) -> Result<Option<Vec<u8>>, FsError> {
        Ok(self.next().map(|line| line.as_ref().to_vec()))
    }
}

/// Drains `source` up to the terminating empty line into file bytes
pub fn drain(source: &mut dyn ContentSource) -> Result<Vec<u8>, FsError> {
    let mut data = Vec::new();
    while let Some(line) = source.next_line()? {
        if line.is_empty() {
            break;
        }
        data.extend_from_slice(&line);
        data.push(b'\n');
    }
    Ok(data)
}

/// Adapts any buffered reader, such as standard input, into a content source
#[cfg(feature = "std")]
pub struct LineSource<R> {
    reader: R,
}

#[cfg(feature = "std")]
impl<R: std::io::BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

#[cfg(feature = "std")]
impl<R: std::io::BufRead> ContentSource for LineSource<R> {
    fn next_line(&mut self) -> Result<Option<Vec<u8>>, FsError> {
        let mut line = Vec::new();
        let read = self.reader.read_until(b'\n', &mut line).map_err(|err| {
            log::error!("content source read failed: {}", err);
            FsError::IOError
        })?;
        if read == 0 {
            return Ok(None);
        }

        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}
