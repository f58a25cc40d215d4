use std::io::{BufRead, BufReader, Read, Write};

use crate::error::{MjpegError, Result};

/// Two-mode reader over a single buffered stream.
///
/// Header lines and JPEG payloads are interleaved on the same connection, so
/// both read styles must share one buffer: a line read may pull payload bytes
/// into the buffer, and the following exact read must see them.
///
/// Each call uses exactly one mode; the modes are never mixed inside an
/// operation.
#[derive(Debug)]
pub struct StreamReader<S> {
    inner: BufReader<S>,
    line: Vec<u8>,
}

impl<S: Read> StreamReader<S> {
    pub fn new(stream: S) -> Self {
        StreamReader {
            inner: BufReader::new(stream),
            line: Vec::new(),
        }
    }

    /// Line mode: read up to and including the next `\n`.
    ///
    /// Returns `Ok(None)` once the peer has closed the stream. The returned
    /// slice is only valid until the next read.
    pub fn read_line(&mut self) -> Result<Option<&[u8]>> {
        self.line.clear();
        match self.inner.read_until(b'\n', &mut self.line)? {
            0 => Ok(None),
            _ => Ok(Some(&self.line)),
        }
    }

    /// Byte mode: read exactly `len` bytes.
    ///
    /// Fails with [`MjpegError::TruncatedFrame`] when the stream ends first.
    pub fn read_exact_or_truncated(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(len);
        let received = (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        if received < len {
            return Err(MjpegError::TruncatedFrame {
                expected: len,
                received,
            });
        }
        Ok(buf)
    }

    pub fn get_ref(&self) -> &S {
        self.inner.get_ref()
    }

    pub fn into_inner(self) -> S {
        self.inner.into_inner()
    }
}

impl<S: Read + Write> StreamReader<S> {
    /// Write directly to the underlying stream and flush.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.inner.get_mut();
        stream.write_all(bytes)?;
        stream.flush()?;
        Ok(())
    }
}
