//! Length-prefixed, big-endian reader/writer over a blocking stream.
//!
//! In-memory buffers are handled by [`ssh_encoding`] directly; this cursor
//! covers the socket side where reads may block or time out. Reads pull
//! straight from the stream, writes are buffered until [`ByteCursor::flush`].

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

/// Largest packed string accepted from a peer (matches OpenSSH's agent limit).
pub const MAX_PACKED_LEN: usize = 256 * 1024;

/// Cursor failures.
#[derive(Debug, Error)]
pub enum CursorError {
    /// The peer sent fewer bytes than the frame declared.
    #[error("Unexpected EOF: {0}")]
    Truncated(&'static str),

    /// The stream did not produce or accept bytes within its timeout.
    #[error("Timed out while {0}")]
    TimedOut(&'static str),

    /// A declared length exceeds [`MAX_PACKED_LEN`].
    #[error("Packed string too long ({0} bytes)")]
    TooLong(usize),

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl CursorError {
    /// Whether the read gave up before all declared bytes arrived.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated(_) | Self::TimedOut(_))
    }

    fn from_read(error: io::Error, what: &'static str) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof => Self::Truncated(what),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::TimedOut(what),
            _ => Self::Io(error),
        }
    }

    fn from_write(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::TimedOut("writing"),
            _ => Self::Io(error),
        }
    }
}

/// Cursor result type.
pub type CursorResult<T> = Result<T, CursorError>;

/// Big-endian cursor over a stream.
#[derive(Debug)]
pub struct ByteCursor<S> {
    stream: S,
    pending: Vec<u8>,
}

impl<S> ByteCursor<S> {
    /// Wrap a stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            pending: Vec::new(),
        }
    }

    /// Returns the stream, discarding unflushed writes.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Shared access to the stream, e.g. to adjust its timeouts.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }
}

impl<S: Read> ByteCursor<S> {
    /// Read one byte.
    pub fn read_u8(&mut self) -> CursorResult<u8> {
        self.stream
            .read_u8()
            .map_err(|e| CursorError::from_read(e, "reading u8"))
    }

    /// Read a big-endian `u16`.
    pub fn read_u16(&mut self) -> CursorResult<u16> {
        self.stream
            .read_u16::<BigEndian>()
            .map_err(|e| CursorError::from_read(e, "reading u16"))
    }

    /// Read a big-endian `u32`.
    pub fn read_u32(&mut self) -> CursorResult<u32> {
        self.stream
            .read_u32::<BigEndian>()
            .map_err(|e| CursorError::from_read(e, "reading u32"))
    }

    /// Read exactly `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> CursorResult<Vec<u8>> {
        let mut buf = vec![0; len];
        self.stream
            .read_exact(&mut buf)
            .map_err(|e| CursorError::from_read(e, "reading bytes"))?;
        Ok(buf)
    }

    /// Read a `u32` length followed by that many bytes.
    pub fn read_string(&mut self) -> CursorResult<Vec<u8>> {
        let len = self.read_u32()? as usize;
        if len > MAX_PACKED_LEN {
            return Err(CursorError::TooLong(len));
        }
        self.read_bytes(len)
    }
}

impl<S: Write> ByteCursor<S> {
    /// Queue one byte.
    pub fn write_u8(&mut self, value: u8) {
        self.pending.push(value);
    }

    /// Queue a big-endian `u16`.
    pub fn write_u16(&mut self, value: u16) {
        // writes into a Vec cannot fail
        let _ = self.pending.write_u16::<BigEndian>(value);
    }

    /// Queue a big-endian `u32`.
    pub fn write_u32(&mut self, value: u32) {
        let _ = self.pending.write_u32::<BigEndian>(value);
    }

    /// Queue raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Queue a `u32` length followed by the bytes.
    pub fn write_string(&mut self, bytes: &[u8]) -> CursorResult<()> {
        let len = u32::try_from(bytes.len()).map_err(|_| CursorError::TooLong(bytes.len()))?;
        self.write_u32(len);
        self.write_bytes(bytes);
        Ok(())
    }

    /// Push queued bytes to the stream.
    pub fn flush(&mut self) -> CursorResult<()> {
        let pending = std::mem::take(&mut self.pending);
        self.stream
            .write_all(&pending)
            .map_err(CursorError::from_write)?;
        self.stream.flush().map_err(CursorError::from_write)
    }
}
