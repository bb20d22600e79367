//! Byte streams with a read cursor, and the shared `Body` handle messages carry.

use bytes::Bytes;
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::io::{self, Read, SeekFrom};
use std::sync::Arc;

/// A sequence of bytes read through a cursor.
///
/// Seeking is optional. Forward-only implementations report
/// `is_seekable() == false` and fail every `seek` call.
pub trait ByteStream: Send {
    /// Total length in bytes, when known.
    fn len(&self) -> Option<u64>;

    /// Whether the cursor can be repositioned.
    fn is_seekable(&self) -> bool;

    /// Whether the cursor has reached the end of the data.
    fn eof(&self) -> bool;

    /// Current cursor position.
    fn tell(&self) -> io::Result<u64>;

    /// Move the cursor and return the new position.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /// Read up to `n` bytes from the cursor.
    fn read(&mut self, n: usize) -> io::Result<Bytes>;

    /// Read everything from the cursor to the end.
    fn get_contents(&mut self) -> io::Result<Bytes>;

    /// Move the cursor back to the start.
    fn rewind(&mut self) -> io::Result<()> {
        self.seek(SeekFrom::Start(0)).map(|_| ())
    }

    /// Whole content as text: rewinds when possible, then reads to the end.
    ///
    /// On a forward-only stream this only yields what is left after the cursor.
    fn contents_to_string(&mut self) -> io::Result<String> {
        if self.is_seekable() {
            self.rewind()?;
        }
        let bytes = self.get_contents()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn not_seekable() -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, "stream is not seekable")
}

/// In-memory stream over a byte buffer.
///
/// Seekability can be switched off to model a forward-only source over known
/// content.
#[derive(Debug, Clone)]
pub struct MemoryStream {
    data: Bytes,
    offset: usize,
    seekable: bool,
}

impl MemoryStream {
    /// Create a seekable stream positioned at the start.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            offset: 0,
            seekable: true,
        }
    }

    /// Create a forward-only stream positioned at the start.
    pub fn forward_only(data: impl Into<Bytes>) -> Self {
        Self::new(data).with_seekable(false)
    }

    /// Builder-style seekability toggle.
    pub fn with_seekable(mut self, seekable: bool) -> Self {
        self.seekable = seekable;
        self
    }

    pub fn set_seekable(&mut self, seekable: bool) {
        self.seekable = seekable;
    }

    fn remaining(&self) -> &[u8] {
        self.data.get(self.offset..).unwrap_or_default()
    }
}

impl Default for MemoryStream {
    fn default() -> Self {
        Self::new(Bytes::new())
    }
}

impl ByteStream for MemoryStream {
    fn len(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn is_seekable(&self) -> bool {
        self.seekable
    }

    fn eof(&self) -> bool {
        self.offset >= self.data.len()
    }

    fn tell(&self) -> io::Result<u64> {
        Ok(self.offset as u64)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if !self.seekable {
            return Err(not_seekable());
        }
        let target = match pos {
            SeekFrom::Start(n) => i128::from(n),
            SeekFrom::Current(delta) => self.offset as i128 + i128::from(delta),
            SeekFrom::End(delta) => self.data.len() as i128 + i128::from(delta),
        };
        let target = usize::try_from(target).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative position")
        })?;
        self.offset = target;
        Ok(target as u64)
    }

    fn read(&mut self, n: usize) -> io::Result<Bytes> {
        let start = self.offset.min(self.data.len());
        let end = start.saturating_add(n).min(self.data.len());
        self.offset = self.offset.max(end);
        Ok(self.data.slice(start..end))
    }

    fn get_contents(&mut self) -> io::Result<Bytes> {
        let rest = Bytes::copy_from_slice(self.remaining());
        self.offset = self.offset.max(self.data.len());
        Ok(rest)
    }
}

/// Forward-only stream over any reader.
///
/// The length is unknown. A read that fills its buffer looks one byte ahead, so
/// `eof()` is already true once the last byte has been handed out.
pub struct ReaderStream<R> {
    reader: R,
    peeked: Option<u8>,
    position: u64,
    eof: bool,
}

impl<R: Read + Send> ReaderStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            peeked: None,
            position: 0,
            eof: false,
        }
    }

    /// The underlying reader. A byte already looked ahead at is lost.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn fill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(k) => filled += k,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn look_ahead(&mut self) -> io::Result<()> {
        let mut byte = [0u8; 1];
        if self.fill(&mut byte)? == 1 {
            self.peeked = Some(byte[0]);
        }
        Ok(())
    }
}

impl<R> fmt::Debug for ReaderStream<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderStream")
            .field("position", &self.position)
            .field("eof", &self.eof)
            .finish_non_exhaustive()
    }
}

impl<R: Read + Send> ByteStream for ReaderStream<R> {
    fn len(&self) -> Option<u64> {
        None
    }

    fn is_seekable(&self) -> bool {
        false
    }

    fn eof(&self) -> bool {
        self.eof && self.peeked.is_none()
    }

    fn tell(&self) -> io::Result<u64> {
        Ok(self.position)
    }

    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(not_seekable())
    }

    fn read(&mut self, n: usize) -> io::Result<Bytes> {
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        if n > 0 {
            if let Some(byte) = self.peeked.take() {
                buf[0] = byte;
                filled = 1;
            }
        }
        if !self.eof {
            filled += self.fill(&mut buf[filled..])?;
        }
        if n > 0 && filled == n && !self.eof {
            self.look_ahead()?;
        }
        buf.truncate(filled);
        self.position += filled as u64;
        Ok(Bytes::from(buf))
    }

    fn get_contents(&mut self) -> io::Result<Bytes> {
        let mut buf: Vec<u8> = self.peeked.take().into_iter().collect();
        if !self.eof {
            self.reader.read_to_end(&mut buf)?;
        }
        self.eof = true;
        self.position += buf.len() as u64;
        Ok(Bytes::from(buf))
    }
}

/// Shared handle to a message body.
///
/// Cloning the handle does not copy the stream: every clone sees the same cursor.
/// Values derived through `with_*` mutators keep pointing at the same body until
/// one of them is given a new one.
#[derive(Clone)]
pub struct Body {
    stream: Arc<Mutex<Box<dyn ByteStream>>>,
}

impl Body {
    pub fn new(stream: impl ByteStream + 'static) -> Self {
        Self::from_boxed(Box::new(stream))
    }

    pub fn from_boxed(stream: Box<dyn ByteStream>) -> Self {
        Self {
            stream: Arc::new(Mutex::new(stream)),
        }
    }

    /// An empty, seekable body.
    pub fn empty() -> Self {
        Self::new(MemoryStream::default())
    }

    /// Exclusive access to the underlying stream.
    pub fn lock(&self) -> MutexGuard<'_, Box<dyn ByteStream>> {
        self.stream.lock()
    }

    /// Whether both handles refer to the same stream.
    pub fn ptr_eq(&self, other: &Body) -> bool {
        Arc::ptr_eq(&self.stream, &other.stream)
    }

    pub fn is_seekable(&self) -> bool {
        self.lock().is_seekable()
    }

    pub fn eof(&self) -> bool {
        self.lock().eof()
    }

    pub fn tell(&self) -> io::Result<u64> {
        self.lock().tell()
    }

    pub fn seek(&self, pos: SeekFrom) -> io::Result<u64> {
        self.lock().seek(pos)
    }

    pub fn read(&self, n: usize) -> io::Result<Bytes> {
        self.lock().read(n)
    }

    pub fn get_contents(&self) -> io::Result<Bytes> {
        self.lock().get_contents()
    }

    pub fn contents_to_string(&self) -> io::Result<String> {
        self.lock().contents_to_string()
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Body");
        match self.stream.try_lock() {
            Some(stream) => {
                out.field("seekable", &stream.is_seekable())
                    .field("position", &stream.tell().ok())
                    .field("len", &stream.len());
            }
            None => {
                out.field("locked", &true);
            }
        }
        out.finish()
    }
}

impl From<MemoryStream> for Body {
    fn from(stream: MemoryStream) -> Self {
        Self::new(stream)
    }
}

impl From<&str> for Body {
    fn from(content: &str) -> Self {
        Self::new(MemoryStream::new(content.to_string()))
    }
}

impl From<String> for Body {
    fn from(content: String) -> Self {
        Self::new(MemoryStream::new(content))
    }
}

impl From<Vec<u8>> for Body {
    fn from(content: Vec<u8>) -> Self {
        Self::new(MemoryStream::new(content))
    }
}

impl From<Bytes> for Body {
    fn from(content: Bytes) -> Self {
        Self::new(MemoryStream::new(content))
    }
}
