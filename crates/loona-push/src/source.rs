//! Body chunks, as seen by observers.
//!
//! Every DATA frame on a connection sits between other frames, so whoever
//! handles a chunk must move the connection's read cursor past all of it,
//! whether or not they care about the bytes. [DataSource] is handed out once
//! per chunk and can only be resolved once, by [DataSource::take],
//! [DataSource::take_into] or [DataSource::skip]. All of them advance the
//! cursor by exactly [DataSource::len] bytes.

use std::io::{self, Read};

use bytes::{Bytes, BytesMut};
use tracing::trace;

/// How a chunk was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The bytes were read into a buffer
    Taken,
    /// The bytes were thrown away
    Skipped,
    /// Reading or skipping the bytes failed, the cursor is somewhere inside
    /// the chunk
    Failed(io::ErrorKind),
}

/// A single data chunk of `len` bytes, positioned at the connection's read
/// cursor.
pub struct DataSource<'a> {
    reader: &'a mut dyn Read,
    len: usize,
    resolution: &'a mut Option<Resolution>,
}

impl<'a> DataSource<'a> {
    pub(crate) fn new(
        reader: &'a mut dyn Read,
        len: usize,
        resolution: &'a mut Option<Resolution>,
    ) -> Self {
        Self {
            reader,
            len,
            resolution,
        }
    }

    /// Number of bytes in this chunk
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read the whole chunk into a fresh buffer
    pub fn take(self) -> io::Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.len);
        self.take_into(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Append the whole chunk to `buf`
    pub fn take_into(self, buf: &mut BytesMut) -> io::Result<()> {
        let len = self.len;

        let start = buf.len();
        buf.resize(start + len, 0);
        if let Err(e) = self.reader.read_exact(&mut buf[start..]) {
            buf.truncate(start);
            *self.resolution = Some(Resolution::Failed(e.kind()));
            return Err(e);
        }
        trace!(%len, "took chunk");
        *self.resolution = Some(Resolution::Taken);
        Ok(())
    }

    /// Throw the whole chunk away
    pub fn skip(self) -> io::Result<()> {
        let len = self.len;

        let res = match io::copy(&mut self.reader.take(len as u64), &mut io::sink()) {
            Ok(skipped) if skipped == len as u64 => Ok(()),
            Ok(skipped) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("connection ended after {skipped} of {len} bytes"),
            )),
            Err(e) => Err(e),
        };
        match &res {
            Ok(()) => {
                trace!(%len, "skipped chunk");
                *self.resolution = Some(Resolution::Skipped);
            }
            Err(e) => *self.resolution = Some(Resolution::Failed(e.kind())),
        }
        res
    }
}

/// Reads or skips exactly one chunk on behalf of the engine, for streams
/// nobody is listening to anymore.
pub(crate) fn discard(reader: &mut dyn Read, len: usize) -> io::Result<()> {
    let mut resolution = None;
    DataSource::new(reader, len, &mut resolution).skip()
}
