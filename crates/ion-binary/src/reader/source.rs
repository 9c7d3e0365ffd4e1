//! Byte sources for the binary cursor.
//!
//! Offsets are absolute positions in the logical input (`u64`, so streams
//! longer than 4 GiB keep exact spans). A source only has to keep bytes from
//! the last released offset onwards.

use std::io::{ErrorKind as IoErrorKind, Read};

use crate::error::{IonError, Result};
use crate::limits::{STREAM_CHUNK_SIZE, STREAM_RELEASE_THRESHOLD};

/// Input the cursor pulls bytes from.
pub trait ByteSource {
    /// Makes bytes from `start` available, reading until at least `want` are
    /// buffered or the input is exhausted, and returns everything buffered
    /// from `start`. Fewer than `want` bytes means the input has no more for
    /// now.
    fn fill(&mut self, start: u64, want: usize) -> Result<&[u8]>;

    /// Bytes in `[start, end)` if they are still buffered.
    fn get(&self, start: u64, end: u64) -> Option<&[u8]>;

    /// Signals that bytes before `before` will not be requested again.
    fn release(&mut self, before: u64) {
        let _ = before;
    }
}

fn window(data: &[u8], base: u64, start: u64, end: u64) -> Option<&[u8]> {
    let from = usize::try_from(start.checked_sub(base)?).ok()?;
    let to = usize::try_from(end.checked_sub(base)?).ok()?;
    data.get(from..to)
}

fn tail(data: &[u8], base: u64, start: u64) -> Result<&[u8]> {
    let from = start
        .checked_sub(base)
        .and_then(|offset| usize::try_from(offset).ok())
        .ok_or(IonError::InvalidState("offset was already released"))?;
    Ok(data.get(from..).unwrap_or_default())
}

/// A borrowed, complete input.
#[derive(Debug, Clone, Copy)]
pub struct SliceSource<'a> {
    data: &'a [u8],
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl ByteSource for SliceSource<'_> {
    fn fill(&mut self, start: u64, _want: usize) -> Result<&[u8]> {
        tail(self.data, 0, start)
    }

    fn get(&self, start: u64, end: u64) -> Option<&[u8]> {
        window(self.data, 0, start, end)
    }
}

/// An owned input that can grow.
///
/// Push-style streaming: when the cursor reports `TruncatedInput` at top
/// level, [`extend`](Self::extend) the buffer and call `next()` again.
#[derive(Debug, Clone, Default)]
pub struct BufferSource {
    data: Vec<u8>,
    base: u64,
}

impl BufferSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends bytes to the end of the input.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Absolute offset one past the last byte received.
    pub fn end_offset(&self) -> u64 {
        self.base + self.data.len() as u64
    }
}

impl From<Vec<u8>> for BufferSource {
    fn from(data: Vec<u8>) -> Self {
        Self { data, base: 0 }
    }
}

impl ByteSource for BufferSource {
    fn fill(&mut self, start: u64, _want: usize) -> Result<&[u8]> {
        tail(&self.data, self.base, start)
    }

    fn get(&self, start: u64, end: u64) -> Option<&[u8]> {
        window(&self.data, self.base, start, end)
    }

    fn release(&mut self, before: u64) {
        compact(&mut self.data, &mut self.base, before);
    }
}

fn compact(data: &mut Vec<u8>, base: &mut u64, before: u64) {
    let Some(consumed) = before
        .checked_sub(*base)
        .and_then(|c| usize::try_from(c).ok())
    else {
        return;
    };
    if consumed >= STREAM_RELEASE_THRESHOLD && consumed <= data.len() {
        data.drain(..consumed);
        *base = before;
    }
}

/// An input read incrementally from a [`Read`] implementation.
///
/// Reads in chunks and keeps only the bytes from the last released offset,
/// so memory stays bounded by the largest top-level value.
#[derive(Debug)]
pub struct StreamSource<R> {
    reader: R,
    buf: Vec<u8>,
    base: u64,
}

impl<R: Read> StreamSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(STREAM_CHUNK_SIZE),
            base: 0,
        }
    }

    /// Returns the wrapped reader, dropping buffered bytes.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteSource for StreamSource<R> {
    fn fill(&mut self, start: u64, want: usize) -> Result<&[u8]> {
        let target = start.saturating_add(want as u64);
        while self.base + (self.buf.len() as u64) < target {
            let missing = (target - self.base - self.buf.len() as u64) as usize;
            let chunk = missing.max(STREAM_CHUNK_SIZE);
            let old_len = self.buf.len();
            self.buf.resize(old_len + chunk, 0);
            match self.reader.read(&mut self.buf[old_len..]) {
                Ok(0) => {
                    self.buf.truncate(old_len);
                    break;
                }
                Ok(n) => self.buf.truncate(old_len + n),
                Err(e) if e.kind() == IoErrorKind::Interrupted => self.buf.truncate(old_len),
                Err(e) => {
                    self.buf.truncate(old_len);
                    return Err(e.into());
                }
            }
        }
        tail(&self.buf, self.base, start)
    }

    fn get(&self, start: u64, end: u64) -> Option<&[u8]> {
        window(&self.buf, self.base, start, end)
    }

    fn release(&mut self, before: u64) {
        compact(&mut self.buf, &mut self.base, before);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Yields at most `step` bytes per read.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_slice_source() {
        let data = [1u8, 2, 3, 4];
        let mut source = SliceSource::new(&data);
        assert_eq!(source.fill(1, 2).unwrap(), &[2, 3, 4]);
        assert_eq!(source.fill(4, 2).unwrap(), &[] as &[u8]);
        assert_eq!(source.get(1, 3), Some(&[2u8, 3][..]));
        assert_eq!(source.get(3, 9), None);
    }

    #[test]
    fn test_buffer_source_extend() {
        let mut source = BufferSource::new();
        source.extend(&[1, 2]);
        assert_eq!(source.fill(0, 4).unwrap().len(), 2);
        source.extend(&[3, 4]);
        assert_eq!(source.fill(0, 4).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(source.end_offset(), 4);
    }

    #[test]
    fn test_stream_source_reads_until_wanted() {
        let data: Vec<u8> = (0..=255).collect();
        let mut source = StreamSource::new(Trickle { data: &data, step: 7 });
        let bytes = source.fill(10, 100).unwrap();
        assert!(bytes.len() >= 100);
        assert_eq!(bytes[0], 10);

        let bytes = source.fill(250, 100).unwrap();
        assert_eq!(bytes, &data[250..]);
    }

    #[test]
    fn test_stream_source_release_keeps_offsets() {
        let data = vec![7u8; STREAM_RELEASE_THRESHOLD + 100];
        let mut source = StreamSource::new(&data[..]);
        source.fill(0, data.len()).unwrap();
        source.release(STREAM_RELEASE_THRESHOLD as u64);

        let start = STREAM_RELEASE_THRESHOLD as u64;
        assert_eq!(source.get(start, start + 100).map(<[u8]>::len), Some(100));
        assert_eq!(source.get(0, 10), None);
        assert!(source.fill(0, 1).is_err());
    }
}
