//! Buffered byte-stream writer.
//!
//! Output accumulates in a fixed buffer and is pushed to the sink whenever
//! the buffer fills. Dropping the writer flushes whatever is still pending.

use crate::constants::DEFAULT_BUFFER_SIZE;
use crate::error::Result;
use crate::split_copy::split_copy;
use crate::traits::{BigEndianInt, MAX_INT_SIZE};
use log::{trace, warn};
use std::io::{self, Write};

pub struct QoiStreamWriter<W: Write> {
    // Only `finish` takes the sink out.
    sink: Option<W>,
    buffer: Box<[u8]>,
    filled: usize,
    len: u64,
}

impl<W: Write> QoiStreamWriter<W> {
    pub fn new(sink: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, sink)
    }

    /// Creates a writer with a buffer of `capacity` bytes (at least one).
    pub fn with_capacity(capacity: usize, sink: W) -> Self {
        Self {
            sink: Some(sink),
            buffer: vec![0u8; capacity.max(1)].into_boxed_slice(),
            filled: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes accepted, flushed or not.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes waiting in the buffer.
    pub fn pending(&self) -> &[u8] {
        &self.buffer[..self.filled]
    }

    pub fn get_ref(&self) -> Option<&W> {
        self.sink.as_ref()
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        if self.filled == self.buffer.len() {
            self.flush_buffer()?;
        }
        self.buffer[self.filled] = value;
        self.filled += 1;
        self.len += 1;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_int(value)
    }

    /// Writes a big-endian integer, flushing mid-value if the buffer fills.
    pub fn write_int<T: BigEndianInt>(&mut self, value: T) -> Result<()> {
        let mut raw = [0u8; MAX_INT_SIZE];
        value.write_be_slice(&mut raw);
        self.write_bytes(&raw[..T::SIZE])
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < bytes.len() {
            if self.filled == self.buffer.len() {
                self.flush_buffer()?;
            }
            let copied = split_copy(&mut self.buffer[self.filled..], &bytes[written..]);
            self.filled += copied;
            written += copied;
            self.len += copied as u64;
        }
        Ok(())
    }

    /// Pushes buffered bytes to the sink and flushes the sink itself.
    pub fn flush(&mut self) -> Result<()> {
        self.flush_buffer()?;
        self.sink_mut()?.flush()?;
        Ok(())
    }

    /// Flushes and hands back the sink.
    pub fn finish(mut self) -> Result<W> {
        self.flush()?;
        let sink = self.sink.take().ok_or_else(missing_sink)?;
        Ok(sink)
    }

    fn flush_buffer(&mut self) -> Result<()> {
        if self.filled == 0 {
            return Ok(());
        }
        let filled = self.filled;
        let sink = self.sink.as_mut().ok_or_else(missing_sink)?;
        let result = sink.write_all(&self.buffer[..filled]);
        // A failed write may have sent part of the buffer; never resend it.
        self.filled = 0;
        result?;
        trace!("flushed {} bytes from writer buffer", filled);
        Ok(())
    }

    fn sink_mut(&mut self) -> io::Result<&mut W> {
        self.sink.as_mut().ok_or_else(missing_sink)
    }
}

impl<W: Write> Drop for QoiStreamWriter<W> {
    fn drop(&mut self) {
        if self.sink.is_none() || self.filled == 0 {
            return;
        }
        let unflushed = self.filled;
        if let Err(e) = self.flush() {
            warn!("dropping writer with {} unflushed bytes: {}", unflushed, e);
        }
    }
}

fn missing_sink() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "writer sink already released")
}
