//! Buffered byte-stream reader.
//!
//! `QoiStreamReader` pulls from any `std::io::Read` source through a fixed
//! size buffer. Multi-byte reads that straddle the end of the buffered window
//! are stitched together with [`split_copy`], so callers never observe a
//! partial value.

use crate::constants::DEFAULT_BUFFER_SIZE;
use crate::error::{QoiError, Result};
use crate::split_copy::split_copy;
use crate::traits::{BigEndianInt, MAX_INT_SIZE};
use log::trace;
use std::io::{ErrorKind, Read};

pub struct QoiStreamReader<R: Read> {
    source: R,
    buffer: Box<[u8]>,
    cursor: usize,
    valid: usize,
    position: u64,
}

impl<R: Read> QoiStreamReader<R> {
    pub fn new(source: R) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, source)
    }

    /// Creates a reader with a buffer of `capacity` bytes (at least one).
    pub fn with_capacity(capacity: usize, source: R) -> Self {
        Self {
            source,
            buffer: vec![0u8; capacity.max(1)].into_boxed_slice(),
            cursor: 0,
            valid: 0,
            position: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes handed out to the caller so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes already pulled from the source but not yet consumed.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer[self.cursor..self.valid]
    }

    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Returns the source. Buffered but unconsumed bytes are discarded.
    pub fn into_inner(self) -> R {
        self.source
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        if self.cursor == self.valid {
            self.refill()?;
        }
        let value = self.buffer[self.cursor];
        self.cursor += 1;
        self.position += 1;
        Ok(value)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_int()
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_int()
    }

    /// Reads a big-endian integer, refilling mid-value if needed.
    pub fn read_int<T: BigEndianInt>(&mut self) -> Result<T> {
        let mut raw = [0u8; MAX_INT_SIZE];
        self.read_exact_into(&mut raw[..T::SIZE])?;
        Ok(T::from_be_slice(&raw))
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut raw = [0u8; N];
        self.read_exact_into(&mut raw)?;
        Ok(raw)
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; count];
        self.read_exact_into(&mut bytes)?;
        Ok(bytes)
    }

    /// Fills `destination` completely or fails with `EndOfStream`.
    pub fn read_exact_into(&mut self, destination: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < destination.len() {
            if self.cursor == self.valid {
                self.refill()?;
            }
            let copied = split_copy(
                &mut destination[filled..],
                &self.buffer[self.cursor..self.valid],
            );
            self.cursor += copied;
            self.position += copied as u64;
            filled += copied;
        }
        Ok(())
    }

    fn refill(&mut self) -> Result<()> {
        loop {
            match self.source.read(&mut self.buffer) {
                Ok(0) => return Err(QoiError::EndOfStream),
                Ok(count) => {
                    trace!("refilled reader buffer with {} bytes", count);
                    self.cursor = 0;
                    self.valid = count;
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Yields at most `chunk` bytes per read call.
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let count = self.chunk.min(buf.len()).min(self.data.len());
            buf[..count].copy_from_slice(&self.data[..count]);
            self.data = &self.data[count..];
            Ok(count)
        }
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn test_read_u8_sequence() {
        let mut reader = QoiStreamReader::new(Cursor::new(vec![1u8, 2, 3]));
        assert_eq!(reader.read_u8().unwrap(), 1);
        assert_eq!(reader.read_u8().unwrap(), 2);
        assert_eq!(reader.read_u8().unwrap(), 3);
        assert!(matches!(reader.read_u8(), Err(QoiError::EndOfStream)));
        assert_eq!(reader.position(), 3);
    }

    #[test]
    fn test_int_spanning_refill() {
        // A 3-byte buffer forces the u32 to straddle two refills.
        let data = [0xAAu8, 0x12, 0x34, 0x56, 0x78, 0xBB];
        let mut reader = QoiStreamReader::with_capacity(3, Cursor::new(data));
        assert_eq!(reader.read_u8().unwrap(), 0xAA);
        assert_eq!(reader.read_u32().unwrap(), 0x1234_5678);
        assert_eq!(reader.read_u8().unwrap(), 0xBB);
    }

    #[test]
    fn test_short_reads_from_source() {
        let data: Vec<u8> = (0..=255).collect();
        let mut reader = QoiStreamReader::with_capacity(
            16,
            Trickle {
                data: &data,
                chunk: 5,
            },
        );
        assert_eq!(reader.read_u16().unwrap(), 0x0001);
        assert_eq!(reader.read_bytes(250).unwrap(), data[2..252].to_vec());
        assert_eq!(reader.read_array::<4>().unwrap(), [252, 253, 254, 255]);
        assert!(matches!(reader.read_u8(), Err(QoiError::EndOfStream)));
    }

    #[test]
    fn test_exhausted_mid_value() {
        let mut reader = QoiStreamReader::with_capacity(2, Cursor::new([1u8, 2, 3]));
        assert!(matches!(
            reader.read_int::<u32>(),
            Err(QoiError::EndOfStream)
        ));
    }

    #[test]
    fn test_io_error_propagates() {
        let mut reader = QoiStreamReader::new(Failing);
        assert!(matches!(reader.read_u8(), Err(QoiError::Io(_))));
    }

    #[test]
    fn test_empty_read_is_noop() {
        let mut reader = QoiStreamReader::new(Cursor::new(Vec::<u8>::new()));
        assert_eq!(reader.read_bytes(0).unwrap(), Vec::<u8>::new());
    }
}
