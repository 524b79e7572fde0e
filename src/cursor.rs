//! Cursors over a byte slice.

use crate::codec::{Decode, Encode, Error};

/// Tracks the write position while a byte slice is being filled.
pub struct WriteCursor<'d> {
    pos: usize,
    data: &'d mut [u8],
}

impl<'d> WriteCursor<'d> {
    /// Creates a write cursor at the beginning of the data.
    pub fn new(data: &'d mut [u8]) -> Self {
        Self { pos: 0, data }
    }

    /// Write an encodable value.
    pub fn write<E: Encode>(&mut self, data: E) -> Result<(), Error> {
        if self.available() < data.size() {
            Err(Error::InsufficientSpace)
        } else {
            data.encode(&mut self.data[self.pos..self.pos + data.size()])?;
            self.pos += data.size();
            Ok(())
        }
    }

    /// Bytes that remain writable.
    pub fn available(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Length of the data written so far.
    pub fn len(&self) -> usize {
        self.pos
    }

    /// Whether anything has been written.
    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }
}

/// Tracks the read position while a byte slice is being decoded.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Debug)]
pub struct ReadCursor<'d> {
    pos: usize,
    data: &'d [u8],
}

impl<'d> ReadCursor<'d> {
    /// Creates a read cursor at the beginning of the data.
    pub fn new(data: &'d [u8]) -> Self {
        Self { pos: 0, data }
    }

    /// Decode the next value.
    pub fn read<T: Decode<'d>>(&mut self) -> Result<T, Error> {
        let src = &self.data[self.pos..];
        let val = T::decode(src)?;
        self.pos += val.size();
        Ok(val)
    }

    /// Bytes that remain readable.
    pub fn available(&self) -> usize {
        self.data.len() - self.pos
    }
}
