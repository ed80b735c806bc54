//! Bit cursor over a borrowed byte buffer

use bitstream_io::{BigEndian, BitRead, BitReader as IoBitReader};

use crate::types::ParseError;

/// MSB-first bit cursor with an explicit "bits remaining" count.
///
/// Every read is bounds-checked against the cursor's bit length; reading past the
/// end yields [`ParseError::InsufficientData`] instead of touching memory beyond
/// the buffer.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    len_bits: usize,
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Cursor over the whole of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_bit_len(data, data.len() * 8)
    }

    /// Cursor over the first `len_bits` bits of `data` (clamped to the buffer).
    pub fn with_bit_len(data: &'a [u8], len_bits: usize) -> Self {
        Self {
            data,
            len_bits: len_bits.min(data.len() * 8),
            pos: 0,
        }
    }

    pub fn bits_left(&self) -> usize {
        self.len_bits - self.pos
    }

    pub fn bit_position(&self) -> usize {
        self.pos
    }

    pub fn byte_position(&self) -> usize {
        self.pos / 8
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.pos % 8 == 0
    }

    /// Bytes from the current byte position up to the end of the cursor.
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.pos / 8..self.len_bits / 8]
    }

    /// Fails with `InsufficientData` unless at least `n` bits remain.
    pub fn require(&self, n: usize) -> Result<(), ParseError> {
        if self.bits_left() < n {
            return Err(ParseError::InsufficientData);
        }
        Ok(())
    }

    fn fetch(&self, n: u32) -> Result<u32, ParseError> {
        if n > 32 {
            return Err(ParseError::Malformed("bit field wider than 32 bits"));
        }
        self.require(n as usize)?;
        if n == 0 {
            return Ok(0);
        }
        let mut br = IoBitReader::endian(&self.data[self.pos / 8..], BigEndian);
        br.skip((self.pos % 8) as u32).map_err(|_| ParseError::InsufficientData)?;
        br.read_var::<u32>(n).map_err(|_| ParseError::InsufficientData)
    }

    /// Consumes `n` (<= 32) bits and returns them as an unsigned value.
    pub fn read_bits(&mut self, n: u32) -> Result<u32, ParseError> {
        let v = self.fetch(n)?;
        self.pos += n as usize;
        Ok(v)
    }

    /// Like [`read_bits`](Self::read_bits) but clamps `n` to what remains;
    /// returns 0 once the cursor is exhausted.
    pub fn read_bits_clamped(&mut self, n: u32) -> u32 {
        let n = n.min(32).min(self.bits_left().min(32) as u32);
        self.read_bits(n).unwrap_or(0)
    }

    pub fn read_bit(&mut self) -> Result<bool, ParseError> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Returns the next `n` bits without advancing.
    pub fn peek_bits(&self, n: u32) -> Result<u32, ParseError> {
        self.fetch(n)
    }

    pub fn skip_bits(&mut self, n: usize) -> Result<(), ParseError> {
        self.require(n)?;
        self.pos += n;
        Ok(())
    }
}
