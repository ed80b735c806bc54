//! Bit-level buffer builder for parser tests

use bitstream_io::{BigEndian, BitWrite, BitWriter};

pub struct BitBuilder {
    w: BitWriter<Vec<u8>, BigEndian>,
}

impl BitBuilder {
    pub fn new() -> Self {
        Self {
            w: BitWriter::endian(Vec::new(), BigEndian),
        }
    }

    /// Writes the low `n` bits of `value`; widths past 32 are zero-extended.
    pub fn bits(&mut self, n: u32, value: u32) -> &mut Self {
        if n > 32 {
            self.bits(n - 32, 0);
            return self.bits(32, value);
        }
        if n > 0 {
            self.w.write_var(n, value).unwrap();
        }
        self
    }

    pub fn bit(&mut self, set: bool) -> &mut Self {
        self.w.write_bit(set).unwrap();
        self
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        for &b in bytes {
            self.bits(8, b as u32);
        }
        self
    }

    pub fn ue(&mut self, value: u32) -> &mut Self {
        let v = value as u64 + 1;
        let len = 64 - v.leading_zeros();
        self.bits(len - 1, 0);
        for i in (0..len).rev() {
            self.bit((v >> i) & 1 == 1);
        }
        self
    }

    pub fn se(&mut self, value: i32) -> &mut Self {
        let k = if value > 0 {
            (value as u32) * 2 - 1
        } else {
            value.unsigned_abs() * 2
        };
        self.ue(k)
    }

    /// Pads with zero bits to the next byte boundary and returns the bytes.
    pub fn finish(&mut self) -> Vec<u8> {
        self.w.byte_align().unwrap();
        std::mem::replace(&mut self.w, BitWriter::endian(Vec::new(), BigEndian)).into_writer()
    }
}
