//! MSB-first bit packing.

/// Appends fixed-width values, most significant bit first.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            bit_len: 0,
        }
    }

    /// Write the low `bits` bits of `value`. `bits` must be at most 32.
    pub fn write(&mut self, value: u32, bits: u32) {
        debug_assert!(bits <= 32);
        for shift in (0..bits).rev() {
            if self.bit_len % 8 == 0 {
                self.bytes.push(0);
            }
            let bit = ((value >> shift) & 1) as u8;
            if let Some(last) = self.bytes.last_mut() {
                *last |= bit << (7 - self.bit_len % 8);
            }
            self.bit_len += 1;
        }
    }

    /// Packed bytes; the final byte is zero padded.
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Reads fixed-width values written by [`BitWriter`].
#[derive(Debug)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Read `bits` bits, or `None` when the input runs out.
    pub fn read(&mut self, bits: u32) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..bits {
            let byte = *self.bytes.get(self.pos / 8)?;
            let bit = (byte >> (7 - self.pos % 8)) & 1;
            value = (value << 1) | bit as u32;
            self.pos += 1;
        }
        Some(value)
    }

    /// Current position in bits.
    pub fn position(&self) -> usize {
        self.pos
    }
}
