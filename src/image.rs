//! The loaded binary image and its fetch cursor.
//!
//! An [`Image`] owns a fixed-capacity byte buffer sized to the target
//! architecture's address space (0x10000 for the 8-bit ISAs, 0x1000000 for
//! the 68000). The buffer is zero-filled and overwritten with the input
//! file's bytes starting at `start`. A single cursor is advanced by
//! whichever pass currently owns the image; no two passes touch it at
//! the same time.

use crate::error::{DisasmError, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// A fixed-capacity address space with a single fetch cursor.
#[derive(Debug)]
pub struct Image {
    buffer: Vec<u8>,
    start: usize,
    end: usize,
    cursor: usize,
}

impl Image {
    /// Create an empty image of the given capacity (the architecture's
    /// full address space), with no bytes loaded yet.
    pub fn new(capacity: usize) -> Self {
        Image {
            buffer: vec![0u8; capacity],
            start: 0,
            end: 0,
            cursor: 0,
        }
    }

    /// Load `data` into the buffer at `start`, truncating at the end of
    /// the address space if the data doesn't fit.
    pub fn load(&mut self, start: usize, data: &[u8]) -> Result<()> {
        if start >= self.buffer.len() {
            return Err(DisasmError::StartOutOfRange {
                start,
                capacity: self.buffer.len(),
            });
        }
        let end = (start + data.len()).min(self.buffer.len());
        self.buffer[start..end].copy_from_slice(&data[..end - start]);
        self.start = start;
        self.end = end;
        self.cursor = start;
        Ok(())
    }

    /// The base address the input is considered to live at.
    pub fn start(&self) -> usize {
        self.start
    }

    /// The first address past the loaded input.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Total address-space capacity (`N` in the design doc).
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Position the cursor at an absolute address.
    pub fn seek(&mut self, addr: usize) {
        self.cursor = addr;
    }

    /// The cursor's current absolute address.
    pub fn tell(&self) -> usize {
        self.cursor
    }

    fn byte_at(&self, addr: usize) -> u8 {
        self.buffer.get(addr).copied().unwrap_or(0)
    }

    /// Fetch one byte and advance the cursor.
    pub fn fetch8(&mut self) -> u8 {
        let c = self.byte_at(self.cursor);
        self.cursor += 1;
        c
    }

    /// Fetch a big-endian 16-bit word and advance the cursor by 2.
    pub fn fetch16_be(&mut self) -> u16 {
        let hi = self.fetch8();
        let lo = self.fetch8();
        BigEndian::read_u16(&[hi, lo])
    }

    /// Fetch a little-endian 16-bit word and advance the cursor by 2.
    pub fn fetch16_le(&mut self) -> u16 {
        let lo = self.fetch8();
        let hi = self.fetch8();
        LittleEndian::read_u16(&[lo, hi])
    }

    /// Fetch a big-endian 32-bit word and advance the cursor by 4.
    pub fn fetch32_be(&mut self) -> u32 {
        let a = self.fetch8();
        let b = self.fetch8();
        let c = self.fetch8();
        let d = self.fetch8();
        BigEndian::read_u32(&[a, b, c, d])
    }

    /// Read a single byte without moving the cursor.
    pub fn peek8(&self, addr: usize) -> u8 {
        self.byte_at(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_zero_fills_outside_input() {
        let mut img = Image::new(0x10000);
        img.load(0x10, &[0xAA, 0xBB]).unwrap();
        assert_eq!(img.start(), 0x10);
        assert_eq!(img.end(), 0x12);
        assert_eq!(img.peek8(0x0f), 0);
        assert_eq!(img.peek8(0x10), 0xAA);
        assert_eq!(img.peek8(0x11), 0xBB);
        assert_eq!(img.peek8(0x12), 0);
    }

    #[test]
    fn fetch_advances_cursor() {
        let mut img = Image::new(0x10000);
        img.load(0, &[0x01, 0x02, 0x03, 0x04]).unwrap();
        img.seek(0);
        assert_eq!(img.fetch8(), 0x01);
        assert_eq!(img.tell(), 1);
        assert_eq!(img.fetch16_be(), 0x0203);
        assert_eq!(img.tell(), 3);
    }

    #[test]
    fn little_vs_big_endian_word() {
        let mut img = Image::new(0x10000);
        img.load(0, &[0x12, 0x34]).unwrap();
        img.seek(0);
        assert_eq!(img.fetch16_le(), 0x3412);
        img.seek(0);
        assert_eq!(img.fetch16_be(), 0x1234);
    }

    #[test]
    fn truncates_at_capacity() {
        let mut img = Image::new(4);
        img.load(2, &[1, 2, 3, 4]).unwrap();
        assert_eq!(img.end(), 4);
    }

    #[test]
    fn start_beyond_capacity_errors() {
        let mut img = Image::new(4);
        assert!(img.load(10, &[1]).is_err());
    }
}
