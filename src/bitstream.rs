//! Bit-level access to a GIF data sub-block chain.
//!
//! The image data area of a GIF is a chain of length-prefixed sub-blocks
//! (`[len:1][len bytes] ... [0x00]`). LZW codes are packed LSB-first across
//! the payload bytes and freely straddle sub-block boundaries, so the chain
//! has to be presented as one continuous bit stream. Bit positions within a
//! byte and byte positions within a sub-block advance on unrelated schedules,
//! which is why the reader refills a single buffered byte at a time instead
//! of slurping whole sub-blocks.

use crate::cursor::ByteCursor;
use crate::error::{GifError, Result};

/// Reads a data sub-block chain as an LSB-first bit stream.
///
/// Borrows the cursor for the duration of one image's code stream. [`finish`]
/// consumes through the chain's 0x00 terminator and leaves the cursor ready
/// for top-level parsing again.
///
/// [`finish`]: BlockBitReader::finish
#[derive(Debug)]
pub struct BlockBitReader<'c, 'a> {
    cursor: &'c mut ByteCursor<'a>,
    /// Unread payload bytes left in the current sub-block.
    bytes_in_block: u8,
    /// Byte the next bits are drawn from, low bit first.
    buffer: u8,
    /// Unread bits left in `buffer`.
    bits_left: u8,
}

impl<'c, 'a> BlockBitReader<'c, 'a> {
    /// Open a reader on a cursor positioned at the first sub-block's length
    /// byte.
    pub fn new(cursor: &'c mut ByteCursor<'a>) -> Result<Self> {
        let first_len = cursor.read_u8()?;
        Ok(Self {
            cursor,
            bytes_in_block: first_len,
            buffer: 0,
            bits_left: 0,
        })
    }

    /// Read `count` bits (1 to 12), LSB first: bit `i` of the result is the
    /// `i`-th bit consumed from the stream.
    pub fn read_bits(&mut self, count: u8) -> Result<u16> {
        debug_assert!((1..=12).contains(&count));
        let mut result = 0u16;
        for i in 0..count {
            result |= u16::from(self.read_bit()?) << i;
        }
        Ok(result)
    }

    fn read_bit(&mut self) -> Result<u8> {
        if self.bits_left == 0 {
            self.refill()?;
        }
        let bit = self.buffer & 0x01;
        self.buffer >>= 1;
        self.bits_left -= 1;
        Ok(bit)
    }

    fn refill(&mut self) -> Result<()> {
        if self.bytes_in_block == 0 {
            let len = self.cursor.read_u8()?;
            if len == 0 {
                return Err(GifError::malformed(
                    "sub-block terminator reached inside code stream",
                ));
            }
            self.bytes_in_block = len;
        }
        self.buffer = self.cursor.read_u8()?;
        self.bits_left = 8;
        self.bytes_in_block -= 1;
        Ok(())
    }

    /// Skip the rest of the current sub-block and consume the chain's
    /// terminator, which must be a zero-length block.
    ///
    /// Buffered partial bits are discarded; a stream that ends mid-code is
    /// not an error.
    pub fn finish(self) -> Result<()> {
        self.cursor.skip(self.bytes_in_block as usize)?;
        let terminator = self.cursor.read_u8()?;
        if terminator != 0 {
            return Err(GifError::malformed(format!(
                "expected data terminator, found {terminator:#04x}"
            )));
        }
        Ok(())
    }
}
