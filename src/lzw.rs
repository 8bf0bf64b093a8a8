//! LZW decompression and rasterization of image data.
//!
//! GIF image data is a variable-width LZW code stream. The dictionary maps
//! codes to byte strings stored as linked suffixes: each entry records its
//! prefix entry, its trailing byte, and its full decoded length. Decoded
//! strings are painted straight onto the canvas through the active color
//! table, clipped to the frame's sub-rectangle.

use tracing::debug;

use crate::bitstream::BlockBitReader;
use crate::block::{GraphicControlExtension, ImageDescriptor};
use crate::cursor::ByteCursor;
use crate::error::{GifError, Result};
use crate::frame::Canvas;

/// Dictionary capacity; codes are at most 12 bits wide.
pub const MAX_CODES: usize = 4096;

const MAX_CODE_LEN: u8 = 12;

/// The LZW code dictionary.
///
/// Three parallel fixed-capacity arrays keep the dictionary a single
/// allocation and make the prefix walks cache-friendly. Atomic entries
/// `0 .. (1 << min_code_size)` decode to their own index; the two codes after
/// them are reserved for clear and end-of-information and never dereferenced.
#[derive(Debug)]
pub struct CodeTable {
    /// Prefix entry index, or -1 for atomic entries.
    prefix: [i16; MAX_CODES],
    /// Trailing byte of the entry's decoded string.
    suffix: [u8; MAX_CODES],
    /// Full decoded string length.
    length: [u16; MAX_CODES],
    min_code_size: u8,
    code_len: u8,
    clear_code: u16,
    eoi_code: u16,
    next_code: u16,
    max_code: u16,
}

impl CodeTable {
    /// Build a dictionary for the given minimum code size, populating the
    /// atomic entries and resetting the scalar state.
    pub fn new(min_code_size: u8) -> Self {
        let mut table = Self {
            prefix: [0; MAX_CODES],
            suffix: [0; MAX_CODES],
            length: [0; MAX_CODES],
            min_code_size,
            code_len: 0,
            clear_code: 0,
            eoi_code: 0,
            next_code: 0,
            max_code: 0,
        };
        for i in 0..(1usize << min_code_size) {
            table.prefix[i] = -1;
            table.suffix[i] = i as u8;
            table.length[i] = 1;
        }
        table.reset();
        table
    }

    /// Drop every learned entry and restore the initial code width. Atomic
    /// entry contents are left untouched.
    pub fn reset(&mut self) {
        self.code_len = self.min_code_size + 1;
        self.clear_code = 1 << self.min_code_size;
        self.eoi_code = self.clear_code + 1;
        self.next_code = self.eoi_code + 1;
        self.max_code = (1 << self.code_len) - 1;
    }

    /// Current code width in bits.
    pub fn code_len(&self) -> u8 {
        self.code_len
    }

    /// The reserved dictionary-reset code.
    pub fn clear_code(&self) -> u16 {
        self.clear_code
    }

    /// The reserved end-of-information code.
    pub fn eoi_code(&self) -> u16 {
        self.eoi_code
    }

    /// The next free entry index.
    pub fn next_code(&self) -> u16 {
        self.next_code
    }

    /// Append the entry `prefix + byte`, returning the index it landed at.
    ///
    /// The code width grows one entry early: when the next free index has
    /// reached the widest code expressible at the current width, the
    /// insertion about to happen forces wider codes, so the width is bumped
    /// before storing. Once all 4096 slots are used the dictionary freezes
    /// and `add` becomes a no-op returning `None`.
    pub fn add(&mut self, prefix: u16, byte: u8) -> Option<u16> {
        if self.next_code == self.max_code && self.code_len < MAX_CODE_LEN {
            self.code_len += 1;
            self.max_code = (1 << self.code_len) - 1;
        }
        if self.next_code as usize == MAX_CODES {
            return None;
        }
        let slot = self.next_code as usize;
        self.prefix[slot] = prefix as i16;
        self.suffix[slot] = byte;
        self.length[slot] = self.length[prefix as usize] + 1;
        self.next_code += 1;
        Some(slot as u16)
    }

    /// First byte of the entry's decoded string.
    pub fn first_byte(&self, code: u16) -> u8 {
        let mut cur = code as usize;
        while self.prefix[cur] >= 0 {
            cur = self.prefix[cur] as usize;
        }
        self.suffix[cur]
    }

    /// Decoded string length of an entry.
    pub fn string_len(&self, code: u16) -> u16 {
        self.length[code as usize]
    }

    /// Materialize the entry's decoded string, prefix-first, into `buf`.
    ///
    /// The dictionary stores strings as linked suffixes, so the walk fills
    /// `buf` right to left from the string's final length.
    fn expand<'b>(&self, code: u16, buf: &'b mut [u8; MAX_CODES]) -> &'b [u8] {
        let len = self.length[code as usize] as usize;
        let mut i = len;
        let mut cur = code as i16;
        while cur >= 0 {
            i -= 1;
            buf[i] = self.suffix[cur as usize];
            cur = self.prefix[cur as usize];
        }
        debug_assert_eq!(i, 0);
        &buf[..len]
    }
}

/// Paints decoded pixel-index runs into the canvas.
///
/// The pen scans the frame rectangle row-major. Transparent indices advance
/// the pen without drawing; indices past the color table and pixels clipped
/// by the canvas edge do the same. Runs that walk past the bottom of the
/// rectangle are dropped silently.
struct Painter<'a> {
    canvas: &'a mut Canvas,
    palette: &'a [[u8; 3]],
    transparent: Option<u8>,
    left: u32,
    right: u32,
    bottom: u32,
    px: u32,
    py: u32,
}

impl<'a> Painter<'a> {
    fn new(
        canvas: &'a mut Canvas,
        descriptor: &ImageDescriptor,
        palette: &'a [[u8; 3]],
        control: Option<&GraphicControlExtension>,
    ) -> Self {
        let left = u32::from(descriptor.left);
        let top = u32::from(descriptor.top);
        Self {
            canvas,
            palette,
            transparent: control
                .filter(|gce| gce.has_transparency)
                .map(|gce| gce.transparent_index),
            left,
            right: left + u32::from(descriptor.width),
            bottom: top + u32::from(descriptor.height),
            px: left,
            py: top,
        }
    }

    fn paint(&mut self, indices: &[u8]) {
        for &index in indices {
            if self.py >= self.bottom {
                return;
            }
            if self.transparent != Some(index) {
                if let Some(&color) = self.palette.get(index as usize) {
                    self.canvas.put(self.px, self.py, color);
                }
            }
            self.px += 1;
            if self.px >= self.right {
                self.px = self.left;
                self.py += 1;
            }
        }
    }
}

/// Decode one image's LZW data and paint it onto the canvas.
///
/// The cursor must sit at the LZW minimum-code-size byte; on success it is
/// left just past the data sub-block terminator.
pub fn decode_image(
    cursor: &mut ByteCursor<'_>,
    descriptor: &ImageDescriptor,
    palette: &[[u8; 3]],
    control: Option<&GraphicControlExtension>,
    canvas: &mut Canvas,
) -> Result<()> {
    let min_code_size = cursor.read_u8()?;
    if !(2..=8).contains(&min_code_size) {
        return Err(GifError::malformed(format!(
            "LZW minimum code size {min_code_size} outside [2, 8]"
        )));
    }

    let mut table = CodeTable::new(min_code_size);
    let mut painter = Painter::new(canvas, descriptor, palette, control);
    let mut buf = [0u8; MAX_CODES];
    let mut reader = BlockBitReader::new(cursor)?;

    let first = reader.read_bits(table.code_len())?;
    if first != table.clear_code() {
        return Err(GifError::malformed(
            "code stream does not open with a clear code",
        ));
    }

    let mut old = read_start_code(&mut reader, &table)?;
    painter.paint(&[old as u8]);

    loop {
        let code = reader.read_bits(table.code_len())?;

        if code < table.next_code() {
            if code == table.eoi_code() {
                reader.finish()?;
                break;
            }
            if code == table.clear_code() {
                table.reset();
                old = read_start_code(&mut reader, &table)?;
                painter.paint(&[old as u8]);
                continue;
            }
            let string = table.expand(code, &mut buf);
            let head = string[0];
            painter.paint(string);
            table.add(old, head);
            old = code;
        } else if code == table.next_code() {
            // KwKwK: the code names the entry about to be created, which is
            // the previous string followed by its own first byte.
            let head = table.first_byte(old);
            let new_code = table
                .add(old, head)
                .ok_or_else(|| GifError::malformed("LZW code beyond dictionary capacity"))?;
            let string = table.expand(new_code, &mut buf);
            painter.paint(string);
            old = code;
        } else {
            return Err(GifError::malformed(format!(
                "LZW code {code} above next dictionary index {}",
                table.next_code()
            )));
        }
    }

    debug!(
        left = descriptor.left,
        top = descriptor.top,
        width = descriptor.width,
        height = descriptor.height,
        "decoded image data"
    );
    Ok(())
}

/// Read the code that must follow a clear code: the start index, which has
/// to be atomic.
fn read_start_code(reader: &mut BlockBitReader<'_, '_>, table: &CodeTable) -> Result<u16> {
    let code = reader.read_bits(table.code_len())?;
    if code >= table.clear_code() {
        return Err(GifError::malformed(format!(
            "start index {code} is not an atomic code"
        )));
    }
    Ok(code)
}
