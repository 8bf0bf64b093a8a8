//! GIF decoding for the GIF87a and GIF89a formats.
//!
//! This crate decodes a complete in-memory GIF stream into fully rasterized,
//! canvas-sized RGBA frames together with the timing and disposal metadata
//! needed to composite an animation.
//!
//! ## Features
//!
//! - Variable-width LZW decompression with the full 4096-entry dictionary
//! - Animation support: per-frame delays, disposal methods, NETSCAPE loop count
//! - Transparency via the graphic control extension
//! - Local and global color tables
//! - Strict structural validation with typed errors, no panics on bad input
//!
//! Interlaced images and encoding are out of scope.
//!
//! ## Example
//!
//! ```no_run
//! use gifdec::GifDecoder;
//!
//! # let data: Vec<u8> = vec![];
//! let mut decoder = GifDecoder::new();
//! let frames = decoder.decode(&data)?;
//!
//! for frame in &frames {
//!     println!(
//!         "{}x{} frame, {} ms",
//!         frame.width,
//!         frame.height,
//!         frame.duration_ms()
//!     );
//! }
//! # Ok::<(), gifdec::GifError>(())
//! ```

#![warn(missing_docs)]

pub mod bitstream;
pub mod block;
pub mod cursor;
mod decoder;
mod error;
pub mod frame;
pub mod lzw;

pub use block::{
    ApplicationExtension, ColorTable, DisposalMethod, GraphicControlExtension, ImageDescriptor,
    LogicalScreenDescriptor, Version,
};
pub use decoder::GifDecoder;
pub use error::{GifError, Result};
pub use frame::{Canvas, Frame};
