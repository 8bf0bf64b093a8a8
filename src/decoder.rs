//! Top-level GIF decoder.

use tracing::debug;

use crate::block::{
    self, ColorTable, DisposalMethod, GraphicControlExtension, LogicalScreenDescriptor, Version,
};
use crate::cursor::ByteCursor;
use crate::error::{GifError, Result};
use crate::frame::{Canvas, Frame};
use crate::lzw;

/// Decodes a complete in-memory GIF stream into rasterized RGBA frames.
///
/// The decoder walks the block structure, keeps one persistent canvas that
/// frames accumulate on, and snapshots the canvas after each image so every
/// returned [`Frame`] is a fully composited picture.
pub struct GifDecoder {
    /// Stream version from the header.
    version: Option<Version>,
    /// Logical screen descriptor.
    screen: Option<LogicalScreenDescriptor>,
    /// Global color table.
    global_palette: Option<ColorTable>,
    /// Decoded frames.
    frames: Vec<Frame>,
    /// NETSCAPE loop count (0 = infinite).
    loop_count: u16,
}

impl GifDecoder {
    /// Create a new GIF decoder.
    pub fn new() -> Self {
        Self {
            version: None,
            screen: None,
            global_palette: None,
            frames: Vec::new(),
            loop_count: 0,
        }
    }

    /// Decode every frame of a GIF stream.
    pub fn decode(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.parse(data)?;
        Ok(std::mem::take(&mut self.frames))
    }

    /// Stream version, available after a decode.
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Logical screen descriptor, available after a decode.
    pub fn screen_descriptor(&self) -> Option<&LogicalScreenDescriptor> {
        self.screen.as_ref()
    }

    /// Global color table, when the stream carries one.
    pub fn global_palette(&self) -> Option<&[[u8; 3]]> {
        self.global_palette.as_deref()
    }

    /// Animation loop count from a NETSCAPE extension (0 = loop forever).
    pub fn loop_count(&self) -> u16 {
        self.loop_count
    }

    fn parse(&mut self, data: &[u8]) -> Result<()> {
        self.version = None;
        self.screen = None;
        self.global_palette = None;
        self.frames.clear();
        self.loop_count = 0;

        let mut cursor = ByteCursor::new(data);

        let version = block::parse_header(&mut cursor)?;
        let screen = block::parse_screen_descriptor(&mut cursor)?;
        let global_palette = if screen.has_global_color_table {
            Some(block::parse_color_table(
                &mut cursor,
                screen.global_table_len(),
            )?)
        } else {
            None
        };

        debug!(
            version = ?version,
            width = screen.width,
            height = screen.height,
            "parsed logical screen"
        );

        self.version = Some(version);
        self.screen = Some(screen.clone());
        self.global_palette = global_palette.clone();

        let mut canvas = Canvas::new(u32::from(screen.width), u32::from(screen.height));
        let mut pending_gce: Option<GraphicControlExtension> = None;
        // Disposal of the most recent frame, applied before the next one.
        let mut previous: Option<(DisposalMethod, [u16; 4])> = None;
        let mut saved_canvas: Option<Vec<u8>> = None;

        while !cursor.is_at_end() {
            match cursor.peek()? {
                block::EXTENSION_INTRODUCER => {
                    cursor.read_u8()?;
                    match cursor.peek()? {
                        block::GRAPHIC_CONTROL_LABEL => {
                            pending_gce = Some(block::parse_graphic_control(&mut cursor)?);
                        }
                        block::APPLICATION_LABEL => {
                            let app = block::parse_application_extension(&mut cursor)?;
                            if let Some(count) = app.loop_count {
                                self.loop_count = count;
                            }
                        }
                        block::COMMENT_LABEL => block::skip_comment_extension(&mut cursor)?,
                        other => {
                            return Err(GifError::malformed(format!(
                                "unknown extension label {other:#04x}"
                            )))
                        }
                    }
                }
                block::IMAGE_SEPARATOR => {
                    let descriptor = block::parse_image_descriptor(&mut cursor)?;
                    let local_palette = if descriptor.has_local_color_table {
                        Some(block::parse_color_table(
                            &mut cursor,
                            descriptor.local_table_len(),
                        )?)
                    } else {
                        None
                    };
                    if descriptor.interlaced {
                        return Err(GifError::unsupported("interlaced image"));
                    }

                    debug!(
                        left = descriptor.left,
                        top = descriptor.top,
                        width = descriptor.width,
                        height = descriptor.height,
                        "decoding frame"
                    );

                    match previous.take() {
                        Some((DisposalMethod::RestoreBackground, [left, top, width, height])) => {
                            canvas.fill_rect(
                                u32::from(left),
                                u32::from(top),
                                u32::from(width),
                                u32::from(height),
                                background_color(&screen, global_palette.as_deref()),
                            );
                        }
                        Some((DisposalMethod::RestorePrevious, _)) => {
                            if let Some(saved) = saved_canvas.take() {
                                canvas.restore(&saved);
                            }
                        }
                        _ => {}
                    }

                    let gce = pending_gce.take();
                    let disposal = gce.as_ref().map(|g| g.disposal).unwrap_or_default();
                    if disposal == DisposalMethod::RestorePrevious {
                        saved_canvas = Some(canvas.snapshot());
                    }

                    let palette = local_palette
                        .as_deref()
                        .or(global_palette.as_deref())
                        .ok_or_else(|| GifError::malformed("no color table for image"))?;

                    lzw::decode_image(&mut cursor, &descriptor, palette, gce.as_ref(), &mut canvas)?;

                    self.frames.push(Frame {
                        data: canvas.snapshot(),
                        width: canvas.width(),
                        height: canvas.height(),
                        left: descriptor.left,
                        top: descriptor.top,
                        frame_width: descriptor.width,
                        frame_height: descriptor.height,
                        delay: gce.as_ref().map(|g| g.delay).unwrap_or(0),
                        disposal,
                    });
                    previous = Some((
                        disposal,
                        [
                            descriptor.left,
                            descriptor.top,
                            descriptor.width,
                            descriptor.height,
                        ],
                    ));
                }
                block::TRAILER => break,
                other => {
                    return Err(GifError::malformed(format!(
                        "unknown block label {other:#04x}"
                    )))
                }
            }
        }

        debug!(frames = self.frames.len(), "decode complete");
        Ok(())
    }
}

impl Default for GifDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// RGBA fill used when a frame is disposed to the background: the global
/// background color when the table has it, fully transparent otherwise.
fn background_color(
    screen: &LogicalScreenDescriptor,
    palette: Option<&[[u8; 3]]>,
) -> [u8; 4] {
    match palette.and_then(|p| p.get(screen.background_color_index as usize)) {
        Some(&[r, g, b]) => [r, g, b, 0xFF],
        None => [0, 0, 0, 0],
    }
}
