//! Bitmap text on the panel, built from points (scale 1) or filled
//! blocks (scale > 1). No wrapping or clipping.

use embedded_hal::digital::OutputPin;
use log::trace;

use crate::bus::BusTransport;
use crate::font::{self, GLYPH_ROWS, GLYPH_WIDTH};
use crate::rm67162::{DriverError, Rm67162};

/// Horizontal advance per character at scale 1 (glyph + one blank column).
pub const CHAR_ADVANCE: u16 = GLYPH_WIDTH as u16 + 1;

impl<B, RST> Rm67162<B, RST>
where
    B: BusTransport,
    RST: OutputPin,
{
    /// Draw one character with its top-left corner at (`x`, `y`).
    ///
    /// Set bits paint `fg`. Clear bits paint `bg`, unless `bg == fg`, in
    /// which case they are skipped and the background is left alone.
    /// Bytes outside printable ASCII draw nothing.
    pub fn draw_char(
        &mut self,
        x: u16,
        y: u16,
        c: u8,
        fg: u16,
        bg: u16,
        scale: u8,
    ) -> Result<(), DriverError<B, RST>> {
        let Some(glyph) = font::glyph(c) else {
            trace!("rm67162: no glyph for {:#04x}", c);
            return Ok(());
        };
        if scale == 0 {
            return Ok(());
        }

        let s = scale as u16;
        for (i, &column) in glyph.iter().enumerate() {
            let i = i as u16;
            let mut line = column;
            for j in 0..GLYPH_ROWS as u16 {
                let color = if line & 0x1 != 0 {
                    Some(fg)
                } else if bg != fg {
                    Some(bg)
                } else {
                    None
                };
                line >>= 1;

                let Some(color) = color else { continue };
                if scale == 1 {
                    self.draw_point(x.saturating_add(i), y.saturating_add(j), color)?;
                } else {
                    self.fill(
                        x.saturating_add(i * s),
                        y.saturating_add(j * s),
                        x.saturating_add((i + 1) * s),
                        y.saturating_add((j + 1) * s),
                        color,
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Draw `text` left to right from (`x`, `y`), one cell per byte, so a
    /// multi-byte UTF-8 sequence takes one blank cell per byte. Returns the
    /// cursor x after the last cell.
    pub fn draw_text(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        fg: u16,
        bg: u16,
        scale: u8,
    ) -> Result<u16, DriverError<B, RST>> {
        let advance = CHAR_ADVANCE * scale as u16;
        let mut cursor = x;
        for c in text.bytes() {
            self.draw_char(cursor, y, c, fg, bg, scale)?;
            cursor = cursor.saturating_add(advance);
        }
        Ok(cursor)
    }
}
