// RM67162 AMOLED panel driver (240x536, RGB565).
// Works over any `BusTransport` (4-wire SPI or QSPI) and plugs into
// embedded-graphics as a `DrawTarget<Rgb565>`.
//
// Bring-up: reset pulse, then the transport's init table.
// Drawing:  CASET + RASET + RAMWR arm a window, then pixels stream in
//           row-major until the window is full.
// Geometry: windows are inclusive on both ends; `fill` takes an exclusive
//           end corner like the rest of the fill helpers on this panel.

use core::fmt;
use core::ops::Deref;

use alloc::vec::Vec;

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::Rectangle,
};
use embedded_hal::{delay::DelayNs, digital::OutputPin};
use log::{debug, trace, warn};

use crate::bus::BusTransport;
use crate::commands::{
    InvalidRotation, Rotation, CASET, DISPOFF, DISPON, HBM_CTRL, INVOFF, INVON, MADCTL, RAMWR,
    RASET, SLPIN, SLPOUT, WRCE, WRCE_HIGH, WRCE_LOW, WRDISBV,
};
use crate::config::PanelConfig;

/// Driver errors: transport and reset-pin failures plus rejected calls.
#[derive(Debug)]
pub enum PanelError<BusE, PinE> {
    Bus(BusE),
    Pin(PinE),
    /// Window corners out of order, or past the 16-bit address range.
    InvalidWindow { x1: u16, y1: u16, x2: u16, y2: u16 },
    /// Pixel buffer does not match the window area.
    LengthMismatch { expected: usize, actual: usize },
    /// `fill` scratch buffer over the configured ceiling or allocation failed.
    ScratchExhausted { requested: usize, limit: usize },
    InvalidRotation(u8),
}

impl<BusE: fmt::Debug, PinE: fmt::Debug> fmt::Display for PanelError<BusE, PinE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelError::Bus(e) => write!(f, "bus transaction failed: {:?}", e),
            PanelError::Pin(e) => write!(f, "reset line failed: {:?}", e),
            PanelError::InvalidWindow { x1, y1, x2, y2 } => {
                write!(f, "invalid window ({}, {})-({}, {})", x1, y1, x2, y2)
            }
            PanelError::LengthMismatch { expected, actual } => {
                write!(f, "window takes {} pixels, got {}", expected, actual)
            }
            PanelError::ScratchExhausted { requested, limit } => {
                write!(f, "scratch of {} pixels refused (limit {})", requested, limit)
            }
            PanelError::InvalidRotation(code) => write!(f, "rotation code {} out of range", code),
        }
    }
}

impl<BusE, PinE> From<InvalidRotation> for PanelError<BusE, PinE> {
    fn from(e: InvalidRotation) -> Self {
        Self::InvalidRotation(e.0)
    }
}

/// Error type of a concrete driver.
pub type DriverError<B, RST> =
    PanelError<<B as BusTransport>::Error, <RST as embedded_hal::digital::ErrorType>::Error>;

// Solid-colour buffer for `fill`; lives for one transfer only.
struct Scratch(Vec<u16>);

impl Scratch {
    fn filled(len: usize, color: u16) -> Option<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len).ok()?;
        buf.resize(len, color);
        #[cfg(test)]
        crate::mock::note_scratch_alloc();
        Some(Self(buf))
    }
}

impl Deref for Scratch {
    type Target = [u16];

    fn deref(&self) -> &[u16] {
        &self.0
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        #[cfg(test)]
        crate::mock::note_scratch_free();
    }
}

/// RM67162 panel. Owns its transport; one instance per panel.
pub struct Rm67162<B, RST> {
    bus: B,
    rst: Option<RST>,
    config: PanelConfig,
    rotation: Rotation,
}

impl<B, RST> Rm67162<B, RST>
where
    B: BusTransport,
    RST: OutputPin,
{
    /// Create + init the panel. Call once at startup.
    ///
    /// * `bus` - a configured transport ([`crate::bus::SerialBus`] or [`crate::bus::QuadBus`])
    /// * `rst` - optional reset pin (recommended to wire)
    /// * `delay` - any `DelayNs` impl, used in milliseconds
    /// * `config` - resolution and timing, see [`PanelConfig::default`]
    pub fn new(
        mut bus: B,
        rst: Option<RST>,
        delay: &mut impl DelayNs,
        config: PanelConfig,
    ) -> Result<Self, DriverError<B, RST>> {
        bus.apply_config(&config);

        let mut this = Self {
            bus,
            rst,
            config,
            rotation: Rotation::Portrait,
        };

        this.hard_reset(delay)?;
        this.run_init_table(delay)?;

        debug!("rm67162: ready, {}x{}", this.config.width, this.config.height);
        Ok(this)
    }

    fn hard_reset(&mut self, delay: &mut impl DelayNs) -> Result<(), DriverError<B, RST>> {
        if let Some(r) = self.rst.as_mut() {
            r.set_low().map_err(PanelError::Pin)?;
            delay.delay_ms(self.config.reset_low_ms);
            r.set_high().map_err(PanelError::Pin)?;
            delay.delay_ms(self.config.reset_release_ms);
        }
        Ok(())
    }

    fn run_init_table(&mut self, delay: &mut impl DelayNs) -> Result<(), DriverError<B, RST>> {
        let table = self.bus.init_table();
        debug!("rm67162: replaying {} init commands", table.len());
        for entry in table {
            self.send_command(entry.opcode, entry.data())?;
            if entry.needs_settle() {
                delay.delay_ms(self.config.settle_ms);
            }
        }
        Ok(())
    }

    // Panel width in pixels (after rotation).
    #[inline]
    pub fn width(&self) -> u16 {
        if self.rotation.swaps_axes() { self.config.height } else { self.config.width }
    }

    // Panel height in pixels (after rotation).
    #[inline]
    pub fn height(&self) -> u16 {
        if self.rotation.swaps_axes() { self.config.width } else { self.config.height }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width(), self.height())
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Give back the transport and reset pin.
    pub fn release(self) -> (B, Option<RST>) {
        (self.bus, self.rst)
    }

    /// Send one command with its payload (may be empty).
    pub fn send_command(&mut self, opcode: u8, payload: &[u8]) -> Result<(), DriverError<B, RST>> {
        trace!("rm67162: cmd {:#04x} {:02x?}", opcode, payload);
        self.bus.send_command(opcode, payload).map_err(PanelError::Bus)
    }

    // ---- Addressing & transfer ----

    /// Arm the controller's write window, corners inclusive.
    pub fn set_window(
        &mut self,
        x1: u16,
        y1: u16,
        x2: u16,
        y2: u16,
    ) -> Result<(), DriverError<B, RST>> {
        if x1 > x2 || y1 > y2 {
            warn!("rm67162: rejected window ({}, {})-({}, {})", x1, y1, x2, y2);
            return Err(PanelError::InvalidWindow { x1, y1, x2, y2 });
        }

        let [x1h, x1l] = x1.to_be_bytes();
        let [x2h, x2l] = x2.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();
        let [y2h, y2l] = y2.to_be_bytes();

        self.send_command(CASET, &[x1h, x1l, x2h, x2l])?;
        self.send_command(RASET, &[y1h, y1l, y2h, y2l])?;
        self.send_command(RAMWR, &[])
    }

    /// Write a `width` x `height` block at (`x`, `y`). `data` is row-major
    /// and must hold exactly `width * height` pixels.
    pub fn push_colors(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        data: &[u16],
    ) -> Result<(), DriverError<B, RST>> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            warn!("rm67162: {}x{} block given {} pixels", width, height, data.len());
            return Err(PanelError::LengthMismatch { expected, actual: data.len() });
        }
        if expected == 0 {
            return Ok(());
        }

        let last = |start: u16, len: u16| u16::try_from(start as u32 + len as u32 - 1).ok();
        let (Some(x2), Some(y2)) = (last(x, width), last(y, height)) else {
            return Err(PanelError::InvalidWindow {
                x1: x,
                y1: y,
                x2: x.saturating_add(width - 1),
                y2: y.saturating_add(height - 1),
            });
        };

        self.set_window(x, y, x2, y2)?;
        self.push_colors_continue(data)
    }

    /// Stream pixels into whatever window is already armed.
    pub fn push_colors_continue(&mut self, data: &[u16]) -> Result<(), DriverError<B, RST>> {
        if data.is_empty() {
            return Ok(());
        }
        self.bus.stream_pixels(data).map_err(PanelError::Bus)
    }

    pub fn draw_point(&mut self, x: u16, y: u16, color: u16) -> Result<(), DriverError<B, RST>> {
        self.set_window(x, y, x.saturating_add(1), y.saturating_add(1))?;
        self.push_colors_continue(&[color])
    }

    /// Solid fill of (`x1`, `y1`) up to, not including, (`x2`, `y2`).
    pub fn fill(
        &mut self,
        x1: u16,
        y1: u16,
        x2: u16,
        y2: u16,
        color: u16,
    ) -> Result<(), DriverError<B, RST>> {
        if x2 < x1 || y2 < y1 {
            return Err(PanelError::InvalidWindow { x1, y1, x2, y2 });
        }
        let (w, h) = (x2 - x1, y2 - y1);
        if w == 0 || h == 0 {
            return Ok(());
        }

        let scratch = self.scratch(w as usize * h as usize, color)?;
        self.push_colors(x1, y1, w, h, &scratch)
    }

    // Same region rules as `fill`, but sends the area as row bands that fit
    // under `max_fill_pixels`, reusing one scratch buffer for every band.
    fn fill_banded(
        &mut self,
        x1: u16,
        y1: u16,
        x2: u16,
        y2: u16,
        color: u16,
    ) -> Result<(), DriverError<B, RST>> {
        if x2 < x1 || y2 < y1 {
            return Err(PanelError::InvalidWindow { x1, y1, x2, y2 });
        }
        let (w, h) = (x2 - x1, y2 - y1);
        if w == 0 || h == 0 {
            return Ok(());
        }

        let rows = (self.config.max_fill_pixels / w as usize).clamp(1, h as usize) as u16;
        let scratch = self.scratch(w as usize * rows as usize, color)?;

        let mut y = y1;
        while y < y2 {
            let band = rows.min(y2 - y);
            self.push_colors(x1, y, w, band, &scratch[..w as usize * band as usize])?;
            y += band;
        }
        Ok(())
    }

    fn scratch(&self, requested: usize, color: u16) -> Result<Scratch, DriverError<B, RST>> {
        let limit = self.config.max_fill_pixels;
        let scratch = if requested <= limit { Scratch::filled(requested, color) } else { None };
        let Some(scratch) = scratch else {
            warn!("rm67162: fill of {} pixels refused", requested);
            return Err(PanelError::ScratchExhausted { requested, limit });
        };
        Ok(scratch)
    }

    pub fn set_rotation(&mut self, rotation: Rotation) -> Result<(), DriverError<B, RST>> {
        self.send_command(MADCTL, &[rotation.madctl()])?;
        self.rotation = rotation;
        Ok(())
    }

    /// Same as [`Self::set_rotation`] from a raw code 0..=3.
    pub fn set_rotation_code(&mut self, code: u8) -> Result<(), DriverError<B, RST>> {
        let rotation = Rotation::try_from(code)?;
        self.set_rotation(rotation)
    }

    // ---- Power and appearance ----

    pub fn sleep(&mut self) -> Result<(), DriverError<B, RST>> {
        self.send_command(SLPIN, &[])
    }

    pub fn sleep_out(&mut self, delay: &mut impl DelayNs) -> Result<(), DriverError<B, RST>> {
        self.send_command(SLPOUT, &[])?;
        delay.delay_ms(self.config.settle_ms);
        Ok(())
    }

    pub fn display_on(&mut self) -> Result<(), DriverError<B, RST>> {
        self.send_command(DISPON, &[])
    }

    pub fn display_off(&mut self) -> Result<(), DriverError<B, RST>> {
        self.send_command(DISPOFF, &[])
    }

    pub fn invert_on(&mut self) -> Result<(), DriverError<B, RST>> {
        self.send_command(INVON, &[])
    }

    pub fn invert_off(&mut self) -> Result<(), DriverError<B, RST>> {
        self.send_command(INVOFF, &[])
    }

    // adjustable brightness (0-255)
    pub fn set_brightness(&mut self, level: u8) -> Result<(), DriverError<B, RST>> {
        self.send_command(WRDISBV, &[level])
    }

    pub fn set_colour_enhance(&mut self, value: u8) -> Result<(), DriverError<B, RST>> {
        self.send_command(WRCE, &[value])
    }

    pub fn set_colour_enhance_low(&mut self, value: u8) -> Result<(), DriverError<B, RST>> {
        self.send_command(WRCE_LOW, &[value])
    }

    pub fn set_colour_enhance_high(&mut self, value: u8) -> Result<(), DriverError<B, RST>> {
        self.send_command(WRCE_HIGH, &[value])
    }

    /// High brightness mode register; 0 turns it off.
    pub fn set_high_brightness_mode(&mut self, value: u8) -> Result<(), DriverError<B, RST>> {
        self.send_command(HBM_CTRL, &[value])
    }
}

// -------------------- embedded-graphics integration --------------------
impl<B, RST> OriginDimensions for Rm67162<B, RST>
where
    B: BusTransport,
    RST: OutputPin,
{
    fn size(&self) -> Size {
        Size::new(self.width() as u32, self.height() as u32)
    }
}

impl<B, RST> DrawTarget for Rm67162<B, RST>
where
    B: BusTransport,
    RST: OutputPin,
{
    type Color = Rgb565;
    type Error = DriverError<B, RST>;

    // Per-pixel path, one window per pixel. Slow; fine for sparse drawing.
    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Rgb565>>,
    {
        let (w, h) = (self.width() as i32, self.height() as i32);
        for Pixel(p, c) in pixels {
            if p.x < 0 || p.y < 0 || p.x >= w || p.y >= h {
                continue;
            }
            self.draw_point(p.x as u16, p.y as u16, c.into_storage())?;
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(br) = area.bottom_right() else {
            return Ok(());
        };
        self.fill_banded(
            area.top_left.x as u16,
            area.top_left.y as u16,
            (br.x + 1) as u16,
            (br.y + 1) as u16,
            color.into_storage(),
        )
    }

    fn clear(&mut self, color: Rgb565) -> Result<(), Self::Error> {
        let (w, h) = (self.width(), self.height());
        self.fill_banded(0, 0, w, h, color.into_storage())
    }
}
