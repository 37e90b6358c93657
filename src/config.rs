//! Panel and board configuration.
//!
//! Board wiring for the LilyGo T-Display-S3 AMOLED (RM67162, 240x536):
//!
//! | Signal | SPI    | QSPI   |
//! |--------|--------|--------|
//! | CS     | GPIO6  | GPIO6  |
//! | SCK    | GPIO47 | GPIO47 |
//! | MOSI/D0| GPIO18 | GPIO18 |
//! | DC/D1  | GPIO7  | GPIO7  |
//! | D2     | -      | GPIO48 |
//! | D3     | -      | GPIO5  |
//! | RST    | GPIO17 | GPIO17 |

/// Native panel resolution (portrait).
pub const TFT_WIDTH: u16 = 240;
pub const TFT_HEIGHT: u16 = 536;

pub const SPI_FREQUENCY_HZ: u32 = 75_000_000;

/// Pixels per QSPI transaction; also sizes the DMA buffers and the
/// default fill scratch.
pub const SEND_BUF_SIZE: usize = 0x4000;

// Empirical power-up timing (ms), not from a datasheet.
pub const RESET_LOW_MS: u32 = 300;
pub const RESET_RELEASE_MS: u32 = 200;
/// Wait after SLPOUT / DISPON before the panel accepts more commands.
pub const SETTLE_MS: u32 = 120;

/// Which framing the firmware drives the panel with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    Serial,
    Quad,
}

/// Transport picked at build time by the `qspi` feature.
pub const TRANSPORT: Transport = if cfg!(feature = "qspi") {
    Transport::Quad
} else {
    Transport::Serial
};

/// Runtime knobs for [`crate::rm67162::Rm67162`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelConfig {
    pub width: u16,
    pub height: u16,
    pub reset_low_ms: u32,
    pub reset_release_ms: u32,
    pub settle_ms: u32,
    /// Largest QSPI pixel transaction.
    pub max_chunk_pixels: usize,
    /// Largest scratch buffer `fill` may allocate. `clear` and the
    /// embedded-graphics fills split into row bands that fit.
    pub max_fill_pixels: usize,
}

impl PanelConfig {
    pub const fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            reset_low_ms: RESET_LOW_MS,
            reset_release_ms: RESET_RELEASE_MS,
            settle_ms: SETTLE_MS,
            max_chunk_pixels: SEND_BUF_SIZE,
            max_fill_pixels: SEND_BUF_SIZE,
        }
    }

    pub const fn with_max_chunk_pixels(mut self, pixels: usize) -> Self {
        self.max_chunk_pixels = pixels;
        self
    }

    pub const fn with_max_fill_pixels(mut self, pixels: usize) -> Self {
        self.max_fill_pixels = pixels;
        self
    }

    pub const fn with_settle_ms(mut self, ms: u32) -> Self {
        self.settle_ms = ms;
        self
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self::new(TFT_WIDTH, TFT_HEIGHT)
    }
}
