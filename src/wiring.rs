// Board pin mapping for the LilyGo T-Display-S3 AMOLED (RM67162).
//! The following wiring is assumed (see `config` for the table):
//! - CS  => GPIO6 (driven by hand, the SPI peripheral does not own it)
//! - SCK => GPIO47
//! - D0/MOSI => GPIO18
//! - D1 => GPIO7 (D/C line in 4-wire SPI mode)
//! - D2 => GPIO48, D3 => GPIO5 (QSPI only)
//! - RST => GPIO17
//! - LED => GPIO38

use esp_backtrace as _;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::peripherals::{Peripherals, DMA_CH0, GPIO18, GPIO47, GPIO48, GPIO5, GPIO7, SPI2};

/// Everything the panel needs, handed to `display::setup_display`.
pub struct DisplayPins<'a> {
    pub spi2: SPI2<'a>,
    pub cs: Output<'a>,
    pub sck: GPIO47<'a>,
    pub d0: GPIO18<'a>,
    pub d1: GPIO7<'a>,
    pub d2: GPIO48<'a>,
    pub d3: GPIO5<'a>,
    pub rst: Output<'a>,
    pub dma_ch0: DMA_CH0<'a>,
}

pub struct BoardPins<'a> {
    pub led: Output<'a>,
    pub display_pins: DisplayPins<'a>,
}

pub fn init_board_pins<'a>(p: Peripherals) -> BoardPins<'a> {
    // CS idles high, reset held high until the driver pulses it
    let cs = Output::new(p.GPIO6, Level::High, OutputConfig::default());
    let rst = Output::new(p.GPIO17, Level::High, OutputConfig::default());
    let led = Output::new(p.GPIO38, Level::Low, OutputConfig::default());

    BoardPins {
        led,
        display_pins: DisplayPins {
            spi2: p.SPI2,
            cs,
            sck: p.GPIO47,
            d0: p.GPIO18,
            d1: p.GPIO7,
            d2: p.GPIO48,
            d3: p.GPIO5,
            rst,
            dma_ch0: p.DMA_CH0,
        },
    }
}
