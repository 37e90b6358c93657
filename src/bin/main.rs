//! RM67162 panel demo
//! ========================================
//! needs to be run in WSL2 terminal
//! source ~/export-esp.sh
//! cargo run --release --features board        (4-wire SPI)
//! cargo run --release --features qspi         (QSPI)
//! ========================================
//!
//! Brings the panel up, paints a few blocks and some text, then pulses
//! the brightness so a dead bus is easy to spot.

//% CHIPS: esp32s3
//% FEATURES: esp-hal/unstable

#![no_std]
#![no_main]

// Define the application description, which is placed in a special section of the binary.
// This is used by the bootloader to verify the application.
esp_bootloader_esp_idf::esp_app_desc!();

use esp_backtrace as _;

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
};
use esp_hal::{delay::Delay, main, Config};
use log::{info, warn};

use rm67162::{
    config::TRANSPORT,
    display::setup_display,
    wiring::{init_board_pins, BoardPins},
    Rotation,
};

extern crate alloc;

const BLACK: u16 = 0x0000;
const WHITE: u16 = 0xFFFF;
const ORANGE: u16 = 0xFC00;

#[main]
fn main() -> ! {
    esp_println::logger::init_logger(log::LevelFilter::Info);

    let peripherals = esp_hal::init(Config::default());

    // Heap for the fill scratch buffer (at most SEND_BUF_SIZE pixels, 32 KiB)
    esp_alloc::heap_allocator!(size: 96 * 1024);

    let BoardPins { mut led, display_pins } = init_board_pins(peripherals);

    info!("bringing up RM67162 over {:?}", TRANSPORT);
    let mut display = setup_display(display_pins);
    led.set_high();

    if let Err(e) = display.set_rotation(Rotation::Landscape) {
        warn!("rotation failed: {}", e);
    }
    let (w, h) = display.size();
    info!("panel ready, {}x{}", w, h);

    if let Err(e) = display.clear(Rgb565::BLACK) {
        warn!("clear failed: {}", e);
    }

    if let Err(e) = Rectangle::new(Point::new(8, 8), Size::new(64, 64))
        .into_styled(PrimitiveStyle::with_fill(Rgb565::BLUE))
        .draw(&mut display)
    {
        warn!("rectangle failed: {}", e);
    }
    if let Err(e) = display.fill(80, 8, 144, 72, ORANGE) {
        warn!("fill failed: {}", e);
    }

    match display.draw_text(8, 96, "RM67162 ready", WHITE, BLACK, 3) {
        Ok(end) => info!("text ends at x={}", end),
        Err(e) => warn!("text failed: {}", e),
    }
    if let Err(e) = display.draw_text(8, 140, "5x7 font, scale 1", WHITE, WHITE, 1) {
        warn!("text failed: {}", e);
    }

    let delay = Delay::new();
    let mut level: u8 = 0xD0;
    loop {
        delay.delay_millis(1000);
        level = if level == 0xD0 { 0x40 } else { 0xD0 };
        if let Err(e) = display.set_brightness(level) {
            warn!("brightness write failed: {}", e);
        }
        led.toggle();
    }
}
