//! Display setup for the board.
//
// - `setup_display` builds the bus picked by the `qspi` feature and runs
//   the panel bring-up.
// - 4-wire path: esp-hal `Spi` + `ExclusiveDevice`, GPIO7 as D/C.
// - QSPI path: esp-hal `SpiDmaBus` half-duplex writes, CS by hand.
// - A failed bus setup is fatal; there is no degraded display.

use esp_backtrace as _;

use esp_hal::{
    delay::Delay,
    gpio::Output,
    spi::master::{Config, Spi},
    spi::Mode,
    time::Rate,
    Blocking,
};

use cfg_if::cfg_if;

use crate::config::{PanelConfig, SPI_FREQUENCY_HZ};
use crate::rm67162::Rm67162;
use crate::wiring::DisplayPins;

fn bus_config() -> Config {
    Config::default()
        .with_frequency(Rate::from_hz(SPI_FREQUENCY_HZ))
        .with_mode(Mode::_0)
}

cfg_if! {
    if #[cfg(feature = "qspi")] {
        mod backend {
            use super::*;
            use esp_hal::dma::{DmaRxBuf, DmaTxBuf};
            use esp_hal::dma_buffers;
            use esp_hal::spi::master::{Address, Command, DataMode, SpiDmaBus};

            use crate::bus::{DataLines, QuadBus, QuadWrite};

            // Raw QSPI container: manual CS + bus so we frame half-duplex writes ourselves.
            pub struct RawQspiDev<'a> {
                pub bus: SpiDmaBus<'a, Blocking>,
                pub cs: Output<'a>,
            }

            impl QuadWrite for RawQspiDev<'_> {
                type Error = esp_hal::spi::Error;

                fn write_quad(
                    &mut self,
                    instruction: u8,
                    address: u32,
                    lines: DataLines,
                    data: &[u8],
                ) -> Result<(), Self::Error> {
                    let data_mode = match lines {
                        DataLines::Single => DataMode::Single,
                        DataLines::Quad => DataMode::Quad,
                    };
                    self.cs.set_low();
                    let res = self.bus.half_duplex_write(
                        data_mode,
                        Command::_8Bit(instruction as u16, DataMode::Single),
                        Address::_24Bit(address, DataMode::Single),
                        0,
                        data,
                    );
                    self.cs.set_high();
                    res
                }
            }

            pub type DisplayType<'a> = Rm67162<QuadBus<RawQspiDev<'a>>, Output<'a>>;

            pub fn setup_display<'a>(display_pins: DisplayPins<'a>) -> DisplayType<'a> {
                let DisplayPins { spi2, cs, sck, d0, d1, d2, d3, rst, dma_ch0 } = display_pins;

                let spi = Spi::new(spi2, bus_config())
                    .expect("SPI2 rejected bus config")
                    .with_sck(sck)
                    .with_sio0(d0)
                    .with_sio1(d1)
                    .with_sio2(d2)
                    .with_sio3(d3)
                    .with_dma(dma_ch0);

                // TX buffer holds one full pixel chunk (SEND_BUF_SIZE pixels)
                let (rx_buf, rx_desc, tx_buf, tx_desc) = dma_buffers!(4096, 32768);
                let rx = DmaRxBuf::new(rx_desc, rx_buf).expect("DMA rx buffer");
                let tx = DmaTxBuf::new(tx_desc, tx_buf).expect("DMA tx buffer");
                let bus: SpiDmaBus<'_, Blocking> = spi.with_buffers(rx, tx);

                let config = PanelConfig::default();
                let quad = QuadBus::from_config(RawQspiDev { bus, cs }, &config);
                Rm67162::new(quad, Some(rst), &mut Delay::new(), config)
                    .expect("RM67162 init failed")
            }
        }
    } else {
        mod backend {
            use super::*;
            use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
            use esp_hal::gpio::{Level, OutputConfig};

            use crate::bus::SerialBus;

            pub type SpiDev<'a> = ExclusiveDevice<Spi<'a, Blocking>, Output<'a>, NoDelay>;

            pub type DisplayType<'a> = Rm67162<SerialBus<SpiDev<'a>, Output<'a>>, Output<'a>>;

            pub fn setup_display<'a>(display_pins: DisplayPins<'a>) -> DisplayType<'a> {
                let DisplayPins { spi2, cs, sck, d0, d1, d2: _, d3: _, rst, dma_ch0: _ } =
                    display_pins;

                let dc = Output::new(d1, Level::Low, OutputConfig::default());

                let spi = Spi::new(spi2, bus_config())
                    .expect("SPI2 rejected bus config")
                    .with_sck(sck)
                    .with_mosi(d0);
                let spi_dev = ExclusiveDevice::new(spi, cs, NoDelay).expect("CS pin");

                let bus = SerialBus::new(spi_dev, dc);
                Rm67162::new(bus, Some(rst), &mut Delay::new(), PanelConfig::default())
                    .expect("RM67162 init failed")
            }
        }
    }
}

pub use backend::{setup_display, DisplayType};
