//! Bus transports for the RM67162.
//!
//! Two framings reach the same controller:
//!
//! * [`SerialBus`]: plain 4-wire SPI with a D/C line. Command byte with D/C low,
//!   then every payload byte with D/C high. Pixels go out MSB first.
//! * [`QuadBus`]: QSPI half-duplex transactions. Instruction `0x02` carries a
//!   command, the opcode rides in the 24-bit address slot as `opcode << 8`.
//!   Pixels use instruction `0x32` with RAMWR (first chunk) or RAMWRC
//!   (continuation) in the address slot and the raw buffer on four lines.
//!
//! Both implement [`BusTransport`], which is all the driver sees.

use core::fmt;

use embedded_hal::{digital::OutputPin, spi::SpiDevice};

use crate::commands::{CommandEntry, QSPI_INIT, RAMWR, RAMWRC, SPI_INIT};
use crate::config::PanelConfig;

/// QSPI instruction: single-line command write.
pub const QSPI_CMD_WRITE: u8 = 0x02;
/// QSPI instruction: quad pixel write.
pub const QSPI_PIXEL_WRITE: u8 = 0x32;

// Bytes staged per SPI write on the serial pixel path.
const SERIAL_STAGE_BYTES: usize = 1024;

/// What the driver needs from a transport.
pub trait BusTransport {
    type Error: fmt::Debug;

    /// Send `opcode` followed by `payload` (may be empty).
    fn send_command(&mut self, opcode: u8, payload: &[u8]) -> Result<(), Self::Error>;

    /// Stream pixels into the window currently armed on the controller.
    fn stream_pixels(&mut self, pixels: &[u16]) -> Result<(), Self::Error>;

    /// Bring-up table matching this framing.
    fn init_table(&self) -> &'static [CommandEntry];

    /// Pick up transfer limits from the panel config. Called once by the
    /// driver before bring-up.
    fn apply_config(&mut self, _config: &PanelConfig) {}
}

/// Line width of a QSPI data phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataLines {
    Single,
    Quad,
}

/// Half-duplex QSPI write: 8-bit instruction and 24-bit address on one
/// line, data phase on `lines`. One call is one chip-select bracket.
pub trait QuadWrite {
    type Error: fmt::Debug;

    fn write_quad(
        &mut self,
        instruction: u8,
        address: u32,
        lines: DataLines,
        data: &[u8],
    ) -> Result<(), Self::Error>;
}

// -------------------- 4-wire SPI --------------------

/// Error type that wraps SPI and D/C pin errors.
#[derive(Debug)]
pub enum BusError<SpiE, PinE> {
    Spi(SpiE),
    Pin(PinE),
}

impl<SpiE: fmt::Debug, PinE: fmt::Debug> fmt::Display for BusError<SpiE, PinE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Spi(e) => write!(f, "spi write failed: {:?}", e),
            BusError::Pin(e) => write!(f, "d/c line failed: {:?}", e),
        }
    }
}

/// 4-wire SPI transport. CS is handled by the `SpiDevice` implementation.
pub struct SerialBus<SPI, DC> {
    spi: SPI,
    dc: DC,
}

impl<SPI, DC> SerialBus<SPI, DC>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
{
    pub fn new(spi: SPI, dc: DC) -> Self {
        Self { spi, dc }
    }

    pub fn release(self) -> (SPI, DC) {
        (self.spi, self.dc)
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) -> Result<(), BusError<SPI::Error, DC::Error>> {
        self.spi.write(bytes).map_err(BusError::Spi)
    }
}

impl<SPI, DC> BusTransport for SerialBus<SPI, DC>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
{
    type Error = BusError<SPI::Error, DC::Error>;

    fn send_command(&mut self, opcode: u8, payload: &[u8]) -> Result<(), Self::Error> {
        self.dc.set_low().map_err(BusError::Pin)?;
        self.write(&[opcode])?;
        self.dc.set_high().map_err(BusError::Pin)?;
        for b in payload {
            self.write(core::slice::from_ref(b))?;
        }
        Ok(())
    }

    fn stream_pixels(&mut self, pixels: &[u16]) -> Result<(), Self::Error> {
        if pixels.is_empty() {
            return Ok(());
        }
        self.dc.set_high().map_err(BusError::Pin)?;

        let mut stage = [0u8; SERIAL_STAGE_BYTES];
        for chunk in pixels.chunks(SERIAL_STAGE_BYTES / 2) {
            for (dst, px) in stage.chunks_exact_mut(2).zip(chunk) {
                dst.copy_from_slice(&px.to_be_bytes());
            }
            self.write(&stage[..chunk.len() * 2])?;
        }
        Ok(())
    }

    fn init_table(&self) -> &'static [CommandEntry] {
        &SPI_INIT
    }
}

// -------------------- QSPI --------------------

/// QSPI transport over any [`QuadWrite`] peripheral.
pub struct QuadBus<Q> {
    quad: Q,
    max_chunk_pixels: usize,
}

impl<Q: QuadWrite> QuadBus<Q> {
    /// `max_chunk_pixels` caps one pixel transaction (the peripheral's
    /// max transfer size); larger streams are split RAMWR + RAMWRC...
    pub fn new(quad: Q, max_chunk_pixels: usize) -> Self {
        Self { quad, max_chunk_pixels: max_chunk_pixels.max(1) }
    }

    pub fn from_config(quad: Q, config: &PanelConfig) -> Self {
        Self::new(quad, config.max_chunk_pixels)
    }

    pub fn max_chunk_pixels(&self) -> usize {
        self.max_chunk_pixels
    }

    pub fn release(self) -> Q {
        self.quad
    }
}

impl<Q: QuadWrite> BusTransport for QuadBus<Q> {
    type Error = Q::Error;

    fn send_command(&mut self, opcode: u8, payload: &[u8]) -> Result<(), Self::Error> {
        self.quad
            .write_quad(QSPI_CMD_WRITE, (opcode as u32) << 8, DataLines::Single, payload)
    }

    fn stream_pixels(&mut self, pixels: &[u16]) -> Result<(), Self::Error> {
        let mut opcode = RAMWR;
        for chunk in pixels.chunks(self.max_chunk_pixels) {
            // Raw buffer, native byte order
            let bytes: &[u8] = bytemuck::cast_slice(chunk);
            self.quad
                .write_quad(QSPI_PIXEL_WRITE, (opcode as u32) << 8, DataLines::Quad, bytes)?;
            opcode = RAMWRC;
        }
        Ok(())
    }

    fn init_table(&self) -> &'static [CommandEntry] {
        &QSPI_INIT
    }

    fn apply_config(&mut self, config: &PanelConfig) {
        self.max_chunk_pixels = config.max_chunk_pixels.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Event, Timeline};

    #[test]
    fn serial_command_frames_dc_around_opcode() {
        let log = Timeline::new();
        let mut bus = SerialBus::new(log.spi(), log.pin("dc"));

        bus.send_command(0x2A, &[0x00, 0x10, 0x00, 0x20]).unwrap();

        assert_eq!(
            log.events(),
            vec![
                Event::Pin("dc", false),
                Event::Spi(vec![0x2A]),
                Event::Pin("dc", true),
                Event::Spi(vec![0x00]),
                Event::Spi(vec![0x10]),
                Event::Spi(vec![0x00]),
                Event::Spi(vec![0x20]),
            ]
        );
    }

    #[test]
    fn serial_command_without_payload() {
        let log = Timeline::new();
        let mut bus = SerialBus::new(log.spi(), log.pin("dc"));

        bus.send_command(0x2C, &[]).unwrap();

        assert_eq!(log.spi_writes(), vec![vec![0x2C]]);
    }

    #[test]
    fn serial_pixels_go_out_msb_first() {
        let log = Timeline::new();
        let mut bus = SerialBus::new(log.spi(), log.pin("dc"));

        bus.stream_pixels(&[0xF800, 0x07E0, 0x001F]).unwrap();

        assert_eq!(
            log.events(),
            vec![
                Event::Pin("dc", true),
                Event::Spi(vec![0xF8, 0x00, 0x07, 0xE0, 0x00, 0x1F]),
            ]
        );
    }

    #[test]
    fn serial_pixels_split_at_stage_size() {
        let log = Timeline::new();
        let mut bus = SerialBus::new(log.spi(), log.pin("dc"));
        let pixels = vec![0x1234u16; SERIAL_STAGE_BYTES / 2 + 3];

        bus.stream_pixels(&pixels).unwrap();

        let writes = log.spi_writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].len(), SERIAL_STAGE_BYTES);
        assert_eq!(writes[1], vec![0x12, 0x34, 0x12, 0x34, 0x12, 0x34]);
    }

    #[test]
    fn serial_empty_stream_is_silent() {
        let log = Timeline::new();
        let mut bus = SerialBus::new(log.spi(), log.pin("dc"));
        bus.stream_pixels(&[]).unwrap();
        assert!(log.events().is_empty());
    }

    #[test]
    fn quad_command_puts_opcode_in_address_slot() {
        let log = Timeline::new();
        let mut bus = QuadBus::new(log.quad(), 16);

        bus.send_command(0x51, &[0xD0]).unwrap();
        bus.send_command(0x2C, &[]).unwrap();

        assert_eq!(
            log.events(),
            vec![
                Event::Quad { instruction: 0x02, address: 0x005100, lines: DataLines::Single, data: vec![0xD0] },
                Event::Quad { instruction: 0x02, address: 0x002C00, lines: DataLines::Single, data: vec![] },
            ]
        );
    }

    #[test]
    fn quad_pixels_chunk_ramwr_then_ramwrc() {
        let log = Timeline::new();
        let mut bus = QuadBus::new(log.quad(), 2);

        bus.stream_pixels(&[0x1122, 0x3344, 0x5566]).unwrap();

        let mut first = Vec::new();
        first.extend_from_slice(&0x1122u16.to_ne_bytes());
        first.extend_from_slice(&0x3344u16.to_ne_bytes());
        assert_eq!(
            log.events(),
            vec![
                Event::Quad { instruction: 0x32, address: 0x002C00, lines: DataLines::Quad, data: first },
                Event::Quad { instruction: 0x32, address: 0x003C00, lines: DataLines::Quad, data: 0x5566u16.to_ne_bytes().to_vec() },
            ]
        );
    }

    #[test]
    fn tables_follow_transport() {
        let log = Timeline::new();
        assert_eq!(SerialBus::new(log.spi(), log.pin("dc")).init_table(), &SPI_INIT[..]);
        assert_eq!(QuadBus::new(log.quad(), 8).init_table(), &QSPI_INIT[..]);
    }

    #[test]
    fn quad_chunk_size_follows_config() {
        let log = Timeline::new();
        let cfg = PanelConfig { max_chunk_pixels: 3, ..PanelConfig::default() };

        let mut bus = QuadBus::from_config(log.quad(), &cfg);
        assert_eq!(bus.max_chunk_pixels(), 3);

        bus.apply_config(&PanelConfig { max_chunk_pixels: 0, ..cfg });
        assert_eq!(bus.max_chunk_pixels(), 1);
    }
}
