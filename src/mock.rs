// Test doubles: every mock writes into one shared timeline so tests can
// assert on the exact interleaving of pin edges, bus traffic and delays.

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, Operation, SpiDevice};

use crate::bus::{BusTransport, DataLines, QuadWrite};
use crate::commands::{CommandEntry, SPI_INIT};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Pin(&'static str, bool),
    Spi(Vec<u8>),
    Quad { instruction: u8, address: u32, lines: DataLines, data: Vec<u8> },
    DelayMs(u32),
    DelayNs(u32),
    Command(u8, Vec<u8>),
    Pixels(Vec<u16>),
}

#[derive(Clone, Default)]
pub struct Timeline(Rc<RefCell<Vec<Event>>>);

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, e: Event) {
        self.0.borrow_mut().push(e);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn spi_writes(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Spi(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    pub fn commands(&self) -> Vec<(u8, Vec<u8>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Command(op, data) => Some((op, data)),
                _ => None,
            })
            .collect()
    }

    pub fn pixel_streams(&self) -> Vec<Vec<u16>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Pixels(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn spi(&self) -> MockSpi {
        MockSpi(self.clone())
    }

    pub fn pin(&self, name: &'static str) -> MockPin {
        MockPin { log: self.clone(), name }
    }

    pub fn delay(&self) -> MockDelay {
        MockDelay(self.clone())
    }

    pub fn quad(&self) -> MockQuad {
        MockQuad(self.clone())
    }

    pub fn recording_bus(&self) -> RecordingBus {
        RecordingBus { log: self.clone(), table: &SPI_INIT, streams_left: None }
    }
}

pub struct MockSpi(Timeline);

impl spi::ErrorType for MockSpi {
    type Error = Infallible;
}

impl SpiDevice<u8> for MockSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        for op in operations.iter() {
            if let Operation::Write(bytes) = op {
                self.0.push(Event::Spi(bytes.to_vec()));
            }
        }
        Ok(())
    }
}

pub struct MockPin {
    log: Timeline,
    name: &'static str,
}

impl digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.push(Event::Pin(self.name, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.push(Event::Pin(self.name, true));
        Ok(())
    }
}

/// Mock clock: records each requested delay.
pub struct MockDelay(Timeline);

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.push(Event::DelayNs(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.push(Event::DelayMs(ms));
    }
}

pub struct MockQuad(Timeline);

impl QuadWrite for MockQuad {
    type Error = Infallible;

    fn write_quad(
        &mut self,
        instruction: u8,
        address: u32,
        lines: DataLines,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        self.0.push(Event::Quad { instruction, address, lines, data: data.to_vec() });
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct BusDown;

/// Logical-level bus: records commands and pixel streams, can be told to
/// fail after a number of pixel streams.
pub struct RecordingBus {
    log: Timeline,
    table: &'static [CommandEntry],
    streams_left: Option<usize>,
}

impl RecordingBus {
    pub fn with_table(mut self, table: &'static [CommandEntry]) -> Self {
        self.table = table;
        self
    }

    pub fn failing_after(mut self, streams: usize) -> Self {
        self.streams_left = Some(streams);
        self
    }
}

impl BusTransport for RecordingBus {
    type Error = BusDown;

    fn send_command(&mut self, opcode: u8, payload: &[u8]) -> Result<(), Self::Error> {
        self.log.push(Event::Command(opcode, payload.to_vec()));
        Ok(())
    }

    fn stream_pixels(&mut self, pixels: &[u16]) -> Result<(), Self::Error> {
        if let Some(left) = self.streams_left.as_mut() {
            if *left == 0 {
                return Err(BusDown);
            }
            *left -= 1;
        }
        self.log.push(Event::Pixels(pixels.to_vec()));
        Ok(())
    }

    fn init_table(&self) -> &'static [CommandEntry] {
        self.table
    }
}

// Scratch buffer accounting, per test thread.
std::thread_local! {
    static SCRATCH_ALLOCS: Cell<usize> = const { Cell::new(0) };
    static SCRATCH_FREES: Cell<usize> = const { Cell::new(0) };
}

pub fn note_scratch_alloc() {
    SCRATCH_ALLOCS.with(|c| c.set(c.get() + 1));
}

pub fn note_scratch_free() {
    SCRATCH_FREES.with(|c| c.set(c.get() + 1));
}

/// (allocations, releases) seen on this thread so far.
pub fn scratch_counts() -> (usize, usize) {
    (SCRATCH_ALLOCS.with(Cell::get), SCRATCH_FREES.with(Cell::get))
}
