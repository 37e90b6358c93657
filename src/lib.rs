#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod bus;
pub mod commands;
pub mod config;
pub mod font;
pub mod rm67162;
pub mod text;

#[cfg(feature = "board")]
pub mod display;
#[cfg(feature = "board")]
pub mod wiring;

#[cfg(test)]
mod mock;

pub use bus::{BusTransport, DataLines, QuadBus, QuadWrite, SerialBus};
pub use commands::{CommandEntry, Rotation};
pub use config::{PanelConfig, Transport};
pub use rm67162::{DriverError, PanelError, Rm67162};
