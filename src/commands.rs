//! RM67162 command set and the fixed init tables.
//
// Each table entry is { opcode, payload, len|flags }: the low 7 bits of
// the last byte are the payload length, bit 7 asks for a settle delay
// after the command is issued.

use core::fmt;

// Opcodes
pub const SLPIN: u8 = 0x10;
pub const SLPOUT: u8 = 0x11;
pub const INVOFF: u8 = 0x20;
pub const INVON: u8 = 0x21;
pub const DISPOFF: u8 = 0x28;
pub const DISPON: u8 = 0x29;
pub const CASET: u8 = 0x2A;
pub const RASET: u8 = 0x2B;
pub const RAMWR: u8 = 0x2C;
pub const MADCTL: u8 = 0x36;
pub const COLMOD: u8 = 0x3A;
pub const RAMWRC: u8 = 0x3C;
pub const WRDISBV: u8 = 0x51;
pub const WRCE: u8 = 0x58;
pub const WRCE_LOW: u8 = 0x5A;
pub const WRCE_HIGH: u8 = 0x5B;
pub const HBM_CTRL: u8 = 0xB0;
pub const PAGE_SEL: u8 = 0xFE;

// MADCTL bits
pub const MAD_MY: u8 = 0x80;
pub const MAD_MX: u8 = 0x40;
pub const MAD_MV: u8 = 0x20;
pub const MAD_RGB: u8 = 0x00;

/// Set in `len_flags` when the panel needs time to settle after the command.
pub const SETTLE_FLAG: u8 = 0x80;
pub const LEN_MASK: u8 = 0x7F;

/// Largest inline payload a table entry carries (CASET/RASET).
pub const MAX_PAYLOAD: usize = 4;

/// One row of a command table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandEntry {
    pub opcode: u8,
    pub payload: [u8; MAX_PAYLOAD],
    pub len_flags: u8,
}

impl CommandEntry {
    pub const fn new(opcode: u8, payload: [u8; MAX_PAYLOAD], len_flags: u8) -> Self {
        Self { opcode, payload, len_flags }
    }

    // Single data byte (or none when `len_flags` says 0).
    const fn byte(opcode: u8, value: u8, len_flags: u8) -> Self {
        Self::new(opcode, [value, 0, 0, 0], len_flags)
    }

    #[inline]
    pub fn len(&self) -> usize {
        ((self.len_flags & LEN_MASK) as usize).min(MAX_PAYLOAD)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Payload bytes actually sent on the bus.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.payload[..self.len()]
    }

    #[inline]
    pub fn needs_settle(&self) -> bool {
        self.len_flags & SETTLE_FLAG != 0
    }
}

/// 4-wire SPI bring-up. Order matters: pixel format and brightness go
/// before display-on.
pub const SPI_INIT: [CommandEntry; 7] = [
    CommandEntry::byte(PAGE_SEL, 0x00, 0x01),
    CommandEntry::byte(MADCTL, 0x00, 0x01),
    CommandEntry::byte(COLMOD, 0x75, 0x01), // 16bpp
    CommandEntry::byte(WRDISBV, 0x00, 0x01),
    CommandEntry::byte(SLPOUT, 0x00, 0x01 | SETTLE_FLAG),
    CommandEntry::byte(DISPON, 0x00, 0x01 | SETTLE_FLAG),
    CommandEntry::byte(WRDISBV, 0xD0, 0x01),
];

/// QSPI bring-up.
pub const QSPI_INIT: [CommandEntry; 5] = [
    CommandEntry::byte(SLPOUT, 0x00, SETTLE_FLAG),
    CommandEntry::byte(COLMOD, 0x55, 0x01), // 16bpp
    CommandEntry::byte(WRDISBV, 0x00, 0x01),
    CommandEntry::byte(DISPON, 0x00, SETTLE_FLAG),
    CommandEntry::byte(WRDISBV, 0xD0, 0x01),
];

/// Panel orientation, mapped onto MADCTL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    Portrait,
    Landscape,
    PortraitFlipped,
    LandscapeFlipped,
}

impl Rotation {
    pub fn madctl(self) -> u8 {
        match self {
            Rotation::Portrait => MAD_RGB,
            Rotation::Landscape => MAD_MX | MAD_MV | MAD_RGB,
            Rotation::PortraitFlipped => MAD_MX | MAD_MY | MAD_RGB,
            Rotation::LandscapeFlipped => MAD_MV | MAD_MY | MAD_RGB,
        }
    }

    /// Rows and columns are exchanged (MV set).
    pub fn swaps_axes(self) -> bool {
        self.madctl() & MAD_MV != 0
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Rotation codes outside 0..=3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidRotation(pub u8);

impl fmt::Display for InvalidRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rotation code {} is not one of 0..=3", self.0)
    }
}

impl TryFrom<u8> for Rotation {
    type Error = InvalidRotation;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Rotation::Portrait),
            1 => Ok(Rotation::Landscape),
            2 => Ok(Rotation::PortraitFlipped),
            3 => Ok(Rotation::LandscapeFlipped),
            other => Err(InvalidRotation(other)),
        }
    }
}
