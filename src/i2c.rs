//! Generic I2C master/slave abstraction.
//!
//! The bridge adapter implements [`I2cMaster`] by multiplexing addressed
//! transfers onto the GPIO channel handle; an [`I2cSlave`] binds a fixed
//! 7-bit address to a shared master and forwards every call.

use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// The closed set of I2C bus speed classes.
///
/// Only a subset is supported by a given master; requesting an unsupported
/// class fails explicitly with [`Error::UnsupportedSpeed`] rather than
/// silently clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum I2cSpeed {
    /// 10 kbit/s low-speed mode.
    Khz10,
    /// 100 kbit/s standard mode.
    Khz100,
    /// 200 kbit/s.
    Khz200,
    /// 400 kbit/s fast mode.
    Khz400,
    /// 1 Mbit/s fast mode plus.
    Mhz1,
    /// 1.7 Mbit/s high-speed mode.
    Mhz1p7,
    /// 3.4 Mbit/s high-speed mode.
    Mhz3p4,
}

impl I2cSpeed {
    /// The nominal bit rate in kbit/s.
    pub fn kbit_per_s(&self) -> u32 {
        match self {
            I2cSpeed::Khz10 => 10,
            I2cSpeed::Khz100 => 100,
            I2cSpeed::Khz200 => 200,
            I2cSpeed::Khz400 => 400,
            I2cSpeed::Mhz1 => 1_000,
            I2cSpeed::Mhz1p7 => 1_700,
            I2cSpeed::Mhz3p4 => 3_400,
        }
    }
}

impl fmt::Display for I2cSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kbit/s", self.kbit_per_s())
    }
}

/// Validates a 7-bit slave address.
pub(crate) fn check_address(address: u8) -> Result<u8> {
    if address <= 0x7F {
        Ok(address)
    } else {
        Err(Error::InvalidI2cAddress(address))
    }
}

/// Addressed register-oriented I2C master (SMBus-style byte/word/block).
///
/// Words are transferred little-endian, low byte first. Implementations
/// serialize transfers internally; callers may share one master across
/// threads.
pub trait I2cMaster: Send + Sync {
    /// Selects the bus clock class. Unsupported classes fail explicitly.
    fn set_speed(&self, speed: I2cSpeed) -> Result<()>;

    /// Reads one byte from register `command` of the slave at `address`.
    fn read_byte(&self, address: u8, command: u8) -> Result<u8>;

    /// Writes one byte to register `command` of the slave at `address`.
    fn write_byte(&self, address: u8, command: u8, value: u8) -> Result<()>;

    /// Reads a little-endian word from register `command`.
    fn read_word(&self, address: u8, command: u8) -> Result<u16>;

    /// Writes a little-endian word to register `command`.
    fn write_word(&self, address: u8, command: u8, value: u16) -> Result<()>;

    /// Reads `buf.len()` bytes starting at register `command`, returning the
    /// count actually read.
    fn read_block(&self, address: u8, command: u8, buf: &mut [u8]) -> Result<usize>;

    /// Writes a block of bytes starting at register `command`.
    fn write_block(&self, address: u8, command: u8, data: &[u8]) -> Result<()>;
}

/// A fixed (master, 7-bit address) binding.
///
/// Immutable after construction; many slaves may share one master. The slave
/// owns no transport state — every call forwards with the address bound.
pub struct I2cSlave {
    master: Arc<dyn I2cMaster>,
    address: u8,
}

impl I2cSlave {
    /// Binds `address` to `master`. Fails for addresses above 0x7F.
    pub fn new(master: Arc<dyn I2cMaster>, address: u8) -> Result<Self> {
        Ok(I2cSlave {
            master,
            address: check_address(address)?,
        })
    }

    /// The bound 7-bit address.
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn read_byte(&self, command: u8) -> Result<u8> {
        self.master.read_byte(self.address, command)
    }

    pub fn write_byte(&self, command: u8, value: u8) -> Result<()> {
        self.master.write_byte(self.address, command, value)
    }

    pub fn read_word(&self, command: u8) -> Result<u16> {
        self.master.read_word(self.address, command)
    }

    pub fn write_word(&self, command: u8, value: u16) -> Result<()> {
        self.master.write_word(self.address, command, value)
    }

    pub fn read_block(&self, command: u8, buf: &mut [u8]) -> Result<usize> {
        self.master.read_block(self.address, command, buf)
    }

    pub fn write_block(&self, command: u8, data: &[u8]) -> Result<()> {
        self.master.write_block(self.address, command, data)
    }
}

impl fmt::Debug for I2cSlave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("I2cSlave")
            .field("address", &format_args!("0x{:02X}", self.address))
            .finish()
    }
}
