//! The vendor transport contract.
//!
//! The crate never talks USB itself: everything that moves bytes to or from
//! the silicon — channel open/close, MPSSE frames, the I2C byte sequencing —
//! lives behind [`Transport`]. Production code implements it over the vendor
//! library (D2XX/libmpsse); tests inject a fake.

use crate::i2c::I2cSpeed;
use thiserror::Error;

/// Vendor status code treated as an I/O error (mirrors `FT_IO_ERROR`).
pub const STATUS_IO_ERROR: i32 = 4;

/// An opaque non-success status from the vendor transport.
///
/// The status code is carried for diagnostics only; the driver never
/// branches on it — any failure means "disconnect now" and hands the link
/// over to the reconnect loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("vendor transport status {status}")]
pub struct TransportError {
    /// The raw vendor status code.
    pub status: i32,
}

impl TransportError {
    pub fn new(status: i32) -> Self {
        TransportError { status }
    }
}

/// Channel configuration handed to the vendor transport at (re)initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelOptions {
    /// Direction byte for D0-D7 (bit set = output), reserved lines cleared.
    pub direction_low: u8,
    /// Initial value byte for D0-D7.
    pub value_low: u8,
    /// Direction byte for C0-C7.
    pub direction_high: u8,
    /// Initial value byte for C0-C7.
    pub value_high: u8,
    /// I2C clock class for the serial engine.
    pub clock: I2cSpeed,
}

/// Narrow interface over the vendor USB driver.
///
/// All methods return the vendor's opaque status on failure. Partial
/// transfers are reported through the returned byte counts and treated by
/// the caller as failures.
pub trait Transport: Send + Sync + 'static {
    /// An open channel handle. Owned exclusively by the adapter.
    type Channel: Send;

    /// Opens the channel at `index`.
    fn open_channel(&self, index: u32) -> Result<Self::Channel, TransportError>;

    /// Closes a channel. Infallible by contract; a failing close is moot
    /// because the handle is discarded either way.
    fn close_channel(&self, channel: Self::Channel);

    /// Applies pin directions, initial values and the I2C clock class.
    fn configure_channel(
        &self,
        channel: &mut Self::Channel,
        options: &ChannelOptions,
    ) -> Result<(), TransportError>;

    /// Writes raw MPSSE bytes, returning the count actually written.
    fn write_bytes(&self, channel: &mut Self::Channel, buf: &[u8]) -> Result<usize, TransportError>;

    /// Reads raw bytes, returning the count actually read.
    fn read_bytes(
        &self,
        channel: &mut Self::Channel,
        buf: &mut [u8],
    ) -> Result<usize, TransportError>;

    /// Performs an addressed I2C write through the vendor's serial engine.
    fn i2c_write_bytes(
        &self,
        channel: &mut Self::Channel,
        address: u8,
        buf: &[u8],
    ) -> Result<usize, TransportError>;

    /// Performs an addressed I2C read through the vendor's serial engine.
    fn i2c_read_bytes(
        &self,
        channel: &mut Self::Channel,
        address: u8,
        buf: &mut [u8],
    ) -> Result<usize, TransportError>;
}
