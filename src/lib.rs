//! Typed GPIO, I2C and PWM driver stack for FT232H-style USB bridge chips.
//!
//! The crate drives the MPSSE GPIO engine of an FT232H-class bridge and the
//! I2C bus it carries, with a [`pwm::Pca9685`] driver for the common
//! 16-channel PWM controller on that bus. The USB plumbing itself stays out:
//! everything that moves bytes lives behind the [`Transport`] trait, so the
//! same driver stack runs over the vendor library in production and over a
//! fake in tests.
//!
//! # Layers
//!
//! * [`gpio`] — the pin model: sixteen lines in two byte groups, with D0-D3
//!   permanently reserved for the serial engine, and the [`PinBank`] that
//!   derives every direction/value byte from per-pin state.
//! * [`Ft232h`] — the adapter: translates pin operations into MPSSE command
//!   frames, implements [`I2cMaster`] over the same channel and runs a
//!   background thread that polls input pins and transparently reconnects
//!   after transport failures.
//! * [`i2c`] — the addressed master/slave abstraction shared by all bus
//!   peripherals.
//! * [`pwm`] — the PCA9685 driver, bound to the bus through an [`I2cSlave`].
//! * [`IoHandler`] — a synchronized facade serializing pin operations of
//!   competing callers.
//!
//! # Connection lifecycle
//!
//! The adapter never fails to construct. It starts a reconnect loop that
//! brings the link up when the hardware appears and back up after it
//! vanishes; while the link is down, operations fail fast with
//! [`Error::NotConnected`]. Input-pin changes are polled in the background
//! and published as 16-bit snapshots through [`Ft232h::subscribe`].
//!
//! # Example
//!
//! ```
//! use ft232h_io::{AdapterConfig, Ft232h, GpioLevel, GpioPin, PinMode, Transport};
//! use ft232h_io::pwm::Pca9685;
//! use std::sync::Arc;
//!
//! fn run(transport: impl Transport) -> ft232h_io::Result<()> {
//!     let adapter = Arc::new(Ft232h::new(transport, AdapterConfig::default()));
//!
//!     adapter.configure_pin(GpioPin::C0, PinMode::Output)?;
//!     adapter.write_pin(GpioPin::C0, GpioLevel::High)?;
//!
//!     let servos = Pca9685::with_default_address(adapter)?;
//!     servos.set_frequency(50)?;
//!     servos.fire_pwm(0, 7.5, 0.0)?;
//!     Ok(())
//! }
//! ```

mod bits;
mod consts;
mod device;
mod error;
mod handler;

pub mod gpio;
pub mod i2c;
pub mod pwm;
pub mod transport;

pub use device::{AdapterConfig, Ft232h, LinkState};
pub use error::{Error, Result};
pub use gpio::{GpioLevel, GpioPin, PinBank, PinGroup, PinMode};
pub use handler::IoHandler;
pub use i2c::{I2cMaster, I2cSlave, I2cSpeed};
pub use pwm::Pca9685;
pub use transport::{ChannelOptions, Transport, TransportError};
