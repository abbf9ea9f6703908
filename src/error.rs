use crate::gpio::GpioPin;
use crate::i2c::I2cSpeed;
use crate::transport::TransportError;
use thiserror::Error;

/// Errors that can occur when driving the bridge and its peripherals.
///
/// Three categories exist: invalid requests (rejected synchronously, no side
/// effect), transient unavailability (`NotConnected`, reported while the
/// background link is down), and transport failures (which also close the
/// handle and hand the link over to the reconnect loop). There is no fatal
/// category — reconnection is retried indefinitely.
#[derive(Error, Debug)]
pub enum Error {
    /// The vendor transport reported a non-success status. The handle has
    /// been closed and the readiness machine is reconnecting.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// The device handle is absent (link down); the operation was not queued.
    #[error("device is not connected")]
    NotConnected,
    /// The pin is wired to the serial engine and can never be reconfigured.
    #[error("pin {pin:?} is reserved for the serial engine")]
    PinReserved {
        /// The reserved pin that was addressed.
        pin: GpioPin,
    },
    /// A level write was attempted on a pin not configured as an output.
    #[error("pin {pin:?} is not configured as an output")]
    PinNotOutput { pin: GpioPin },
    /// A read was attempted on a pin not configured as an input.
    #[error("pin {pin:?} is not configured as an input")]
    PinNotInput { pin: GpioPin },
    /// The pin carries no controllable I/O line (its level is `Unknown`).
    #[error("pin {pin:?} is not a controllable I/O line")]
    PinNotControllable { pin: GpioPin },
    /// The requested I2C clock class is outside what the transport supports.
    /// Unsupported classes fail explicitly instead of being clamped.
    #[error("I2C speed class {0:?} is not supported by this transport")]
    UnsupportedSpeed(I2cSpeed),
    /// 7-bit I2C slave address above 0x7F.
    #[error("invalid 7-bit I2C address 0x{0:02X} (must be 0x00-0x7F)")]
    InvalidI2cAddress(u8),
    /// PWM channel outside 0-15: there is no register quadruplet for it and
    /// nothing is written to the device.
    #[error("PWM channel {0} has no register set (valid channels are 0-15)")]
    UndefinedPwmChannel(u8),
    /// The requested PWM frequency maps to a prescale value outside the
    /// 8-bit prescale register.
    #[error("prescale {prescale} for {freq_hz} Hz does not fit the 8-bit prescale register")]
    PrescaleOutOfRange {
        /// The frequency that was requested.
        freq_hz: u32,
        /// The computed (unrepresentable) prescale value.
        prescale: i64,
    },
    /// Function argument is outside the valid range.
    #[error("argument out of range: {0}")]
    ArgumentOutOfRange(String),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
