//! PCA9685 16-channel PWM controller driver.
//!
//! The chip divides each PWM frame into 4096 counts and holds one
//! `(ON, OFF)` count pair per channel in a quadruplet of 8-bit registers.
//! [`Pca9685`] maps duty cycle and phase delay onto those counts and drives
//! the registers through a bound [`I2cSlave`].

use crate::consts::pca9685::{self, led, mode1, mode2, reg};
use crate::error::{Error, Result};
use crate::i2c::{I2cMaster, I2cSlave};
use log::{debug, trace};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Settle time after leaving sleep before the restart bit may be set,
/// per the datasheet.
const OSC_WAKE_DELAY: Duration = Duration::from_micros(500);

/// A PCA9685 at a fixed bus address.
#[derive(Debug)]
pub struct Pca9685 {
    slave: I2cSlave,
}

impl Pca9685 {
    /// Binds a controller at `address` on the given master.
    pub fn new(master: Arc<dyn I2cMaster>, address: u8) -> Result<Self> {
        Ok(Pca9685 {
            slave: I2cSlave::new(master, address)?,
        })
    }

    /// Binds a controller at the default address (0x40, all address pins low).
    pub fn with_default_address(master: Arc<dyn I2cMaster>) -> Result<Self> {
        Self::new(master, pca9685::DEFAULT_ADDRESS)
    }

    /// The bound 7-bit bus address.
    pub fn address(&self) -> u8 {
        self.slave.address()
    }

    /// Sets the PWM frame frequency for all sixteen channels.
    ///
    /// The frequency maps to the 8-bit prescale register through the 25 MHz
    /// internal oscillator; frequencies whose prescale falls outside
    /// 0x03..=0xFF fail with [`Error::PrescaleOutOfRange`] before anything
    /// is written. The oscillator is put to sleep around the prescale write
    /// and restarted afterwards, as the register is read-only while running.
    pub fn set_frequency(&self, freq_hz: u32) -> Result<()> {
        let prescale = prescale_for(freq_hz)?;
        debug!("PWM frequency {} Hz -> prescale 0x{:02X}", freq_hz, prescale);
        self.slave
            .write_byte(reg::MODE1, mode1::AUTO_INCREMENT | mode1::SLEEP)?;
        self.slave.write_byte(reg::PRE_SCALE, prescale)?;
        self.slave.write_byte(reg::MODE1, mode1::AUTO_INCREMENT)?;
        thread::sleep(OSC_WAKE_DELAY);
        self.slave
            .write_byte(reg::MODE1, mode1::AUTO_INCREMENT | mode1::RESTART)
    }

    /// Selects totem-pole (default) or open-drain output drivers.
    pub fn set_output_mode(&self, open_drain: bool) -> Result<()> {
        let value = if open_drain { 0 } else { mode2::OUTDRV };
        self.slave.write_byte(reg::MODE2, value)
    }

    /// Programs one channel's duty cycle and phase delay.
    ///
    /// `duty_cycle_percent` is 0..=100; `phase_delay` is the fraction of the
    /// frame (0.0..=1.0) to wait before switching on. The ON count is the
    /// rounded phase offset, the OFF count the ON count plus the rounded duty
    /// counts; an OFF count past the frame end wraps into the next frame. A
    /// duty of 100 % sets the ON_H full-on bit and 0 % the OFF_H full-off
    /// bit instead of counts, since OFF_H = 0x10 would otherwise latch the
    /// channel constantly off. The four registers are written in quadruplet
    /// order; a failure mid-sequence leaves the earlier registers written.
    pub fn fire_pwm(&self, channel: u8, duty_cycle_percent: f64, phase_delay: f64) -> Result<()> {
        let registers = channel_registers(channel)?;
        check_pulse_shape(duty_cycle_percent, phase_delay)?;
        let bytes = quadruplet_bytes(duty_cycle_percent, phase_delay);
        trace!(
            "channel {} duty {} % phase {} -> {:02X?}",
            channel,
            duty_cycle_percent,
            phase_delay,
            bytes
        );
        self.write_quadruplet(registers, bytes)
    }

    /// Programs every channel at once through the broadcast quadruplet.
    pub fn fire_all_pwm(&self, duty_cycle_percent: f64, phase_delay: f64) -> Result<()> {
        check_pulse_shape(duty_cycle_percent, phase_delay)?;
        let bytes = quadruplet_bytes(duty_cycle_percent, phase_delay);
        let base = reg::ALL_LED_ON_L;
        self.write_quadruplet([base, base + 1, base + 2, base + 3], bytes)
    }

    /// Switches one channel fully on or fully off.
    pub fn set_constant(&self, channel: u8, high: bool) -> Result<()> {
        if high {
            self.fire_pwm(channel, 100.0, 0.0)
        } else {
            self.fire_pwm(channel, 0.0, 0.0)
        }
    }

    fn write_quadruplet(&self, registers: [u8; 4], bytes: [u8; 4]) -> Result<()> {
        for (register, byte) in registers.iter().zip(bytes) {
            self.slave.write_byte(*register, byte)?;
        }
        Ok(())
    }
}

fn check_pulse_shape(duty_cycle_percent: f64, phase_delay: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&duty_cycle_percent) {
        return Err(Error::ArgumentOutOfRange(format!(
            "duty cycle {} % is outside 0-100",
            duty_cycle_percent
        )));
    }
    if !(0.0..=1.0).contains(&phase_delay) {
        return Err(Error::ArgumentOutOfRange(format!(
            "phase delay {} is outside 0.0-1.0",
            phase_delay
        )));
    }
    Ok(())
}

/// The `(ON_L, ON_H, OFF_L, OFF_H)` bytes for a duty/phase pair.
///
/// The counts are 12-bit; the duty extremes use the ON_H/OFF_H control bits
/// because a count of 4096 does not exist (bit 4 of OFF_H is the full-off
/// latch, not a count bit).
fn quadruplet_bytes(duty_cycle_percent: f64, phase_delay: f64) -> [u8; 4] {
    let resolution = u32::from(pca9685::RESOLUTION);
    let duty_counts = (f64::from(resolution) * duty_cycle_percent / 100.0).round() as u32;
    if duty_counts >= resolution {
        return [0x00, led::FULL_ON, 0x00, 0x00];
    }
    if duty_counts == 0 {
        return [0x00, 0x00, 0x00, led::FULL_OFF];
    }
    let on = ((phase_delay * f64::from(resolution)).round() as u32) % resolution;
    // An OFF count past the frame end occurs in the next frame.
    let off = (on + duty_counts) % resolution;
    [
        (on & 0xFF) as u8,
        (on >> 8) as u8,
        (off & 0xFF) as u8,
        (off >> 8) as u8,
    ]
}

/// The `(ON_L, ON_H, OFF_L, OFF_H)` register quadruplet of a channel.
///
/// Channels above 15 have no registers and fail with
/// [`Error::UndefinedPwmChannel`].
fn channel_registers(channel: u8) -> Result<[u8; 4]> {
    if channel >= pca9685::CHANNEL_COUNT {
        return Err(Error::UndefinedPwmChannel(channel));
    }
    let base = reg::LED0_ON_L + 4 * channel;
    Ok([base, base + 1, base + 2, base + 3])
}

/// Maps a frame frequency to the prescale register value:
/// `round(osc / (freq * 4096)) - 1`, valid in 0x03..=0xFF.
fn prescale_for(freq_hz: u32) -> Result<u8> {
    let counts = f64::from(freq_hz) * pca9685::RESOLUTION as f64;
    let prescale = (f64::from(pca9685::OSC_HZ) / counts).round() as i64 - 1;
    if !(i64::from(pca9685::PRESCALE_MIN)..=i64::from(pca9685::PRESCALE_MAX)).contains(&prescale) {
        return Err(Error::PrescaleOutOfRange { freq_hz, prescale });
    }
    Ok(prescale as u8)
}
