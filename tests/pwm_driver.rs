//! PCA9685 register-level behavior against a recording I2C master.

mod common;

use approx::assert_relative_eq;
use common::{quiet_config, FakeTransport};
use ft232h_io::{Error, Ft232h, I2cMaster, I2cSpeed, Pca9685, Result};
use std::sync::{Arc, Mutex};

/// Records every byte-register write; reads answer zero.
#[derive(Default)]
struct RecordingMaster {
    writes: Mutex<Vec<(u8, u8, u8)>>,
}

impl RecordingMaster {
    fn writes(&self) -> Vec<(u8, u8, u8)> {
        self.writes.lock().unwrap().clone()
    }
}

impl I2cMaster for RecordingMaster {
    fn set_speed(&self, _speed: I2cSpeed) -> Result<()> {
        Ok(())
    }

    fn read_byte(&self, _address: u8, _command: u8) -> Result<u8> {
        Ok(0)
    }

    fn write_byte(&self, address: u8, command: u8, value: u8) -> Result<()> {
        self.writes.lock().unwrap().push((address, command, value));
        Ok(())
    }

    fn read_word(&self, _address: u8, _command: u8) -> Result<u16> {
        Ok(0)
    }

    fn write_word(&self, address: u8, command: u8, value: u16) -> Result<()> {
        let [lo, hi] = value.to_le_bytes();
        self.write_byte(address, command, lo)?;
        self.write_byte(address, command + 1, hi)
    }

    fn read_block(&self, _address: u8, _command: u8, buf: &mut [u8]) -> Result<usize> {
        buf.fill(0);
        Ok(buf.len())
    }

    fn write_block(&self, address: u8, command: u8, data: &[u8]) -> Result<()> {
        for (i, &byte) in data.iter().enumerate() {
            self.write_byte(address, command + i as u8, byte)?;
        }
        Ok(())
    }
}

fn controller() -> (Arc<RecordingMaster>, Pca9685) {
    let master = Arc::new(RecordingMaster::default());
    let pwm = Pca9685::with_default_address(master.clone()).unwrap();
    (master, pwm)
}

#[test]
fn half_duty_fills_the_channel_quadruplet() {
    let (master, pwm) = controller();
    pwm.fire_pwm(0, 50.0, 0.0).unwrap();
    assert_eq!(
        master.writes(),
        vec![
            (0x40, 0x06, 0x00),
            (0x40, 0x07, 0x00),
            (0x40, 0x08, 0x00),
            (0x40, 0x09, 0x08),
        ]
    );
}

#[test]
fn phase_delay_offsets_both_counts() {
    let (master, pwm) = controller();
    // ON = 2048, OFF = 2048 + 1024 = 3072.
    pwm.fire_pwm(0, 25.0, 0.5).unwrap();
    assert_eq!(
        master.writes(),
        vec![
            (0x40, 0x06, 0x00),
            (0x40, 0x07, 0x08),
            (0x40, 0x08, 0x00),
            (0x40, 0x09, 0x0C),
        ]
    );
}

#[test]
fn channels_map_to_disjoint_register_quadruplets() {
    let (master, pwm) = controller();
    pwm.fire_pwm(15, 50.0, 0.0).unwrap();
    let registers: Vec<u8> = master.writes().iter().map(|w| w.1).collect();
    assert_eq!(registers, vec![0x42, 0x43, 0x44, 0x45]);
}

#[test]
fn servo_frequency_programs_the_prescaler() {
    let (master, pwm) = controller();
    pwm.set_frequency(50).unwrap();
    let writes = master.writes();
    // Sleep, prescale, wake, restart.
    assert_eq!(writes[0], (0x40, 0x00, 0x30));
    assert_eq!(writes[1], (0x40, 0xFE, 121));
    assert_eq!(writes[2], (0x40, 0x00, 0x20));
    assert_eq!(writes[3], (0x40, 0x00, 0xA0));

    // The programmed prescale reproduces the requested frequency.
    let achieved = 25_000_000.0 / ((f64::from(writes[1].2) + 1.0) * 4096.0);
    assert_relative_eq!(achieved, 50.0, max_relative = 0.01);
}

#[test]
fn unreachable_frequencies_write_nothing() {
    let (master, pwm) = controller();
    assert!(matches!(
        pwm.set_frequency(10_000),
        Err(Error::PrescaleOutOfRange { .. })
    ));
    assert!(matches!(
        pwm.set_frequency(1),
        Err(Error::PrescaleOutOfRange { .. })
    ));
    assert!(master.writes().is_empty());
}

#[test]
fn undefined_channels_write_nothing() {
    let (master, pwm) = controller();
    assert!(matches!(
        pwm.fire_pwm(16, 50.0, 0.0),
        Err(Error::UndefinedPwmChannel(16))
    ));
    assert!(matches!(
        pwm.fire_pwm(255, 50.0, 0.0),
        Err(Error::UndefinedPwmChannel(255))
    ));
    assert!(master.writes().is_empty());
}

#[test]
fn out_of_range_arguments_write_nothing() {
    let (master, pwm) = controller();
    assert!(matches!(
        pwm.fire_pwm(0, 100.1, 0.0),
        Err(Error::ArgumentOutOfRange(_))
    ));
    assert!(matches!(
        pwm.fire_pwm(0, -0.1, 0.0),
        Err(Error::ArgumentOutOfRange(_))
    ));
    assert!(matches!(
        pwm.fire_pwm(0, 50.0, 1.5),
        Err(Error::ArgumentOutOfRange(_))
    ));
    assert!(master.writes().is_empty());
}

#[test]
fn constant_levels_latch_the_full_on_off_bits() {
    let (master, pwm) = controller();
    pwm.set_constant(3, true).unwrap();
    pwm.set_constant(3, false).unwrap();
    let writes = master.writes();
    // Fully on: bit 4 of ON_H, zero counts. The OFF_H full-off bit must
    // stay clear, as it overrides everything else on the chip.
    assert_eq!(
        &writes[..4],
        &[
            (0x40, 0x12, 0x00),
            (0x40, 0x13, 0x10),
            (0x40, 0x14, 0x00),
            (0x40, 0x15, 0x00),
        ]
    );
    // Fully off: bit 4 of OFF_H.
    assert_eq!(
        &writes[4..],
        &[
            (0x40, 0x12, 0x00),
            (0x40, 0x13, 0x00),
            (0x40, 0x14, 0x00),
            (0x40, 0x15, 0x10),
        ]
    );
}

#[test]
fn off_counts_past_the_frame_end_wrap() {
    let (master, pwm) = controller();
    // on = 3072, off = 5120 - 4096 = 1024 in the next frame.
    pwm.fire_pwm(0, 50.0, 0.75).unwrap();
    assert_eq!(
        master.writes(),
        vec![
            (0x40, 0x06, 0x00),
            (0x40, 0x07, 0x0C),
            (0x40, 0x08, 0x00),
            (0x40, 0x09, 0x04),
        ]
    );
}

#[test]
fn broadcast_reaches_all_channels_in_one_quadruplet() {
    let (master, pwm) = controller();
    pwm.fire_all_pwm(50.0, 0.0).unwrap();
    assert_eq!(
        master.writes(),
        vec![
            (0x40, 0xFA, 0x00),
            (0x40, 0xFB, 0x00),
            (0x40, 0xFC, 0x00),
            (0x40, 0xFD, 0x08),
        ]
    );
}

#[test]
fn rejects_addresses_above_the_7_bit_range() {
    let master = Arc::new(RecordingMaster::default());
    assert!(matches!(
        Pca9685::new(master, 0x80),
        Err(Error::InvalidI2cAddress(0x80))
    ));
}

#[test]
fn drives_the_controller_through_the_bridge_adapter() {
    let transport = FakeTransport::new();
    let adapter = Arc::new(Ft232h::new(transport.clone(), quiet_config()));
    let pwm = Pca9685::with_default_address(adapter).unwrap();

    pwm.fire_pwm(0, 50.0, 0.0).unwrap();
    let i2c_writes = transport.state().i2c_writes.clone();
    assert_eq!(
        i2c_writes,
        vec![
            (0x40, vec![0x06, 0x00]),
            (0x40, vec![0x07, 0x00]),
            (0x40, vec![0x08, 0x00]),
            (0x40, vec![0x09, 0x08]),
        ]
    );
}
