//! Pin model and the pin bank: the authoritative map of every GPIO line's
//! configured mode and last known level.

use crate::bits;
use crate::consts::{mpsse, PIN_COUNT};
use crate::error::{Error, Result};

/// The sixteen GPIO lines of the bridge, split in two physical byte groups:
/// D0-D7 (low group, ordinals 0-7) and C0-C7 (high group, ordinals 8-15).
///
/// D0-D3 are wired to the serial engine (clock, data out, data in, select)
/// and are permanently reserved — see [`PinMode::SpecialFunction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GpioPin {
    D0 = 0,
    D1 = 1,
    D2 = 2,
    D3 = 3,
    D4 = 4,
    D5 = 5,
    D6 = 6,
    D7 = 7,
    C0 = 8,
    C1 = 9,
    C2 = 10,
    C3 = 11,
    C4 = 12,
    C5 = 13,
    C6 = 14,
    C7 = 15,
}

/// The two physical byte groups of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinGroup {
    /// D0-D7, shared with the serial engine on D0-D3.
    Low,
    /// C0-C7, plain I/O.
    High,
}

/// Configured function of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output,
    /// Reserved for the serial protocol engine (I2C clock/data/select).
    /// Pins in this mode can never transition to `Input` or `Output`.
    SpecialFunction,
}

/// Last known electrical level of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioLevel {
    Low,
    High,
    /// The line is not a controllable I/O line (serial engine pins).
    Unknown,
}

impl GpioPin {
    /// All pins in ordinal order.
    pub const ALL: [GpioPin; PIN_COUNT as usize] = [
        GpioPin::D0,
        GpioPin::D1,
        GpioPin::D2,
        GpioPin::D3,
        GpioPin::D4,
        GpioPin::D5,
        GpioPin::D6,
        GpioPin::D7,
        GpioPin::C0,
        GpioPin::C1,
        GpioPin::C2,
        GpioPin::C3,
        GpioPin::C4,
        GpioPin::C5,
        GpioPin::C6,
        GpioPin::C7,
    ];

    /// Looks a pin up by its ordinal (0-15).
    pub fn from_number(number: u8) -> Option<GpioPin> {
        GpioPin::ALL.get(number as usize).copied()
    }

    /// Returns the pin ordinal (0-15).
    #[inline]
    pub fn number(&self) -> u8 {
        *self as u8
    }

    /// Returns the physical byte group the pin belongs to.
    #[inline]
    pub fn group(&self) -> PinGroup {
        if self.number() < 8 {
            PinGroup::Low
        } else {
            PinGroup::High
        }
    }

    /// Returns the bit index (0-7) within the pin's byte group.
    #[inline]
    pub fn bit_index(&self) -> u8 {
        self.number() % 8
    }

    /// Returns the bit mask within the pin's byte group.
    #[inline]
    pub fn mask(&self) -> u8 {
        1u8 << self.bit_index()
    }
}

/// The authoritative pin ordinal -> (mode, level) map.
///
/// The composite direction and value masks are always derived on demand from
/// this map, never stored, so they cannot diverge from it. All mutation goes
/// through the adapter's exclusive lock.
#[derive(Debug, Clone)]
pub struct PinBank {
    modes: [PinMode; PIN_COUNT as usize],
    levels: [GpioLevel; PIN_COUNT as usize],
}

impl Default for PinBank {
    fn default() -> Self {
        Self::new()
    }
}

impl PinBank {
    /// Creates the bank in its power-on configuration: D0-D3 reserved for
    /// the serial engine with no readable level, every other pin an output
    /// driven low.
    pub fn new() -> Self {
        let mut modes = [PinMode::Output; PIN_COUNT as usize];
        let mut levels = [GpioLevel::Low; PIN_COUNT as usize];
        for pin in 0..4 {
            modes[pin] = PinMode::SpecialFunction;
            levels[pin] = GpioLevel::Unknown;
        }
        PinBank { modes, levels }
    }

    /// Returns the configured mode of a pin.
    #[inline]
    pub fn mode(&self, pin: GpioPin) -> PinMode {
        self.modes[pin.number() as usize]
    }

    /// Returns the last known level of a pin.
    #[inline]
    pub fn level(&self, pin: GpioPin) -> GpioLevel {
        self.levels[pin.number() as usize]
    }

    /// Reconfigures a pin as input or output.
    ///
    /// Fails with [`Error::PinReserved`] for serial-engine pins. Setting the
    /// mode a pin already has is a no-op.
    pub fn set_mode(&mut self, pin: GpioPin, mode: PinMode) -> Result<()> {
        if self.mode(pin) == PinMode::SpecialFunction {
            return Err(Error::PinReserved { pin });
        }
        self.modes[pin.number() as usize] = mode;
        Ok(())
    }

    /// Records the last known level of a pin. Levels are written by the pin
    /// write path (outputs) and by the poller (inputs).
    pub(crate) fn set_level(&mut self, pin: GpioPin, level: GpioLevel) {
        self.levels[pin.number() as usize] = level;
    }

    /// Folds the bank into a 32-bit mask, setting the bit at each pin's
    /// ordinal when the predicate holds for that pin.
    pub fn compute_mask<F>(&self, predicate: F) -> u32
    where
        F: Fn(GpioPin, PinMode, GpioLevel) -> bool,
    {
        let mut mask = 0u32;
        for pin in GpioPin::ALL {
            if predicate(pin, self.mode(pin), self.level(pin)) {
                mask = bits::set(mask, pin.number());
            } else {
                mask = bits::clear(mask, pin.number());
            }
        }
        mask
    }

    /// Mask of pins currently configured as inputs, one bit per ordinal.
    pub fn input_mask(&self) -> u16 {
        self.compute_mask(|_, mode, _| mode == PinMode::Input) as u16
    }

    /// Derives the direction byte for one byte group (bit set = output).
    ///
    /// The low-group byte keeps D0-D3 masked out so the serial engine's
    /// lines are never overwritten.
    pub fn direction_byte(&self, group: PinGroup) -> u8 {
        let mask = self.compute_mask(|_, mode, _| mode == PinMode::Output);
        Self::group_byte(mask, group)
    }

    /// Derives the output value byte for one byte group (bit set = high),
    /// with the same reserved-line masking as [`Self::direction_byte`].
    pub fn value_byte(&self, group: PinGroup) -> u8 {
        let mask = self.compute_mask(|_, _, level| level == GpioLevel::High);
        Self::group_byte(mask, group)
    }

    fn group_byte(mask: u32, group: PinGroup) -> u8 {
        match group {
            PinGroup::Low => (mask & 0xFF) as u8 & mpsse::LOW_GROUP_IO_MASK,
            PinGroup::High => ((mask >> 8) & 0xFF) as u8 & mpsse::HIGH_GROUP_IO_MASK,
        }
    }

    /// Folds a polled 16-bit snapshot into the stored levels of all pins
    /// currently configured as inputs.
    pub(crate) fn apply_snapshot(&mut self, snapshot: u16) {
        for pin in GpioPin::ALL {
            if self.mode(pin) == PinMode::Input {
                let level = if bits::is_set(snapshot as u32, pin.number()) {
                    GpioLevel::High
                } else {
                    GpioLevel::Low
                };
                self.set_level(pin, level);
            }
        }
    }
}
