//! Internal constants: MPSSE command bytes, reserved-line masks and the
//! PCA9685 register map.

/// Number of GPIO lines exposed by the bridge (two 8-bit byte groups).
pub const PIN_COUNT: u8 = 16;

// --- MPSSE GPIO Related Constants ---
pub mod mpsse {
    //! Opcodes of the MPSSE GPIO commands. The full byte sequencing is the
    //! vendor engine's contract; only the opcodes and the 3-byte
    //! `[opcode, value, direction]` write frame shape are relied on here.

    /// Set the D0-D7 byte group (low byte): `[0x80, value, direction]`.
    pub const SET_DATA_BITS_LOW: u8 = 0x80;
    /// Read the D0-D7 byte group, one byte returned.
    pub const GET_DATA_BITS_LOW: u8 = 0x81;
    /// Set the C0-C7 byte group (high byte): `[0x82, value, direction]`.
    pub const SET_DATA_BITS_HIGH: u8 = 0x82;
    /// Read the C0-C7 byte group, one byte returned.
    pub const GET_DATA_BITS_HIGH: u8 = 0x83;
    /// Flush the read buffer back to the host immediately.
    pub const SEND_IMMEDIATE: u8 = 0x87;

    /// D0-D3 carry the serial engine (clock, data out, data in, select).
    /// Direction and value bytes for the low group are masked with this so
    /// the reserved lines are never overwritten.
    pub const LOW_GROUP_IO_MASK: u8 = 0xF0;
    /// All eight high-group lines are plain I/O.
    pub const HIGH_GROUP_IO_MASK: u8 = 0xFF;
}

// --- PCA9685 PWM Controller Constants ---
pub mod pca9685 {
    /// Default 7-bit bus address (A5..A0 straps low).
    pub const DEFAULT_ADDRESS: u8 = 0x40;
    /// Internal oscillator frequency in Hz.
    pub const OSC_HZ: u32 = 25_000_000;
    /// Counts per PWM frame (12-bit counter).
    pub const RESOLUTION: u16 = 4096;
    /// Number of LED/PWM output channels.
    pub const CHANNEL_COUNT: u8 = 16;

    // Register addresses
    pub mod reg {
        pub const MODE1: u8 = 0x00;
        pub const MODE2: u8 = 0x01;
        /// First register of the LED0 quadruplet; channel `n` lives at
        /// `LED0_ON_L + 4 * n` (ON_L, ON_H, OFF_L, OFF_H).
        pub const LED0_ON_L: u8 = 0x06;
        /// First register of the broadcast quadruplet driving all channels.
        pub const ALL_LED_ON_L: u8 = 0xFA;
        /// Prescaler for the output frequency; writable only while asleep.
        pub const PRE_SCALE: u8 = 0xFE;
    }

    // MODE1 register bits
    pub mod mode1 {
        pub const RESTART: u8 = 0x80;
        pub const AUTO_INCREMENT: u8 = 0x20;
        /// Low-power mode, oscillator off. Required while writing PRE_SCALE.
        pub const SLEEP: u8 = 0x10;
    }

    // MODE2 register bits
    pub mod mode2 {
        /// Totem-pole output structure (clear for open-drain).
        pub const OUTDRV: u8 = 0x04;
    }

    // LEDn_ON_H / LEDn_OFF_H control bits
    pub mod led {
        /// Bit 4 of an ON_H register: channel fully on, counts ignored.
        pub const FULL_ON: u8 = 0x10;
        /// Bit 4 of an OFF_H register: channel fully off. Takes precedence
        /// over the counts and over FULL_ON.
        pub const FULL_OFF: u8 = 0x10;
    }

    /// Hardware floor of the prescale register (datasheet table 5).
    pub const PRESCALE_MIN: u8 = 0x03;
    pub const PRESCALE_MAX: u8 = 0xFF;
}
