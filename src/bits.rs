//! Bit manipulation helpers for the 32-bit pin masks.

/// Returns `mask` with the bit at `bit` set.
#[inline]
pub fn set(mask: u32, bit: u8) -> u32 {
    mask | (1u32 << bit)
}

/// Returns `mask` with the bit at `bit` cleared.
#[inline]
pub fn clear(mask: u32, bit: u8) -> u32 {
    mask & !(1u32 << bit)
}

/// Tests the bit at `bit`.
#[inline]
pub fn is_set(mask: u32, bit: u8) -> bool {
    mask & (1u32 << bit) != 0
}
