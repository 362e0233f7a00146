//! HAWKEYE files are always little-endian on disk. Every multi-byte value moved between a packed
//! record buffer and a [`crate::PointRecord`] goes through the functions in this module, which
//! swap bytes only when the host is big-endian.

use std::sync::OnceLock;

static BIG_ENDIAN: OnceLock<bool> = OnceLock::new();

/// Returns `true` if the host stores multi-byte values most significant byte first
///
/// The answer is computed once per process from a known four byte pattern.
pub fn is_big_endian() -> bool {
    *BIG_ENDIAN.get_or_init(|| u32::from_ne_bytes([0x01, 0x02, 0x03, 0x04]) == 0x0102_0304)
}

/// Reverses the bytes of a 16 bit value
#[must_use]
pub const fn swap16(value: u16) -> u16 {
    value.swap_bytes()
}

/// Reverses the bytes of a 32 bit value
#[must_use]
pub const fn swap32(value: u32) -> u32 {
    value.swap_bytes()
}

/// Reverses the bytes of a 64 bit value
#[must_use]
pub const fn swap64(value: u64) -> u64 {
    value.swap_bytes()
}

fn normalize16(value: u16) -> u16 {
    if is_big_endian() {
        swap16(value)
    } else {
        value
    }
}

fn normalize32(value: u32) -> u32 {
    if is_big_endian() {
        swap32(value)
    } else {
        value
    }
}

fn normalize64(value: u64) -> u64 {
    if is_big_endian() {
        swap64(value)
    } else {
        value
    }
}

// The read_* helpers expect at least as many bytes as the value width; callers slice exactly.

pub(crate) fn read_u16(bytes: &[u8]) -> u16 {
    normalize16(u16::from_ne_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn read_u32(bytes: &[u8]) -> u32 {
    normalize32(u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub(crate) fn read_u64(bytes: &[u8]) -> u64 {
    let mut raw = [0; 8];
    raw.copy_from_slice(&bytes[..8]);
    normalize64(u64::from_ne_bytes(raw))
}

pub(crate) fn write_u16(out: &mut [u8], value: u16) {
    out[..2].copy_from_slice(&normalize16(value).to_ne_bytes());
}

pub(crate) fn write_u32(out: &mut [u8], value: u32) {
    out[..4].copy_from_slice(&normalize32(value).to_ne_bytes());
}

pub(crate) fn write_u64(out: &mut [u8], value: u64) {
    out[..8].copy_from_slice(&normalize64(value).to_ne_bytes());
}
