//! Bit extraction
//!
//! Pulls an unsigned raw value out of a payload given a start bit, a length and a
//! byte order. The payload is treated as zero-extended: bits past its end read as
//! zero, whatever the start bit.

use crate::signals::ByteOrder;

/// Widest raw value the extractor produces
pub const MAX_BIT_LENGTH: u32 = 64;

/// Mask covering the low `length` bits
pub fn mask(length: u32) -> u64 {
    if length >= MAX_BIT_LENGTH {
        u64::MAX
    } else {
        (1u64 << length) - 1
    }
}

/// Extract `length` bits starting at `start_bit` using the given byte order
pub fn extract(data: &[u8], start_bit: u32, length: u32, byte_order: ByteOrder) -> u64 {
    match byte_order {
        ByteOrder::LittleEndian => extract_little_endian(data, start_bit, length),
        ByteOrder::BigEndian => extract_big_endian(data, start_bit, length),
    }
}

/// Extract signal with little-endian (Intel) byte order
///
/// Little-endian format:
/// - Start bit points to the LSB (least significant bit)
/// - Signal bit `k` sits at absolute bit `start_bit + k`
/// - Absolute bit `i` is bit `i % 8` of byte `i / 8`, bit 0 being the byte's LSB
pub fn extract_little_endian(data: &[u8], start_bit: u32, length: u32) -> u64 {
    let length = length.min(MAX_BIT_LENGTH);
    let mut result: u64 = 0;

    for k in 0..length {
        let bit_pos = start_bit as u64 + k as u64;
        if let Some(bit_value) = bit_at(data, bit_pos / 8, (bit_pos % 8) as u8) {
            result |= (bit_value as u64) << k;
        }
    }

    result
}

/// Extract signal with big-endian (Motorola) byte order
///
/// Big-endian format:
/// - Start bit points to the MSB of the signal, found in byte `start_bit / 8`
///   at bit `7 - start_bit % 8` (bit 7 being the byte's MSB)
/// - Following bits walk down through the byte; below bit 0 they continue at
///   bit 7 of the previous byte
/// - Bits are assembled MSB first
pub fn extract_big_endian(data: &[u8], start_bit: u32, length: u32) -> u64 {
    let length = length.min(MAX_BIT_LENGTH);
    let mut result: u64 = 0;

    // None once the walk has stepped before byte 0
    let mut byte_idx = Some(start_bit as u64 / 8);
    let mut bit_in_byte = 7 - (start_bit % 8) as u8;

    for _ in 0..length {
        let bit_value = byte_idx
            .and_then(|idx| bit_at(data, idx, bit_in_byte))
            .unwrap_or(0);
        result = (result << 1) | bit_value as u64;

        if bit_in_byte == 0 {
            byte_idx = byte_idx.and_then(|idx| idx.checked_sub(1));
            bit_in_byte = 7;
        } else {
            bit_in_byte -= 1;
        }
    }

    result
}

/// Read one bit, or `None` if the byte lies outside the payload
fn bit_at(data: &[u8], byte_idx: u64, bit_in_byte: u8) -> Option<u8> {
    let idx = usize::try_from(byte_idx).ok()?;
    data.get(idx).map(|byte| (byte >> bit_in_byte) & 0x01)
}
