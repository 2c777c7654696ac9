use embedded_can::{ExtendedId, StandardId};
use heapless::Vec;

use crate::{FrameParseError, MAX_LINE_SIZE};

/* Encoding */

pub fn to_hex_digit(value: u32) -> u8 {
    const HEX_LUT: &[u8] = "0123456789ABCDEF".as_bytes();

    HEX_LUT[(value & 0xF) as usize]
}

/// Uppercase, zero padded, most significant nibble first
pub fn to_hex_digits<const N: usize>(value: u32) -> [u8; N] {
    let mut digits = [b'0'; N];

    for (index, digit) in digits.iter_mut().rev().enumerate() {
        *digit = to_hex_digit(value.checked_shr(4 * index as u32).unwrap_or(0));
    }

    digits
}

pub fn standard_id_to_hex(id: StandardId) -> [u8; 3] {
    to_hex_digits(id.as_raw() as u32)
}

pub fn extended_id_to_hex(id: ExtendedId) -> [u8; 8] {
    to_hex_digits(id.as_raw())
}

pub fn byte_to_hex(byte: u8) -> [u8; 2] {
    to_hex_digits(byte as u32)
}

/// Appends to a line whose layout is already bounded by `MAX_LINE_SIZE`.
pub(crate) fn push_all(line: &mut Vec<u8, MAX_LINE_SIZE>, bytes: &[u8]) {
    line.extend_from_slice(bytes).expect("Encoded line exceeds MAX_LINE_SIZE");
}

/* Decoding */

pub fn hex_digit_to_u8(byte: u8) -> Result<u8, FrameParseError> {
    Ok(match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        b'A'..=b'F' => byte - b'A' + 10,
        _ => return Err(FrameParseError::IllegalHexDigit(byte)),
    })
}

pub fn dec_digit_to_u8(byte: u8) -> Result<u8, FrameParseError> {
    Ok(match byte {
        b'0'..=b'9' => byte - b'0',
        _ => return Err(FrameParseError::IllegalDecimalDigit(byte)),
    })
}

/// Parses 1..=8 big-endian hex digits. Shared by IDs, payload bytes, the
/// acceptance registers and the bit-timing registers.
pub fn u32_from_hex(hex_digits: &[u8]) -> Result<u32, FrameParseError> {
    if hex_digits.is_empty() || hex_digits.len() > 8 {
        return Err(FrameParseError::InvalidHexFieldLength(hex_digits.len()));
    }

    hex_digits.iter().try_fold(0u32, |value, digit| {
        Ok((value << 4) | hex_digit_to_u8(*digit)? as u32)
    })
}

pub fn u8_from_hex_nibbles(hex_nibbles: &[u8; 2]) -> Result<u8, FrameParseError> {
    let msn = hex_digit_to_u8(hex_nibbles[0])?;
    let lsn = hex_digit_to_u8(hex_nibbles[1])?;

    Ok((msn << 4) | lsn)
}

pub fn standard_id_from_hex(hex_nibbles: &[u8; 3]) -> Result<StandardId, FrameParseError> {
    let value = u32_from_hex(hex_nibbles)? as u16;

    StandardId::new(value).ok_or(FrameParseError::StandardIdOutOfRange(value))
}

pub fn extended_id_from_hex(hex_nibbles: &[u8; 8]) -> Result<ExtendedId, FrameParseError> {
    let value = u32_from_hex(hex_nibbles)?;

    ExtendedId::new(value).ok_or(FrameParseError::ExtendedIdOutOfRange(value))
}

/// Decodes `2 × expected_length` hex digits into the leading bytes of an
/// 8 byte payload array.
pub fn unpack_data_bytes(
    hex_bytes: &[u8],
    expected_length: usize,
) -> Result<[u8; 8], FrameParseError> {
    // Make sure data is multiple of 2 (otherwise we can't parse the hex digits)
    if hex_bytes.len() % 2 != 0 {
        return Err(FrameParseError::InvalidEncodedDataLength(
            hex_bytes.len() as u8
        ));
    }

    // Make sure the data length matches the DLC
    if hex_bytes.len() / 2 != expected_length {
        return Err(FrameParseError::MismatchedDataLength(
            expected_length as u8,
            hex_bytes.len() / 2,
        ));
    }

    if expected_length > 8 {
        return Err(FrameParseError::InvalidDataLengthCode(expected_length as u8));
    }

    let mut data = [0u8; 8];

    for (byte, pair) in data.iter_mut().zip(hex_bytes.chunks_exact(2)) {
        *byte = u8_from_hex_nibbles(&[pair[0], pair[1]])?;
    }

    Ok(data)
}
