use crate::{FrameParseError, PAYLOAD_DISPLAY_LENGTH, PAYLOAD_LENGTH, TRANSCRIPT_LENGTH};

/* Encoding */

pub fn to_hex_digit(value: u32) -> u8 {
    const HEX_LUT: &[u8] = "0123456789ABCDEF".as_bytes();

    HEX_LUT[(value & 0xF) as usize]
}

pub fn u32_to_hex(raw: u32) -> [u8; 8] {
    [
        to_hex_digit(raw >> 28),
        to_hex_digit(raw >> 24),
        to_hex_digit(raw >> 20),
        to_hex_digit(raw >> 16),
        to_hex_digit(raw >> 12),
        to_hex_digit(raw >> 8),
        to_hex_digit(raw >> 4),
        to_hex_digit(raw),
    ]
}

/// Renders the payload as `AA BB CC ..`, uppercase with single spaces.
pub fn payload_to_hex(data: &[u8; PAYLOAD_LENGTH]) -> [u8; PAYLOAD_DISPLAY_LENGTH] {
    let mut buf = [b' '; PAYLOAD_DISPLAY_LENGTH];

    for (i, byte) in data.iter().enumerate() {
        buf[i * 3] = to_hex_digit((byte >> 4) as u32);
        buf[i * 3 + 1] = to_hex_digit(*byte as u32);
    }

    buf
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

pub fn u8_from_hex_nibbles(hex_nibbles: &[u8; 2]) -> Result<u8, FrameParseError> {
    let msn = hex_digit_to_u8(hex_nibbles[0])?;
    let lsn = hex_digit_to_u8(hex_nibbles[1])?;

    Ok((msn << 4) | lsn)
}

pub fn u32_from_hex(hex_nibbles: &[u8]) -> Result<u32, FrameParseError> {
    let mut value = 0u32;

    for nibble in hex_nibbles.iter() {
        value <<= 4;
        value |= hex_digit_to_u8(*nibble)? as u32;
    }

    Ok(value)
}

/// Strips whitespace and `0x`/`0X` prefixes from a hex transcript.
///
/// Only the first [`TRANSCRIPT_LENGTH`] remaining characters are kept, but
/// the returned count covers all of them so the caller can reject any other
/// length.
pub fn clean_transcript(text: &[u8]) -> ([u8; TRANSCRIPT_LENGTH], usize) {
    let mut buf = [0u8; TRANSCRIPT_LENGTH];
    let mut count = 0;
    let mut i = 0;

    while i < text.len() {
        let byte = text[i];

        if byte.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if byte == b'0' && matches!(text.get(i + 1), Some(b'x' | b'X')) {
            i += 2;
            continue;
        }

        if count < TRANSCRIPT_LENGTH {
            buf[count] = byte;
        }
        count += 1;
        i += 1;
    }

    (buf, count)
}
