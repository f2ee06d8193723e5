//! Base64 variable-length quantity codec used by the `mappings` field.

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const CONTINUATION_BIT: u8 = 0b10_0000;
const VALUE_MASK: u8 = 0b01_1111;
const SHIFT: u32 = 5;

/// Maps a base64 character to its 6-bit value.
fn decode_char(c: u8) -> Option<u8> {
    match c {
        b'A'..=b'Z' => Some(c - b'A'),
        b'a'..=b'z' => Some(c - b'a' + 26),
        b'0'..=b'9' => Some(c - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Decodes every VLQ value in a single segment (the text between commas).
///
/// Returns `None` on an invalid character, a dangling continuation, or a value
/// that does not fit in an `i64`.
pub fn decode_segment(segment: &str) -> Option<Vec<i64>> {
    let mut values = Vec::with_capacity(5);
    let mut accum: u64 = 0;
    let mut shift: u32 = 0;
    let mut pending = false;

    for &c in segment.as_bytes() {
        let digit = decode_char(c)?;
        if shift >= 60 {
            return None;
        }
        accum |= u64::from(digit & VALUE_MASK) << shift;
        if digit & CONTINUATION_BIT != 0 {
            shift += SHIFT;
            pending = true;
            continue;
        }
        let magnitude = (accum >> 1) as i64;
        values.push(if accum & 1 == 1 { -magnitude } else { magnitude });
        accum = 0;
        shift = 0;
        pending = false;
    }

    if pending {
        return None;
    }
    Some(values)
}

/// Appends the VLQ encoding of `value` to `out`.
pub fn encode_value(value: i64, out: &mut String) {
    let mut vlq: u64 = if value < 0 {
        (value.unsigned_abs() << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = (vlq & u64::from(VALUE_MASK)) as u8;
        vlq >>= SHIFT;
        if vlq > 0 {
            digit |= CONTINUATION_BIT;
        }
        out.push(ALPHABET[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}
