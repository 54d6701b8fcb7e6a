//! Modified UTF-8, the string encoding of `CONSTANT_Utf8` entries and of `DataOutput.writeUTF`.
//!
//! It differs from standard UTF-8 in two ways: U+0000 is written as the two bytes
//! `C0 80`, and supplementary characters are written as a UTF-16 surrogate pair with each
//! surrogate encoded separately in three bytes. Four-byte sequences never occur.

use crate::Result;

/// Decodes modified UTF-8 into a Rust string.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] for truncated or invalid sequences and for
/// unpaired surrogates, which have no Rust string representation.
pub fn decode(bytes: &[u8]) -> Result<String> {
    if bytes.is_ascii() && !bytes.contains(&0) {
        return Ok(bytes.iter().map(|&b| b as char).collect());
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        let b0 = bytes[pos];
        match b0 {
            0x01..=0x7F => {
                units.push(u16::from(b0));
                pos += 1;
            }
            0xC0..=0xDF => {
                let b1 = continuation(bytes, pos + 1)?;
                units.push((u16::from(b0 & 0x1F) << 6) | b1);
                pos += 2;
            }
            0xE0..=0xEF => {
                let b1 = continuation(bytes, pos + 1)?;
                let b2 = continuation(bytes, pos + 2)?;
                units.push((u16::from(b0 & 0x0F) << 12) | (b1 << 6) | b2);
                pos += 3;
            }
            _ => {
                return Err(malformed_error!(
                    "Invalid modified UTF-8 lead byte 0x{:02X} at {}",
                    b0,
                    pos
                ))
            }
        }
    }

    String::from_utf16(&units)
        .map_err(|_| malformed_error!("Modified UTF-8 string contains an unpaired surrogate"))
}

fn continuation(bytes: &[u8], pos: usize) -> Result<u16> {
    match bytes.get(pos) {
        Some(&b) if b & 0xC0 == 0x80 => Ok(u16::from(b & 0x3F)),
        Some(&b) => Err(malformed_error!(
            "Invalid modified UTF-8 continuation byte 0x{:02X} at {}",
            b,
            pos
        )),
        None => Err(malformed_error!("Truncated modified UTF-8 sequence")),
    }
}

/// Encodes a string as modified UTF-8.
#[must_use]
pub fn encode(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii() {
        assert_eq!(decode(b"java/io/Serializable").unwrap(), "java/io/Serializable");
        assert_eq!(encode("serialVersionUID"), b"serialVersionUID");
    }

    #[test]
    fn nul_uses_two_bytes() {
        assert_eq!(encode("a\0b"), [b'a', 0xC0, 0x80, b'b']);
        assert_eq!(decode(&[b'a', 0xC0, 0x80, b'b']).unwrap(), "a\0b");
        assert!(decode(&[b'a', 0x00]).is_err());
    }

    #[test]
    fn bmp_and_supplementary() {
        assert_eq!(encode("\u{e9}"), [0xC3, 0xA9]);
        assert_eq!(encode("\u{20AC}"), [0xE2, 0x82, 0xAC]);

        // U+1F600 becomes the surrogates D83D DE00, three bytes each
        let emoji = encode("\u{1F600}");
        assert_eq!(emoji, [0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80]);
        assert_eq!(decode(&emoji).unwrap(), "\u{1F600}");
    }

    #[test]
    fn invalid_sequences() {
        assert!(decode(&[0xF0, 0x9F, 0x98, 0x80]).is_err());
        assert!(decode(&[0xC3]).is_err());
        assert!(decode(&[0xE2, 0x28, 0xA1]).is_err());
        assert!(decode(&[0xED, 0xA0, 0xBD]).is_err());
    }
}
