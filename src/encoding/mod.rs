//! Encodings: decode/encode between bytes and Unicode scalar values.
//!
//! Invalid sequences never fail the caller; they decode to the replacement
//! codepoint and still advance by at least one byte, so a decode loop is
//! always guaranteed to terminate.

use crate::character::DecodedCodepoint;
use crate::constants::REPLACEMENT_CODEPOINT;

/// Decode/encode behavior for one text encoding.
pub trait Encoding {
    fn name(&self) -> &'static str;
    /// Upper bound on bytes any single codepoint can be encoded into.
    fn max_codepoint_length(&self) -> usize;
    /// Decode the codepoint starting at `bytes[0]`. `bytes` may be a prefix
    /// of the real data (the caller re-slices on each call); returns the
    /// replacement codepoint and a byte length of at least 1 on any
    /// malformed input, including empty input never being called for (the
    /// caller must not call this at end of buffer).
    fn next_codepoint(&self, bytes: &[u8]) -> DecodedCodepoint;
    fn encode_codepoint(&self, codepoint: u32) -> Vec<u8>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8;

impl Encoding for Utf8 {
    fn name(&self) -> &'static str {
        "UTF-8"
    }

    fn max_codepoint_length(&self) -> usize {
        4
    }

    fn next_codepoint(&self, bytes: &[u8]) -> DecodedCodepoint {
        if bytes.is_empty() {
            return DecodedCodepoint::replacement(1);
        }
        let b0 = bytes[0];
        let expected_len = if b0 & 0x80 == 0 {
            1
        } else if b0 & 0xE0 == 0xC0 {
            2
        } else if b0 & 0xF0 == 0xE0 {
            3
        } else if b0 & 0xF8 == 0xF0 {
            4
        } else {
            return DecodedCodepoint::replacement(1);
        };
        if bytes.len() < expected_len {
            tracing::debug!(len = expected_len, available = bytes.len(), "utf-8 sequence truncated");
            return DecodedCodepoint::replacement(1);
        }
        for &cont in &bytes[1..expected_len] {
            if cont & 0xC0 != 0x80 {
                tracing::debug!("invalid utf-8 continuation byte, falling back to replacement");
                return DecodedCodepoint::replacement(1);
            }
        }
        match std::str::from_utf8(&bytes[..expected_len]) {
            Ok(s) => {
                let ch = s.chars().next().expect("non-empty validated str");
                DecodedCodepoint {
                    value: ch as u32,
                    byte_len: expected_len,
                    valid: true,
                }
            }
            Err(_) => {
                tracing::debug!("invalid utf-8 sequence, falling back to replacement");
                DecodedCodepoint::replacement(1)
            }
        }
    }

    fn encode_codepoint(&self, codepoint: u32) -> Vec<u8> {
        char::from_u32(codepoint)
            .map(|c| c.to_string().into_bytes())
            .unwrap_or_else(|| {
                char::from_u32(REPLACEMENT_CODEPOINT)
                    .unwrap()
                    .to_string()
                    .into_bytes()
            })
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Utf16Endian {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy)]
pub struct Utf16 {
    pub endian: Utf16Endian,
}

impl Utf16 {
    pub fn little_endian() -> Self {
        Utf16 {
            endian: Utf16Endian::Little,
        }
    }

    pub fn big_endian() -> Self {
        Utf16 {
            endian: Utf16Endian::Big,
        }
    }

    fn read_u16(&self, bytes: &[u8]) -> u16 {
        match self.endian {
            Utf16Endian::Little => u16::from_le_bytes([bytes[0], bytes[1]]),
            Utf16Endian::Big => u16::from_be_bytes([bytes[0], bytes[1]]),
        }
    }

    fn write_u16(&self, value: u16) -> [u8; 2] {
        match self.endian {
            Utf16Endian::Little => value.to_le_bytes(),
            Utf16Endian::Big => value.to_be_bytes(),
        }
    }
}

impl Encoding for Utf16 {
    fn name(&self) -> &'static str {
        match self.endian {
            Utf16Endian::Little => "UTF-16LE",
            Utf16Endian::Big => "UTF-16BE",
        }
    }

    fn max_codepoint_length(&self) -> usize {
        4
    }

    fn next_codepoint(&self, bytes: &[u8]) -> DecodedCodepoint {
        if bytes.len() < 2 {
            tracing::debug!("utf-16 sequence truncated, falling back to replacement");
            return DecodedCodepoint::replacement(bytes.len().max(1));
        }
        let unit = self.read_u16(bytes);
        if (0xD800..=0xDBFF).contains(&unit) {
            if bytes.len() < 4 {
                tracing::debug!("unpaired utf-16 high surrogate at end of input");
                return DecodedCodepoint::replacement(2);
            }
            let low = self.read_u16(&bytes[2..4]);
            if !(0xDC00..=0xDFFF).contains(&low) {
                tracing::debug!("unpaired utf-16 high surrogate");
                return DecodedCodepoint::replacement(2);
            }
            let value = 0x10000 + (((unit as u32) - 0xD800) << 10) + ((low as u32) - 0xDC00);
            DecodedCodepoint {
                value,
                byte_len: 4,
                valid: true,
            }
        } else if (0xDC00..=0xDFFF).contains(&unit) {
            tracing::debug!("unpaired utf-16 low surrogate");
            DecodedCodepoint::replacement(2)
        } else {
            DecodedCodepoint {
                value: unit as u32,
                byte_len: 2,
                valid: true,
            }
        }
    }

    fn encode_codepoint(&self, codepoint: u32) -> Vec<u8> {
        if codepoint > 0x10FFFF || (0xD800..=0xDFFF).contains(&codepoint) {
            return self.write_u16(REPLACEMENT_CODEPOINT as u16).to_vec();
        }
        if codepoint <= 0xFFFF {
            self.write_u16(codepoint as u16).to_vec()
        } else {
            let v = codepoint - 0x10000;
            let high = 0xD800 + (v >> 10);
            let low = 0xDC00 + (v & 0x3FF);
            let mut out = self.write_u16(high as u16).to_vec();
            out.extend_from_slice(&self.write_u16(low as u16));
            out
        }
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
