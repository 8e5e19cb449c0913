use super::*;

#[test]
fn utf8_ascii_round_trips() {
    let enc = Utf8;
    let bytes = enc.encode_codepoint('A' as u32);
    assert_eq!(bytes, b"A");
    let decoded = enc.next_codepoint(&bytes);
    assert_eq!(decoded.value, 'A' as u32);
    assert_eq!(decoded.byte_len, 1);
    assert!(decoded.valid);
}

#[test]
fn utf8_multibyte_round_trips() {
    let enc = Utf8;
    for ch in ['\u{00E9}', '\u{4E2D}', '\u{1D800}'] {
        let bytes = enc.encode_codepoint(ch as u32);
        let decoded = enc.next_codepoint(&bytes);
        assert!(decoded.valid);
        assert_eq!(decoded.value, ch as u32);
        assert_eq!(decoded.byte_len, bytes.len());
    }
}

#[test]
fn utf8_invalid_byte_falls_back_and_advances_one() {
    let enc = Utf8;
    let decoded = enc.next_codepoint(&[0xFF, b'a']);
    assert!(!decoded.valid);
    assert_eq!(decoded.value, REPLACEMENT_CODEPOINT);
    assert_eq!(decoded.byte_len, 1);
}

#[test]
fn utf8_truncated_multibyte_at_end_falls_back() {
    let enc = Utf8;
    let decoded = enc.next_codepoint(&[0xE2, 0x82]);
    assert!(!decoded.valid);
    assert_eq!(decoded.byte_len, 1);
}

#[test]
fn utf16le_bmp_round_trips() {
    let enc = Utf16::little_endian();
    let bytes = enc.encode_codepoint('H' as u32);
    assert_eq!(bytes, vec![b'H', 0]);
    let decoded = enc.next_codepoint(&bytes);
    assert_eq!(decoded.value, 'H' as u32);
    assert_eq!(decoded.byte_len, 2);
}

#[test]
fn utf16le_surrogate_pair_round_trips() {
    let enc = Utf16::little_endian();
    let cp = 0x1F600u32; // outside the BMP
    let bytes = enc.encode_codepoint(cp);
    assert_eq!(bytes.len(), 4);
    let decoded = enc.next_codepoint(&bytes);
    assert!(decoded.valid);
    assert_eq!(decoded.value, cp);
    assert_eq!(decoded.byte_len, 4);
}

#[test]
fn utf16be_matches_opposite_byte_order() {
    let le = Utf16::little_endian();
    let be = Utf16::big_endian();
    let cp = 'Z' as u32;
    let le_bytes = le.encode_codepoint(cp);
    let be_bytes = be.encode_codepoint(cp);
    assert_ne!(le_bytes, be_bytes);
    assert_eq!(be.next_codepoint(&be_bytes).value, cp);
}

#[test]
fn utf16_unpaired_surrogate_falls_back() {
    let enc = Utf16::little_endian();
    let high_only = enc.write_u16(0xD800).to_vec();
    let decoded = enc.next_codepoint(&high_only);
    assert!(!decoded.valid);
    assert_eq!(decoded.byte_len, 2);
}
