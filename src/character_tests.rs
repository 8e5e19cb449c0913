use super::*;

#[test]
fn ending_codepoint_and_character_lengths() {
    assert_eq!(Ending::None.codepoint_len(), 0);
    assert_eq!(Ending::Cr.codepoint_len(), 1);
    assert_eq!(Ending::Lf.codepoint_len(), 1);
    assert_eq!(Ending::CrLf.codepoint_len(), 2);

    assert_eq!(Ending::None.character_len(), 0);
    assert_eq!(Ending::Cr.character_len(), 1);
    assert_eq!(Ending::Lf.character_len(), 1);
    assert_eq!(Ending::CrLf.character_len(), 1);
}

#[test]
fn replacement_codepoint_is_invalid_and_advances() {
    let d = DecodedCodepoint::replacement(0);
    assert!(!d.valid);
    assert_eq!(d.value, 0xFFFD);
    assert_eq!(d.byte_len, 1);
}

#[test]
fn cr_lf_detection() {
    let cr = DecodedCodepoint {
        value: '\r' as u32,
        byte_len: 1,
        valid: true,
    };
    let lf = DecodedCodepoint {
        value: '\n' as u32,
        byte_len: 1,
        valid: true,
    };
    assert!(cr.is_cr());
    assert!(lf.is_lf());
    assert!(!cr.is_lf());
}
