use super::*;

#[test]
fn display_includes_kind_code_and_message() {
    let err = TextEngineError::new(ErrorKind::Internal, "BAD_POS", "position out of range");
    let s = err.to_string();
    assert!(s.contains("Internal"));
    assert!(s.contains("BAD_POS"));
    assert!(s.contains("position out of range"));
}

#[test]
fn io_error_converts() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
    let err: TextEngineError = io_err.into();
    assert_eq!(err.kind, ErrorKind::Io);
}

#[test]
fn contains_msg_substring() {
    let err = TextEngineError::io("failed to open /tmp/x");
    assert!(err.contains_msg("/tmp/x"));
    assert!(!err.contains_msg("/tmp/y"));
}
