use super::*;

fn edit(position: u64) -> Edit {
    Edit {
        modifications: vec![Modification {
            position,
            removed: vec![],
            added: vec![b'x'],
        }],
    }
}

#[test]
fn record_advances_cursor_and_allows_undo() {
    let mut h = History::new();
    assert!(!h.can_undo());
    h.record(edit(0));
    assert!(h.can_undo());
    assert!(!h.can_redo());
}

#[test]
fn undo_then_record_truncates_redo_tail() {
    let mut h = History::new();
    h.record(edit(0));
    h.record(edit(1));
    assert!(h.undo().is_some());
    assert!(h.can_redo());
    h.record(edit(2));
    assert!(!h.can_redo());
    assert_eq!(h.len(), 2);
}

#[test]
fn undo_redo_round_trip() {
    let mut h = History::new();
    h.record(edit(5));
    let undone = h.undo().unwrap().modifications[0].position;
    assert_eq!(undone, 5);
    assert!(!h.can_undo());
    let redone = h.redo().unwrap().modifications[0].position;
    assert_eq!(redone, 5);
    assert!(h.can_undo());
    assert!(!h.can_redo());
}
