use super::*;

fn op(position: u64, erase_len: u64, insert: &str) -> RawOp {
    RawOp {
        position,
        erase_len,
        insert: insert.as_bytes().to_vec(),
    }
}

fn text_of(buf: &Buffer) -> String {
    String::from_utf8(buf.get_clip(0, buf.length())).unwrap()
}

#[test]
fn new_unnamed_is_empty() {
    let handle = Buffer::new_unnamed(1);
    let buf = handle.borrow();
    assert_eq!(buf.length(), 0);
    assert!(!buf.can_undo());
    assert!(!buf.can_redo());
}

#[test]
fn insert_into_empty_buffer() {
    let handle = Buffer::new_unnamed(1);
    let mut buf = handle.borrow_mut();
    buf.modify(SourceId(0), &[op(0, 0, "hello")]);
    assert_eq!(text_of(&buf), "hello");
}

#[test]
fn insert_in_the_middle() {
    let handle = Buffer::new_unnamed(1);
    let mut buf = handle.borrow_mut();
    buf.modify(SourceId(0), &[op(0, 0, "ace")]);
    buf.modify(SourceId(0), &[op(1, 0, "b")]);
    buf.modify(SourceId(0), &[op(3, 0, "d")]);
    assert_eq!(text_of(&buf), "abcde");
}

#[test]
fn erase_range_spanning_multiple_small_chunks() {
    let handle = Buffer::new_unnamed(1);
    let mut buf = handle.borrow_mut();
    for ch in "abcdefgh".chars() {
        let len = buf.length();
        buf.modify(SourceId(0), &[op(len, 0, &ch.to_string())]);
    }
    assert_eq!(text_of(&buf), "abcdefgh");
    buf.modify(SourceId(0), &[op(2, 4, "")]);
    assert_eq!(text_of(&buf), "abgh");
}

#[test]
fn multiple_carets_in_one_edit_ascending_positions() {
    let handle = Buffer::new_unnamed(1);
    let mut buf = handle.borrow_mut();
    buf.modify(SourceId(0), &[op(0, 0, "abcde")]);
    // positions are post-earlier-ops-of-this-edit coordinates: the second op
    // targets what was index 4 in "abcde", shifted by the first op's insert.
    buf.modify(SourceId(0), &[op(1, 0, "X"), op(5, 0, "X")]);
    assert_eq!(text_of(&buf), "aXbcdXe");
}

#[test]
fn undo_restores_previous_content_and_redo_replays() {
    let handle = Buffer::new_unnamed(1);
    let mut buf = handle.borrow_mut();
    buf.modify(SourceId(0), &[op(0, 0, "abcde")]);
    buf.modify(SourceId(0), &[op(1, 0, "X"), op(5, 0, "X")]);
    assert_eq!(text_of(&buf), "aXbcdXe");

    buf.undo(SourceId(0));
    assert_eq!(text_of(&buf), "abcde");
    assert!(buf.can_redo());

    buf.redo(SourceId(0));
    assert_eq!(text_of(&buf), "aXbcdXe");
    assert!(!buf.can_redo());
}

#[test]
fn undo_without_history_is_none() {
    let handle = Buffer::new_unnamed(1);
    let mut buf = handle.borrow_mut();
    assert!(buf.undo(SourceId(0)).is_none());
}

#[test]
fn recording_after_undo_truncates_redo_tail() {
    let handle = Buffer::new_unnamed(1);
    let mut buf = handle.borrow_mut();
    buf.modify(SourceId(0), &[op(0, 0, "a")]);
    buf.modify(SourceId(0), &[op(1, 0, "b")]);
    buf.undo(SourceId(0));
    assert!(buf.can_redo());
    buf.modify(SourceId(0), &[op(1, 0, "c")]);
    assert!(!buf.can_redo());
    assert_eq!(text_of(&buf), "ac");
}

#[test]
fn at_positions_cursor_mid_document() {
    let handle = Buffer::new_unnamed(1);
    let mut buf = handle.borrow_mut();
    buf.modify(SourceId(0), &[op(0, 0, "hello world")]);
    let tail: Vec<u8> = buf.at(6).collect();
    assert_eq!(String::from_utf8(tail).unwrap(), "world");
    assert_eq!(buf.at(buf.length()).count(), 0);
}

#[test]
fn large_document_stays_consistent_across_many_edits() {
    let handle = Buffer::new_unnamed(1);
    let mut buf = handle.borrow_mut();
    let mut model = String::new();
    for i in 0..500 {
        let text = format!("{i} ");
        let pos = model.len() as u64;
        model.push_str(&text);
        buf.modify(SourceId(0), &[op(pos, 0, &text)]);
    }
    assert_eq!(text_of(&buf), model);
}

#[test]
fn at_locates_every_position_in_a_multi_chunk_document() {
    // Enough chunks to force a multi-level tree, so a find selector that
    // loses accumulated byte state across more than one right-descent
    // would return the wrong byte at many of these positions.
    let handle = Buffer::new_unnamed(1);
    let mut buf = handle.borrow_mut();
    let piece = "x".repeat(crate::constants::MAX_CHUNK_BYTES);
    let mut model = String::new();
    for _ in 0..20 {
        let pos = model.len() as u64;
        buf.modify(SourceId(0), &[op(pos, 0, &piece)]);
        model.push_str(&piece);
    }
    // mark every chunk boundary with a distinct byte so a wrong lookup is
    // detectable rather than silently matching due to repeated 'x's.
    for i in 0..20u64 {
        let pos = i * crate::constants::MAX_CHUNK_BYTES as u64;
        buf.modify(SourceId(0), &[op(pos, 1, &((b'A' + i as u8) as char).to_string())]);
        model.replace_range(pos as usize..pos as usize + 1, &((b'A' + i as u8) as char).to_string());
    }
    let bytes = model.as_bytes();
    for pos in (0..bytes.len()).step_by(1789) {
        let got: Vec<u8> = buf.at(pos as u64).take(1).collect();
        assert_eq!(got[0], bytes[pos], "mismatch at byte {pos}");
    }
}

#[test]
fn from_path_streams_file_into_chunks() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    use std::io::Write;
    write!(file, "contents of the file").unwrap();
    let handle = Buffer::from_path(file.path()).unwrap();
    let buf = handle.borrow();
    assert_eq!(text_of(&buf), "contents of the file");
    assert!(matches!(buf.identity(), Identity::Path(_)));
}

#[test]
fn from_path_missing_file_errors() {
    let result = Buffer::from_path("/nonexistent/path/does/not/exist");
    assert!(result.is_err());
}

#[derive(Default)]
struct Recorder {
    begin_edits: usize,
    end_edits: usize,
    end_modifies: usize,
}

impl BufferObserver for Recorder {
    fn begin_edit(&mut self, _edit_type: EditType, _source: SourceId) {
        self.begin_edits += 1;
    }

    fn end_edit(&mut self, _edit_type: EditType, _source: SourceId, _journal: &[JournalEntry]) {
        self.end_edits += 1;
    }

    fn end_modify(&mut self, _position: u64, _erased: &[u8], _inserted: &[u8]) {
        self.end_modifies += 1;
    }
}

#[test]
fn observers_see_begin_and_end_edit() {
    let handle = Buffer::new_unnamed(1);
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let as_observer: Rc<RefCell<dyn BufferObserver>> = recorder.clone();
    {
        let mut buf = handle.borrow_mut();
        buf.subscribe(&as_observer);
        buf.modify(SourceId(0), &[op(0, 0, "hi"), op(2, 0, "!")]);
    }
    let r = recorder.borrow();
    assert_eq!(r.begin_edits, 1);
    assert_eq!(r.end_edits, 1);
    assert_eq!(r.end_modifies, 2);
}

#[test]
fn unsubscribed_observer_stops_receiving_events() {
    let handle = Buffer::new_unnamed(1);
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let as_observer: Rc<RefCell<dyn BufferObserver>> = recorder.clone();
    {
        let mut buf = handle.borrow_mut();
        let token = buf.subscribe(&as_observer);
        buf.modify(SourceId(0), &[op(0, 0, "a")]);
        buf.unsubscribe(token);
        buf.modify(SourceId(0), &[op(1, 0, "b")]);
    }
    assert_eq!(recorder.borrow().end_edits, 1);
}
