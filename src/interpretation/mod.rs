//! Interpretation: the encoding-aware index over a buffer — a chunk index
//! translating bytes to codepoints, and the line registry built on top of
//! it, kept in sync with the buffer incrementally rather than by a full
//! re-decode on every edit.
//!
//! The chunk index reuses the same generic `Tree` as the byte buffer and
//! the line registry (grounded on the teacher's AVL piece table, same as
//! `buffer::rope`), but its nodes aggregate `(bytes, codepoints)` runs of up
//! to [`crate::constants::MAX_CODEPOINTS_PER_CHUNK`] codepoints instead of
//! raw bytes.
//!
//! Unlike the other character-indexed observers (carets, theme maps, fold
//! registry), this one does not subscribe through [`crate::buffer::BufferObserver`]:
//! its fixup needs to read buffer bytes near the edit for context, and the
//! buffer is already mutably borrowed for the whole `modify`/`undo`/`redo`
//! call, so a `BufferObserver::end_modify` callback cannot safely re-borrow
//! it. Instead `Interpretation` owns the edit calls that touch a buffer it
//! indexes (`on_insert`/`on_delete`/`on_backspace`) and resyncs itself right
//! after `buffer.modify()` returns, when the borrow has been released; for
//! edits applied directly to the buffer (`undo`/`redo`, or an external
//! collaborator), the caller resyncs explicitly via
//! [`Interpretation::resync_after_edit`]. See DESIGN.md.

use std::collections::VecDeque;

use crate::buffer::{BufferHandle, EditType, JournalEntry, RawOp, SourceId};
use crate::caret::CaretSet;
use crate::character::{DecodedCodepoint, Ending};
use crate::constants::{LineEnding, MAX_CODEPOINTS_PER_CHUNK};
use crate::encoding::Encoding;
use crate::line_registry::{self, LineRecord, Registry as LineRegistry};
use crate::tree::{FindSelector, Step, Summary, Tree};

/// One run of decoded bytes: how many bytes and how many codepoints it
/// covers. Boundaries between entries are always codepoint boundaries,
/// since entries are only ever produced by this module's own decode loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkEntry {
    pub bytes: usize,
    pub codepoints: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkIndexSummary {
    pub bytes: usize,
    pub codepoints: usize,
}

impl Summary<ChunkEntry> for ChunkIndexSummary {
    fn identity() -> Self {
        ChunkIndexSummary::default()
    }

    fn of_value(value: &ChunkEntry) -> Self {
        ChunkIndexSummary {
            bytes: value.bytes,
            codepoints: value.codepoints,
        }
    }

    fn combine(left: &Self, right: &Self) -> Self {
        ChunkIndexSummary {
            bytes: left.bytes + right.bytes,
            codepoints: left.codepoints + right.codepoints,
        }
    }
}

struct ByteLocate {
    target: usize,
    consumed_bytes: usize,
    consumed_codepoints: usize,
}

impl FindSelector<ChunkEntry, ChunkIndexSummary> for ByteLocate {
    fn visit(&mut self, left: &ChunkIndexSummary, value: &ChunkEntry, _own: &ChunkIndexSummary) -> Step {
        if self.target < left.bytes {
            Step::Left
        } else if self.target < left.bytes + value.bytes {
            self.consumed_bytes += left.bytes;
            self.consumed_codepoints += left.codepoints;
            Step::Hit
        } else {
            self.consumed_bytes += left.bytes + value.bytes;
            self.consumed_codepoints += left.codepoints + value.codepoints;
            self.target -= left.bytes + value.bytes;
            Step::Right
        }
    }
}

struct CodepointLocate {
    target: usize,
    consumed_bytes: usize,
    consumed_codepoints: usize,
}

impl FindSelector<ChunkEntry, ChunkIndexSummary> for CodepointLocate {
    fn visit(&mut self, left: &ChunkIndexSummary, value: &ChunkEntry, _own: &ChunkIndexSummary) -> Step {
        if self.target < left.codepoints {
            Step::Left
        } else if self.target < left.codepoints + value.codepoints {
            self.consumed_bytes += left.bytes;
            self.consumed_codepoints += left.codepoints;
            Step::Hit
        } else {
            self.consumed_bytes += left.bytes + value.bytes;
            self.consumed_codepoints += left.codepoints + value.codepoints;
            self.target -= left.codepoints + value.codepoints;
            Step::Right
        }
    }
}

/// Pulls codepoints one at a time out of a byte iterator, buffering only as
/// many trailing bytes as `encoding.max_codepoint_length()` requires.
struct CodepointReader<'a, I: Iterator<Item = u8>> {
    source: I,
    pending: VecDeque<u8>,
    encoding: &'a dyn Encoding,
}

impl<'a, I: Iterator<Item = u8>> CodepointReader<'a, I> {
    fn new(source: I, encoding: &'a dyn Encoding) -> Self {
        CodepointReader {
            source,
            pending: VecDeque::new(),
            encoding,
        }
    }

    fn fill(&mut self) {
        let want = self.encoding.max_codepoint_length();
        while self.pending.len() < want {
            match self.source.next() {
                Some(b) => self.pending.push_back(b),
                None => break,
            }
        }
    }

    fn next(&mut self) -> Option<DecodedCodepoint> {
        self.fill();
        if self.pending.is_empty() {
            return None;
        }
        let slice: Vec<u8> = self.pending.iter().copied().collect();
        let decoded = self.encoding.next_codepoint(&slice);
        for _ in 0..decoded.byte_len {
            self.pending.pop_front();
        }
        Some(decoded)
    }
}

/// Decode a full byte stream into chunk-index entries (split every
/// `MAX_CODEPOINTS_PER_CHUNK` codepoints) and the `(is_cr, is_lf)` stream the
/// line analyzer consumes.
fn decode_stream<I: Iterator<Item = u8>>(mut reader: CodepointReader<'_, I>) -> (Vec<ChunkEntry>, Vec<(bool, bool)>) {
    let mut entries = Vec::new();
    let mut marks = Vec::new();
    let mut cur_bytes = 0usize;
    let mut cur_codepoints = 0usize;
    while let Some(dc) = reader.next() {
        marks.push((dc.is_cr(), dc.is_lf()));
        cur_bytes += dc.byte_len;
        cur_codepoints += 1;
        if cur_codepoints == MAX_CODEPOINTS_PER_CHUNK {
            entries.push(ChunkEntry {
                bytes: cur_bytes,
                codepoints: cur_codepoints,
            });
            cur_bytes = 0;
            cur_codepoints = 0;
        }
    }
    if cur_codepoints > 0 {
        entries.push(ChunkEntry {
            bytes: cur_bytes,
            codepoints: cur_codepoints,
        });
    }
    (entries, marks)
}

/// How carets should be reconciled after an edit: recomputed from their own
/// patched byte caches (`normal`/`external` edits), or replaced with one
/// selection per replayed modification (`undo`/`redo`) — see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretFixupMode {
    Track,
    Replay,
}

/// A position within the document, decoded on demand: codepoint, line,
/// column, the line's hard-break ending, and whether this position sits at
/// that ending.
#[derive(Debug, Clone, Copy)]
pub struct CharacterInfo {
    pub codepoint: u32,
    pub line: usize,
    pub column: usize,
    pub ending: Ending,
    pub at_linebreak: bool,
}

/// Stateful cursor over characters, advanced one at a time.
pub struct CharacterIterator<'a> {
    interp: &'a Interpretation,
    pos: usize,
}

impl<'a> CharacterIterator<'a> {
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn info(&self) -> Option<CharacterInfo> {
        if self.pos >= self.interp.lines.total_characters() {
            return None;
        }
        let (line_idx, column) = self.interp.lines.character_to_line(self.pos);
        let line = self.interp.lines.line(line_idx).copied().unwrap_or_else(LineRecord::empty_last);
        let at_linebreak = column == line.nonbreak_chars && !line.ending.is_none();
        let codepoint = self.interp.codepoint_at_character(self.pos);
        Some(CharacterInfo {
            codepoint,
            line: line_idx,
            column,
            ending: line.ending,
            at_linebreak,
        })
    }

    pub fn advance(&mut self) {
        self.pos += 1;
    }
}

pub struct Interpretation {
    buffer: BufferHandle,
    encoding: Box<dyn Encoding>,
    chunk_index: Tree<ChunkEntry, ChunkIndexSummary>,
    lines: LineRegistry,
    default_ending: LineEnding,
}

impl Interpretation {
    /// Fully decode `buffer` under `encoding`.
    pub fn new(buffer: BufferHandle, encoding: Box<dyn Encoding>) -> Self {
        let (chunk_index, lines) = {
            let buf = buffer.borrow();
            let reader = CodepointReader::new(buf.at(0), encoding.as_ref());
            let (entries, marks) = decode_stream(reader);
            let lines = LineRegistry::from_records(line_registry::analyze(marks));
            (entries.into_iter().collect(), lines)
        };
        Interpretation {
            buffer,
            encoding,
            chunk_index,
            lines,
            default_ending: LineEnding::platform_default(),
        }
    }

    pub fn buffer(&self) -> &BufferHandle {
        &self.buffer
    }

    pub fn encoding(&self) -> &dyn Encoding {
        self.encoding.as_ref()
    }

    pub fn lines(&self) -> &LineRegistry {
        &self.lines
    }

    pub fn default_ending(&self) -> LineEnding {
        self.default_ending
    }

    pub fn total_bytes(&self) -> u64 {
        self.chunk_index.summary().bytes as u64
    }

    pub fn total_codepoints(&self) -> usize {
        self.chunk_index.summary().codepoints
    }

    fn locate_by_byte(&self, byte: u64) -> (usize, u64, usize) {
        if self.chunk_index.is_empty() {
            return (0, 0, 0);
        }
        let mut sel = ByteLocate {
            target: byte as usize,
            consumed_bytes: 0,
            consumed_codepoints: 0,
        };
        match self.chunk_index.find(&mut sel) {
            Some((idx, _)) => (idx, sel.consumed_bytes as u64, sel.consumed_codepoints),
            None => (
                self.chunk_index.len(),
                self.chunk_index.summary().bytes as u64,
                self.chunk_index.summary().codepoints,
            ),
        }
    }

    fn locate_by_codepoint(&self, cp: usize) -> (usize, u64, usize) {
        if self.chunk_index.is_empty() {
            return (0, 0, 0);
        }
        let mut sel = CodepointLocate {
            target: cp,
            consumed_bytes: 0,
            consumed_codepoints: 0,
        };
        match self.chunk_index.find(&mut sel) {
            Some((idx, _)) => (idx, sel.consumed_bytes as u64, sel.consumed_codepoints),
            None => (
                self.chunk_index.len(),
                self.chunk_index.summary().bytes as u64,
                self.chunk_index.summary().codepoints,
            ),
        }
    }

    /// Translate a byte offset to `(codepoint_idx, byte_idx_of_that_codepoint)`.
    /// The returned byte index is always ≤ `byte`, equal iff `byte` is a
    /// codepoint start.
    pub fn byte_to_codepoint(&self, byte: u64) -> (usize, u64) {
        let total_bytes = self.chunk_index.summary().bytes as u64;
        let byte = byte.min(total_bytes);
        let (_, mut b, mut cp) = self.locate_by_byte(byte);
        if b >= byte {
            return (cp, b);
        }
        let buf = self.buffer.borrow();
        let mut reader = CodepointReader::new(buf.at(b), self.encoding.as_ref());
        loop {
            if b >= byte {
                break;
            }
            let Some(dc) = reader.next() else { break };
            if b + dc.byte_len as u64 <= byte {
                b += dc.byte_len as u64;
                cp += 1;
            } else {
                break;
            }
        }
        (cp, b)
    }

    /// Translate a codepoint index to the byte offset of its first byte.
    pub fn codepoint_to_byte(&self, cp: usize) -> u64 {
        let total_codepoints = self.chunk_index.summary().codepoints;
        let cp = cp.min(total_codepoints);
        let (_, mut b, mut c) = self.locate_by_codepoint(cp);
        if c >= cp {
            return b;
        }
        let buf = self.buffer.borrow();
        let mut reader = CodepointReader::new(buf.at(b), self.encoding.as_ref());
        while c < cp {
            let Some(dc) = reader.next() else { break };
            b += dc.byte_len as u64;
            c += 1;
        }
        b
    }

    pub fn character_to_byte(&self, ch: usize) -> u64 {
        self.codepoint_to_byte(self.lines.character_to_codepoint(ch))
    }

    pub fn byte_to_character(&self, byte: u64) -> usize {
        let (cp, _) = self.byte_to_codepoint(byte);
        self.lines.codepoint_to_character(cp)
    }

    fn codepoint_at_character(&self, ch: usize) -> u32 {
        let cp = self.lines.character_to_codepoint(ch);
        let byte = self.codepoint_to_byte(cp);
        let buf = self.buffer.borrow();
        let mut reader = CodepointReader::new(buf.at(byte), self.encoding.as_ref());
        reader.next().map(|dc| dc.value).unwrap_or(0)
    }

    /// A cursor positioned at character `ch`.
    pub fn at_character(&self, ch: usize) -> CharacterIterator<'_> {
        CharacterIterator { interp: self, pos: ch }
    }

    /// Re-decode and check chunk-index/line-registry totals and contents
    /// against a fresh full decode of the buffer.
    #[cfg(debug_assertions)]
    pub fn check_integrity(&self) {
        let buf = self.buffer.borrow();
        let reader = CodepointReader::new(buf.at(0), self.encoding.as_ref());
        let (entries, marks) = decode_stream(reader);
        let fresh_chunks: Tree<ChunkEntry, ChunkIndexSummary> = entries.into_iter().collect();
        debug_assert_eq!(
            fresh_chunks.summary().bytes,
            self.chunk_index.summary().bytes,
            "chunk index byte total diverged from a full re-decode"
        );
        debug_assert_eq!(
            fresh_chunks.summary().codepoints,
            self.chunk_index.summary().codepoints,
            "chunk index codepoint total diverged from a full re-decode"
        );
        let fresh_lines = line_registry::analyze(marks);
        let current: Vec<LineRecord> = self.lines.iter().copied().collect();
        debug_assert_eq!(fresh_lines, current, "line registry diverged from a full re-decode");
    }

    /// Re-decode chunk index and line registry entries overlapping
    /// `[touch_start, touch_end)` (old, pre-edit byte coordinates), given
    /// the edit's net byte delta. Widens to whole chunk-index entries and
    /// whole lines so the redecoded window always starts and ends on a
    /// line boundary (required for the line analyzer to run correctly) and
    /// on an entry boundary (required to remove whole entries).
    fn resync_window(&mut self, touch_start: u64, touch_end: u64, diff: i64) {
        if self.chunk_index.is_empty() && touch_start == 0 && touch_end == 0 {
            // nothing existed and nothing was touched in old coordinates;
            // still may need to decode a fresh insert at the very start.
        }
        let (mut idx_lo, _, _) = self.locate_by_byte(touch_start);
        let (mut idx_hi, _, _) = if touch_end == touch_start {
            (idx_lo, 0u64, 0usize)
        } else {
            let (idx, b, c) = self.locate_by_byte(touch_end - 1);
            (idx + 1, b, c)
        };
        idx_hi = idx_hi.max(idx_lo);

        let mut first_line;
        let mut last_line;
        loop {
            let cp_lo = self.codepoints_before(idx_lo);
            let cp_hi = self.codepoints_before(idx_hi);
            first_line = self.lines.codepoint_to_line(cp_lo).0;
            last_line = if cp_hi == 0 {
                0
            } else {
                self.lines.codepoint_to_line(cp_hi - 1).0
            };
            let line_cp_lo = self.lines.codepoint_of_line_start(first_line);
            let line_cp_hi = if last_line + 1 < self.lines.len() {
                self.lines.codepoint_of_line_start(last_line + 1)
            } else {
                self.lines.total_codepoints()
            };
            let (new_idx_lo, _, _) = self.locate_by_codepoint(line_cp_lo);
            let new_idx_hi = if line_cp_hi == 0 {
                new_idx_lo
            } else {
                let (idx, _, _) = self.locate_by_codepoint(line_cp_hi - 1);
                idx + 1
            };
            if new_idx_lo == idx_lo && new_idx_hi == idx_hi {
                break;
            }
            idx_lo = new_idx_lo;
            idx_hi = new_idx_hi.max(new_idx_lo);
        }
        // The window's decode always runs through to `byte_end_new`; when
        // that reaches the document's end, the redecoded lines carry their
        // own trailing empty sentinel, so the old one must be in the
        // replaced range too or it survives as a stray duplicate.
        if idx_hi >= self.chunk_index.len() {
            last_line = self.lines.len() - 1;
        }

        let byte_start = self.bytes_before(idx_lo);
        let byte_end_old = self.bytes_before(idx_hi);
        let byte_end_new = (byte_end_old as i64 + diff) as u64;

        let new_bytes = self.buffer.borrow().get_clip(byte_start, byte_end_new);
        let (new_entries, marks) = decode_stream(CodepointReader::new(new_bytes.into_iter(), self.encoding.as_ref()));
        let mut new_lines = line_registry::analyze(marks);

        // `analyze` always appends a trailing `Ending::None` sentinel. That's
        // correct only when this window reaches the document's end; for an
        // interior window it's a spurious extra line, so fuse its leftover
        // nonbreak characters (if any) into the surviving line right after
        // the window and extend the splice to cover that line instead.
        let mut splice_end = last_line + 1;
        if splice_end < self.lines.len() {
            let tail = new_lines.pop().expect("analyze always emits at least one record");
            let next = *self.lines.line(splice_end).expect("splice_end is within bounds");
            new_lines.push(line_registry::LineRecord {
                nonbreak_chars: tail.nonbreak_chars + next.nonbreak_chars,
                ending: next.ending,
            });
            splice_end += 1;
        }

        self.chunk_index.remove_range(idx_lo, idx_hi);
        for (i, entry) in new_entries.into_iter().enumerate() {
            self.chunk_index.insert(idx_lo + i, entry);
        }
        self.lines.splice(first_line, splice_end, new_lines);
    }

    fn codepoints_before(&self, idx: usize) -> usize {
        if idx == 0 {
            return 0;
        }
        if idx >= self.chunk_index.len() {
            return self.chunk_index.summary().codepoints;
        }
        self.chunk_index.iter().take(idx).map(|e| e.codepoints).sum()
    }

    fn bytes_before(&self, idx: usize) -> u64 {
        if idx == 0 {
            return 0;
        }
        if idx >= self.chunk_index.len() {
            return self.chunk_index.summary().bytes as u64;
        }
        self.chunk_index.iter().take(idx).map(|e| e.bytes as u64).sum()
    }

    /// Apply a batch of per-caret `(old_byte_start, old_byte_end, insert)`
    /// edits (ascending, non-overlapping, in current buffer coordinates) as
    /// one atomic edit, resync the index, and fix up `carets`.
    fn apply(
        &mut self,
        carets: &mut CaretSet,
        edits: Vec<(u64, u64, Vec<u8>)>,
        source: SourceId,
        mode: CaretFixupMode,
    ) -> Vec<JournalEntry> {
        if edits.is_empty() {
            return Vec::new();
        }
        let mut raw_ops = Vec::with_capacity(edits.len());
        let mut diff: i64 = 0;
        let touch_start = edits[0].0;
        let mut touch_end = edits[0].1;
        for (s, e, insert) in &edits {
            touch_end = touch_end.max(*e);
            raw_ops.push(RawOp {
                position: (*s as i64 + diff) as u64,
                erase_len: e - s,
                insert: insert.clone(),
            });
            diff += insert.len() as i64 - (*e as i64 - *s as i64);
        }
        let journal = self.buffer.borrow_mut().modify(source, &raw_ops);
        self.resync_window(touch_start, touch_end, diff);
        match mode {
            CaretFixupMode::Track => carets.fixup_from_journal(&journal, |b| self.byte_to_character(b)),
            CaretFixupMode::Replay => carets.replace_with_replay(&journal, |b| self.byte_to_character(b)),
        }
        journal
    }

    /// Insert `text` at every caret, replacing its selection if non-empty.
    pub fn on_insert(&mut self, carets: &mut CaretSet, text: &[u8], source: SourceId) -> Vec<JournalEntry> {
        if !carets.bytepos_valid() {
            carets.calculate_byte_positions(|ch| self.character_to_byte(ch));
        }
        let edits: Vec<(u64, u64, Vec<u8>)> = carets
            .iter()
            .map(|(_, data)| (data.bytepos_first, data.bytepos_second, text.to_vec()))
            .collect();
        self.apply(carets, edits, source, CaretFixupMode::Track)
    }

    /// Delete forward: each selection is erased; each point caret erases
    /// the one character ahead of it.
    pub fn on_delete(&mut self, carets: &mut CaretSet, source: SourceId) -> Vec<JournalEntry> {
        if !carets.bytepos_valid() {
            carets.calculate_byte_positions(|ch| self.character_to_byte(ch));
        }
        let total_chars = self.lines.total_characters();
        let mut edits = Vec::new();
        for (caret, data) in carets.iter() {
            if caret.is_point() {
                let next = (caret.caret_pos + 1).min(total_chars);
                let end_byte = self.character_to_byte(next);
                if end_byte > data.bytepos_first {
                    edits.push((data.bytepos_first, end_byte, Vec::new()));
                }
            } else {
                edits.push((data.bytepos_first, data.bytepos_second, Vec::new()));
            }
        }
        self.apply(carets, edits, source, CaretFixupMode::Track)
    }

    /// Backspace: each selection is erased; each point caret erases the
    /// one character behind it.
    pub fn on_backspace(&mut self, carets: &mut CaretSet, source: SourceId) -> Vec<JournalEntry> {
        if !carets.bytepos_valid() {
            carets.calculate_byte_positions(|ch| self.character_to_byte(ch));
        }
        let mut edits = Vec::new();
        for (caret, data) in carets.iter() {
            if caret.is_point() {
                if caret.caret_pos == 0 {
                    continue;
                }
                let start_byte = self.character_to_byte(caret.caret_pos - 1);
                if start_byte < data.bytepos_first {
                    edits.push((start_byte, data.bytepos_first, Vec::new()));
                }
            } else {
                edits.push((data.bytepos_first, data.bytepos_second, Vec::new()));
            }
        }
        self.apply(carets, edits, source, CaretFixupMode::Track)
    }

    /// Resync the chunk index and line registry after an edit applied
    /// directly to the buffer (`Buffer::undo`/`redo`, or an external
    /// collaborator), then fix up `carets` per `mode`.
    pub fn resync_after_edit(&mut self, carets: &mut CaretSet, journal: &[JournalEntry], mode: CaretFixupMode) {
        if journal.is_empty() {
            return;
        }
        let touch_start = journal.iter().map(|j| j.position).min().unwrap();
        let touch_end = journal.iter().map(|j| j.position + j.removed_len).max().unwrap();
        let diff: i64 = journal.iter().map(|j| j.added_len as i64 - j.removed_len as i64).sum();
        self.resync_window(touch_start, touch_end, diff);
        match mode {
            CaretFixupMode::Track => carets.fixup_from_journal(journal, |b| self.byte_to_character(b)),
            CaretFixupMode::Replay => carets.replace_with_replay(journal, |b| self.byte_to_character(b)),
        }
    }

    /// Convenience for callers driving `Buffer::undo`: resyncs and restores
    /// carets to the replayed selection (`EditType::Undo`/`Redo` both use
    /// this — see DESIGN.md).
    pub fn on_buffer_replay(&mut self, carets: &mut CaretSet, journal: &[JournalEntry], _edit_type: EditType) {
        self.resync_after_edit(carets, journal, CaretFixupMode::Replay);
    }
}
