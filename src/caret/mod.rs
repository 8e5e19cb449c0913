//! Caret set: carets ordered by position, with overlap-merging on insert.
//!
//! Positions are absolute character indices rather than cumulative offsets
//! in a sequence, so a `BTreeMap` keyed by `(caret, anchor)` is the
//! idiomatic Rust fit here rather than the generic augmented `Tree` used
//! for the byte/line/fold/softbreak structures (see DESIGN.md).

use std::collections::BTreeMap;

/// A caret: `caret_pos` is where the cursor blinks, `anchor_pos` is the
/// other end of the selection (equal to `caret_pos` for an empty selection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub caret_pos: usize,
    pub anchor_pos: usize,
}

impl Caret {
    pub fn point(pos: usize) -> Self {
        Caret {
            caret_pos: pos,
            anchor_pos: pos,
        }
    }

    pub fn min(&self) -> usize {
        self.caret_pos.min(self.anchor_pos)
    }

    pub fn max(&self) -> usize {
        self.caret_pos.max(self.anchor_pos)
    }

    pub fn is_point(&self) -> bool {
        self.caret_pos == self.anchor_pos
    }
}

/// Per-caret cached data: visual alignment column, whether the caret prefers
/// the start of the next soft-wrapped line at a break, and cached byte
/// offsets for the two endpoints (smaller first).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaretData {
    pub alignment: usize,
    pub softbreak_next_line: bool,
    pub bytepos_first: u64,
    pub bytepos_second: u64,
}

/// Merge "master" `(mc, ms)` with "slave" `(sc, ss)`, per the contract's
/// four-case predicate.
pub fn merge(master: Caret, slave: Caret) -> Option<Caret> {
    let (mc, ms) = (master.caret_pos, master.anchor_pos);
    let (sc, ss) = (slave.caret_pos, slave.anchor_pos);
    let s_min = sc.min(ss);
    let s_max = sc.max(ss);
    let m_min = mc.min(ms);
    let m_max = mc.max(ms);

    if mc == ms && (s_min..=s_max).contains(&mc) {
        return Some(slave);
    }
    if sc == ss && (m_min..=m_max).contains(&sc) {
        return Some(master);
    }
    if m_max < s_min || s_max < m_min {
        return None;
    }

    let g_min = m_min.min(s_min);
    let g_max = m_max.max(s_max);
    // The caret lands on whichever end lies on the same side as `mc` did
    // relative to `ms`; the opposite-ends configuration is impossible for
    // overlapping ranges under this predicate.
    let new_caret = if mc <= ms { g_min } else { g_max };
    let new_anchor = if new_caret == g_min { g_max } else { g_min };
    Some(Caret {
        caret_pos: new_caret,
        anchor_pos: new_anchor,
    })
}

/// Ordered by each caret's `min()` position — ranges never overlap once
/// merged, so this key is unique and gives the "ordered by caret pair"
/// iteration order the contract calls for.
#[derive(Debug, Clone, Default)]
pub struct CaretSet {
    carets: BTreeMap<usize, (Caret, CaretData)>,
    bytepos_valid: bool,
}

impl CaretSet {
    pub fn new() -> Self {
        CaretSet {
            carets: BTreeMap::new(),
            bytepos_valid: false,
        }
    }

    pub fn len(&self) -> usize {
        self.carets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Caret, CaretData)> {
        self.carets.values()
    }

    pub fn bytepos_valid(&self) -> bool {
        self.bytepos_valid
    }

    pub fn invalidate_bytepos(&mut self) {
        self.bytepos_valid = false;
    }

    /// Recompute byte offsets for every caret from a character→byte
    /// converter, and mark the cache valid.
    pub fn calculate_byte_positions(&mut self, mut character_to_byte: impl FnMut(usize) -> u64) {
        for (caret, data) in self.carets.values_mut() {
            let a = character_to_byte(caret.min());
            let b = character_to_byte(caret.max());
            data.bytepos_first = a.min(b);
            data.bytepos_second = a.max(b);
        }
        self.bytepos_valid = true;
    }

    /// Insert `entry`, merging with every existing caret whose range
    /// overlaps it. `entry` is always the "master" side of the merge
    /// predicate.
    pub fn add(&mut self, entry: Caret) {
        self.invalidate_bytepos();
        let mut merged = entry;
        loop {
            let overlapping = self
                .carets
                .values()
                .find(|(c, _)| merge(merged, *c).is_some())
                .map(|(c, _)| *c);
            match overlapping {
                Some(existing) => {
                    self.carets.remove(&existing.min());
                    merged = merge(merged, existing).expect("checked above");
                }
                None => break,
            }
        }
        self.carets.insert(merged.min(), (merged, CaretData::default()));
    }

    /// Patch every caret through an edit's position journal: each endpoint's
    /// cached byte offset is advanced with the `back` policy (per the
    /// contract), then character positions are recomputed from those bytes
    /// via `byte_to_character`. Used for `normal`/`external` edits, where
    /// carets track their own text through the change.
    pub fn fixup_from_journal(
        &mut self,
        journal: &[crate::buffer::JournalEntry],
        mut byte_to_character: impl FnMut(u64) -> usize,
    ) {
        let old: Vec<(Caret, CaretData)> = self.carets.values().copied().collect();
        self.carets.clear();
        for (caret, mut data) in old {
            let was_point = caret.is_point();
            let caret_first_was_min = caret.min() == caret.caret_pos;
            data.bytepos_first = crate::edit::patch_position(journal, data.bytepos_first, crate::edit::PatchPolicy::Back);
            data.bytepos_second = crate::edit::patch_position(journal, data.bytepos_second, crate::edit::PatchPolicy::Back);
            let lo = byte_to_character(data.bytepos_first);
            let hi = if was_point { lo } else { byte_to_character(data.bytepos_second) };
            let new_caret = if was_point {
                Caret::point(lo)
            } else if caret_first_was_min {
                Caret {
                    caret_pos: lo,
                    anchor_pos: hi,
                }
            } else {
                Caret {
                    caret_pos: hi,
                    anchor_pos: lo,
                }
            };
            self.carets.insert(new_caret.min(), (new_caret, data));
        }
        self.bytepos_valid = true;
    }

    /// Replace the whole caret set with one point caret per journal entry,
    /// selecting exactly the span the replay inserted. Used for
    /// `undo`/`redo` edits, which replay a stored modification rather than
    /// tracking live text, so there is no "same caret, moved" to recompute —
    /// the replayed region itself is what the caller wants highlighted.
    pub fn replace_with_replay(
        &mut self,
        journal: &[crate::buffer::JournalEntry],
        mut byte_to_character: impl FnMut(u64) -> usize,
    ) {
        self.carets.clear();
        self.bytepos_valid = false;
        for entry in journal {
            let anchor = byte_to_character(entry.position);
            let caret = byte_to_character(entry.position + entry.added_len);
            self.add(Caret {
                caret_pos: caret,
                anchor_pos: anchor,
            });
        }
    }
}
