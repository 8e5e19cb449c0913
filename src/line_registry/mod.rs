//! Line registry: an ordered sequence of line records backed by the generic
//! tree, with the CR/LF merge and split rules from the edit contract.

use crate::character::Ending;
use crate::tree::{FindSelector, Step, Summary, Tree};

/// One line: non-breaking codepoints, then the hard linebreak it ends with.
/// Exactly one record in a registry (the last) has `ending == Ending::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRecord {
    pub nonbreak_chars: usize,
    pub ending: Ending,
}

impl LineRecord {
    pub fn empty_last() -> Self {
        LineRecord {
            nonbreak_chars: 0,
            ending: Ending::None,
        }
    }

    pub fn codepoints(&self) -> usize {
        self.nonbreak_chars + self.ending.codepoint_len()
    }

    pub fn characters(&self) -> usize {
        self.nonbreak_chars + self.ending.character_len()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LineSummary {
    pub codepoints: usize,
    pub characters: usize,
    pub linebreaks: usize,
}

impl Summary<LineRecord> for LineSummary {
    fn identity() -> Self {
        LineSummary::default()
    }

    fn of_value(value: &LineRecord) -> Self {
        LineSummary {
            codepoints: value.codepoints(),
            characters: value.characters(),
            linebreaks: if value.ending.is_none() { 0 } else { 1 },
        }
    }

    fn combine(left: &Self, right: &Self) -> Self {
        LineSummary {
            codepoints: left.codepoints + right.codepoints,
            characters: left.characters + right.characters,
            linebreaks: left.linebreaks + right.linebreaks,
        }
    }
}

/// Result metadata from an insert/erase, telling the caller whether a CRLF
/// fused or split at either boundary (so character-range reporting upstream
/// can account for the fused pair counting as one character).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditFlags {
    pub merge_front: bool,
    pub merge_back: bool,
    pub split: bool,
}

/// Outcome of the codepoint-by-codepoint linebreak scan.
struct Analyzer {
    lines: Vec<LineRecord>,
    nonbreak: usize,
    pending_cr: bool,
}

impl Analyzer {
    fn new() -> Self {
        Analyzer {
            lines: Vec::new(),
            nonbreak: 0,
            pending_cr: false,
        }
    }

    fn feed(&mut self, is_cr: bool, is_lf: bool) {
        if self.pending_cr {
            self.pending_cr = false;
            if is_lf {
                self.lines.push(LineRecord {
                    nonbreak_chars: self.nonbreak,
                    ending: Ending::CrLf,
                });
                self.nonbreak = 0;
                return;
            }
            self.lines.push(LineRecord {
                nonbreak_chars: self.nonbreak,
                ending: Ending::Cr,
            });
            self.nonbreak = 0;
        }
        if is_cr {
            self.pending_cr = true;
        } else if is_lf {
            self.lines.push(LineRecord {
                nonbreak_chars: self.nonbreak,
                ending: Ending::Lf,
            });
            self.nonbreak = 0;
        } else {
            self.nonbreak += 1;
        }
    }

    fn finish(mut self) -> Vec<LineRecord> {
        if self.pending_cr {
            self.lines.push(LineRecord {
                nonbreak_chars: self.nonbreak,
                ending: Ending::Cr,
            });
            self.nonbreak = 0;
        }
        self.lines.push(LineRecord {
            nonbreak_chars: self.nonbreak,
            ending: Ending::None,
        });
        self.lines
    }
}

/// Feed a run of codepoints (as `(is_cr, is_lf)` pairs) through the
/// linebreak automaton and return the resulting line records, the last of
/// which always has `Ending::None`.
pub fn analyze<I: IntoIterator<Item = (bool, bool)>>(codepoints: I) -> Vec<LineRecord> {
    let mut a = Analyzer::new();
    for (is_cr, is_lf) in codepoints {
        a.feed(is_cr, is_lf);
    }
    a.finish()
}

pub struct Registry {
    lines: Tree<LineRecord, LineSummary>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

struct CodepointLocate {
    target: usize,
    consumed_codepoints: usize,
}

impl FindSelector<LineRecord, LineSummary> for CodepointLocate {
    fn visit(&mut self, left: &LineSummary, value: &LineRecord, _own: &LineSummary) -> Step {
        if self.target < left.codepoints {
            Step::Left
        } else if self.target < left.codepoints + value.codepoints() {
            self.consumed_codepoints += left.codepoints;
            Step::Hit
        } else {
            self.consumed_codepoints += left.codepoints + value.codepoints();
            self.target -= left.codepoints + value.codepoints();
            Step::Right
        }
    }
}

struct CharacterLocate {
    target: usize,
    consumed_characters: usize,
}

impl FindSelector<LineRecord, LineSummary> for CharacterLocate {
    fn visit(&mut self, left: &LineSummary, value: &LineRecord, _own: &LineSummary) -> Step {
        if self.target < left.characters {
            Step::Left
        } else if self.target < left.characters + value.characters() {
            self.consumed_characters += left.characters;
            Step::Hit
        } else {
            self.consumed_characters += left.characters + value.characters();
            self.target -= left.characters + value.characters();
            Step::Right
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        let mut lines = Tree::new();
        lines.push_back(LineRecord::empty_last());
        Registry { lines }
    }

    pub fn from_records(records: Vec<LineRecord>) -> Self {
        debug_assert!(
            records.iter().filter(|r| r.ending.is_none()).count() == 1,
            "exactly one line record must have Ending::None"
        );
        Registry {
            lines: records.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, idx: usize) -> Option<&LineRecord> {
        self.lines.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineRecord> {
        self.lines.iter()
    }

    pub fn total_codepoints(&self) -> usize {
        self.lines.summary().codepoints
    }

    pub fn total_characters(&self) -> usize {
        self.lines.summary().characters
    }

    pub fn total_linebreaks(&self) -> usize {
        self.lines.summary().linebreaks
    }

    /// The character position of the first codepoint of line `idx`.
    pub fn character_of_line_start(&self, idx: usize) -> usize {
        let mut total = 0;
        for (i, line) in self.lines.iter().enumerate() {
            if i == idx {
                break;
            }
            total += line.characters();
        }
        total
    }

    /// The codepoint position of the first codepoint of line `idx`.
    pub fn codepoint_of_line_start(&self, idx: usize) -> usize {
        let mut total = 0;
        for (i, line) in self.lines.iter().enumerate() {
            if i == idx {
                break;
            }
            total += line.codepoints();
        }
        total
    }

    /// Translate a character index to the codepoint index it corresponds
    /// to. Identity everywhere except inside a CRLF ending, where the CR
    /// and LF codepoints both belong to the single character at the line's
    /// `nonbreak_chars` boundary; a character index past the ending always
    /// lands on the codepoint just past the LF.
    pub fn character_to_codepoint(&self, ch: usize) -> usize {
        let (line_idx, char_off) = self.character_to_line(ch);
        let line = self.line(line_idx).copied().unwrap_or_else(LineRecord::empty_last);
        let cp_off = if char_off <= line.nonbreak_chars {
            char_off
        } else {
            line.nonbreak_chars + line.ending.codepoint_len()
        };
        self.codepoint_of_line_start(line_idx) + cp_off
    }

    /// Translate a codepoint index to the character index it corresponds
    /// to (the inverse of [`Self::character_to_codepoint`]; see its doc for
    /// the CRLF boundary rule).
    pub fn codepoint_to_character(&self, cp: usize) -> usize {
        let (line_idx, cp_off) = self.codepoint_to_line(cp);
        let line = self.line(line_idx).copied().unwrap_or_else(LineRecord::empty_last);
        let char_off = if cp_off <= line.nonbreak_chars {
            cp_off
        } else if cp_off >= line.nonbreak_chars + line.ending.codepoint_len() {
            line.nonbreak_chars + line.ending.character_len()
        } else {
            line.nonbreak_chars
        };
        self.character_of_line_start(line_idx) + char_off
    }

    /// Translate a codepoint index to `(line_idx, codepoint_offset_in_line)`.
    pub fn codepoint_to_line(&self, codepoint: usize) -> (usize, usize) {
        let mut sel = CodepointLocate {
            target: codepoint,
            consumed_codepoints: 0,
        };
        match self.lines.find(&mut sel) {
            Some((idx, _)) => (idx, codepoint - sel.consumed_codepoints),
            None => (self.lines.len().saturating_sub(1), 0),
        }
    }

    /// Translate a character index to `(line_idx, character_offset_in_line)`.
    pub fn character_to_line(&self, character: usize) -> (usize, usize) {
        let mut sel = CharacterLocate {
            target: character,
            consumed_characters: 0,
        };
        match self.lines.find(&mut sel) {
            Some((idx, _)) => (idx, character - sel.consumed_characters),
            None => (self.lines.len().saturating_sub(1), 0),
        }
    }

    /// Replace line records `[begin, end)` with `replacement`, applying the
    /// CR-LF merge rule at the new join points. Returns flags describing
    /// what happened at the front/back boundary.
    pub fn splice(&mut self, begin: usize, end: usize, replacement: Vec<LineRecord>) -> EditFlags {
        self.lines.remove_range(begin, end);
        for (i, record) in replacement.into_iter().enumerate() {
            self.lines.insert(begin + i, record);
        }
        let mut flags = EditFlags::default();
        if begin > 0 && self.try_merge_cr_lf(begin - 1) {
            flags.merge_front = true;
        }
        let end_boundary = self.lines.len();
        if end_boundary > 0 {
            let idx = end_boundary.saturating_sub(2);
            if self.try_merge_cr_lf(idx) {
                flags.merge_back = true;
            }
        }
        flags
    }

    /// If the line at `idx` ends with `CR` and the next line is an empty
    /// `LF`-only line, fuse them into a single `CRLF` line. Returns whether
    /// a merge happened.
    fn try_merge_cr_lf(&mut self, idx: usize) -> bool {
        let Some(first) = self.lines.get(idx) else {
            return false;
        };
        if first.ending != Ending::Cr {
            return false;
        }
        let Some(second) = self.lines.get(idx + 1) else {
            return false;
        };
        if second.ending != Ending::Lf || second.nonbreak_chars != 0 {
            return false;
        }
        let nonbreak_chars = first.nonbreak_chars;
        self.lines.remove(idx + 1);
        self.lines.remove(idx);
        self.lines.insert(
            idx,
            LineRecord {
                nonbreak_chars,
                ending: Ending::CrLf,
            },
        );
        true
    }

    /// Split the CRLF line at `idx` into a `CR` line and an empty `LF`
    /// line, for an insertion/erase that lands strictly between the CR and
    /// the LF. Returns `true` if a split happened.
    pub fn split_crlf_at(&mut self, idx: usize) -> bool {
        let Some(line) = self.lines.get(idx) else {
            return false;
        };
        if line.ending != Ending::CrLf {
            return false;
        }
        let nonbreak_chars = line.nonbreak_chars;
        self.lines.remove(idx);
        self.lines.insert(
            idx,
            LineRecord {
                nonbreak_chars,
                ending: Ending::Cr,
            },
        );
        self.lines.insert(
            idx + 1,
            LineRecord {
                nonbreak_chars: 0,
                ending: Ending::Lf,
            },
        );
        true
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
