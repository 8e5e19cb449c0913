//! Soft-linebreak registry: where a visual line wraps without a hard line
//! ending. Rebuilt wholesale on edits (the contract's explicit choice —
//! see `set_softbreaks`) rather than patched incrementally.

use crate::line_registry::Registry as LineRegistry;
use crate::tree::{FindSelector, Step, Summary, Tree};

/// `length` is the character count since the previous break (or document
/// start for the first node).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftBreak {
    pub length: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SoftBreakSummary {
    pub characters: usize,
    pub breaks: usize,
}

impl Summary<SoftBreak> for SoftBreakSummary {
    fn identity() -> Self {
        SoftBreakSummary::default()
    }

    fn of_value(value: &SoftBreak) -> Self {
        SoftBreakSummary {
            characters: value.length,
            breaks: 1,
        }
    }

    fn combine(left: &Self, right: &Self) -> Self {
        SoftBreakSummary {
            characters: left.characters + right.characters,
            breaks: left.breaks + right.breaks,
        }
    }
}

struct CharacterLocate {
    target: usize,
    consumed_characters: usize,
    consumed_breaks: usize,
}

impl FindSelector<SoftBreak, SoftBreakSummary> for CharacterLocate {
    fn visit(&mut self, left: &SoftBreakSummary, value: &SoftBreak, _own: &SoftBreakSummary) -> Step {
        if self.target < left.characters || (self.target == left.characters && left.breaks > 0) {
            Step::Left
        } else if self.target <= left.characters + value.length {
            self.consumed_characters += left.characters;
            self.consumed_breaks += left.breaks;
            Step::Hit
        } else {
            self.consumed_characters += left.characters + value.length;
            self.consumed_breaks += left.breaks + 1;
            self.target -= left.characters + value.length;
            Step::Right
        }
    }
}

#[derive(Default)]
pub struct Registry {
    breaks: Tree<SoftBreak, SoftBreakSummary>,
}

impl Registry {
    pub fn new() -> Self {
        Registry { breaks: Tree::new() }
    }

    pub fn num_soft_breaks(&self) -> usize {
        self.breaks.len()
    }

    pub fn total_characters(&self) -> usize {
        self.breaks.summary().characters
    }

    /// Replace the whole registry with breaks at the given character
    /// positions (ascending, each strictly after the previous).
    pub fn set_softbreaks(&mut self, positions: &[usize], total_characters: usize) {
        let mut nodes = Vec::with_capacity(positions.len());
        let mut prev = 0;
        for &pos in positions {
            debug_assert!(pos >= prev && pos <= total_characters);
            nodes.push(SoftBreak { length: pos - prev });
            prev = pos;
        }
        debug_assert!(total_characters >= prev);
        // trailing remainder after the last break is not itself a break;
        // track it implicitly via total_characters - prev when callers need it.
        self.breaks = nodes.into_iter().collect();
        let _ = total_characters;
    }

    /// Find the soft break at or before character `c`; returns the break
    /// index (or `None` if `c` precedes the first break), the number of
    /// characters before it, and the number of soft breaks before it.
    pub fn get_softbreak_before_or_at_char(&self, c: usize) -> (Option<usize>, usize, usize) {
        let mut sel = CharacterLocate {
            target: c,
            consumed_characters: 0,
            consumed_breaks: 0,
        };
        match self.breaks.find(&mut sel) {
            Some((idx, _)) => (Some(idx), sel.consumed_characters, sel.consumed_breaks),
            None => {
                let total = self.breaks.summary();
                (None, total.characters, total.breaks)
            }
        }
    }

    /// `hard_line_of(c) + soft_breaks_before(c)`.
    pub fn get_visual_line_of_char(&self, lines: &LineRegistry, c: usize) -> usize {
        let (hard_line, _) = lines.character_to_line(c);
        let (_, _, soft_before) = self.get_softbreak_before_or_at_char(c);
        hard_line + soft_before
    }

    pub fn num_visual_lines(&self, lines: &LineRegistry) -> usize {
        lines.len() + self.num_soft_breaks()
    }

    /// Merge hard line starts and soft break positions into one ascending
    /// list of visual-line boundaries.
    fn visual_line_boundaries(&self, lines: &LineRegistry) -> Vec<(usize, bool)> {
        let mut acc = 0;
        let mut hard_positions = Vec::with_capacity(lines.len());
        for line in lines.iter() {
            hard_positions.push((acc, true));
            acc += line.characters();
        }
        let mut acc2 = 0;
        let mut soft_positions = Vec::with_capacity(self.breaks.len());
        for b in self.breaks.iter() {
            acc2 += b.length;
            soft_positions.push((acc2, false));
        }
        let mut merged = hard_positions;
        merged.extend(soft_positions);
        merged.sort_by_key(|(p, is_hard)| (*p, !*is_hard));
        merged
    }

    /// Beginning character of visual line `line`, and whether that boundary
    /// is a hard line start (`true`) or a soft break (`false`).
    pub fn get_beginning_char_of_visual_line(&self, lines: &LineRegistry, line: usize) -> (usize, bool) {
        let boundaries = self.visual_line_boundaries(lines);
        boundaries
            .get(line)
            .copied()
            .unwrap_or((lines.total_characters(), true))
    }

    /// Character just past the end of visual line `line`.
    pub fn get_past_ending_char_of_visual_line(&self, lines: &LineRegistry, line: usize) -> (usize, bool) {
        let boundaries = self.visual_line_boundaries(lines);
        boundaries
            .get(line + 1)
            .copied()
            .unwrap_or((lines.total_characters(), true))
    }
}
