//! Folding registry: an ordered sequence of collapsed character ranges
//! tiling the document alongside the gaps between them.
//!
//! A fold node stores `(gap, range)`: the unfolded characters visible
//! before the fold, then the unfolded characters the fold hides. Gaps and
//! ranges tile the document exactly, so the registry also tracks the
//! trailing gap after the last fold as `total_unfolded - folds.characters`
//! rather than as a node of its own.

use crate::tree::{FindSelector, Step, Summary, Tree};

/// `gap_lines`/`folded_lines` mirror `gap`/`range` in line units; wiring
/// real counts requires the line registry and is left to the caller that
/// constructs folds from document knowledge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fold {
    pub gap: usize,
    pub range: usize,
    pub gap_lines: usize,
    pub folded_lines: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FoldSummary {
    pub characters: usize,
    pub folded_characters: usize,
    pub lines: usize,
    pub folded_lines: usize,
    pub count: usize,
}

impl Summary<Fold> for FoldSummary {
    fn identity() -> Self {
        FoldSummary::default()
    }

    fn of_value(value: &Fold) -> Self {
        FoldSummary {
            characters: value.gap + value.range,
            folded_characters: value.gap,
            lines: value.gap_lines + value.folded_lines,
            folded_lines: value.folded_lines,
            count: 1,
        }
    }

    fn combine(left: &Self, right: &Self) -> Self {
        FoldSummary {
            characters: left.characters + right.characters,
            folded_characters: left.folded_characters + right.folded_characters,
            lines: left.lines + right.lines,
            folded_lines: left.folded_lines + right.folded_lines,
            count: left.count + right.count,
        }
    }
}

struct FoldedToUnfolded {
    target: usize,
    consumed_folded: usize,
    consumed_unfolded: usize,
    result: Option<usize>,
}

impl FindSelector<Fold, FoldSummary> for FoldedToUnfolded {
    fn visit(&mut self, left: &FoldSummary, value: &Fold, _own: &FoldSummary) -> Step {
        let cf = self.consumed_folded + left.folded_characters;
        let cu = self.consumed_unfolded + left.characters;
        if self.target < cf || (self.target == cf && left.count > 0) {
            Step::Left
        } else if self.target <= cf + value.gap {
            self.result = Some(cu + (self.target - cf));
            Step::Hit
        } else {
            self.consumed_folded = cf + value.gap;
            self.consumed_unfolded = cu + value.gap + value.range;
            Step::Right
        }
    }
}

struct UnfoldedToFolded {
    target: usize,
    consumed_folded: usize,
    consumed_unfolded: usize,
    result: Option<usize>,
}

impl FindSelector<Fold, FoldSummary> for UnfoldedToFolded {
    fn visit(&mut self, left: &FoldSummary, value: &Fold, _own: &FoldSummary) -> Step {
        let cu = self.consumed_unfolded + left.characters;
        let cf = self.consumed_folded + left.folded_characters;
        if self.target < cu {
            Step::Left
        } else if self.target < cu + value.gap {
            self.result = Some(cf + (self.target - cu));
            Step::Hit
        } else if self.target < cu + value.gap + value.range {
            // lands inside the hidden range: clamp to the fold's own boundary.
            self.result = Some(cf + value.gap);
            Step::Hit
        } else {
            self.consumed_unfolded = cu + value.gap + value.range;
            self.consumed_folded = cf + value.gap;
            Step::Right
        }
    }
}

#[derive(Default)]
pub struct Registry {
    folds: Tree<Fold, FoldSummary>,
    total_unfolded: usize,
}

impl Registry {
    pub fn new(total_unfolded: usize) -> Self {
        Registry {
            folds: Tree::new(),
            total_unfolded,
        }
    }

    pub fn num_folds(&self) -> usize {
        self.folds.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fold> {
        self.folds.iter()
    }

    pub fn total_unfolded_characters(&self) -> usize {
        self.total_unfolded
    }

    pub fn total_folded_characters(&self) -> usize {
        let summary = self.folds.summary();
        summary.folded_characters + (self.total_unfolded - summary.characters)
    }

    /// `(start, end)` unfolded character ranges of every fold, in order.
    fn positioned_folds(&self) -> Vec<(usize, usize, Fold)> {
        let mut start = 0;
        let mut result = Vec::with_capacity(self.folds.len());
        for f in self.folds.iter() {
            let s = start + f.gap;
            let e = s + f.range;
            result.push((s, e, *f));
            start = e;
        }
        result
    }

    fn rebuild_from_positions(&mut self, items: Vec<(usize, usize, Fold)>) {
        let mut prev_end = 0;
        let mut nodes = Vec::with_capacity(items.len());
        for (s, e, mut f) in items {
            debug_assert!(s >= prev_end && e >= s);
            f.gap = s - prev_end;
            f.range = e - s;
            prev_end = e;
            nodes.push(f);
        }
        self.folds = nodes.into_iter().collect();
    }

    pub fn folded_to_unfolded_char(&self, p: usize) -> usize {
        let mut sel = FoldedToUnfolded {
            target: p,
            consumed_folded: 0,
            consumed_unfolded: 0,
            result: None,
        };
        self.folds.find(&mut sel);
        sel.result
            .unwrap_or_else(|| sel.consumed_unfolded + (p - sel.consumed_folded))
    }

    pub fn unfolded_to_folded_char(&self, p: usize) -> usize {
        let mut sel = UnfoldedToFolded {
            target: p,
            consumed_folded: 0,
            consumed_unfolded: 0,
            result: None,
        };
        self.folds.find(&mut sel);
        sel.result
            .unwrap_or_else(|| sel.consumed_folded + (p - sel.consumed_unfolded))
    }

    /// Removes any folds overlapping `[begin, end]`, absorbs their union
    /// plus `[begin, end]` into one new fold, and inserts it in order.
    pub fn add_fold(&mut self, begin: usize, end: usize) {
        debug_assert!(begin <= end && end <= self.total_unfolded);
        let mut union_begin = begin;
        let mut union_end = end;
        let mut items = self.positioned_folds();
        items.retain(|(s, e, _)| {
            let overlaps = *s <= union_end && *e >= union_begin;
            if overlaps {
                union_begin = union_begin.min(*s);
                union_end = union_end.max(*e);
            }
            !overlaps
        });
        let insert_at = items.iter().position(|(s, _, _)| *s > union_begin).unwrap_or(items.len());
        items.insert(insert_at, (union_begin, union_end, Fold::default()));
        self.rebuild_from_positions(items);
    }

    /// Removes the fold at sequence index `index`; its gap and range are
    /// absorbed into the following fold's gap (or the trailing tail).
    pub fn remove_fold(&mut self, index: usize) {
        let mut items = self.positioned_folds();
        if index < items.len() {
            items.remove(index);
            self.rebuild_from_positions(items);
        }
    }

    /// Position-patch every fold boundary through an insertion of `count`
    /// characters at unfolded position `at`. A fold whose start is exactly
    /// `at` shifts rather than grows, so an insertion clips to the fold's
    /// beginning rather than being absorbed by it.
    pub fn apply_insert(&mut self, at: usize, count: usize) {
        let mut items = self.positioned_folds();
        for (s, e, _) in items.iter_mut() {
            if at <= *s {
                *s += count;
                *e += count;
            } else if at < *e {
                *e += count;
            }
        }
        self.total_unfolded += count;
        self.rebuild_from_positions(items);
    }

    /// Position-patch every fold boundary through an erase of `[begin, end)`.
    /// A fold whose whole span collapses into a single point is dropped.
    pub fn apply_erase(&mut self, begin: usize, end: usize) {
        let count = end - begin;
        let patch = |p: usize| -> usize {
            if p <= begin {
                p
            } else if p < end {
                begin
            } else {
                p - count
            }
        };
        let mut new_items = Vec::new();
        for (s, e, rec) in self.positioned_folds() {
            let ns = patch(s);
            let ne = patch(e);
            if ne > ns {
                new_items.push((ns, ne, rec));
            }
        }
        self.total_unfolded -= count;
        self.rebuild_from_positions(new_items);
    }
}
