//! Theme parameter maps: a `position -> value` step function per
//! rendering parameter (style, color, ...), backed by an ordered map.
//!
//! Positions are absolute character indices rather than cumulative
//! sequence offsets, so a `BTreeMap` is the natural fit here, the same
//! reasoning that put the caret set on one (see DESIGN.md).

use std::collections::BTreeMap;
use std::ops::Bound;

#[derive(Debug, Clone)]
pub struct StepMap<V> {
    steps: BTreeMap<usize, V>,
    default: V,
}

impl<V: Clone + PartialEq> StepMap<V> {
    pub fn new(default: V) -> Self {
        StepMap {
            steps: BTreeMap::new(),
            default,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Effective value at character position `p`: the value of the step
    /// at or immediately before `p`, or the registry default before the
    /// first step.
    pub fn get_at(&self, p: usize) -> V {
        self.steps
            .range(..=p)
            .next_back()
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default.clone())
    }

    /// Sets every position in `[begin, end)` to `value`, keeping the map
    /// minimal: only the boundaries where the effective value actually
    /// changes get a step.
    pub fn set_range(&mut self, begin: usize, end: usize, value: V) {
        let predecessor = self.get_at(begin);
        let v_end = self.get_at(end);
        let stale: Vec<usize> = self
            .steps
            .range((Bound::Excluded(begin), Bound::Included(end)))
            .map(|(k, _)| *k)
            .collect();
        for k in stale {
            self.steps.remove(&k);
        }
        if predecessor != value {
            self.steps.insert(begin, value.clone());
        }
        if v_end != value {
            self.steps.insert(end, v_end);
        }
    }

    pub fn apply_insert(&mut self, at: usize, count: usize) {
        let old = std::mem::take(&mut self.steps);
        for (k, v) in old {
            let nk = if k >= at { k + count } else { k };
            self.steps.insert(nk, v);
        }
    }

    pub fn apply_erase(&mut self, begin: usize, end: usize) {
        let count = end - begin;
        let old = std::mem::take(&mut self.steps);
        for (k, v) in old {
            let nk = if k <= begin {
                k
            } else if k < end {
                begin
            } else {
                k - count
            };
            self.steps.insert(nk, v);
        }
    }
}

/// Merges the step boundaries of two parameter maps (e.g. style and
/// color) into one ascending list of `(position, style, color)` events,
/// one per position where either parameter's effective value changes.
pub fn walk_pair<A, B>(a: &StepMap<A>, b: &StepMap<B>) -> Vec<(usize, A, B)>
where
    A: Clone + PartialEq,
    B: Clone + PartialEq,
{
    let mut positions: Vec<usize> = a.steps.keys().chain(b.steps.keys()).copied().collect();
    positions.sort_unstable();
    positions.dedup();
    positions.into_iter().map(|p| (p, a.get_at(p), b.get_at(p))).collect()
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
