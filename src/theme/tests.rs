use super::*;

#[test]
fn get_at_before_any_step_returns_default() {
    let map: StepMap<&str> = StepMap::new("plain");
    assert_eq!(map.get_at(0), "plain");
    assert_eq!(map.get_at(100), "plain");
}

#[test]
fn set_range_installs_value_and_restores_predecessor_after() {
    let mut map = StepMap::new("plain");
    map.set_range(5, 10, "bold");
    assert_eq!(map.get_at(4), "plain");
    assert_eq!(map.get_at(5), "bold");
    assert_eq!(map.get_at(9), "bold");
    assert_eq!(map.get_at(10), "plain");
}

#[test]
fn set_range_skips_redundant_boundary_when_value_matches_predecessor() {
    let mut map = StepMap::new("plain");
    map.set_range(5, 10, "plain");
    assert!(map.is_empty());
}

#[test]
fn overlapping_set_range_overwrites_the_earlier_one() {
    let mut map = StepMap::new("plain");
    map.set_range(0, 20, "bold");
    map.set_range(5, 10, "italic");
    assert_eq!(map.get_at(0), "bold");
    assert_eq!(map.get_at(5), "italic");
    assert_eq!(map.get_at(9), "italic");
    assert_eq!(map.get_at(10), "bold");
    assert_eq!(map.get_at(19), "bold");
    assert_eq!(map.get_at(20), "plain");
}

#[test]
fn apply_insert_shifts_steps_at_or_after_the_insertion_point() {
    let mut map = StepMap::new("plain");
    map.set_range(5, 10, "bold");
    map.apply_insert(7, 3);
    assert_eq!(map.get_at(5), "bold");
    assert_eq!(map.get_at(9), "bold"); // inserted text inherits the step it landed in
    assert_eq!(map.get_at(13), "plain"); // the shifted-right end boundary
}

#[test]
fn apply_erase_collapses_steps_inside_the_erased_range() {
    let mut map = StepMap::new("plain");
    map.set_range(5, 10, "bold");
    map.apply_erase(3, 7);
    // the start-of-bold step (at 5) falls inside [3,7) and collapses to 3
    assert_eq!(map.get_at(3), "bold");
    assert_eq!(map.get_at(5), "bold");
    assert_eq!(map.get_at(6), "plain"); // end step (was at 10) shifted to 6
}

#[test]
fn walk_pair_merges_boundaries_from_both_maps() {
    let mut style = StepMap::new("plain");
    let mut color = StepMap::new("black");
    style.set_range(5, 15, "bold");
    color.set_range(10, 20, "red");
    let events = walk_pair(&style, &color);
    let positions: Vec<usize> = events.iter().map(|(p, _, _)| *p).collect();
    assert_eq!(positions, vec![5, 10, 15, 20]);
    assert_eq!(events[1], (10, "bold", "red"));
}
