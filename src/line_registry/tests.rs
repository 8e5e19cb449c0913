use super::*;

fn feed_str(s: &str) -> Vec<LineRecord> {
    analyze(s.chars().map(|c| (c == '\r', c == '\n')))
}

#[test]
fn analyzer_matches_scenario_one_from_the_contract() {
    let lines = feed_str("a\r\nb\n");
    assert_eq!(
        lines,
        vec![
            LineRecord {
                nonbreak_chars: 1,
                ending: Ending::CrLf
            },
            LineRecord {
                nonbreak_chars: 1,
                ending: Ending::Lf
            },
            LineRecord {
                nonbreak_chars: 0,
                ending: Ending::None
            },
        ]
    );
    let registry = Registry::from_records(lines);
    assert_eq!(registry.total_characters(), 4);
    assert_eq!(registry.total_codepoints(), 5);
}

#[test]
fn lone_trailing_cr_is_its_own_line() {
    let lines = feed_str("a\r");
    assert_eq!(lines.last().unwrap().ending, Ending::None);
    assert_eq!(lines[lines.len() - 2].ending, Ending::Cr);
}

#[test]
fn cr_not_followed_by_lf_is_a_cr_line() {
    let lines = feed_str("a\rb");
    assert_eq!(lines[0].ending, Ending::Cr);
    assert_eq!(lines[0].nonbreak_chars, 1);
}

#[test]
fn new_registry_has_one_empty_line() {
    let r = Registry::new();
    assert_eq!(r.len(), 1);
    assert_eq!(r.line(0).unwrap().ending, Ending::None);
}

#[test]
fn cr_lf_merge_fuses_adjacent_cr_and_empty_lf_lines() {
    let mut r = Registry::from_records(vec![
        LineRecord {
            nonbreak_chars: 3,
            ending: Ending::Cr,
        },
        LineRecord {
            nonbreak_chars: 0,
            ending: Ending::Lf,
        },
        LineRecord {
            nonbreak_chars: 0,
            ending: Ending::None,
        },
    ]);
    assert!(r.try_merge_cr_lf(0));
    assert_eq!(r.len(), 2);
    assert_eq!(r.line(0).unwrap().ending, Ending::CrLf);
    assert_eq!(r.line(0).unwrap().nonbreak_chars, 3);
}

#[test]
fn cr_lf_split_produces_cr_then_empty_lf() {
    let mut r = Registry::from_records(vec![
        LineRecord {
            nonbreak_chars: 2,
            ending: Ending::CrLf,
        },
        LineRecord {
            nonbreak_chars: 0,
            ending: Ending::None,
        },
    ]);
    assert!(r.split_crlf_at(0));
    assert_eq!(r.len(), 3);
    assert_eq!(r.line(0).unwrap().ending, Ending::Cr);
    assert_eq!(r.line(0).unwrap().nonbreak_chars, 2);
    assert_eq!(r.line(1).unwrap().ending, Ending::Lf);
    assert_eq!(r.line(1).unwrap().nonbreak_chars, 0);
}

#[test]
fn splice_merges_at_the_new_boundary() {
    let mut r = Registry::from_records(vec![
        LineRecord {
            nonbreak_chars: 1,
            ending: Ending::Cr,
        },
        LineRecord {
            nonbreak_chars: 0,
            ending: Ending::None,
        },
    ]);
    let flags = r.splice(
        1,
        2,
        vec![
            LineRecord {
                nonbreak_chars: 0,
                ending: Ending::Lf,
            },
            LineRecord {
                nonbreak_chars: 0,
                ending: Ending::None,
            },
        ],
    );
    assert!(flags.merge_front);
    assert_eq!(r.len(), 2);
    assert_eq!(r.line(0).unwrap().ending, Ending::CrLf);
}

#[test]
fn lookups_stay_correct_across_many_lines_not_just_shallow_trees() {
    // Enough lines to force a multi-level tree, so a find selector that
    // loses accumulated state across more than one right-descent would
    // show up as a wrong line/offset here.
    let text: String = (0..50).map(|i| format!("line{i}\n")).collect();
    let r = Registry::from_records(feed_str(&text));
    for i in 0..50 {
        let start = r.character_of_line_start(i);
        let (line, offset) = r.character_to_line(start);
        assert_eq!(line, i, "character_to_line({start}) should land on line {i}");
        assert_eq!(offset, 0);
        let (cp_line, cp_offset) = r.codepoint_to_line(start);
        assert_eq!(cp_line, i);
        assert_eq!(cp_offset, 0);
    }
}

#[test]
fn codepoint_and_character_lookup_locate_the_right_line() {
    let r = Registry::from_records(feed_str("ab\r\ncd\n"));
    let (line, offset) = r.codepoint_to_line(3);
    assert_eq!(line, 0);
    assert_eq!(offset, 3); // "ab" (2) + CR (1) = within first line's 4 codepoints
    let (line2, _) = r.character_to_line(3);
    assert_eq!(line2, 1); // characters: line0 has 3 (a,b,CRLF-as-one), so char idx 3 is line1
}
