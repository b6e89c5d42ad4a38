//! Boundary filtering tests: dissolve contraction, debounce, scene ids.

use shotsplit::BoundaryFilter;
use shotsplit::boundary::{contract_dissolves, debounce, scene_ids};

fn bits(pattern: &str) -> Vec<bool> {
    pattern.chars().map(|c| c == '1').collect()
}

// ── contract_dissolves ─────────────────────────────────────────────

#[test]
fn contraction_delays_and_collapses() {
    let contracted: Vec<bool> = contract_dissolves(bits("01100")).collect();
    assert_eq!(contracted, bits("00100"));
}

#[test]
fn contraction_of_long_run_alternates() {
    let contracted: Vec<bool> = contract_dissolves(bits("011110")).collect();
    assert_eq!(contracted, bits("001010"));
}

#[test]
fn contraction_never_flags_first_frame() {
    let contracted: Vec<bool> = contract_dissolves(bits("1000")).collect();
    assert_eq!(contracted, bits("0100"));
}

#[test]
fn contraction_drops_trailing_flag() {
    // The last raw flag would surface one frame past the end.
    let contracted: Vec<bool> = contract_dissolves(bits("0001")).collect();
    assert_eq!(contracted, bits("0000"));
}

#[test]
fn contraction_preserves_length() {
    let raw = bits("1101011100101");
    assert_eq!(contract_dissolves(raw.clone()).count(), raw.len());
}

// ── debounce ───────────────────────────────────────────────────────

#[test]
fn debounce_suppresses_within_min_run() {
    let accepted: Vec<bool> = debounce(bits("1100101"), 3).collect();
    assert_eq!(accepted, bits("1000100"));
}

#[test]
fn debounce_window_is_exclusive() {
    // 3 - 0 is not greater than 3; 4 - 0 is.
    let accepted: Vec<bool> = debounce(bits("10011"), 3).collect();
    assert_eq!(accepted, bits("10001"));
}

#[test]
fn debounce_zero_keeps_everything() {
    let raw = bits("0110111");
    let accepted: Vec<bool> = debounce(raw.clone(), 0).collect();
    assert_eq!(accepted, raw);
}

#[test]
fn debounce_measures_from_last_accepted_only() {
    // The suppressed flag at 2 does not extend the window.
    let accepted: Vec<bool> = debounce(bits("101010"), 2).collect();
    assert_eq!(accepted, bits("100010"));
}

// ── scene_ids ──────────────────────────────────────────────────────

#[test]
fn scene_ids_group_by_running_count() {
    let ids: Vec<u64> = scene_ids(bits("1001010")).collect();
    assert_eq!(ids, vec![0, 0, 0, 1, 1, 2, 2]);
}

#[test]
fn scene_ids_without_flags_is_one_scene() {
    let ids: Vec<u64> = scene_ids(bits("00000")).collect();
    assert_eq!(ids, vec![0; 5]);
}

#[test]
fn scene_ids_empty() {
    assert_eq!(scene_ids(Vec::new()).count(), 0);
}

#[test]
fn full_chain_merges_dissolve() {
    // A three-frame fade at 4..7 and a hard cut at 12.
    let raw = bits("0000111000001000");
    let ids: Vec<u64> = scene_ids(debounce(contract_dissolves(raw), 3)).collect();
    assert_eq!(ids, vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2]);
}

// ── BoundaryFilter ─────────────────────────────────────────────────

#[test]
fn filter_matches_composed_stages() {
    let raw = bits("01110010001101000111");
    for min_run in [0, 1, 2, 5] {
        let staged: Vec<bool> = debounce(contract_dissolves(raw.clone()), min_run).collect();

        let mut filter = BoundaryFilter::new(min_run);
        let pushed: Vec<bool> = raw.iter().map(|&flag| filter.push(flag)).collect();

        assert_eq!(pushed, staged, "min_run = {min_run}");
        assert_eq!(
            filter.run().accepted,
            staged.iter().filter(|&&flag| flag).count() as u64
        );
    }
}

#[test]
fn filter_tracks_scene_id_and_position() {
    let mut filter = BoundaryFilter::new(0);
    assert_eq!(filter.position(), 0);
    assert_eq!(filter.run().last_accepted, None);

    for flag in bits("0100") {
        filter.push(flag);
    }

    assert_eq!(filter.position(), 4);
    assert_eq!(filter.scene_id(), 1);
    assert_eq!(filter.run().last_accepted, Some(2));
}
