use crate::domain::score::evaluate_sets;
use crate::entities::matches::{SetScore, SlotNo};
use crate::errors::{EngineError, ValidationKind};

fn sets(raw: &[(u16, u16)]) -> Vec<SetScore> {
    raw.iter()
        .map(|&(side1, side2)| SetScore { side1, side2 })
        .collect()
}

fn validation_kind(err: EngineError) -> ValidationKind {
    match err {
        EngineError::Validation { kind, .. } => kind,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn empty_score_is_rejected() {
    let err = evaluate_sets(&[]).unwrap_err();
    assert_eq!(validation_kind(err), ValidationKind::EmptyScore);
}

#[test]
fn tied_set_is_rejected() {
    let err = evaluate_sets(&sets(&[(6, 3), (5, 5)])).unwrap_err();
    assert_eq!(validation_kind(err), ValidationKind::SetScore);
}

#[test]
fn implausible_game_count_is_rejected() {
    let err = evaluate_sets(&sets(&[(100, 3)])).unwrap_err();
    assert_eq!(validation_kind(err), ValidationKind::SetScore);
}

#[test]
fn split_sets_are_rejected() {
    let err = evaluate_sets(&sets(&[(6, 3), (3, 6)])).unwrap_err();
    assert_eq!(validation_kind(err), ValidationKind::TiedMatch);
}

#[test]
fn straight_sets_win_for_side_one() {
    let outcome = evaluate_sets(&sets(&[(6, 3), (6, 4)])).unwrap();
    assert_eq!(outcome.winner_slot, SlotNo::One);
    assert_eq!(outcome.loser_slot(), SlotNo::Two);
    assert_eq!((outcome.sets1, outcome.sets2), (2, 0));
    assert_eq!((outcome.games1, outcome.games2), (12, 7));
}

#[test]
fn deciding_set_win_for_side_two() {
    let outcome = evaluate_sets(&sets(&[(6, 4), (3, 6), (2, 6)])).unwrap();
    assert_eq!(outcome.winner_slot, SlotNo::Two);
    assert_eq!((outcome.sets1, outcome.sets2), (1, 2));
    assert_eq!((outcome.games1, outcome.games2), (11, 16));
}

#[test]
fn single_set_decides_a_short_format() {
    let outcome = evaluate_sets(&sets(&[(9, 7)])).unwrap();
    assert_eq!(outcome.winner_slot, SlotNo::One);
    assert_eq!((outcome.sets1, outcome.sets2), (1, 0));
}
