use uuid::Uuid;

use crate::domain::bracket::{build, cross_seed};
use crate::entities::brackets::SeedSlot;
use crate::entities::ids::TeamId;
use crate::entities::matches::{KnockoutRound, MatchStatus, SlotNo};
use crate::errors::{EngineError, ValidationKind};

fn teams(count: usize) -> Vec<TeamId> {
    (0..count).map(|_| Uuid::new_v4()).collect()
}

fn seed_count_kind(err: EngineError) {
    match err {
        EngineError::Validation { kind, .. } => assert_eq!(kind, ValidationKind::SeedCount),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn cross_seed_pairs_positions_across_neighbouring_groups() {
    // Four groups, two qualifiers each: winners meet the next group's
    // runner-up, with the last group wrapping back to the first.
    let q: Vec<Vec<TeamId>> = (0..4).map(|_| teams(2)).collect();
    let seeds = cross_seed(&q);
    assert_eq!(
        seeds,
        vec![q[0][0], q[1][1], q[1][0], q[2][1], q[2][0], q[3][1], q[3][0], q[0][1]]
    );
}

#[test]
fn cross_seed_appends_an_odd_tail_in_group_order() {
    let q: Vec<Vec<TeamId>> = (0..2).map(|_| teams(3)).collect();
    let seeds = cross_seed(&q);
    assert_eq!(
        seeds,
        vec![q[0][0], q[1][1], q[1][0], q[0][1], q[0][2], q[1][2]]
    );
}

#[test]
fn cross_seed_with_a_single_position_lists_winners_in_group_order() {
    let q: Vec<Vec<TeamId>> = (0..3).map(|_| teams(1)).collect();
    assert_eq!(cross_seed(&q), vec![q[0][0], q[1][0], q[2][0]]);
}

#[test]
fn cross_seed_truncates_to_the_shortest_group() {
    let q = vec![teams(2), teams(1)];
    assert_eq!(cross_seed(&q), vec![q[0][0], q[1][0]]);
}

#[test]
fn five_seeds_pad_to_eight_with_byes_behind_the_top_three() {
    let seeds = teams(5);
    let plan = build(&seeds, true).unwrap();

    assert_eq!(plan.starting_round, KnockoutRound::QuarterFinals);
    assert_eq!(
        plan.slots,
        vec![
            SeedSlot::Team { team_id: seeds[0] },
            SeedSlot::Bye,
            SeedSlot::Team { team_id: seeds[1] },
            SeedSlot::Bye,
            SeedSlot::Team { team_id: seeds[2] },
            SeedSlot::Bye,
            SeedSlot::Team { team_id: seeds[3] },
            SeedSlot::Team { team_id: seeds[4] },
        ]
    );

    // Three walkovers complete on the spot, one real opening fixture.
    assert_eq!(plan.bye_completions(), 3);
    let opening: Vec<_> = plan
        .matches
        .iter()
        .filter(|m| m.round == KnockoutRound::QuarterFinals)
        .collect();
    assert_eq!(opening.len(), 4);
    assert_eq!(opening[0].winner, Some(seeds[0]));
    assert_eq!(opening[3].status, MatchStatus::Scheduled);
    assert_eq!(opening[3].side1, Some(seeds[3]));
    assert_eq!(opening[3].side2, Some(seeds[4]));
}

#[test]
fn walkover_winners_propagate_one_round_into_their_successor() {
    let seeds = teams(5);
    let plan = build(&seeds, false).unwrap();

    // Quarter-finals occupy indices 0..4, semifinals 4..6, final 6.
    let sf1 = &plan.matches[4];
    assert_eq!(sf1.round, KnockoutRound::SemiFinals);
    assert_eq!(sf1.side1, Some(seeds[0]));
    assert_eq!(sf1.side2, Some(seeds[1]));
    assert_eq!(sf1.status, MatchStatus::Scheduled);
    assert_eq!(sf1.winner, None);

    let sf2 = &plan.matches[5];
    assert_eq!(sf2.side1, Some(seeds[2]));
    assert_eq!(sf2.side2, None);

    let final_match = &plan.matches[6];
    assert_eq!(final_match.round, KnockoutRound::Finals);
    assert_eq!(final_match.side1, None);
    assert_eq!(final_match.side2, None);
    assert_eq!(plan.matches.len(), 7);
}

#[test]
fn successor_links_pair_adjacent_children() {
    let seeds = teams(8);
    let plan = build(&seeds, false).unwrap();

    assert_eq!(plan.matches[0].next, Some((4, SlotNo::One)));
    assert_eq!(plan.matches[1].next, Some((4, SlotNo::Two)));
    assert_eq!(plan.matches[2].next, Some((5, SlotNo::One)));
    assert_eq!(plan.matches[3].next, Some((5, SlotNo::Two)));
    assert_eq!(plan.matches[4].next, Some((6, SlotNo::One)));
    assert_eq!(plan.matches[5].next, Some((6, SlotNo::Two)));
    assert_eq!(plan.matches[6].next, None);
}

#[test]
fn full_field_needs_no_byes() {
    let seeds = teams(8);
    let plan = build(&seeds, false).unwrap();
    assert_eq!(plan.bye_completions(), 0);
    assert!(plan.slots.iter().all(|s| s.team_id().is_some()));
}

#[test]
fn byes_are_never_adjacent_for_any_field_size() {
    for count in 3..=16 {
        let plan = build(&teams(count), false).unwrap();
        for m in &plan.matches {
            if m.round == plan.starting_round {
                assert!(
                    m.side1.is_some() || m.side2.is_some(),
                    "double bye with {count} seeds"
                );
            }
        }
        let field = count.next_power_of_two();
        assert_eq!(plan.bye_completions(), field - count, "{count} seeds");
    }
}

#[test]
fn third_place_fixture_is_appended_without_links() {
    let plan = build(&teams(4), true).unwrap();
    let third = plan.matches.last().unwrap();
    assert_eq!(third.round, KnockoutRound::ThirdPlace);
    assert_eq!(third.match_number, 1);
    assert_eq!(third.next, None);
    assert_eq!(plan.matches.len(), 4);
}

#[test]
fn two_team_field_drops_the_third_place_fixture() {
    let plan = build(&teams(2), true).unwrap();
    assert_eq!(plan.starting_round, KnockoutRound::Finals);
    assert_eq!(plan.matches.len(), 1);
}

#[test]
fn single_seed_is_rejected() {
    seed_count_kind(build(&teams(1), false).unwrap_err());
}

#[test]
fn oversized_field_is_rejected() {
    // 17 qualifiers pad to 32, beyond the supported bracket.
    seed_count_kind(build(&teams(17), false).unwrap_err());
}
