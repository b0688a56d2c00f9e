use std::collections::HashMap;

use time::macros::datetime;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::championship::calculate;
use crate::entities::ids::{GroupNo, TeamId};
use crate::entities::matches::{
    KnockoutRound, Match, MatchSide, MatchStage, MatchStatus, SetScore,
};
use crate::entities::points::{PointsSource, Tenths};
use crate::entities::teams::{Player, Team, TeamStatus};
use crate::entities::tournaments::ChampionshipWeights;

fn now() -> OffsetDateTime {
    datetime!(2026-03-14 09:00:00 UTC)
}

fn team(name: &str) -> Team {
    let player = |tag: &str| Player {
        id: Uuid::new_v4(),
        name: format!("{name} {tag}"),
        rating: Some(1000.0),
    };
    Team {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        players: vec![player("one"), player("two")],
        status: TeamStatus::Active,
        group_no: None,
        group_position: None,
        revision: 1,
        created_at: now(),
        updated_at: now(),
    }
}

fn fixture(stage: MatchStage, a: Option<TeamId>, b: Option<TeamId>, sets: &[(u16, u16)]) -> Match {
    let side = |team_id: Option<TeamId>| {
        team_id.map(|team_id| MatchSide {
            team_id,
            team_name: String::new(),
        })
    };
    let sets: Vec<SetScore> = sets
        .iter()
        .map(|&(side1, side2)| SetScore { side1, side2 })
        .collect();
    let mut m = Match {
        id: Uuid::new_v4(),
        stage,
        match_number: 1,
        side1: side(a),
        side2: side(b),
        status: MatchStatus::Completed,
        sets,
        winner: None,
        next_match: None,
        next_slot: None,
        revision: 1,
        created_at: now(),
        updated_at: now(),
    };
    let (s1, s2) = m.sets_won();
    m.winner = if s1 >= s2 { a } else { b };
    m
}

fn group(a: TeamId, b: TeamId, sets: &[(u16, u16)]) -> Match {
    fixture(
        MatchStage::Group {
            group_no: 1,
            round_no: 1,
        },
        Some(a),
        Some(b),
        sets,
    )
}

fn knockout(round: KnockoutRound, a: TeamId, b: TeamId, sets: &[(u16, u16)]) -> Match {
    fixture(MatchStage::Knockout { round }, Some(a), Some(b), sets)
}

/// Two groups of two, semifinals, final and third place, every side
/// rated 1000 so the exchanges depend only on the game margins.
fn finished_tournament() -> (Vec<Team>, Vec<Match>, HashMap<TeamId, (GroupNo, u8)>) {
    let teams = vec![team("A"), team("B"), team("C"), team("D")];
    let (a, b, c, d) = (teams[0].id, teams[1].id, teams[2].id, teams[3].id);
    let matches = vec![
        group(a, b, &[(6, 3), (6, 4)]),
        group(c, d, &[(6, 0), (6, 0)]),
        knockout(KnockoutRound::SemiFinals, a, d, &[(6, 2), (6, 2)]),
        knockout(KnockoutRound::SemiFinals, c, b, &[(6, 1), (6, 1)]),
        knockout(KnockoutRound::Finals, a, c, &[(7, 5), (7, 6)]),
        knockout(KnockoutRound::ThirdPlace, d, b, &[(6, 4), (6, 4)]),
    ];
    let placements = HashMap::from([(a, (1, 1)), (b, (1, 2)), (c, (2, 1)), (d, (2, 2))]);
    (teams, matches, placements)
}

#[test]
fn totals_combine_rating_placement_and_progression_parts() {
    let (teams, matches, placements) = finished_tournament();
    let outcome = calculate(&ChampionshipWeights::default(), &teams, &matches, &placements);

    let ids: Vec<TeamId> = outcome.teams.iter().map(|t| t.team_id).collect();
    let input: Vec<TeamId> = teams.iter().map(|t| t.id).collect();
    assert_eq!(ids, input, "totals follow the input team order");

    // A: 16.97 (group) + 18.75 (semi) + 15.9 (final), 20 for winning the
    // group, 6 + 10 for the knockout wins.
    let a = &outcome.teams[0];
    assert_eq!(a.rating_points, 51.62);
    assert_eq!(a.placement_bonus, 20.0);
    assert_eq!(a.knockout_bonus, 16.0);
    assert_eq!(a.raw_total, Tenths(876));
    assert_eq!(a.awarded_total, Tenths(876));

    let c = &outcome.teams[2];
    assert_eq!(c.rating_points, 42.86);
    assert_eq!(c.placement_bonus, 20.0);
    assert_eq!(c.knockout_bonus, 6.0);
    assert_eq!(c.awarded_total, Tenths(689));

    // D conceded 22.5 in the group but won the third-place match.
    let d = &outcome.teams[3];
    assert_eq!(d.rating_points, -6.0);
    assert_eq!(d.placement_bonus, 12.0);
    assert_eq!(d.knockout_bonus, 3.0);
    assert_eq!(d.awarded_total, Tenths(90));
}

#[test]
fn negative_raw_totals_are_clamped_before_award() {
    let (teams, matches, placements) = finished_tournament();
    let outcome = calculate(&ChampionshipWeights::default(), &teams, &matches, &placements);

    // B lost the group exchange and everything afterwards: -16.97 + 12
    // lands below zero, so the raw total survives but the award is 0.
    let b = &outcome.teams[1];
    assert_eq!(b.rating_points, -16.97);
    assert_eq!(b.knockout_bonus, 0.0);
    assert_eq!(b.raw_total, Tenths(-50));
    assert_eq!(b.awarded_total, Tenths::ZERO);
}

#[test]
fn knockout_losers_concede_nothing_but_keep_zero_entries() {
    let (teams, matches, placements) = finished_tournament();
    let outcome = calculate(&ChampionshipWeights::default(), &teams, &matches, &placements);

    let b = teams[1].id;
    let award = outcome
        .awards
        .iter()
        .find(|aw| aw.team_id == b)
        .unwrap();
    // Group loss, two knockout losses (two entries each) and placement.
    assert_eq!(award.contributions.len(), 6);
    for event in &award.contributions {
        if let PointsSource::RatingExchange {
            round: Some(_), ..
        } = event.source
        {
            assert_eq!(event.amount, 0.0, "knockout losses cost nothing");
        }
    }
}

#[test]
fn player_awards_replicate_the_team_total() {
    let (teams, matches, placements) = finished_tournament();
    let outcome = calculate(&ChampionshipWeights::default(), &teams, &matches, &placements);

    assert_eq!(outcome.awards.len(), 8);
    for award in &outcome.awards {
        let total = outcome
            .teams
            .iter()
            .find(|t| t.team_id == award.team_id)
            .unwrap();
        assert_eq!(award.amount, total.awarded_total);
    }
}

#[test]
fn third_place_win_carries_its_own_bonus() {
    let (teams, matches, placements) = finished_tournament();
    let outcome = calculate(&ChampionshipWeights::default(), &teams, &matches, &placements);

    let d = teams[3].id;
    let award = outcome.awards.iter().find(|aw| aw.team_id == d).unwrap();
    let bonus = award.contributions.iter().find(|e| {
        matches!(
            e.source,
            PointsSource::Progression {
                round: KnockoutRound::ThirdPlace,
                won: true,
                ..
            }
        )
    });
    assert_eq!(bonus.map(|e| e.amount), Some(3.0));
}

#[test]
fn bye_walkover_earns_the_progression_bonus_without_an_exchange() {
    let winner = team("Walkover");
    let idle = team("Idle");
    let bye = fixture(
        MatchStage::Knockout {
            round: KnockoutRound::QuarterFinals,
        },
        Some(winner.id),
        None,
        &[],
    );

    let outcome = calculate(
        &ChampionshipWeights::default(),
        &[winner.clone(), idle],
        &[bye],
        &HashMap::new(),
    );

    // The idle team left no trace and is omitted entirely.
    assert_eq!(outcome.teams.len(), 1);
    let total = &outcome.teams[0];
    assert_eq!(total.team_id, winner.id);
    assert_eq!(total.knockout_bonus, 4.0);
    assert_eq!(total.rating_points, 0.0);
    assert_eq!(total.awarded_total, Tenths(40));
    assert_eq!(outcome.awards[0].contributions.len(), 1);
}

#[test]
fn rating_multiplier_scales_every_exchange() {
    let a = team("A");
    let b = team("B");
    let matches = vec![group(a.id, b.id, &[(6, 3), (6, 4)])];
    let weights = ChampionshipWeights {
        rating_multiplier: 2.0,
        ..ChampionshipWeights::default()
    };

    let outcome = calculate(&weights, &[a, b], &matches, &HashMap::new());
    assert_eq!(outcome.teams[0].rating_points, 33.94);
    assert_eq!(outcome.teams[1].rating_points, -33.94);
    assert_eq!(outcome.teams[0].raw_total, Tenths(339));
}
