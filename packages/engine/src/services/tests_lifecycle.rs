//! Service tests for the phase arc: draw, knockout construction,
//! completion, cancellation, rollback and transition failure handling.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::entities::brackets::{BracketSummary, SeedSlot};
use crate::entities::ids::{ActorId, GroupNo, MatchId, PlayerId, TeamId, TournamentId};
use crate::entities::matches::{KnockoutRound, Match, MatchStage, MatchStatus, SetScore};
use crate::entities::points::{LeaderboardEntry, PointsApplication};
use crate::entities::standings::Standing;
use crate::entities::teams::Team;
use crate::entities::tournaments::{Configuration, Tournament, TournamentStatus};
use crate::errors::{ConflictKind, EngineError, ErrorCode, PreconditionKind};
use crate::repos::tournaments::require_tournament;
use crate::services::Engine;
use crate::store::{
    Document, MatchFilter, MemoryStore, OpenAccess, StoreError, TeamFilter, TournamentStore,
    WriteBatch, WriteOp,
};
use crate::test_support::{
    completed_tournament, config_4x4, drawn_tournament, groups_phase_tournament, harness,
    harness_with_store, knockout_tournament, knockout_tournament_with, oriented_sets,
    play_knockout_stage, rated_players, registered_tournament, team_names, FixedClock,
};

use KnockoutRound::{Finals, QuarterFinals, SemiFinals, ThirdPlace};
use TournamentStatus::{
    Completed, Draft, GroupsGeneration, GroupsPhase, KnockoutPhase, RegistrationClosed,
    RegistrationOpen,
};

/// Store wrapper that fails a window of commits, by 1-based sequence
/// number since the window was armed. Reads always pass through.
struct FlakyStore {
    inner: MemoryStore,
    gate: Mutex<Gate>,
}

#[derive(Default)]
struct Gate {
    seen: usize,
    fail_from: usize,
    fail_to: usize,
}

impl FlakyStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            gate: Mutex::new(Gate::default()),
        }
    }

    fn fail_commits(&self, from: usize, to: usize) {
        *self.gate.lock() = Gate {
            seen: 0,
            fail_from: from,
            fail_to: to,
        };
    }

    fn heal(&self) {
        self.fail_commits(0, 0);
    }
}

#[async_trait]
impl TournamentStore for FlakyStore {
    async fn fetch_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Option<Tournament>, StoreError> {
        self.inner.fetch_tournament(tournament_id).await
    }

    async fn fetch_team(
        &self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> Result<Option<Team>, StoreError> {
        self.inner.fetch_team(tournament_id, team_id).await
    }

    async fn list_teams(
        &self,
        tournament_id: TournamentId,
        filter: TeamFilter,
    ) -> Result<Vec<Team>, StoreError> {
        self.inner.list_teams(tournament_id, filter).await
    }

    async fn fetch_match(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
    ) -> Result<Option<Match>, StoreError> {
        self.inner.fetch_match(tournament_id, match_id).await
    }

    async fn list_matches(
        &self,
        tournament_id: TournamentId,
        filter: MatchFilter,
    ) -> Result<Vec<Match>, StoreError> {
        self.inner.list_matches(tournament_id, filter).await
    }

    async fn list_standings(
        &self,
        tournament_id: TournamentId,
        group_no: Option<GroupNo>,
    ) -> Result<Vec<Standing>, StoreError> {
        self.inner.list_standings(tournament_id, group_no).await
    }

    async fn fetch_bracket(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Option<BracketSummary>, StoreError> {
        self.inner.fetch_bracket(tournament_id).await
    }

    async fn fetch_points_application(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Option<PointsApplication>, StoreError> {
        self.inner.fetch_points_application(tournament_id).await
    }

    async fn fetch_leaderboard(
        &self,
        player_id: PlayerId,
    ) -> Result<Option<LeaderboardEntry>, StoreError> {
        self.inner.fetch_leaderboard(player_id).await
    }

    async fn commit(
        &self,
        tournament_id: TournamentId,
        batch: WriteBatch,
    ) -> Result<(), StoreError> {
        {
            let mut gate = self.gate.lock();
            gate.seen += 1;
            if gate.fail_from != 0 && gate.seen >= gate.fail_from && gate.seen <= gate.fail_to {
                return Err(StoreError::Backend {
                    detail: format!("injected failure on commit {}", gate.seen),
                });
            }
        }
        self.inner.commit(tournament_id, batch).await
    }

    fn max_batch_ops(&self) -> usize {
        self.inner.max_batch_ops()
    }
}

/// Registers a full 4x4 field and closes registration.
async fn ready_for_draw(engine: &Engine, actor: ActorId) -> Result<TournamentId, EngineError> {
    let t = engine
        .create_tournament(actor, "Club Open", config_4x4())
        .await?;
    engine.open_registration(actor, t.id).await?;
    for (idx, name) in team_names(16).into_iter().enumerate() {
        engine
            .register_team(actor, t.id, &name, rated_players(idx + 1))
            .await?;
    }
    engine.close_registration(actor, t.id).await?;
    Ok(t.id)
}

fn sorted_by_number(mut matches: Vec<Match>) -> Vec<Match> {
    matches.sort_by_key(|m| m.match_number);
    matches
}

fn side_names(m: &Match) -> (&str, &str) {
    (
        m.side1.as_ref().map_or("", |s| s.team_name.as_str()),
        m.side2.as_ref().map_or("", |s| s.team_name.as_str()),
    )
}

#[tokio::test]
async fn the_full_arc_ends_completed_with_a_six_hop_history() -> Result<(), EngineError> {
    let h = harness();
    let (t, _) = completed_tournament(&h).await?;

    assert_eq!(t.status, Completed);
    assert_eq!(t.total_matches, 31);
    assert_eq!(t.completed_matches, 31);

    let hops: Vec<_> = t.phase_history.iter().map(|c| (c.from, c.to)).collect();
    assert_eq!(
        hops,
        [
            (Draft, RegistrationOpen),
            (RegistrationOpen, RegistrationClosed),
            (RegistrationClosed, GroupsGeneration),
            (GroupsGeneration, GroupsPhase),
            (GroupsPhase, KnockoutPhase),
            (KnockoutPhase, Completed),
        ]
    );
    assert!(t
        .phase_history
        .iter()
        .all(|c| c.at == FixedClock::default().0));
    Ok(())
}

#[tokio::test]
async fn phases_only_flip_in_order() -> Result<(), EngineError> {
    let h = harness();
    let t = h
        .engine
        .create_tournament(h.actor, "Club Open", config_4x4())
        .await?;

    let skips = [
        h.engine.close_registration(h.actor, t.id).await,
        h.engine.start_group_phase(h.actor, t.id).await,
        h.engine.complete(h.actor, t.id).await,
    ];
    for outcome in skips {
        let err = outcome.unwrap_err();
        assert!(
            matches!(
                err,
                EngineError::Conflict {
                    kind: ConflictKind::InvalidTransition,
                    ..
                }
            ),
            "{err:?}"
        );
    }
    let stored = require_tournament(h.engine.store(), t.id).await?;
    assert_eq!(stored.status, Draft);
    assert_eq!(stored.revision, 1);

    h.engine.open_registration(h.actor, t.id).await?;
    let err = h.engine.open_registration(h.actor, t.id).await.unwrap_err();
    assert!(
        matches!(
            err,
            EngineError::Conflict {
                kind: ConflictKind::InvalidTransition,
                ..
            }
        ),
        "{err:?}"
    );
    Ok(())
}

#[tokio::test]
async fn the_draw_needs_a_full_field() -> Result<(), EngineError> {
    let h = harness();
    let (t, teams) = registered_tournament(&h, config_4x4(), 16).await?;
    h.engine.close_registration(h.actor, t.id).await?;
    h.engine.withdraw_team(h.actor, t.id, teams[4].id).await?;

    let err = h.engine.generate_groups(h.actor, t.id).await.unwrap_err();
    match &err {
        EngineError::Precondition {
            kind: PreconditionKind::InsufficientTeams,
            detail,
        } => assert!(detail.contains("needs 16"), "{detail}"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.code(), ErrorCode::InsufficientTeams);
    Ok(())
}

#[tokio::test]
async fn the_draw_snakes_seeds_across_groups() -> Result<(), EngineError> {
    let h = harness();
    let (t, _) = registered_tournament(&h, config_4x4(), 16).await?;
    h.engine.close_registration(h.actor, t.id).await?;
    let outcome = h.engine.generate_groups(h.actor, t.id).await?;

    assert_eq!(outcome.matches_created, 24);
    assert_eq!(outcome.groups.len(), 4);
    assert_eq!(outcome.groups[0].label, "Group A");

    // Ratings ascend with the seed number, so the serpentine rows are
    // fully determined: 1-4 forward, 5-8 reverse, 9-12 forward, 13-16
    // reverse.
    let expected: [[&str; 4]; 4] = [
        ["Team 01", "Team 08", "Team 09", "Team 16"],
        ["Team 02", "Team 07", "Team 10", "Team 15"],
        ["Team 03", "Team 06", "Team 11", "Team 14"],
        ["Team 04", "Team 05", "Team 12", "Team 13"],
    ];
    let stored = h.store.list_teams(t.id, TeamFilter::default()).await?;
    let placement: HashMap<&str, (GroupNo, u8)> = stored
        .iter()
        .map(|team| {
            (
                team.name.as_str(),
                (team.group_no.unwrap(), team.group_position.unwrap()),
            )
        })
        .collect();
    for (group_idx, row) in expected.iter().enumerate() {
        for (pos_idx, name) in row.iter().enumerate() {
            assert_eq!(
                placement[name],
                ((group_idx + 1) as GroupNo, (pos_idx + 1) as u8),
                "{name}"
            );
        }
    }

    // The outcome reports the same draft order the teams were stored
    // with.
    let names: HashMap<TeamId, &str> = stored
        .iter()
        .map(|team| (team.id, team.name.as_str()))
        .collect();
    for (group_idx, group) in outcome.groups.iter().enumerate() {
        let drawn: Vec<&str> = group.team_ids.iter().map(|id| names[id]).collect();
        assert_eq!(drawn, expected[group_idx]);
    }
    Ok(())
}

#[tokio::test]
async fn the_draw_lays_out_a_full_round_robin() -> Result<(), EngineError> {
    let h = harness();
    let (t, _) = drawn_tournament(&h).await?;

    let fixtures = h.store.list_matches(t.id, MatchFilter::group_stage()).await?;
    assert_eq!(fixtures.len(), 24);
    assert!(fixtures.iter().all(|m| m.status == MatchStatus::Scheduled));

    for group_no in 1..=4 {
        let in_group = sorted_by_number(
            h.store
                .list_matches(t.id, MatchFilter::in_group(group_no))
                .await?,
        );
        assert_eq!(in_group.len(), 6);
        let numbers: Vec<u16> = in_group.iter().map(|m| m.match_number).collect();
        assert_eq!(numbers, [1, 2, 3, 4, 5, 6]);

        // Every pair meets exactly once over three two-match rounds.
        let mut pairs = HashSet::new();
        let mut per_round = HashMap::new();
        for m in &in_group {
            let (a, b) = side_names(m);
            pairs.insert((a.min(b).to_string(), a.max(b).to_string()));
            let round_no = match m.stage {
                MatchStage::Group { round_no, .. } => round_no,
                MatchStage::Knockout { .. } => panic!("group listing returned a knockout match"),
            };
            *per_round.entry(round_no).or_insert(0) += 1;
        }
        assert_eq!(pairs.len(), 6);
        assert_eq!(per_round, HashMap::from([(1, 2), (2, 2), (3, 2)]));
    }

    let stored = require_tournament(h.engine.store(), t.id).await?;
    assert_eq!(stored.total_matches, 24);
    assert_eq!(stored.completed_matches, 0);
    Ok(())
}

#[tokio::test]
async fn a_redraw_replaces_the_fixtures_without_a_new_history_entry() -> Result<(), EngineError> {
    let h = harness();
    let (t, _) = drawn_tournament(&h).await?;
    let before = h.store.list_teams(t.id, TeamFilter::default()).await?;
    let old_ids: HashSet<MatchId> = h
        .store
        .list_matches(t.id, MatchFilter::group_stage())
        .await?
        .iter()
        .map(|m| m.id)
        .collect();

    let outcome = h.engine.generate_groups(h.actor, t.id).await?;
    assert_eq!(outcome.matches_created, 24);

    let new_ids: HashSet<MatchId> = h
        .store
        .list_matches(t.id, MatchFilter::group_stage())
        .await?
        .iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(new_ids.len(), 24);
    assert!(old_ids.is_disjoint(&new_ids));

    let stored = require_tournament(h.engine.store(), t.id).await?;
    assert_eq!(stored.status, GroupsGeneration);
    assert_eq!(stored.phase_history.len(), 3);

    // Same draw seed and ratings, so the re-draw lands every team in
    // the same slot.
    let after = h.store.list_teams(t.id, TeamFilter::default()).await?;
    let slots = |teams: &[Team]| -> HashMap<String, (Option<GroupNo>, Option<u8>)> {
        teams
            .iter()
            .map(|team| (team.name.clone(), (team.group_no, team.group_position)))
            .collect()
    };
    assert_eq!(slots(&before), slots(&after));
    Ok(())
}

#[tokio::test]
async fn the_knockout_waits_for_every_group_result() -> Result<(), EngineError> {
    let h = harness();
    let (t, _) = groups_phase_tournament(&h).await?;

    let err = h.engine.start_knockout(h.actor, t.id).await.unwrap_err();
    match err {
        EngineError::Precondition {
            kind: PreconditionKind::GroupMatchesIncomplete,
            detail,
        } => assert!(detail.contains("24 of 24"), "{detail}"),
        other => panic!("unexpected error: {other:?}"),
    }

    let pending = h
        .store
        .list_matches(
            t.id,
            MatchFilter::group_stage().with_status(MatchStatus::Scheduled),
        )
        .await?;
    for m in pending.iter().take(23) {
        let sets = oriented_sets(m).unwrap();
        h.engine.submit_result(h.actor, t.id, m.id, sets).await?;
    }

    let err = h.engine.start_knockout(h.actor, t.id).await.unwrap_err();
    match err {
        EngineError::Precondition {
            kind: PreconditionKind::GroupMatchesIncomplete,
            detail,
        } => assert!(detail.contains("1 of 24"), "{detail}"),
        other => panic!("unexpected error: {other:?}"),
    }

    let last = &pending[23];
    h.engine
        .submit_result(h.actor, t.id, last.id, oriented_sets(last).unwrap())
        .await?;
    let summary = h.engine.start_knockout(h.actor, t.id).await?;
    assert_eq!(summary.starting_round, QuarterFinals);
    Ok(())
}

#[tokio::test]
async fn the_bracket_pairs_winners_with_other_groups_runners_up() -> Result<(), EngineError> {
    let h = harness();
    let (t, teams) = knockout_tournament(&h).await?;
    let id_of: HashMap<&str, TeamId> = teams
        .iter()
        .map(|team| (team.name.as_str(), team.id))
        .collect();

    let bracket = h.store.fetch_bracket(t.id).await?.unwrap();
    assert_eq!(bracket.starting_round, QuarterFinals);
    assert!(!bracket.third_place_match);
    let expected: Vec<SeedSlot> = [
        "Team 01", "Team 07", "Team 02", "Team 06", "Team 03", "Team 05", "Team 04", "Team 08",
    ]
    .iter()
    .map(|name| SeedSlot::Team {
        team_id: id_of[*name],
    })
    .collect();
    assert_eq!(bracket.slots, expected);

    let quarters = sorted_by_number(h.store.list_matches(t.id, MatchFilter::in_round(QuarterFinals)).await?);
    let pairs: Vec<(&str, &str)> = quarters.iter().map(side_names).collect();
    assert_eq!(
        pairs,
        [
            ("Team 01", "Team 07"),
            ("Team 02", "Team 06"),
            ("Team 03", "Team 05"),
            ("Team 04", "Team 08"),
        ]
    );

    // Later rounds stay TBD until fed by results.
    for round in [SemiFinals, Finals] {
        let fixtures = h.store.list_matches(t.id, MatchFilter::in_round(round)).await?;
        assert!(!fixtures.is_empty());
        assert!(fixtures.iter().all(|m| m.side1.is_none() && m.side2.is_none()));
    }

    assert_eq!(t.total_matches, 31);
    assert_eq!(t.completed_matches, 24);
    assert_eq!(
        t.phase_history.last().map(|c| (c.from, c.to)),
        Some((GroupsPhase, KnockoutPhase))
    );
    Ok(())
}

#[tokio::test]
async fn byes_complete_themselves_and_advance_the_seed() -> Result<(), EngineError> {
    let h = harness();
    let config = Configuration {
        group_count: 3,
        ..config_4x4()
    };
    let (t, teams) = knockout_tournament_with(&h, config, 12).await?;
    let id_of: HashMap<&str, TeamId> = teams
        .iter()
        .map(|team| (team.name.as_str(), team.id))
        .collect();

    // Six qualifiers pad out to a field of eight; the two strongest
    // seeds draw the byes.
    let bracket = h.store.fetch_bracket(t.id).await?.unwrap();
    let expected = vec![
        SeedSlot::Team { team_id: id_of["Team 01"] },
        SeedSlot::Bye,
        SeedSlot::Team { team_id: id_of["Team 05"] },
        SeedSlot::Bye,
        SeedSlot::Team { team_id: id_of["Team 02"] },
        SeedSlot::Team { team_id: id_of["Team 04"] },
        SeedSlot::Team { team_id: id_of["Team 03"] },
        SeedSlot::Team { team_id: id_of["Team 06"] },
    ];
    assert_eq!(bracket.slots, expected);

    let quarters = sorted_by_number(h.store.list_matches(t.id, MatchFilter::in_round(QuarterFinals)).await?);
    assert!(quarters[0].is_bye());
    assert_eq!(quarters[0].status, MatchStatus::Completed);
    assert_eq!(quarters[0].winner, Some(id_of["Team 01"]));
    assert!(quarters[1].is_bye());
    assert_eq!(quarters[1].winner, Some(id_of["Team 05"]));
    assert_eq!(side_names(&quarters[2]), ("Team 02", "Team 04"));
    assert_eq!(side_names(&quarters[3]), ("Team 03", "Team 06"));

    // Walkover winners are already waiting in the first semifinal.
    let semis = sorted_by_number(h.store.list_matches(t.id, MatchFilter::in_round(SemiFinals)).await?);
    assert_eq!(side_names(&semis[0]), ("Team 01", "Team 05"));
    assert!(semis[1].side1.is_none() && semis[1].side2.is_none());

    assert_eq!(t.total_matches, 25);
    assert_eq!(t.completed_matches, 20);
    Ok(())
}

#[tokio::test]
async fn completion_waits_for_the_final() -> Result<(), EngineError> {
    let h = harness();
    let (t, teams) = knockout_tournament(&h).await?;

    let err = h.engine.complete(h.actor, t.id).await.unwrap_err();
    match err {
        EngineError::Precondition {
            kind: PreconditionKind::FinalsIncomplete,
            detail,
        } => assert!(detail.contains("final"), "{detail}"),
        other => panic!("unexpected error: {other:?}"),
    }

    play_knockout_stage(&h, t.id).await?;
    let done = h.engine.complete(h.actor, t.id).await?;
    assert_eq!(done.status, Completed);

    let final_match = &h.store.list_matches(t.id, MatchFilter::in_round(Finals)).await?[0];
    let champion = teams.iter().find(|team| team.name == "Team 01").unwrap();
    assert_eq!(final_match.winner, Some(champion.id));
    Ok(())
}

#[tokio::test]
async fn the_third_place_match_gates_completion_too() -> Result<(), EngineError> {
    let h = harness();
    let config = Configuration {
        third_place_match: true,
        ..config_4x4()
    };
    let (t, _) = knockout_tournament_with(&h, config, 16).await?;

    for round in [QuarterFinals, SemiFinals, Finals] {
        for m in h.store.list_matches(t.id, MatchFilter::in_round(round)).await? {
            let sets = oriented_sets(&m).unwrap();
            h.engine.submit_result(h.actor, t.id, m.id, sets).await?;
        }
    }

    let err = h.engine.complete(h.actor, t.id).await.unwrap_err();
    match err {
        EngineError::Precondition {
            kind: PreconditionKind::FinalsIncomplete,
            detail,
        } => assert!(detail.contains("third-place"), "{detail}"),
        other => panic!("unexpected error: {other:?}"),
    }

    // The semifinal losers meet for third.
    let third = &h.store.list_matches(t.id, MatchFilter::in_round(ThirdPlace)).await?[0];
    assert_eq!(side_names(third), ("Team 02", "Team 04"));
    h.engine
        .submit_result(h.actor, t.id, third.id, oriented_sets(third).unwrap())
        .await?;

    let done = h.engine.complete(h.actor, t.id).await?;
    assert_eq!(done.status, Completed);
    assert_eq!(done.total_matches, 32);
    assert_eq!(done.completed_matches, 32);
    Ok(())
}

#[tokio::test]
async fn cancel_parks_the_tournament_and_rollback_revives_it() -> Result<(), EngineError> {
    let h = harness();
    let (t, _) = groups_phase_tournament(&h).await?;

    let cancelled = h.engine.cancel(h.actor, t.id).await?;
    assert_eq!(cancelled.status, TournamentStatus::Cancelled);

    let fixture = h
        .store
        .list_matches(t.id, MatchFilter::group_stage())
        .await?
        .into_iter()
        .next()
        .unwrap();
    let err = h
        .engine
        .submit_result(h.actor, t.id, fixture.id, oriented_sets(&fixture).unwrap())
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            EngineError::Conflict {
                kind: ConflictKind::InvalidTransition,
                ..
            }
        ),
        "{err:?}"
    );

    let revived = h.engine.rollback_phase(h.actor, t.id).await?;
    assert_eq!(revived.status, GroupsPhase);
    assert_eq!(
        h.store
            .list_matches(t.id, MatchFilter::group_stage())
            .await?
            .len(),
        24
    );
    Ok(())
}

#[tokio::test]
async fn reactivation_reopens_the_knockout_for_a_correction() -> Result<(), EngineError> {
    let h = harness();
    let (t, teams) = completed_tournament(&h).await?;

    let reopened = h.engine.reactivate(h.actor, t.id).await?;
    assert_eq!(reopened.status, KnockoutPhase);
    assert_eq!(
        reopened.phase_history.last().map(|c| (c.from, c.to)),
        Some((Completed, KnockoutPhase))
    );

    // Overturn the final: the other side wins the replay.
    let final_match = &h.store.list_matches(t.id, MatchFilter::in_round(Finals)).await?[0];
    h.engine.clear_result(h.actor, t.id, final_match.id).await?;
    h.engine
        .submit_result(
            h.actor,
            t.id,
            final_match.id,
            vec![
                SetScore { side1: 3, side2: 6 },
                SetScore { side1: 4, side2: 6 },
            ],
        )
        .await?;
    let done = h.engine.complete(h.actor, t.id).await?;
    assert_eq!(done.status, Completed);

    let final_match = &h.store.list_matches(t.id, MatchFilter::in_round(Finals)).await?[0];
    let runner_up = teams.iter().find(|team| team.name == "Team 03").unwrap();
    assert_eq!(final_match.winner, Some(runner_up.id));
    Ok(())
}

#[tokio::test]
async fn rolling_back_the_draw_clears_every_artifact() -> Result<(), EngineError> {
    let h = harness();
    let (t, _) = drawn_tournament(&h).await?;

    let restored = h.engine.rollback_phase(h.actor, t.id).await?;
    assert_eq!(restored.status, RegistrationClosed);
    assert_eq!(restored.phase_history.len(), 2);
    assert_eq!(restored.total_matches, 0);
    assert_eq!(restored.completed_matches, 0);

    assert!(h
        .store
        .list_matches(t.id, MatchFilter::default())
        .await?
        .is_empty());
    assert!(h.store.list_standings(t.id, None).await?.is_empty());
    let teams = h.store.list_teams(t.id, TeamFilter::default()).await?;
    assert!(teams
        .iter()
        .all(|team| team.group_no.is_none() && team.group_position.is_none()));

    // The phase can simply be taken again.
    let outcome = h.engine.generate_groups(h.actor, t.id).await?;
    assert_eq!(outcome.matches_created, 24);
    assert_eq!(
        require_tournament(h.engine.store(), t.id).await?.status,
        GroupsGeneration
    );
    Ok(())
}

#[tokio::test]
async fn rolling_back_the_knockout_restores_the_group_phase() -> Result<(), EngineError> {
    let h = harness();
    let (t, _) = knockout_tournament(&h).await?;

    let restored = h.engine.rollback_phase(h.actor, t.id).await?;
    assert_eq!(restored.status, GroupsPhase);
    assert_eq!(restored.total_matches, 24);
    assert_eq!(restored.completed_matches, 24);

    assert!(h.store.fetch_bracket(t.id).await?.is_none());
    assert!(h
        .store
        .list_matches(t.id, MatchFilter::knockout())
        .await?
        .is_empty());
    assert_eq!(
        h.store
            .list_matches(t.id, MatchFilter::group_stage())
            .await?
            .len(),
        24
    );

    let summary = h.engine.start_knockout(h.actor, t.id).await?;
    assert_eq!(summary.starting_round, QuarterFinals);
    Ok(())
}

#[tokio::test]
async fn rollback_needs_a_recorded_transition() -> Result<(), EngineError> {
    let h = harness();
    let t = h
        .engine
        .create_tournament(h.actor, "Club Open", config_4x4())
        .await?;
    let err = h.engine.rollback_phase(h.actor, t.id).await.unwrap_err();
    assert!(
        matches!(
            err,
            EngineError::Precondition {
                kind: PreconditionKind::HistoryEmpty,
                ..
            }
        ),
        "{err:?}"
    );
    Ok(())
}

#[tokio::test]
async fn rollback_refuses_a_history_that_diverged_from_the_status() -> Result<(), EngineError> {
    let h = harness();
    let (t, _) = groups_phase_tournament(&h).await?;

    // Flip the status behind the engine's back, leaving the history
    // pointing elsewhere.
    let mut rigged = require_tournament(h.engine.store(), t.id).await?;
    let expected_revision = rigged.revision;
    rigged.status = KnockoutPhase;
    let mut batch = WriteBatch::new();
    batch.push(WriteOp::Update {
        doc: Document::Tournament(rigged),
        expected_revision,
    });
    h.store.commit(t.id, batch).await?;

    let err = h.engine.rollback_phase(h.actor, t.id).await.unwrap_err();
    match err {
        EngineError::Precondition {
            kind: PreconditionKind::HistoryMismatch,
            detail,
        } => assert!(detail.contains("KNOCKOUT_PHASE"), "{detail}"),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn a_tiny_batch_cap_still_completes_the_arc() -> Result<(), EngineError> {
    let h = harness_with_store(Arc::new(MemoryStore::with_max_batch_ops(6)));
    let (t, _) = completed_tournament(&h).await?;
    assert_eq!(t.status, Completed);
    assert_eq!(t.total_matches, 31);
    assert_eq!(t.completed_matches, 31);
    Ok(())
}

#[tokio::test]
async fn a_mid_draw_failure_rolls_the_artifacts_back() -> Result<(), EngineError> {
    let store = Arc::new(FlakyStore::new(MemoryStore::with_max_batch_ops(8)));
    let engine = Engine::new(
        store.clone(),
        Arc::new(OpenAccess),
        Arc::new(FixedClock::default()),
    );
    let actor = Uuid::new_v4();
    let id = ready_for_draw(&engine, actor).await?;

    // The draw stages 16 assignment updates plus 24 fixture creates:
    // five chunks of eight, then the flip. Kill the third chunk.
    store.fail_commits(3, 3);
    let err = engine.generate_groups(actor, id).await.unwrap_err();
    assert!(matches!(err, EngineError::Transaction { .. }), "{err:?}");

    let t = require_tournament(engine.store(), id).await?;
    assert_eq!(t.status, RegistrationClosed);
    assert_eq!(t.total_matches, 0);
    assert!(engine
        .store()
        .list_matches(id, MatchFilter::default())
        .await?
        .is_empty());
    let teams = engine.store().list_teams(id, TeamFilter::default()).await?;
    assert!(teams.iter().all(|team| team.group_no.is_none()));

    // The failure window has passed; a plain retry completes the draw.
    let outcome = engine.generate_groups(actor, id).await?;
    assert_eq!(outcome.matches_created, 24);
    assert_eq!(
        require_tournament(engine.store(), id).await?.status,
        GroupsGeneration
    );
    Ok(())
}

#[tokio::test]
async fn a_failed_automatic_rollback_escalates_and_a_retry_converges() -> Result<(), EngineError> {
    let store = Arc::new(FlakyStore::new(MemoryStore::with_max_batch_ops(8)));
    let engine = Engine::new(
        store.clone(),
        Arc::new(OpenAccess),
        Arc::new(FixedClock::default()),
    );
    let actor = Uuid::new_v4();
    let id = ready_for_draw(&engine, actor).await?;

    // Every commit from the third one fails, so the automatic rollback
    // cannot help either.
    store.fail_commits(3, usize::MAX);
    let err = engine.generate_groups(actor, id).await.unwrap_err();
    match err {
        EngineError::FatalReconciliation {
            tournament_id,
            status,
            ..
        } => {
            assert_eq!(tournament_id, id);
            assert_eq!(status, RegistrationClosed);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The two applied chunks left their assignments behind.
    let stranded = engine
        .store()
        .list_teams(id, TeamFilter::default())
        .await?
        .iter()
        .filter(|team| team.group_no.is_some())
        .count();
    assert_eq!(stranded, 16);

    // Once the store recovers, re-running the draw converges: stale
    // assignments are overwritten and the fixtures created fresh.
    store.heal();
    let outcome = engine.generate_groups(actor, id).await?;
    assert_eq!(outcome.matches_created, 24);
    let t = require_tournament(engine.store(), id).await?;
    assert_eq!(t.status, GroupsGeneration);
    assert_eq!(t.total_matches, 24);
    Ok(())
}

#[tokio::test]
async fn the_overview_tracks_the_tournament_through_its_stages() -> Result<(), EngineError> {
    let h = harness();
    let (t, _) = registered_tournament(&h, config_4x4(), 16).await?;
    let view = h.engine.tournament_overview(t.id).await?;
    assert_eq!(view.status, RegistrationOpen);
    assert_eq!(view.registered_teams, 16);
    assert!(view.groups.is_empty());
    assert!(view.knockout.is_empty());
    assert!(!view.points_applied);

    let h = harness();
    let (t, _) = completed_tournament(&h).await?;
    let view = h.engine.tournament_overview(t.id).await?;
    assert_eq!(view.status, Completed);
    assert_eq!(view.total_matches, 31);
    assert_eq!(view.completed_matches, 31);
    assert!(!view.points_applied);

    assert_eq!(view.groups.len(), 4);
    assert_eq!(view.groups[0].label, "Group A");
    let rows = &view.groups[0].rows;
    assert_eq!(rows[0].team_name, "Team 01");
    let positions: Vec<u8> = rows.iter().map(|r| r.standing.position).collect();
    assert_eq!(positions, [1, 2, 3, 4]);

    let rounds: Vec<KnockoutRound> = view.knockout.iter().map(|r| r.round).collect();
    assert_eq!(rounds, [QuarterFinals, SemiFinals, Finals]);
    assert_eq!(view.knockout[0].label, "Quarter-finals");
    assert!(view
        .knockout
        .iter()
        .flat_map(|r| r.matches.iter())
        .all(|m| m.status == MatchStatus::Completed));
    Ok(())
}
