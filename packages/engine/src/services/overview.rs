//! Read-model assembly for host UIs. Pure reads, no authorization.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::rules::group_label;
use crate::entities::ids::{GroupNo, MatchId, TeamId, TournamentId};
use crate::entities::matches::{KnockoutRound, Match, MatchSide, MatchStatus, SetScore};
use crate::entities::standings::Standing;
use crate::entities::tournaments::TournamentStatus;
use crate::errors::EngineError;
use crate::repos::tournaments::require_tournament;
use crate::services::Engine;
use crate::store::{MatchFilter, TeamFilter};

/// Snapshot of one tournament for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TournamentOverview {
    pub tournament_id: TournamentId,
    pub name: String,
    pub status: TournamentStatus,
    pub archived: bool,
    pub registered_teams: u32,
    pub total_matches: u32,
    pub completed_matches: u32,
    /// One table per drawn group, rows in final order.
    pub groups: Vec<GroupTable>,
    /// Ladder rounds from the opening round down to the final, then the
    /// third-place match when one exists. Empty before the bracket.
    pub knockout: Vec<RoundOverview>,
    pub points_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTable {
    pub group_no: GroupNo,
    pub label: String,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub team_name: String,
    #[serde(flatten)]
    pub standing: Standing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundOverview {
    pub round: KnockoutRound,
    pub label: &'static str,
    pub matches: Vec<MatchOverview>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOverview {
    pub match_id: MatchId,
    pub match_number: u16,
    pub side1: Option<MatchSide>,
    pub side2: Option<MatchSide>,
    pub status: MatchStatus,
    pub sets: Vec<SetScore>,
    pub winner: Option<TeamId>,
}

impl Engine {
    /// Assembles the persisted state into one display document: header
    /// with counters, group tables joined with team names, knockout
    /// rounds in ladder order.
    pub async fn tournament_overview(
        &self,
        tournament_id: TournamentId,
    ) -> Result<TournamentOverview, EngineError> {
        let tournament = require_tournament(self.store(), tournament_id).await?;
        let teams = self
            .store()
            .list_teams(tournament_id, TeamFilter::default())
            .await?;
        let names: HashMap<TeamId, String> =
            teams.into_iter().map(|t| (t.id, t.name)).collect();

        let mut groups = Vec::new();
        for group_no in 1..=tournament.config.group_count {
            let mut rows = self
                .store()
                .list_standings(tournament_id, Some(group_no))
                .await?;
            if rows.is_empty() {
                continue;
            }
            rows.sort_by_key(|s| s.position);
            let rows = rows
                .into_iter()
                .map(|standing| TableRow {
                    team_name: names.get(&standing.team_id).cloned().unwrap_or_default(),
                    standing,
                })
                .collect();
            groups.push(GroupTable {
                group_no,
                label: group_label(group_no),
                rows,
            });
        }

        let knockout = match self.store().fetch_bracket(tournament_id).await? {
            None => Vec::new(),
            Some(bracket) => {
                let fixtures = self
                    .store()
                    .list_matches(tournament_id, MatchFilter::knockout())
                    .await?;
                ladder(bracket.starting_round, &fixtures)
            }
        };

        let points_applied = self
            .store()
            .fetch_points_application(tournament_id)
            .await?
            .is_some();

        Ok(TournamentOverview {
            tournament_id,
            name: tournament.name,
            status: tournament.status,
            archived: tournament.archived,
            registered_teams: tournament.registered_teams,
            total_matches: tournament.total_matches,
            completed_matches: tournament.completed_matches,
            groups,
            knockout,
            points_applied,
        })
    }
}

fn ladder(starting_round: KnockoutRound, fixtures: &[Match]) -> Vec<RoundOverview> {
    let mut rounds = Vec::new();
    let mut cursor = Some(starting_round);
    while let Some(round) = cursor {
        rounds.push(round);
        cursor = round.next();
    }
    rounds.push(KnockoutRound::ThirdPlace);

    let mut out = Vec::new();
    for round in rounds {
        let mut in_round: Vec<&Match> = fixtures
            .iter()
            .filter(|m| m.knockout_round() == Some(round))
            .collect();
        if in_round.is_empty() {
            continue;
        }
        in_round.sort_by_key(|m| m.match_number);
        out.push(RoundOverview {
            round,
            label: round.label(),
            matches: in_round.into_iter().map(overview_row).collect(),
        });
    }
    out
}

fn overview_row(m: &Match) -> MatchOverview {
    MatchOverview {
        match_id: m.id,
        match_number: m.match_number,
        side1: m.side1.clone(),
        side2: m.side2.clone(),
        status: m.status,
        sets: m.sets.clone(),
        winner: m.winner,
    }
}
