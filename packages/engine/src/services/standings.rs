//! Standings computation and the persisted-table rebuild.

use tracing::info;

use crate::domain::standings;
use crate::entities::ids::{ActorId, GroupNo, TeamId, TournamentId};
use crate::entities::matches::Match;
use crate::entities::standings::Standing;
use crate::entities::tournaments::{PointsRule, TournamentStatus};
use crate::errors::{ConflictKind, EngineError};
use crate::repos::tournaments::require_tournament;
use crate::services::{ensure_not_archived, Engine};
use crate::store::{Action, Document, MatchFilter, TeamFilter, WriteOp};

impl Engine {
    /// Computes one group's table from current matches. `override_match`
    /// substitutes a not-yet-committed fixture so a submission can
    /// write match and standings in the same batch.
    pub(crate) async fn group_table(
        &self,
        tournament_id: TournamentId,
        group_no: GroupNo,
        points: &PointsRule,
        override_match: Option<&Match>,
    ) -> Result<Vec<Standing>, EngineError> {
        let members = self
            .store()
            .list_teams(tournament_id, TeamFilter::group(group_no))
            .await?;
        let pairs: Vec<(TeamId, Option<f64>)> =
            members.iter().map(|t| (t.id, t.rating())).collect();
        let mut fixtures = self
            .store()
            .list_matches(tournament_id, MatchFilter::in_group(group_no))
            .await?;
        if let Some(updated) = override_match {
            if let Some(slot) = fixtures.iter_mut().find(|m| m.id == updated.id) {
                *slot = updated.clone();
            }
        }
        Ok(standings::compute_group(group_no, &pairs, &fixtures, points))
    }

    /// Recomputes and overwrites every group table.
    ///
    /// The persisted standings are only a cache of the completed
    /// matches, so this is safe at any point after the draw; it exists
    /// for hosts that suspect their cache drifted.
    pub async fn rebuild_standings(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
    ) -> Result<Vec<Standing>, EngineError> {
        self.authorize(actor_id, tournament_id, Action::ManageTournament)
            .await?;
        let tournament = require_tournament(self.store(), tournament_id).await?;
        ensure_not_archived(&tournament)?;
        if !matches!(
            tournament.status,
            TournamentStatus::GroupsGeneration
                | TournamentStatus::GroupsPhase
                | TournamentStatus::KnockoutPhase
                | TournamentStatus::Completed
        ) {
            return Err(EngineError::conflict(
                ConflictKind::InvalidTransition,
                format!(
                    "no group stage to rebuild while the tournament is {}",
                    tournament.status
                ),
            ));
        }

        let mut rows = Vec::new();
        let mut ops = Vec::new();
        for group_no in 1..=tournament.config.group_count {
            let table = self
                .group_table(tournament_id, group_no, &tournament.config.points, None)
                .await?;
            for row in &table {
                ops.push(WriteOp::Put(Document::Standing(row.clone())));
            }
            rows.extend(table);
        }
        self.commit_chunked(tournament_id, ops, Vec::new()).await?;

        info!(tournament_id = %tournament_id, rows = rows.len(), "standings rebuilt");
        Ok(rows)
    }
}
