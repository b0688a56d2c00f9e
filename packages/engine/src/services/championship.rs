//! Applying and reverting championship points.

use std::collections::HashMap;

use tracing::info;
use uuid::Uuid;

use crate::domain::championship;
use crate::entities::ids::{ActorId, GroupNo, TeamId, TournamentId};
use crate::entities::points::PointsApplication;
use crate::entities::tournaments::TournamentStatus;
use crate::errors::{ConflictKind, EngineError};
use crate::repos::points::require_application;
use crate::repos::tournaments::require_tournament;
use crate::services::{ensure_not_archived, Engine};
use crate::store::{
    Action, DocKey, Document, EntityKind, Guard, MatchFilter, TeamFilter, WriteBatch, WriteOp,
};

impl Engine {
    /// Calculates championship points for a completed tournament and
    /// credits every player's club leaderboard total.
    ///
    /// The application record and all leaderboard adjustments land in a
    /// single batch, so points are either fully applied or not at all;
    /// the `NoPointsApplication` guard makes double application a
    /// conflict even under races.
    pub async fn apply_points(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
    ) -> Result<PointsApplication, EngineError> {
        self.authorize(actor_id, tournament_id, Action::AwardPoints)
            .await?;
        let tournament = require_tournament(self.store(), tournament_id).await?;
        ensure_not_archived(&tournament)?;
        if tournament.status != TournamentStatus::Completed {
            return Err(EngineError::conflict(
                ConflictKind::InvalidTransition,
                format!(
                    "points are awarded once the tournament is COMPLETED, not {}",
                    tournament.status
                ),
            ));
        }
        if self
            .store()
            .fetch_points_application(tournament_id)
            .await?
            .is_some()
        {
            return Err(EngineError::conflict(
                ConflictKind::PointsAlreadyApplied,
                format!("tournament {tournament_id} already has applied points"),
            ));
        }

        let teams = self
            .store()
            .list_teams(tournament_id, TeamFilter::active())
            .await?;
        let matches = self
            .store()
            .list_matches(tournament_id, MatchFilter::default())
            .await?;
        let mut placements: HashMap<TeamId, (GroupNo, u8)> = HashMap::new();
        for group_no in 1..=tournament.config.group_count {
            let table = self
                .group_table(tournament_id, group_no, &tournament.config.points, None)
                .await?;
            for row in table {
                placements.insert(row.team_id, (group_no, row.position));
            }
        }

        let outcome = championship::calculate(
            &tournament.config.championship,
            &teams,
            &matches,
            &placements,
        );
        let application = PointsApplication {
            id: Uuid::new_v4(),
            teams: outcome.teams,
            awards: outcome.awards,
            revision: 1,
            applied_at: self.now(),
        };

        let mut batch = WriteBatch::new();
        batch.guard(Guard::TournamentStatusIs(TournamentStatus::Completed));
        batch.guard(Guard::NoPointsApplication);
        batch.push(WriteOp::Create(Document::PointsApplication(
            application.clone(),
        )));
        for award in &application.awards {
            batch.push(WriteOp::AdjustLeaderboard {
                player_id: award.player_id,
                delta: award.amount,
            });
        }
        self.store().commit(tournament_id, batch).await?;

        info!(
            tournament_id = %tournament_id,
            teams = application.teams.len(),
            awards = application.awards.len(),
            "championship points applied"
        );
        Ok(application)
    }

    /// Subtracts exactly what [`Engine::apply_points`] credited and
    /// deletes the application record, again in one batch. The `Present`
    /// guard stops two concurrent reverts from subtracting twice.
    pub async fn revert_points(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
    ) -> Result<PointsApplication, EngineError> {
        self.authorize(actor_id, tournament_id, Action::AwardPoints)
            .await?;
        let tournament = require_tournament(self.store(), tournament_id).await?;
        ensure_not_archived(&tournament)?;
        let application = require_application(self.store(), tournament_id).await?;

        let key = DocKey::new(EntityKind::PointsApplication, application.id);
        let mut batch = WriteBatch::new();
        batch.guard(Guard::Present(key));
        batch.push(WriteOp::Delete(key));
        for award in &application.awards {
            batch.push(WriteOp::AdjustLeaderboard {
                player_id: award.player_id,
                delta: -award.amount,
            });
        }
        self.store().commit(tournament_id, batch).await?;

        info!(
            tournament_id = %tournament_id,
            awards = application.awards.len(),
            "championship points reverted"
        );
        Ok(application)
    }
}
