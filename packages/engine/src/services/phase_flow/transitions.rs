//! Plain status flips: validated, guarded, one atomic batch each.

use tracing::info;

use crate::domain::phase;
use crate::entities::ids::{ActorId, TournamentId};
use crate::entities::matches::{KnockoutRound, MatchStatus};
use crate::entities::tournaments::{Tournament, TournamentStatus};
use crate::errors::{EngineError, PreconditionKind};
use crate::repos::matches::find_round_fixture;
use crate::repos::tournaments::require_tournament;
use crate::services::{ensure_not_archived, Engine};
use crate::store::{Action, Document, Guard, WriteBatch, WriteOp};

impl Engine {
    pub async fn open_registration(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
    ) -> Result<Tournament, EngineError> {
        self.flip(actor_id, tournament_id, TournamentStatus::RegistrationOpen)
            .await
    }

    pub async fn close_registration(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
    ) -> Result<Tournament, EngineError> {
        self.flip(actor_id, tournament_id, TournamentStatus::RegistrationClosed)
            .await
    }

    /// Draft fixtures reviewed, play begins.
    pub async fn start_group_phase(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
    ) -> Result<Tournament, EngineError> {
        self.flip(actor_id, tournament_id, TournamentStatus::GroupsPhase)
            .await
    }

    /// KnockoutPhase → Completed once the deciding fixtures are played.
    pub async fn complete(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
    ) -> Result<Tournament, EngineError> {
        self.authorize(actor_id, tournament_id, Action::ManageTournament)
            .await?;
        let tournament = require_tournament(self.store(), tournament_id).await?;
        ensure_not_archived(&tournament)?;
        phase::ensure(tournament.status, TournamentStatus::Completed)?;

        let finals = find_round_fixture(self.store(), tournament_id, KnockoutRound::Finals)
            .await?
            .filter(|m| m.status == MatchStatus::Completed);
        if finals.is_none() {
            return Err(EngineError::precondition(
                PreconditionKind::FinalsIncomplete,
                "the final has not been played",
            ));
        }
        if tournament.config.third_place_match {
            // The fixture may be absent for a two-team knockout.
            let third = find_round_fixture(self.store(), tournament_id, KnockoutRound::ThirdPlace)
                .await?;
            if third.is_some_and(|m| m.status != MatchStatus::Completed) {
                return Err(EngineError::precondition(
                    PreconditionKind::FinalsIncomplete,
                    "the third-place match has not been played",
                ));
            }
        }

        self.commit_flip(tournament, TournamentStatus::Completed).await
    }

    /// Any non-terminal state → Cancelled.
    pub async fn cancel(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
    ) -> Result<Tournament, EngineError> {
        self.flip(actor_id, tournament_id, TournamentStatus::Cancelled)
            .await
    }

    /// Completed → KnockoutPhase, the single road out of a terminal
    /// state; used to fix a late result correction.
    pub async fn reactivate(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
    ) -> Result<Tournament, EngineError> {
        self.flip(actor_id, tournament_id, TournamentStatus::KnockoutPhase)
            .await
    }

    async fn flip(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
        to: TournamentStatus,
    ) -> Result<Tournament, EngineError> {
        self.authorize(actor_id, tournament_id, Action::ManageTournament)
            .await?;
        let tournament = require_tournament(self.store(), tournament_id).await?;
        ensure_not_archived(&tournament)?;
        phase::ensure(tournament.status, to)?;
        self.commit_flip(tournament, to).await
    }

    pub(crate) async fn commit_flip(
        &self,
        mut tournament: Tournament,
        to: TournamentStatus,
    ) -> Result<Tournament, EngineError> {
        let from = tournament.status;
        let expected_revision = tournament.revision;
        tournament.record_transition(to, self.now());

        let mut batch = WriteBatch::new();
        batch.guard(Guard::TournamentStatusIs(from));
        batch.push(WriteOp::Update {
            doc: Document::Tournament(tournament.clone()),
            expected_revision,
        });
        self.store.commit(tournament.id, batch).await?;
        tournament.revision = expected_revision + 1;

        info!(
            tournament_id = %tournament.id,
            from = %from,
            to = %to,
            "phase transition"
        );
        Ok(tournament)
    }
}
