//! Transition failure handling and history-driven rollback.

use tracing::{error, info, warn};

use crate::entities::ids::{ActorId, MatchId, TournamentId};
use crate::entities::matches::MatchStatus;
use crate::entities::tournaments::{Tournament, TournamentStatus};
use crate::errors::{EngineError, PreconditionKind};
use crate::repos::tournaments::require_tournament;
use crate::services::{ensure_not_archived, Engine};
use crate::store::{
    Action, DocKey, Document, EntityKind, Guard, MatchFilter, TeamFilter, WriteBatch,
    WriteOp,
};
use uuid::Uuid;

/// Artifacts to discard when a generating transition fails midway.
pub(crate) enum UndoPlan {
    GroupDraw { created_match_ids: Vec<MatchId> },
    Knockout {
        created_match_ids: Vec<MatchId>,
        bracket_id: Uuid,
    },
}

impl Engine {
    /// Undoes the most recent phase transition.
    ///
    /// Deletes the artifacts that transition created (group fixtures,
    /// standings and team assignments for the draw; knockout fixtures
    /// and the bracket summary for the knockout), restores the prior
    /// status and pops the history entry. Deletions are idempotent and
    /// chunked; the status restore rides in the final atomic batch, so
    /// a partly failed rollback can simply be re-run.
    pub async fn rollback_phase(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
    ) -> Result<Tournament, EngineError> {
        self.authorize(actor_id, tournament_id, Action::ManageTournament)
            .await?;
        let tournament = require_tournament(self.store(), tournament_id).await?;
        ensure_not_archived(&tournament)?;

        let Some(last) = tournament.phase_history.last().cloned() else {
            return Err(EngineError::precondition(
                PreconditionKind::HistoryEmpty,
                "no phase transitions recorded",
            ));
        };
        if last.to != tournament.status {
            return Err(EngineError::precondition(
                PreconditionKind::HistoryMismatch,
                format!(
                    "history ends {} -> {} but the tournament is {}",
                    last.from, last.to, tournament.status
                ),
            ));
        }

        let now = self.now();
        let mut staged: Vec<WriteOp> = Vec::new();
        let mut total_matches = tournament.total_matches;
        let mut completed_matches = tournament.completed_matches;

        match (last.from, last.to) {
            (TournamentStatus::RegistrationClosed, TournamentStatus::GroupsGeneration) => {
                let fixtures = self
                    .store()
                    .list_matches(tournament_id, MatchFilter::group_stage())
                    .await?;
                for m in &fixtures {
                    staged.push(WriteOp::Delete(DocKey::new(EntityKind::Match, m.id)));
                }
                for row in self.store().list_standings(tournament_id, None).await? {
                    staged.push(WriteOp::Delete(Document::Standing(row).key()));
                }
                for team in self
                    .store()
                    .list_teams(tournament_id, TeamFilter::default())
                    .await?
                {
                    if team.group_no.is_none() {
                        continue;
                    }
                    let expected_revision = team.revision;
                    let mut doc = team;
                    doc.clear_group_assignment(now);
                    staged.push(WriteOp::Update {
                        doc: Document::Team(doc),
                        expected_revision,
                    });
                }
                let survivors = self
                    .store()
                    .list_matches(tournament_id, MatchFilter::knockout())
                    .await?;
                total_matches = survivors.len() as u32;
                completed_matches = survivors
                    .iter()
                    .filter(|m| m.status == MatchStatus::Completed)
                    .count() as u32;
            }
            (TournamentStatus::GroupsPhase, TournamentStatus::KnockoutPhase) => {
                let fixtures = self
                    .store()
                    .list_matches(tournament_id, MatchFilter::knockout())
                    .await?;
                for m in &fixtures {
                    staged.push(WriteOp::Delete(DocKey::new(EntityKind::Match, m.id)));
                }
                if let Some(bracket) = self.store().fetch_bracket(tournament_id).await? {
                    staged.push(WriteOp::Delete(Document::Bracket(bracket).key()));
                }
                let survivors = self
                    .store()
                    .list_matches(tournament_id, MatchFilter::group_stage())
                    .await?;
                total_matches = survivors.len() as u32;
                completed_matches = survivors
                    .iter()
                    .filter(|m| m.status == MatchStatus::Completed)
                    .count() as u32;
            }
            // Every other recorded transition is a plain flip.
            _ => {}
        }

        let mut updated = tournament.clone();
        let expected_revision = updated.revision;
        updated.phase_history.pop();
        updated.status = last.from;
        updated.total_matches = total_matches;
        updated.completed_matches = completed_matches;
        updated.updated_at = now;
        let flip = WriteOp::Update {
            doc: Document::Tournament(updated.clone()),
            expected_revision,
        };

        self.commit_staged_then_flip(
            tournament_id,
            staged,
            flip,
            vec![Guard::TournamentStatusIs(tournament.status)],
        )
        .await?;
        updated.revision = expected_revision + 1;

        info!(
            tournament_id = %tournament_id,
            undone = %last.to,
            restored = %last.from,
            "phase rolled back"
        );
        Ok(updated)
    }

    /// Commits a generating transition: artifacts first (chunked when
    /// they exceed the batch cap), the status flip alone at the end.
    /// When everything fits one batch the commit is fully atomic and a
    /// failure changes nothing; on a chunked failure the undo plan runs
    /// once, and if that fails too the error escalates to
    /// [`EngineError::FatalReconciliation`].
    pub(crate) async fn commit_transition(
        &self,
        tournament_id: TournamentId,
        staged: Vec<WriteOp>,
        flip: WriteOp,
        guards: Vec<Guard>,
        status: TournamentStatus,
        undo: UndoPlan,
    ) -> Result<(), EngineError> {
        let cap = self.store.max_batch_ops().max(1);
        if staged.len() + 1 <= cap {
            let mut ops = staged;
            ops.push(flip);
            self.store
                .commit(tournament_id, WriteBatch { ops, guards })
                .await?;
            return Ok(());
        }

        match self
            .commit_staged_then_flip(tournament_id, staged, flip, guards)
            .await
        {
            Ok(()) => Ok(()),
            Err(primary) => {
                warn!(
                    tournament_id = %tournament_id,
                    error = %primary,
                    "transition failed midway, rolling created artifacts back"
                );
                match self.run_undo(tournament_id, undo).await {
                    Ok(()) => Err(primary),
                    Err(undo_err) => {
                        error!(
                            tournament_id = %tournament_id,
                            error = %undo_err,
                            "automatic rollback failed"
                        );
                        Err(EngineError::fatal_reconciliation(
                            tournament_id,
                            status,
                            format!(
                                "transition failed ({primary}) and automatic rollback also failed ({undo_err})"
                            ),
                        ))
                    }
                }
            }
        }
    }

    async fn commit_staged_then_flip(
        &self,
        tournament_id: TournamentId,
        staged: Vec<WriteOp>,
        flip: WriteOp,
        guards: Vec<Guard>,
    ) -> Result<(), EngineError> {
        self.commit_chunked(tournament_id, staged, guards.clone())
            .await?;
        self.store
            .commit(
                tournament_id,
                WriteBatch {
                    ops: vec![flip],
                    guards,
                },
            )
            .await?;
        Ok(())
    }

    async fn run_undo(
        &self,
        tournament_id: TournamentId,
        undo: UndoPlan,
    ) -> Result<(), EngineError> {
        let mut ops: Vec<WriteOp> = Vec::new();
        match undo {
            UndoPlan::GroupDraw { created_match_ids } => {
                for id in created_match_ids {
                    ops.push(WriteOp::Delete(DocKey::new(EntityKind::Match, id)));
                }
                // Assignments from the aborted draw come off again; a
                // later re-run re-assigns from the same seed.
                let now = self.now();
                for team in self
                    .store()
                    .list_teams(tournament_id, TeamFilter::default())
                    .await?
                {
                    if team.group_no.is_none() {
                        continue;
                    }
                    let expected_revision = team.revision;
                    let mut doc = team;
                    doc.clear_group_assignment(now);
                    ops.push(WriteOp::Update {
                        doc: Document::Team(doc),
                        expected_revision,
                    });
                }
            }
            UndoPlan::Knockout {
                created_match_ids,
                bracket_id,
            } => {
                for id in created_match_ids {
                    ops.push(WriteOp::Delete(DocKey::new(EntityKind::Match, id)));
                }
                ops.push(WriteOp::Delete(DocKey::new(EntityKind::Bracket, bracket_id)));
            }
        }
        self.commit_chunked(tournament_id, ops, Vec::new()).await
    }
}
