//! Result submission and retraction, including knockout propagation.

use time::OffsetDateTime;
use tracing::info;

use crate::domain::score;
use crate::entities::ids::{ActorId, MatchId, TournamentId};
use crate::entities::matches::{
    KnockoutRound, Match, MatchSide, MatchStage, MatchStatus, SetScore, SlotNo,
};
use crate::entities::tournaments::{Tournament, TournamentStatus};
use crate::errors::{ConflictKind, EngineError, PreconditionKind};
use crate::repos::matches::{find_round_fixture, require_match};
use crate::repos::tournaments::require_tournament;
use crate::services::{ensure_not_archived, Engine};
use crate::store::{Action, Document, Guard, WriteBatch, WriteOp};

impl Engine {
    /// Marks a scheduled fixture as underway. Idempotent when the match
    /// is already in progress.
    pub async fn begin_match(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
        match_id: MatchId,
    ) -> Result<Match, EngineError> {
        self.authorize(actor_id, tournament_id, Action::SubmitResult)
            .await?;
        let tournament = require_tournament(self.store(), tournament_id).await?;
        ensure_not_archived(&tournament)?;
        let fixture = require_match(self.store(), tournament_id, match_id).await?;
        let phase = ensure_stage_phase(&tournament, &fixture)?;

        match fixture.status {
            MatchStatus::InProgress => return Ok(fixture),
            MatchStatus::Completed => {
                return Err(EngineError::conflict(
                    ConflictKind::MatchCompleted,
                    format!("match {match_id} already has a result"),
                ))
            }
            MatchStatus::Cancelled => {
                return Err(EngineError::conflict(
                    ConflictKind::MatchCancelled,
                    format!("match {match_id} was cancelled"),
                ))
            }
            MatchStatus::Scheduled => {}
        }
        if !fixture.has_both_sides() {
            return Err(EngineError::precondition(
                PreconditionKind::OpponentsPending,
                format!("match {match_id} is still waiting for a qualifier"),
            ));
        }

        let mut updated = fixture.clone();
        updated.status = MatchStatus::InProgress;
        updated.updated_at = self.now();

        let mut batch = WriteBatch::new();
        batch.guard(Guard::TournamentStatusIs(phase));
        batch.push(WriteOp::Update {
            doc: Document::Match(updated.clone()),
            expected_revision: fixture.revision,
        });
        self.store().commit(tournament_id, batch).await?;
        updated.revision = fixture.revision + 1;

        info!(tournament_id = %tournament_id, match_id = %match_id, "match underway");
        Ok(updated)
    }

    /// Records a decided score, derives the winner and, in one atomic
    /// batch, refreshes the group table or fills the successor slots.
    pub async fn submit_result(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
        match_id: MatchId,
        sets: Vec<SetScore>,
    ) -> Result<Match, EngineError> {
        self.authorize(actor_id, tournament_id, Action::SubmitResult)
            .await?;
        let tournament = require_tournament(self.store(), tournament_id).await?;
        ensure_not_archived(&tournament)?;
        let fixture = require_match(self.store(), tournament_id, match_id).await?;
        let phase = ensure_stage_phase(&tournament, &fixture)?;

        match fixture.status {
            MatchStatus::Completed => {
                return Err(EngineError::conflict(
                    ConflictKind::MatchCompleted,
                    format!("match {match_id} already has a result; clear it first"),
                ))
            }
            MatchStatus::Cancelled => {
                return Err(EngineError::conflict(
                    ConflictKind::MatchCancelled,
                    format!("match {match_id} was cancelled"),
                ))
            }
            MatchStatus::Scheduled | MatchStatus::InProgress => {}
        }
        let (Some(side1), Some(side2)) = (fixture.side1.clone(), fixture.side2.clone()) else {
            return Err(EngineError::precondition(
                PreconditionKind::OpponentsPending,
                format!("match {match_id} is still waiting for a qualifier"),
            ));
        };

        let outcome = score::evaluate_sets(&sets)?;
        let (winner, loser) = match outcome.winner_slot {
            SlotNo::One => (side1, side2),
            SlotNo::Two => (side2, side1),
        };
        let now = self.now();

        let mut updated = fixture.clone();
        updated.sets = sets;
        updated.status = MatchStatus::Completed;
        updated.winner = Some(winner.team_id);
        updated.updated_at = now;

        let mut batch = WriteBatch::new();
        batch.guard(Guard::TournamentStatusIs(phase));
        batch.push(WriteOp::Update {
            doc: Document::Match(updated.clone()),
            expected_revision: fixture.revision,
        });

        match fixture.stage {
            MatchStage::Group { group_no, .. } => {
                let rows = self
                    .group_table(
                        tournament_id,
                        group_no,
                        &tournament.config.points,
                        Some(&updated),
                    )
                    .await?;
                for row in rows {
                    batch.push(WriteOp::Put(Document::Standing(row)));
                }
            }
            MatchStage::Knockout { round } => {
                self.stage_promotions(&mut batch, tournament_id, &fixture, &winner, &loser, round, now)
                    .await?;
            }
        }
        batch.push(WriteOp::completed_matches(1));
        self.store().commit(tournament_id, batch).await?;
        updated.revision = fixture.revision + 1;

        info!(
            tournament_id = %tournament_id,
            match_id = %match_id,
            winner = %winner.team_id,
            sets = updated.sets.len(),
            "result recorded"
        );
        Ok(updated)
    }

    /// Retracts a recorded result, returning the fixture to `Scheduled`
    /// and undoing its downstream effects. Refused once any successor
    /// has its own result.
    pub async fn clear_result(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
        match_id: MatchId,
    ) -> Result<Match, EngineError> {
        self.authorize(actor_id, tournament_id, Action::ClearResult)
            .await?;
        let tournament = require_tournament(self.store(), tournament_id).await?;
        ensure_not_archived(&tournament)?;
        let fixture = require_match(self.store(), tournament_id, match_id).await?;
        let phase = ensure_stage_phase(&tournament, &fixture)?;

        if fixture.status != MatchStatus::Completed {
            return Err(EngineError::conflict(
                ConflictKind::MatchNotCompleted,
                format!("match {match_id} has no result to clear"),
            ));
        }
        if fixture.is_bye() {
            return Err(EngineError::conflict(
                ConflictKind::MatchNotCompleted,
                format!("match {match_id} is a bye walkover with no submitted result"),
            ));
        }

        let now = self.now();
        let mut cleared = fixture.clone();
        cleared.sets.clear();
        cleared.winner = None;
        cleared.status = MatchStatus::Scheduled;
        cleared.updated_at = now;

        let mut batch = WriteBatch::new();
        batch.guard(Guard::TournamentStatusIs(phase));
        batch.push(WriteOp::Update {
            doc: Document::Match(cleared.clone()),
            expected_revision: fixture.revision,
        });

        match fixture.stage {
            MatchStage::Group { group_no, .. } => {
                let rows = self
                    .group_table(
                        tournament_id,
                        group_no,
                        &tournament.config.points,
                        Some(&cleared),
                    )
                    .await?;
                for row in rows {
                    batch.push(WriteOp::Put(Document::Standing(row)));
                }
            }
            MatchStage::Knockout { round } => {
                self.stage_retractions(&mut batch, tournament_id, &fixture, round, now)
                    .await?;
            }
        }
        batch.push(WriteOp::completed_matches(-1));
        self.store().commit(tournament_id, batch).await?;
        cleared.revision = fixture.revision + 1;

        info!(tournament_id = %tournament_id, match_id = %match_id, "result cleared");
        Ok(cleared)
    }

    /// Queues the successor-slot writes for a freshly decided knockout
    /// match: winner into the linked fixture, semifinal loser into the
    /// third-place match when one exists.
    #[allow(clippy::too_many_arguments)]
    async fn stage_promotions(
        &self,
        batch: &mut WriteBatch,
        tournament_id: TournamentId,
        fixture: &Match,
        winner: &MatchSide,
        loser: &MatchSide,
        round: KnockoutRound,
        now: OffsetDateTime,
    ) -> Result<(), EngineError> {
        if let Some(next_id) = fixture.next_match {
            let slot = fixture.next_slot.ok_or_else(|| {
                EngineError::transaction(format!(
                    "match {} links to successor {next_id} without a slot",
                    fixture.id
                ))
            })?;
            let successor = require_match(self.store(), tournament_id, next_id).await?;
            if successor.is_completed() {
                return Err(EngineError::conflict(
                    ConflictKind::SuccessorCompleted,
                    format!("successor match {next_id} already has a result"),
                ));
            }
            let mut doc = successor.clone();
            doc.set_side(slot, Some(winner.clone()));
            doc.updated_at = now;
            batch.guard(Guard::MatchNotCompleted { match_id: next_id });
            batch.push(WriteOp::Update {
                doc: Document::Match(doc),
                expected_revision: successor.revision,
            });
        }
        if round == KnockoutRound::SemiFinals {
            if let Some(third) =
                find_round_fixture(self.store(), tournament_id, KnockoutRound::ThirdPlace).await?
            {
                if third.is_completed() {
                    return Err(EngineError::conflict(
                        ConflictKind::SuccessorCompleted,
                        "the third-place match already has a result",
                    ));
                }
                let mut doc = third.clone();
                doc.set_side(third_place_slot(fixture.match_number), Some(loser.clone()));
                doc.updated_at = now;
                batch.guard(Guard::MatchNotCompleted { match_id: third.id });
                batch.push(WriteOp::Update {
                    doc: Document::Match(doc),
                    expected_revision: third.revision,
                });
            }
        }
        Ok(())
    }

    /// Queues the slot clears that undo [`Engine::stage_promotions`].
    async fn stage_retractions(
        &self,
        batch: &mut WriteBatch,
        tournament_id: TournamentId,
        fixture: &Match,
        round: KnockoutRound,
        now: OffsetDateTime,
    ) -> Result<(), EngineError> {
        if let Some(next_id) = fixture.next_match {
            let slot = fixture.next_slot.ok_or_else(|| {
                EngineError::transaction(format!(
                    "match {} links to successor {next_id} without a slot",
                    fixture.id
                ))
            })?;
            let successor = require_match(self.store(), tournament_id, next_id).await?;
            if successor.is_completed() {
                return Err(EngineError::conflict(
                    ConflictKind::SuccessorCompleted,
                    format!("clear successor match {next_id} first"),
                ));
            }
            let mut doc = successor.clone();
            doc.set_side(slot, None);
            doc.updated_at = now;
            batch.guard(Guard::MatchNotCompleted { match_id: next_id });
            batch.push(WriteOp::Update {
                doc: Document::Match(doc),
                expected_revision: successor.revision,
            });
        }
        if round == KnockoutRound::SemiFinals {
            if let Some(third) =
                find_round_fixture(self.store(), tournament_id, KnockoutRound::ThirdPlace).await?
            {
                if third.is_completed() {
                    return Err(EngineError::conflict(
                        ConflictKind::SuccessorCompleted,
                        "clear the third-place match first",
                    ));
                }
                let mut doc = third.clone();
                doc.set_side(third_place_slot(fixture.match_number), None);
                doc.updated_at = now;
                batch.guard(Guard::MatchNotCompleted { match_id: third.id });
                batch.push(WriteOp::Update {
                    doc: Document::Match(doc),
                    expected_revision: third.revision,
                });
            }
        }
        Ok(())
    }
}

/// Results are only accepted while the tournament sits in the phase the
/// fixture belongs to.
fn ensure_stage_phase(
    tournament: &Tournament,
    fixture: &Match,
) -> Result<TournamentStatus, EngineError> {
    let (expected, stage) = match fixture.stage {
        MatchStage::Group { .. } => (TournamentStatus::GroupsPhase, "group"),
        MatchStage::Knockout { .. } => (TournamentStatus::KnockoutPhase, "knockout"),
    };
    if tournament.status == expected {
        Ok(expected)
    } else {
        Err(EngineError::conflict(
            ConflictKind::InvalidTransition,
            format!(
                "match {} belongs to the {stage} stage but the tournament is {}",
                fixture.id, tournament.status
            ),
        ))
    }
}

/// Semifinal one feeds the first third-place slot, semifinal two the
/// second.
fn third_place_slot(semifinal_number: u16) -> SlotNo {
    if semifinal_number == 1 {
        SlotNo::One
    } else {
        SlotNo::Two
    }
}
