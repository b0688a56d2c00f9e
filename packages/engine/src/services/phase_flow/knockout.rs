//! Knockout construction: qualifiers, seeding, bracket, flip.

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{bracket, standings};
use crate::entities::brackets::BracketSummary;
use crate::entities::ids::{ActorId, GroupNo, MatchId, TeamId, TournamentId};
use crate::entities::matches::{
    KnockoutRound, Match, MatchSide, MatchStage, MatchStatus,
};
use crate::entities::teams::Team;
use crate::entities::tournaments::TournamentStatus;
use crate::errors::{ConflictKind, EngineError, PreconditionKind};
use crate::repos::tournaments::require_tournament;
use crate::services::phase_flow::rollback::UndoPlan;
use crate::services::{ensure_not_archived, Engine};
use crate::store::{Action, Document, Guard, MatchFilter, TeamFilter, WriteOp};

impl Engine {
    /// Closes the group stage and opens the knockout.
    ///
    /// Requires every group fixture to be completed. Qualification is
    /// recomputed from the matches rather than read from the standings
    /// cache, so a stale cache can never seed the bracket wrong.
    pub async fn start_knockout(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
    ) -> Result<BracketSummary, EngineError> {
        self.authorize(actor_id, tournament_id, Action::ManageTournament)
            .await?;
        let tournament = require_tournament(self.store(), tournament_id).await?;
        ensure_not_archived(&tournament)?;
        if tournament.status != TournamentStatus::GroupsPhase {
            return Err(EngineError::conflict(
                ConflictKind::InvalidTransition,
                format!(
                    "knockout starts from {}, tournament is {}",
                    TournamentStatus::GroupsPhase,
                    tournament.status
                ),
            ));
        }

        let group_matches = self
            .store()
            .list_matches(tournament_id, MatchFilter::group_stage())
            .await?;
        let unplayed = group_matches
            .iter()
            .filter(|m| m.status != MatchStatus::Completed)
            .count();
        if unplayed > 0 {
            return Err(EngineError::precondition(
                PreconditionKind::GroupMatchesIncomplete,
                format!(
                    "{unplayed} of {} group matches still unplayed",
                    group_matches.len()
                ),
            ));
        }

        let config = &tournament.config;
        let mut qualifiers: Vec<Vec<TeamId>> = Vec::with_capacity(config.group_count.into());
        let mut all_members: Vec<Team> = Vec::new();
        for group_no in 1..=config.group_count {
            let members = self
                .store()
                .list_teams(tournament_id, TeamFilter::group(group_no as GroupNo))
                .await?;
            let pairs: Vec<(TeamId, Option<f64>)> =
                members.iter().map(|t| (t.id, t.rating())).collect();
            let in_group: Vec<Match> = group_matches
                .iter()
                .filter(|m| m.group_no() == Some(group_no as GroupNo))
                .cloned()
                .collect();
            let table =
                standings::compute_group(group_no as GroupNo, &pairs, &in_group, &config.points);
            qualifiers.push(
                table
                    .iter()
                    .take(config.qualified_per_group.into())
                    .map(|row| row.team_id)
                    .collect(),
            );
            all_members.extend(members);
        }

        let seeds = bracket::cross_seed(&qualifiers);
        let plan = bracket::build(&seeds, config.third_place_match)?;
        let has_third_place = plan
            .matches
            .iter()
            .any(|m| m.round == KnockoutRound::ThirdPlace);
        if config.third_place_match && !has_third_place {
            warn!(
                tournament_id = %tournament_id,
                "third-place fixture skipped, bracket has no semifinals"
            );
        }

        let now = self.now();
        let ids: Vec<MatchId> = plan.matches.iter().map(|_| Uuid::new_v4()).collect();
        let side = |team_id: TeamId| {
            all_members.iter().find(|t| t.id == team_id).map(|t| MatchSide {
                team_id,
                team_name: t.name.clone(),
            })
        };

        let summary = BracketSummary {
            id: Uuid::new_v4(),
            starting_round: plan.starting_round,
            slots: plan.slots.clone(),
            third_place_match: has_third_place,
            revision: 1,
            created_at: now,
        };
        let mut staged: Vec<WriteOp> =
            vec![WriteOp::Create(Document::Bracket(summary.clone()))];
        for (idx, planned) in plan.matches.iter().enumerate() {
            staged.push(WriteOp::Create(Document::Match(Match {
                id: ids[idx],
                stage: MatchStage::Knockout {
                    round: planned.round,
                },
                match_number: planned.match_number,
                side1: planned.side1.and_then(|id| side(id)),
                side2: planned.side2.and_then(|id| side(id)),
                status: planned.status,
                sets: Vec::new(),
                winner: planned.winner,
                next_match: planned.next.map(|(parent, _)| ids[parent]),
                next_slot: planned.next.map(|(_, slot)| slot),
                revision: 1,
                created_at: now,
                updated_at: now,
            })));
        }

        let mut updated = tournament.clone();
        let expected_revision = updated.revision;
        updated.record_transition(TournamentStatus::KnockoutPhase, now);
        updated.total_matches += plan.matches.len() as u32;
        updated.completed_matches += plan.bye_completions() as u32;
        let flip = WriteOp::Update {
            doc: Document::Tournament(updated),
            expected_revision,
        };

        self.commit_transition(
            tournament_id,
            staged,
            flip,
            vec![Guard::TournamentStatusIs(TournamentStatus::GroupsPhase)],
            TournamentStatus::GroupsPhase,
            UndoPlan::Knockout {
                created_match_ids: ids,
                bracket_id: summary.id,
            },
        )
        .await?;

        info!(
            tournament_id = %tournament_id,
            qualifiers = seeds.len(),
            starting_round = %plan.starting_round,
            byes = plan.bye_completions(),
            "knockout bracket generated"
        );
        Ok(summary)
    }
}
