//! Group draw: serpentine balancing plus round-robin fixtures.

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::domain::{group_draw, round_robin, rules};
use crate::entities::ids::{ActorId, GroupNo, TeamId, TournamentId};
use crate::entities::matches::{Match, MatchSide, MatchStage, MatchStatus};
use crate::entities::teams::Team;
use crate::entities::tournaments::{Tournament, TournamentStatus};
use crate::errors::{ConflictKind, EngineError, PreconditionKind};
use crate::repos::tournaments::require_tournament;
use crate::services::phase_flow::rollback::UndoPlan;
use crate::services::{ensure_not_archived, Engine};
use crate::store::{
    Action, Document, Guard, MatchFilter, TeamFilter, WriteOp,
};

/// What the draw produced, for immediate display by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawOutcome {
    pub groups: Vec<DrawnGroup>,
    pub matches_created: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawnGroup {
    pub group_no: GroupNo,
    pub label: String,
    /// Draft order; index is the 0-based position within the group.
    pub team_ids: Vec<TeamId>,
}

impl Engine {
    /// Draws the groups and schedules their round-robin fixtures.
    ///
    /// Allowed from RegistrationClosed (first draw, flips to
    /// GroupsGeneration) and from GroupsGeneration (re-draw before play
    /// starts; prior fixtures are discarded). The status flip and the
    /// counter reset ride in the last batch, so an interrupted draw
    /// never leaves the tournament half-advanced. Created artifacts of
    /// a failed draw are rolled back automatically.
    pub async fn generate_groups(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
    ) -> Result<DrawOutcome, EngineError> {
        self.authorize(actor_id, tournament_id, Action::ManageTournament)
            .await?;
        let tournament = require_tournament(self.store(), tournament_id).await?;
        ensure_not_archived(&tournament)?;
        let from = tournament.status;
        if !matches!(
            from,
            TournamentStatus::RegistrationClosed | TournamentStatus::GroupsGeneration
        ) {
            return Err(EngineError::conflict(
                ConflictKind::InvalidTransition,
                format!(
                    "groups are generated from {} or {}, tournament is {from}",
                    TournamentStatus::RegistrationClosed,
                    TournamentStatus::GroupsGeneration
                ),
            ));
        }

        let config = &tournament.config;
        let active = self
            .store()
            .list_teams(tournament_id, TeamFilter::active())
            .await?;
        let need = config.field_size() as usize;
        if active.len() < need {
            return Err(EngineError::precondition(
                PreconditionKind::InsufficientTeams,
                format!(
                    "draw needs {need} active teams ({} groups of {}), have {}",
                    config.group_count,
                    config.teams_per_group,
                    active.len()
                ),
            ));
        }

        let entrants: Vec<group_draw::DrawEntrant> = active
            .iter()
            .map(|team| group_draw::DrawEntrant {
                team_id: team.id,
                rating: team.rating(),
            })
            .collect();
        let order = group_draw::seeding_order(&entrants, tournament.draw_seed);
        let groups = group_draw::serpentine(&order, config.group_count, config.teams_per_group)?;

        let now = self.now();
        let mut staged: Vec<WriteOp> = Vec::new();

        // Discard any previous draw; deletes are idempotent, so a
        // re-run after a partial failure converges.
        let stale_matches = self
            .store()
            .list_matches(tournament_id, MatchFilter::group_stage())
            .await?;
        for m in &stale_matches {
            staged.push(WriteOp::Delete(Document::Match(m.clone()).key()));
        }
        let stale_standings = self.store().list_standings(tournament_id, None).await?;
        for s in &stale_standings {
            staged.push(WriteOp::Delete(Document::Standing(s.clone()).key()));
        }

        staged.extend(assignment_updates(&active, &groups, now));

        let mut drawn_groups = Vec::with_capacity(groups.len());
        let mut created_match_ids = Vec::new();
        for (idx, members) in groups.iter().enumerate() {
            let group_no = (idx + 1) as GroupNo;
            drawn_groups.push(DrawnGroup {
                group_no,
                label: rules::group_label(group_no),
                team_ids: members.clone(),
            });
            for pairing in round_robin::schedule(members) {
                let doc = group_match(&active, group_no, &pairing, now);
                created_match_ids.push(doc.id);
                staged.push(WriteOp::Create(Document::Match(doc)));
            }
        }
        let matches_created = created_match_ids.len();

        let mut updated = tournament.clone();
        let expected_revision = updated.revision;
        if from == TournamentStatus::RegistrationClosed {
            updated.record_transition(TournamentStatus::GroupsGeneration, now);
        } else {
            updated.updated_at = now;
        }
        updated.total_matches = matches_created as u32;
        updated.completed_matches = 0;
        let flip = WriteOp::Update {
            doc: Document::Tournament(updated.clone()),
            expected_revision,
        };
        let guards = vec![Guard::TournamentStatusIs(from)];

        self.commit_transition(
            tournament_id,
            staged,
            flip,
            guards,
            from,
            UndoPlan::GroupDraw { created_match_ids },
        )
        .await?;

        info!(
            tournament_id = %tournament_id,
            groups = groups.len(),
            matches = matches_created,
            redraw = from == TournamentStatus::GroupsGeneration,
            "group draw generated"
        );
        Ok(DrawOutcome {
            groups: drawn_groups,
            matches_created,
        })
    }
}

/// Team updates for the draw: drawn teams get their slot, previously
/// assigned teams outside the draw are cleared.
fn assignment_updates(
    active: &[Team],
    groups: &[Vec<TeamId>],
    now: OffsetDateTime,
) -> Vec<WriteOp> {
    let mut ops = Vec::new();
    for team in active {
        let drawn = groups.iter().enumerate().find_map(|(idx, members)| {
            members
                .iter()
                .position(|id| *id == team.id)
                .map(|pos| ((idx + 1) as GroupNo, (pos + 1) as u8))
        });
        let mut doc = team.clone();
        let expected_revision = doc.revision;
        match drawn {
            Some((group_no, position)) => {
                doc.group_no = Some(group_no);
                doc.group_position = Some(position);
                doc.updated_at = now;
            }
            None if doc.group_no.is_some() => {
                doc.clear_group_assignment(now);
            }
            None => continue,
        }
        ops.push(WriteOp::Update {
            doc: Document::Team(doc),
            expected_revision,
        });
    }
    ops
}

fn group_match(
    teams: &[Team],
    group_no: GroupNo,
    pairing: &round_robin::Pairing,
    now: OffsetDateTime,
) -> Match {
    let side = |team_id: TeamId| {
        teams.iter().find(|t| t.id == team_id).map(|t| MatchSide {
            team_id,
            team_name: t.name.clone(),
        })
    };
    Match {
        id: Uuid::new_v4(),
        stage: MatchStage::Group {
            group_no,
            round_no: pairing.round_no,
        },
        match_number: pairing.match_number,
        side1: side(pairing.side1),
        side2: side(pairing.side2),
        status: MatchStatus::Scheduled,
        sets: Vec::new(),
        winner: None,
        next_match: None,
        next_slot: None,
        revision: 1,
        created_at: now,
        updated_at: now,
    }
}
