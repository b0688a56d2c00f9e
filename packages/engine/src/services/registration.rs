//! Tournament and team lifecycle around the state machine.

use std::collections::HashSet;

use tracing::info;
use uuid::Uuid;

use crate::domain::rules;
use crate::entities::ids::{ActorId, TeamId, TournamentId};
use crate::entities::teams::{Player, Team, TeamStatus};
use crate::entities::tournaments::{Configuration, Tournament, TournamentStatus};
use crate::errors::{ConflictKind, EngineError, ValidationKind};
use crate::repos::teams::{require_team, team_name_taken};
use crate::repos::tournaments::require_tournament;
use crate::services::{ensure_not_archived, Engine};
use crate::store::{Action, Document, Guard, WriteBatch, WriteOp};

impl Engine {
    /// Creates a Draft tournament.
    ///
    /// The draw seed is fixed here so later re-draws reproduce the same
    /// shuffle. Authorization is checked against the new id.
    pub async fn create_tournament(
        &self,
        actor_id: ActorId,
        name: &str,
        config: Configuration,
    ) -> Result<Tournament, EngineError> {
        let tournament_id = Uuid::new_v4();
        self.authorize(actor_id, tournament_id, Action::ManageTournament)
            .await?;
        let name = valid_name(name, "tournament name")?;
        config.validate()?;

        let now = self.now();
        let tournament = Tournament {
            id: tournament_id,
            name,
            status: TournamentStatus::Draft,
            config,
            phase_history: Vec::new(),
            draw_seed: rand::random::<u64>(),
            registered_teams: 0,
            total_matches: 0,
            completed_matches: 0,
            archived: false,
            revision: 1,
            created_at: now,
            updated_at: now,
        };

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::Create(Document::Tournament(tournament.clone())));
        self.store.commit(tournament_id, batch).await?;

        info!(tournament_id = %tournament_id, name = %tournament.name, "tournament created");
        Ok(tournament)
    }

    /// Replaces the structural configuration. Refused once the draw may
    /// exist, because fixtures would no longer match it.
    pub async fn update_config(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
        config: Configuration,
    ) -> Result<Tournament, EngineError> {
        self.authorize(actor_id, tournament_id, Action::ManageTournament)
            .await?;
        let mut tournament = require_tournament(self.store(), tournament_id).await?;
        ensure_not_archived(&tournament)?;
        if !matches!(
            tournament.status,
            TournamentStatus::Draft
                | TournamentStatus::RegistrationOpen
                | TournamentStatus::RegistrationClosed
        ) {
            return Err(EngineError::conflict(
                ConflictKind::ConfigFrozen,
                format!(
                    "configuration is frozen in {}, changes end at {}",
                    tournament.status,
                    TournamentStatus::RegistrationClosed
                ),
            ));
        }
        config.validate()?;

        let from = tournament.status;
        let expected_revision = tournament.revision;
        tournament.config = config;
        tournament.updated_at = self.now();

        let mut batch = WriteBatch::new();
        batch.guard(Guard::TournamentStatusIs(from));
        batch.push(WriteOp::Update {
            doc: Document::Tournament(tournament.clone()),
            expected_revision,
        });
        self.store.commit(tournament_id, batch).await?;
        tournament.revision = expected_revision + 1;

        info!(tournament_id = %tournament_id, "configuration updated");
        Ok(tournament)
    }

    pub async fn register_team(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
        name: &str,
        players: Vec<Player>,
    ) -> Result<Team, EngineError> {
        self.authorize(actor_id, tournament_id, Action::RegisterTeam)
            .await?;
        let tournament = require_tournament(self.store(), tournament_id).await?;
        ensure_not_archived(&tournament)?;
        if tournament.status != TournamentStatus::RegistrationOpen {
            return Err(EngineError::conflict(
                ConflictKind::InvalidTransition,
                format!(
                    "team registration requires {}, tournament is {}",
                    TournamentStatus::RegistrationOpen,
                    tournament.status
                ),
            ));
        }
        let name = valid_name(name, "team name")?;
        valid_players(&players)?;
        if team_name_taken(self.store(), tournament_id, &name).await? {
            return Err(EngineError::conflict(
                ConflictKind::DuplicateTeamName,
                format!("a team named \"{name}\" is already registered"),
            ));
        }

        let now = self.now();
        let team = Team {
            id: Uuid::new_v4(),
            name,
            players,
            status: TeamStatus::Active,
            group_no: None,
            group_position: None,
            revision: 1,
            created_at: now,
            updated_at: now,
        };

        let mut batch = WriteBatch::new();
        batch.guard(Guard::TournamentStatusIs(TournamentStatus::RegistrationOpen));
        batch.push(WriteOp::Create(Document::Team(team.clone())));
        batch.push(WriteOp::registered_teams(1));
        self.store.commit(tournament_id, batch).await?;

        info!(
            tournament_id = %tournament_id,
            team_id = %team.id,
            players = team.players.len(),
            "team registered"
        );
        Ok(team)
    }

    /// Marks a team Withdrawn. Only possible before the draw; once
    /// groups exist a dropout is an administrative matter outside the
    /// engine. Withdrawing twice is a no-op.
    pub async fn withdraw_team(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> Result<Team, EngineError> {
        self.authorize(actor_id, tournament_id, Action::RegisterTeam)
            .await?;
        let tournament = require_tournament(self.store(), tournament_id).await?;
        ensure_not_archived(&tournament)?;
        if !matches!(
            tournament.status,
            TournamentStatus::RegistrationOpen | TournamentStatus::RegistrationClosed
        ) {
            return Err(EngineError::conflict(
                ConflictKind::InvalidTransition,
                format!(
                    "withdrawal is only possible before the draw, tournament is {}",
                    tournament.status
                ),
            ));
        }
        let mut team = require_team(self.store(), tournament_id, team_id).await?;
        if team.status == TeamStatus::Withdrawn {
            return Ok(team);
        }

        let expected_revision = team.revision;
        team.status = TeamStatus::Withdrawn;
        team.updated_at = self.now();

        let mut batch = WriteBatch::new();
        batch.guard(Guard::TournamentStatusIs(tournament.status));
        batch.push(WriteOp::Update {
            doc: Document::Team(team.clone()),
            expected_revision,
        });
        batch.push(WriteOp::registered_teams(-1));
        self.store.commit(tournament_id, batch).await?;
        team.revision = expected_revision + 1;

        info!(tournament_id = %tournament_id, team_id = %team_id, "team withdrawn");
        Ok(team)
    }

    /// Physically removes a team while registration is still open.
    pub async fn remove_team(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> Result<(), EngineError> {
        self.authorize(actor_id, tournament_id, Action::RegisterTeam)
            .await?;
        let tournament = require_tournament(self.store(), tournament_id).await?;
        ensure_not_archived(&tournament)?;
        if tournament.status != TournamentStatus::RegistrationOpen {
            return Err(EngineError::conflict(
                ConflictKind::InvalidTransition,
                format!(
                    "team removal requires {}, tournament is {}",
                    TournamentStatus::RegistrationOpen,
                    tournament.status
                ),
            ));
        }
        let team = require_team(self.store(), tournament_id, team_id).await?;

        let mut batch = WriteBatch::new();
        batch.guard(Guard::TournamentStatusIs(TournamentStatus::RegistrationOpen));
        batch.push(WriteOp::Delete(Document::Team(team.clone()).key()));
        if team.status == TeamStatus::Active {
            batch.push(WriteOp::registered_teams(-1));
        }
        self.store.commit(tournament_id, batch).await?;

        info!(tournament_id = %tournament_id, team_id = %team_id, "team removed");
        Ok(())
    }

    /// Flags a finished tournament as archived; archived tournaments
    /// refuse every further mutation. Archiving twice is a no-op.
    pub async fn archive_tournament(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
    ) -> Result<Tournament, EngineError> {
        self.authorize(actor_id, tournament_id, Action::ManageTournament)
            .await?;
        let mut tournament = require_tournament(self.store(), tournament_id).await?;
        if !tournament.status.is_terminal() {
            return Err(EngineError::conflict(
                ConflictKind::InvalidTransition,
                format!(
                    "only {} or {} tournaments can be archived, this one is {}",
                    TournamentStatus::Completed,
                    TournamentStatus::Cancelled,
                    tournament.status
                ),
            ));
        }
        if tournament.archived {
            return Ok(tournament);
        }

        let expected_revision = tournament.revision;
        tournament.archived = true;
        tournament.updated_at = self.now();

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::Update {
            doc: Document::Tournament(tournament.clone()),
            expected_revision,
        });
        self.store.commit(tournament_id, batch).await?;
        tournament.revision = expected_revision + 1;

        info!(tournament_id = %tournament_id, "tournament archived");
        Ok(tournament)
    }
}

fn valid_name(name: &str, what: &str) -> Result<String, EngineError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(EngineError::validation(
            ValidationKind::EmptyName,
            format!("{what} must not be blank"),
        ))
    } else {
        Ok(trimmed.to_string())
    }
}

fn valid_players(players: &[Player]) -> Result<(), EngineError> {
    if !(rules::MIN_PLAYERS_PER_TEAM..=rules::MAX_PLAYERS_PER_TEAM).contains(&players.len()) {
        return Err(EngineError::validation(
            ValidationKind::PlayerCount,
            format!(
                "a team fields {}..={} players, got {}",
                rules::MIN_PLAYERS_PER_TEAM,
                rules::MAX_PLAYERS_PER_TEAM,
                players.len()
            ),
        ));
    }
    let mut seen = HashSet::new();
    for player in players {
        if !seen.insert(player.id) {
            return Err(EngineError::validation(
                ValidationKind::DuplicatePlayer,
                format!("player {} listed more than once", player.id),
            ));
        }
        if player.name.trim().is_empty() {
            return Err(EngineError::validation(
                ValidationKind::EmptyName,
                format!("player {} has a blank name", player.id),
            ));
        }
        if player.rating.is_some_and(|r| !r.is_finite()) {
            return Err(EngineError::validation(
                ValidationKind::Rating,
                format!("player {} has a non-finite rating", player.id),
            ));
        }
    }
    Ok(())
}
