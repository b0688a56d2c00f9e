use crate::entities::ids::{TeamId, TournamentId};
use crate::entities::teams::{Team, TeamStatus};
use crate::errors::{EngineError, NotFoundKind};
use crate::store::{TeamFilter, TournamentStore};

pub async fn require_team(
    store: &dyn TournamentStore,
    tournament_id: TournamentId,
    team_id: TeamId,
) -> Result<Team, EngineError> {
    store
        .fetch_team(tournament_id, team_id)
        .await?
        .ok_or_else(|| {
            EngineError::not_found(
                NotFoundKind::Team,
                format!("team {team_id} in tournament {tournament_id}"),
            )
        })
}

/// True when a non-withdrawn team already uses the name
/// (ASCII case-insensitive, surrounding whitespace ignored).
pub async fn team_name_taken(
    store: &dyn TournamentStore,
    tournament_id: TournamentId,
    name: &str,
) -> Result<bool, EngineError> {
    let wanted = name.trim();
    let teams = store.list_teams(tournament_id, TeamFilter::default()).await?;
    Ok(teams.iter().any(|team| {
        team.status != TeamStatus::Withdrawn && team.name.trim().eq_ignore_ascii_case(wanted)
    }))
}
