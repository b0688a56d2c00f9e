use crate::entities::ids::{MatchId, TournamentId};
use crate::entities::matches::{KnockoutRound, Match};
use crate::errors::{EngineError, NotFoundKind};
use crate::store::{MatchFilter, TournamentStore};

pub async fn require_match(
    store: &dyn TournamentStore,
    tournament_id: TournamentId,
    match_id: MatchId,
) -> Result<Match, EngineError> {
    store
        .fetch_match(tournament_id, match_id)
        .await?
        .ok_or_else(|| {
            EngineError::not_found(
                NotFoundKind::Match,
                format!("match {match_id} in tournament {tournament_id}"),
            )
        })
}

/// The single fixture of a one-match round (final or third place).
pub async fn find_round_fixture(
    store: &dyn TournamentStore,
    tournament_id: TournamentId,
    round: KnockoutRound,
) -> Result<Option<Match>, EngineError> {
    let mut fixtures = store
        .list_matches(tournament_id, MatchFilter::in_round(round))
        .await?;
    Ok(if fixtures.is_empty() {
        None
    } else {
        Some(fixtures.swap_remove(0))
    })
}
