use crate::entities::brackets::BracketSummary;
use crate::entities::ids::TournamentId;
use crate::errors::{EngineError, NotFoundKind};
use crate::store::TournamentStore;

pub async fn require_bracket(
    store: &dyn TournamentStore,
    tournament_id: TournamentId,
) -> Result<BracketSummary, EngineError> {
    store
        .fetch_bracket(tournament_id)
        .await?
        .ok_or_else(|| {
            EngineError::not_found(
                NotFoundKind::Bracket,
                format!("bracket summary for tournament {tournament_id}"),
            )
        })
}
