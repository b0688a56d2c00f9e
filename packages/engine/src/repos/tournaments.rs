use crate::entities::ids::TournamentId;
use crate::entities::tournaments::Tournament;
use crate::errors::{EngineError, NotFoundKind};
use crate::store::TournamentStore;

pub async fn require_tournament(
    store: &dyn TournamentStore,
    tournament_id: TournamentId,
) -> Result<Tournament, EngineError> {
    store
        .fetch_tournament(tournament_id)
        .await?
        .ok_or_else(|| {
            EngineError::not_found(
                NotFoundKind::Tournament,
                format!("tournament {tournament_id}"),
            )
        })
}
