use crate::entities::ids::TournamentId;
use crate::entities::points::PointsApplication;
use crate::errors::{EngineError, NotFoundKind};
use crate::store::TournamentStore;

pub async fn require_application(
    store: &dyn TournamentStore,
    tournament_id: TournamentId,
) -> Result<PointsApplication, EngineError> {
    store
        .fetch_points_application(tournament_id)
        .await?
        .ok_or_else(|| {
            EngineError::not_found(
                NotFoundKind::PointsApplication,
                format!("no points application for tournament {tournament_id}"),
            )
        })
}
