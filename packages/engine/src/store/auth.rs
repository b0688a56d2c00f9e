//! Authorization oracle.
//!
//! Access policy lives in the host application; the engine only asks
//! whether an actor may perform an action and honors the answer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entities::ids::{ActorId, TournamentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    ManageTournament,
    RegisterTeam,
    SubmitResult,
    ClearResult,
    AwardPoints,
}

#[async_trait]
pub trait AccessOracle: Send + Sync {
    async fn is_authorized(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
        action: Action,
    ) -> bool;
}

/// Grants everything; for embedding without access control and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAccess;

#[async_trait]
impl AccessOracle for OpenAccess {
    async fn is_authorized(
        &self,
        _actor_id: ActorId,
        _tournament_id: TournamentId,
        _action: Action,
    ) -> bool {
        true
    }
}
