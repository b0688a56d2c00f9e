//! External collaborator seams: document store, authorization, clock.

pub mod auth;
pub mod batch;
pub mod clock;
pub mod filters;
pub mod memory;


use async_trait::async_trait;

pub use auth::{AccessOracle, Action, OpenAccess};
pub use batch::{DocKey, Document, EntityKind, Guard, StoreError, WriteBatch, WriteOp};
pub use clock::{Clock, SystemClock};
pub use filters::{MatchFilter, StageFilter, TeamFilter};
pub use memory::MemoryStore;

use crate::entities::brackets::BracketSummary;
use crate::entities::ids::{GroupNo, MatchId, PlayerId, TeamId, TournamentId};
use crate::entities::matches::Match;
use crate::entities::points::{LeaderboardEntry, PointsApplication};
use crate::entities::standings::Standing;
use crate::entities::teams::Team;
use crate::entities::tournaments::Tournament;

/// Document store the engine runs against.
///
/// Implementations must make [`TournamentStore::commit`] atomic: all
/// guards hold and all operations apply, or nothing changes. Listings
/// must return documents in stable insertion order, because the
/// standings tie-break falls back to it.
///
/// All documents except the leaderboard live inside one tournament
/// scope; leaderboard entries are club-wide and keyed by player.
#[async_trait]
pub trait TournamentStore: Send + Sync {
    async fn fetch_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Option<Tournament>, StoreError>;

    async fn fetch_team(
        &self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> Result<Option<Team>, StoreError>;

    async fn list_teams(
        &self,
        tournament_id: TournamentId,
        filter: TeamFilter,
    ) -> Result<Vec<Team>, StoreError>;

    async fn fetch_match(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
    ) -> Result<Option<Match>, StoreError>;

    async fn list_matches(
        &self,
        tournament_id: TournamentId,
        filter: MatchFilter,
    ) -> Result<Vec<Match>, StoreError>;

    async fn list_standings(
        &self,
        tournament_id: TournamentId,
        group_no: Option<GroupNo>,
    ) -> Result<Vec<Standing>, StoreError>;

    async fn fetch_bracket(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Option<BracketSummary>, StoreError>;

    async fn fetch_points_application(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Option<PointsApplication>, StoreError>;

    async fn fetch_leaderboard(
        &self,
        player_id: PlayerId,
    ) -> Result<Option<LeaderboardEntry>, StoreError>;

    /// Applies the batch atomically against the tournament scope.
    async fn commit(
        &self,
        tournament_id: TournamentId,
        batch: WriteBatch,
    ) -> Result<(), StoreError>;

    /// Most operations one committed batch may carry. Bulk work above
    /// this size must be chunked by the caller.
    fn max_batch_ops(&self) -> usize;
}
