#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

//! Storage-agnostic tournament progression engine: group draw,
//! round-robin scheduling, standings, knockout bracket and championship
//! points, driven through guarded atomic write batches.

pub mod domain;
pub mod entities;
pub mod errors;
pub mod repos;
pub mod services;
pub mod store;

#[cfg(test)]
pub mod test_support;

// Re-exports for public API
pub use entities::ids::{
    ActorId, ApplicationId, GroupNo, MatchId, PlayerId, TeamId, TournamentId,
};
pub use entities::matches::{KnockoutRound, Match, MatchStage, MatchStatus, SetScore, SlotNo};
pub use entities::teams::{Player, Team, TeamStatus};
pub use entities::tournaments::{Configuration, Tournament, TournamentStatus};
pub use errors::{
    ConflictKind, EngineError, ErrorCode, NotFoundKind, PreconditionKind, ValidationKind,
};
pub use services::overview::TournamentOverview;
pub use services::phase_flow::{DrawOutcome, DrawnGroup};
pub use services::Engine;
pub use store::{
    AccessOracle, Action, Clock, Guard, MemoryStore, OpenAccess, SystemClock, TournamentStore,
    WriteBatch, WriteOp,
};

// Prelude for embedding hosts
pub mod prelude {
    pub use super::entities::*;
    pub use super::errors::*;
    pub use super::services::Engine;
    pub use super::store::*;
}

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    engine_test_support::logging::init();
}
