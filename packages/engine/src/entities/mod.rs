//! Stored document types.
//!
//! These are plain serde structs with small derived accessors; all
//! behavior lives in [`crate::domain`] and [`crate::services`].

pub mod brackets;
pub mod ids;
pub mod matches;
pub mod points;
pub mod standings;
pub mod teams;
pub mod tournaments;

pub use brackets::{BracketSummary, SeedSlot};
pub use ids::{
    ActorId, ApplicationId, GroupNo, MatchId, PlayerId, TeamId, TournamentId,
};
pub use matches::{
    KnockoutRound, Match, MatchSide, MatchStage, MatchStatus, SetScore, SlotNo,
};
pub use points::{
    LeaderboardEntry, PlayerAward, PointsApplication, PointsEvent, PointsSource,
    TeamPointsTotal, Tenths,
};
pub use standings::Standing;
pub use teams::{Player, Team, TeamStatus};
pub use tournaments::{
    ChampionshipWeights, Configuration, PhaseChange, PlacementBonus, PointsRule,
    RoundBonus, Tournament, TournamentStatus,
};
