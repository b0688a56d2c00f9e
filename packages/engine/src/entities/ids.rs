//! Identifier aliases shared across the crate.

use uuid::Uuid;

pub type TournamentId = Uuid;
pub type TeamId = Uuid;
pub type MatchId = Uuid;
pub type PlayerId = Uuid;
pub type ActorId = Uuid;
pub type ApplicationId = Uuid;

/// 1-based group number; group 1 is displayed as "Group A".
pub type GroupNo = u8;
