//! Knockout bracket summary document.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::ids::TeamId;
use crate::entities::matches::KnockoutRound;

/// One seeded slot of the opening round, in bracket order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeedSlot {
    Team { team_id: TeamId },
    Bye,
}

impl SeedSlot {
    pub fn team_id(&self) -> Option<TeamId> {
        match self {
            Self::Team { team_id } => Some(*team_id),
            Self::Bye => None,
        }
    }
}

/// Snapshot of the generated bracket, kept for display and audits.
///
/// At most one summary exists per tournament; rolling the knockout phase
/// back deletes it together with the knockout matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketSummary {
    pub id: Uuid,
    pub starting_round: KnockoutRound,
    /// Padded seed order; adjacent pairs form the opening fixtures.
    pub slots: Vec<SeedSlot>,
    pub third_place_match: bool,
    pub revision: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
