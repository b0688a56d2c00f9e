//! Championship points documents.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::entities::ids::{ApplicationId, GroupNo, MatchId, PlayerId, TeamId};
use crate::entities::matches::KnockoutRound;

/// Championship points as integer tenths.
///
/// Totals are rounded to one decimal before they leave the calculator,
/// so carrying them as tenths makes apply-then-revert restore the
/// leaderboard bit for bit, which floating point would not guarantee.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Tenths(pub i64);

impl Tenths {
    pub const ZERO: Tenths = Tenths(0);

    /// Rounds half away from zero to one decimal.
    pub fn from_points(points: f64) -> Self {
        Self((points * 10.0).round() as i64)
    }

    pub fn as_points(self) -> f64 {
        self.0 as f64 / 10.0
    }

    pub fn clamp_non_negative(self) -> Self {
        Self(self.0.max(0))
    }
}

impl Add for Tenths {
    type Output = Tenths;

    fn add(self, rhs: Tenths) -> Tenths {
        Tenths(self.0 + rhs.0)
    }
}

impl AddAssign for Tenths {
    fn add_assign(&mut self, rhs: Tenths) {
        self.0 += rhs.0;
    }
}

impl Sub for Tenths {
    type Output = Tenths;

    fn sub(self, rhs: Tenths) -> Tenths {
        Tenths(self.0 - rhs.0)
    }
}

impl Neg for Tenths {
    type Output = Tenths;

    fn neg(self) -> Tenths {
        Tenths(-self.0)
    }
}

impl Sum for Tenths {
    fn sum<I: Iterator<Item = Tenths>>(iter: I) -> Tenths {
        iter.fold(Tenths::ZERO, Add::add)
    }
}

impl fmt::Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.as_points())
    }
}

/// Where one contribution of the championship total came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointsSource {
    /// Rating exchange for one completed match against a real opponent.
    /// Knockout losers keep a zero-amount entry for display.
    RatingExchange {
        match_id: MatchId,
        opponent: TeamId,
        round: Option<KnockoutRound>,
        won: bool,
    },
    /// Fixed bonus for the final group position.
    Placement { group_no: GroupNo, position: u8 },
    /// Per-round bonus for progressing through the knockout stage.
    /// Losers keep a zero-amount entry for display.
    Progression {
        match_id: MatchId,
        round: KnockoutRound,
        won: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointsEvent {
    pub source: PointsSource,
    pub amount: f64,
}

/// Per-team breakdown inside one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPointsTotal {
    pub team_id: TeamId,
    pub rating_points: f64,
    pub placement_bonus: f64,
    pub knockout_bonus: f64,
    /// Sum of the three parts rounded to one decimal; may be negative.
    pub raw_total: Tenths,
    /// `raw_total` clamped at zero; this is what players receive.
    pub awarded_total: Tenths,
}

/// One player's credited amount with its full provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAward {
    pub player_id: PlayerId,
    pub team_id: TeamId,
    pub amount: Tenths,
    pub contributions: Vec<PointsEvent>,
}

/// Record of one championship-points application.
///
/// Its presence marks the tournament as applied; reverting subtracts
/// exactly the stored amounts and deletes the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsApplication {
    pub id: ApplicationId,
    pub teams: Vec<TeamPointsTotal>,
    pub awards: Vec<PlayerAward>,
    pub revision: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub applied_at: OffsetDateTime,
}

/// Club-wide running total for one player, spanning tournaments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player_id: PlayerId,
    pub points: Tenths,
}
