//! Match documents for both the group and knockout stages.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::entities::ids::{GroupNo, MatchId, TeamId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

/// Knockout rounds, ordered from the widest field to the final.
///
/// `ThirdPlace` sits outside the progression ladder; it is fed by the
/// semifinal losers and has no successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KnockoutRound {
    RoundOf16,
    QuarterFinals,
    SemiFinals,
    Finals,
    ThirdPlace,
}

impl KnockoutRound {
    /// Round a winner advances into, if any.
    pub fn next(&self) -> Option<KnockoutRound> {
        match self {
            Self::RoundOf16 => Some(Self::QuarterFinals),
            Self::QuarterFinals => Some(Self::SemiFinals),
            Self::SemiFinals => Some(Self::Finals),
            Self::Finals | Self::ThirdPlace => None,
        }
    }

    /// Opening round for a padded bracket of the given size.
    pub fn starting_round(field: usize) -> Option<KnockoutRound> {
        match field {
            2 => Some(Self::Finals),
            4 => Some(Self::SemiFinals),
            8 => Some(Self::QuarterFinals),
            16 => Some(Self::RoundOf16),
            _ => None,
        }
    }

    /// Number of fixtures the round holds in a full bracket.
    pub fn match_count(&self) -> usize {
        match self {
            Self::RoundOf16 => 8,
            Self::QuarterFinals => 4,
            Self::SemiFinals => 2,
            Self::Finals | Self::ThirdPlace => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::RoundOf16 => "Round of 16",
            Self::QuarterFinals => "Quarter-finals",
            Self::SemiFinals => "Semi-finals",
            Self::Finals => "Final",
            Self::ThirdPlace => "Third place",
        }
    }
}

impl fmt::Display for KnockoutRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which side of a successor match a winner lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotNo {
    One,
    Two,
}

/// Where a match sits in the tournament structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStage {
    Group {
        group_no: GroupNo,
        /// 1-based round-robin round within the group.
        round_no: u8,
    },
    Knockout {
        round: KnockoutRound,
    },
}

/// One participant slot, denormalized with the team name for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSide {
    pub team_id: TeamId,
    pub team_name: String,
}

/// Games won by each side in one set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetScore {
    pub side1: u16,
    pub side2: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub stage: MatchStage,
    /// 1-based sequence within the group or knockout round.
    pub match_number: u16,
    /// `None` while the slot is TBD (awaiting a feeder result) or a bye.
    pub side1: Option<MatchSide>,
    pub side2: Option<MatchSide>,
    pub status: MatchStatus,
    pub sets: Vec<SetScore>,
    pub winner: Option<TeamId>,
    /// Successor link for knockout matches; `None` for the final, the
    /// third-place match and all group matches.
    pub next_match: Option<MatchId>,
    pub next_slot: Option<SlotNo>,
    pub revision: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Match {
    pub fn group_no(&self) -> Option<GroupNo> {
        match self.stage {
            MatchStage::Group { group_no, .. } => Some(group_no),
            MatchStage::Knockout { .. } => None,
        }
    }

    pub fn knockout_round(&self) -> Option<KnockoutRound> {
        match self.stage {
            MatchStage::Group { .. } => None,
            MatchStage::Knockout { round } => Some(round),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.side_of(team_id).is_some()
    }

    pub fn side_of(&self, team_id: TeamId) -> Option<SlotNo> {
        if self.side1.as_ref().is_some_and(|s| s.team_id == team_id) {
            Some(SlotNo::One)
        } else if self.side2.as_ref().is_some_and(|s| s.team_id == team_id) {
            Some(SlotNo::Two)
        } else {
            None
        }
    }

    pub fn side(&self, slot: SlotNo) -> Option<&MatchSide> {
        match slot {
            SlotNo::One => self.side1.as_ref(),
            SlotNo::Two => self.side2.as_ref(),
        }
    }

    pub fn set_side(&mut self, slot: SlotNo, side: Option<MatchSide>) {
        match slot {
            SlotNo::One => self.side1 = side,
            SlotNo::Two => self.side2 = side,
        }
    }

    pub fn has_both_sides(&self) -> bool {
        self.side1.is_some() && self.side2.is_some()
    }

    /// A bye fixture has exactly one real participant.
    pub fn is_bye(&self) -> bool {
        matches!(self.stage, MatchStage::Knockout { .. })
            && self.side1.is_some() != self.side2.is_some()
    }

    /// Losing side of a completed match with two real participants.
    pub fn loser(&self) -> Option<TeamId> {
        let winner = self.winner?;
        let s1 = self.side1.as_ref()?;
        let s2 = self.side2.as_ref()?;
        if s1.team_id == winner {
            Some(s2.team_id)
        } else if s2.team_id == winner {
            Some(s1.team_id)
        } else {
            None
        }
    }

    /// Sets won by (side1, side2).
    pub fn sets_won(&self) -> (u16, u16) {
        self.sets.iter().fold((0, 0), |(a, b), set| {
            if set.side1 > set.side2 {
                (a + 1, b)
            } else if set.side2 > set.side1 {
                (a, b + 1)
            } else {
                (a, b)
            }
        })
    }

    /// Total games won by (side1, side2) across all sets.
    pub fn game_totals(&self) -> (u32, u32) {
        self.sets.iter().fold((0, 0), |(a, b), set| {
            (a + u32::from(set.side1), b + u32::from(set.side2))
        })
    }
}
