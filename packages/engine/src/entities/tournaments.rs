//! Tournament document and its configuration.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::entities::ids::TournamentId;
use crate::entities::matches::KnockoutRound;
use crate::errors::{EngineError, ValidationKind};

/// Lifecycle phase of a tournament.
///
/// Serialized as SCREAMING_SNAKE_CASE strings so stored documents stay
/// readable in backend consoles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentStatus {
    Draft,
    RegistrationOpen,
    RegistrationClosed,
    GroupsGeneration,
    GroupsPhase,
    KnockoutPhase,
    Completed,
    Cancelled,
}

impl TournamentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::RegistrationOpen => "REGISTRATION_OPEN",
            Self::RegistrationClosed => "REGISTRATION_CLOSED",
            Self::GroupsGeneration => "GROUPS_GENERATION",
            Self::GroupsPhase => "GROUPS_PHASE",
            Self::KnockoutPhase => "KNOCKOUT_PHASE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the phase audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseChange {
    pub from: TournamentStatus,
    pub to: TournamentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

/// Table points awarded per group-match outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsRule {
    pub win: i32,
    pub draw: i32,
    pub loss: i32,
}

impl Default for PointsRule {
    fn default() -> Self {
        Self {
            win: 3,
            draw: 1,
            loss: 0,
        }
    }
}

/// Fixed bonus for finishing a group at a given position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementBonus {
    /// 1-based final position within the group.
    pub position: u8,
    pub points: f64,
}

/// Fixed bonus for winning a knockout match of a given round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundBonus {
    pub round: KnockoutRound,
    pub points: f64,
}

/// Weights for the championship-points calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionshipWeights {
    /// Multiplier applied to every rating-delta exchange.
    pub rating_multiplier: f64,
    pub placement_bonus: Vec<PlacementBonus>,
    pub round_bonus: Vec<RoundBonus>,
}

impl Default for ChampionshipWeights {
    fn default() -> Self {
        Self {
            rating_multiplier: 1.0,
            placement_bonus: vec![
                PlacementBonus {
                    position: 1,
                    points: 20.0,
                },
                PlacementBonus {
                    position: 2,
                    points: 12.0,
                },
                PlacementBonus {
                    position: 3,
                    points: 8.0,
                },
                PlacementBonus {
                    position: 4,
                    points: 4.0,
                },
            ],
            round_bonus: vec![
                RoundBonus {
                    round: KnockoutRound::RoundOf16,
                    points: 2.0,
                },
                RoundBonus {
                    round: KnockoutRound::QuarterFinals,
                    points: 4.0,
                },
                RoundBonus {
                    round: KnockoutRound::SemiFinals,
                    points: 6.0,
                },
                RoundBonus {
                    round: KnockoutRound::Finals,
                    points: 10.0,
                },
                RoundBonus {
                    round: KnockoutRound::ThirdPlace,
                    points: 3.0,
                },
            ],
        }
    }
}

impl ChampionshipWeights {
    pub fn placement_points(&self, position: u8) -> f64 {
        self.placement_bonus
            .iter()
            .find(|b| b.position == position)
            .map(|b| b.points)
            .unwrap_or(0.0)
    }

    pub fn round_points(&self, round: KnockoutRound) -> f64 {
        self.round_bonus
            .iter()
            .find(|b| b.round == round)
            .map(|b| b.points)
            .unwrap_or(0.0)
    }
}

/// Structural configuration, frozen once the draw has been generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub group_count: u8,
    pub teams_per_group: u8,
    /// How many teams advance from each group, in position order.
    pub qualified_per_group: u8,
    pub points: PointsRule,
    pub third_place_match: bool,
    pub championship: ChampionshipWeights,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            group_count: 4,
            teams_per_group: 4,
            qualified_per_group: 2,
            points: PointsRule::default(),
            third_place_match: false,
            championship: ChampionshipWeights::default(),
        }
    }
}

impl Configuration {
    /// Shape checks applied when a configuration enters the engine.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.group_count == 0 || self.group_count > crate::domain::rules::MAX_GROUPS {
            return Err(EngineError::validation(
                ValidationKind::GroupConfig,
                format!(
                    "group_count must be 1..={}, got {}",
                    crate::domain::rules::MAX_GROUPS,
                    self.group_count
                ),
            ));
        }
        if self.teams_per_group < 2
            || self.teams_per_group > crate::domain::rules::MAX_TEAMS_PER_GROUP
        {
            return Err(EngineError::validation(
                ValidationKind::GroupConfig,
                format!(
                    "teams_per_group must be 2..={}, got {}",
                    crate::domain::rules::MAX_TEAMS_PER_GROUP,
                    self.teams_per_group
                ),
            ));
        }
        if self.qualified_per_group == 0 || self.qualified_per_group > self.teams_per_group {
            return Err(EngineError::validation(
                ValidationKind::GroupConfig,
                format!(
                    "qualified_per_group must be 1..={}, got {}",
                    self.teams_per_group, self.qualified_per_group
                ),
            ));
        }
        let qualifiers = self.qualifier_count();
        if !(2..=crate::domain::rules::MAX_BRACKET_FIELD as u32).contains(&qualifiers) {
            return Err(EngineError::validation(
                ValidationKind::GroupConfig,
                format!(
                    "{} groups x {} qualifiers yield a knockout field of {qualifiers}, supported range is 2..={}",
                    self.group_count,
                    self.qualified_per_group,
                    crate::domain::rules::MAX_BRACKET_FIELD
                ),
            ));
        }
        if !self.championship.rating_multiplier.is_finite()
            || self.championship.rating_multiplier < 0.0
        {
            return Err(EngineError::validation(
                ValidationKind::BonusConfig,
                "rating_multiplier must be a finite non-negative number",
            ));
        }
        for bonus in &self.championship.placement_bonus {
            if bonus.position == 0 || !bonus.points.is_finite() {
                return Err(EngineError::validation(
                    ValidationKind::BonusConfig,
                    format!("bad placement bonus entry at position {}", bonus.position),
                ));
            }
        }
        if !self.championship.round_bonus.iter().all(|b| b.points.is_finite()) {
            return Err(EngineError::validation(
                ValidationKind::BonusConfig,
                "round bonus points must be finite",
            ));
        }
        Ok(())
    }

    /// Total number of teams a full draw consumes.
    pub fn field_size(&self) -> u32 {
        u32::from(self.group_count) * u32::from(self.teams_per_group)
    }

    /// Knockout entrants produced by a completed group stage.
    pub fn qualifier_count(&self) -> u32 {
        u32::from(self.group_count) * u32::from(self.qualified_per_group)
    }
}

/// Root document of one tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub status: TournamentStatus,
    pub config: Configuration,
    /// Oldest first; the last entry always matches `status`.
    pub phase_history: Vec<PhaseChange>,
    /// Seed for the draw shuffle, fixed at creation so re-generation
    /// of the same tournament is reproducible.
    pub draw_seed: u64,
    pub registered_teams: u32,
    pub total_matches: u32,
    pub completed_matches: u32,
    pub archived: bool,
    pub revision: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Tournament {
    /// Appends a phase change and flips the status in one step so the
    /// two can never disagree.
    pub fn record_transition(&mut self, to: TournamentStatus, at: OffsetDateTime) {
        self.phase_history.push(PhaseChange {
            from: self.status,
            to,
            at,
        });
        self.status = to;
        self.updated_at = at;
    }
}
