//! Stable machine-readable error codes.
//!
//! Codes are part of the public contract: hosts map them onto HTTP or
//! RPC surfaces, so renaming one is a breaking change.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    // Validation
    ValidationFailed,
    InvalidGroupConfig,
    InvalidBonusConfig,
    InvalidPlayerCount,
    DuplicatePlayer,
    InvalidRating,
    EmptyName,
    EmptyScore,
    InvalidSetScore,
    TiedMatch,
    InvalidSeedCount,

    // Preconditions
    PreconditionFailed,
    InsufficientTeams,
    GroupMatchesIncomplete,
    FinalsIncomplete,
    OpponentsPending,
    PhaseHistoryEmpty,
    PhaseHistoryMismatch,

    // Missing records
    NotFound,
    TournamentNotFound,
    TeamNotFound,
    MatchNotFound,
    BracketNotFound,
    PointsApplicationNotFound,

    // Conflicts
    Conflict,
    InvalidPhaseTransition,
    MatchAlreadyCompleted,
    MatchNotCompleted,
    MatchCancelled,
    SuccessorCompleted,
    StaleRevision,
    GuardFailed,
    DuplicateTeamName,
    PointsAlreadyApplied,
    TournamentArchived,
    ConfigFrozen,

    // Authorization and infrastructure
    Forbidden,
    TransactionFailed,
    FatalReconciliation,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InvalidGroupConfig => "INVALID_GROUP_CONFIG",
            Self::InvalidBonusConfig => "INVALID_BONUS_CONFIG",
            Self::InvalidPlayerCount => "INVALID_PLAYER_COUNT",
            Self::DuplicatePlayer => "DUPLICATE_PLAYER",
            Self::InvalidRating => "INVALID_RATING",
            Self::EmptyName => "EMPTY_NAME",
            Self::EmptyScore => "EMPTY_SCORE",
            Self::InvalidSetScore => "INVALID_SET_SCORE",
            Self::TiedMatch => "TIED_MATCH",
            Self::InvalidSeedCount => "INVALID_SEED_COUNT",
            Self::PreconditionFailed => "PRECONDITION_FAILED",
            Self::InsufficientTeams => "INSUFFICIENT_TEAMS",
            Self::GroupMatchesIncomplete => "GROUP_MATCHES_INCOMPLETE",
            Self::FinalsIncomplete => "FINALS_INCOMPLETE",
            Self::OpponentsPending => "OPPONENTS_PENDING",
            Self::PhaseHistoryEmpty => "PHASE_HISTORY_EMPTY",
            Self::PhaseHistoryMismatch => "PHASE_HISTORY_MISMATCH",
            Self::NotFound => "NOT_FOUND",
            Self::TournamentNotFound => "TOURNAMENT_NOT_FOUND",
            Self::TeamNotFound => "TEAM_NOT_FOUND",
            Self::MatchNotFound => "MATCH_NOT_FOUND",
            Self::BracketNotFound => "BRACKET_NOT_FOUND",
            Self::PointsApplicationNotFound => "POINTS_APPLICATION_NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::InvalidPhaseTransition => "INVALID_PHASE_TRANSITION",
            Self::MatchAlreadyCompleted => "MATCH_ALREADY_COMPLETED",
            Self::MatchNotCompleted => "MATCH_NOT_COMPLETED",
            Self::MatchCancelled => "MATCH_CANCELLED",
            Self::SuccessorCompleted => "SUCCESSOR_COMPLETED",
            Self::StaleRevision => "STALE_REVISION",
            Self::GuardFailed => "GUARD_FAILED",
            Self::DuplicateTeamName => "DUPLICATE_TEAM_NAME",
            Self::PointsAlreadyApplied => "POINTS_ALREADY_APPLIED",
            Self::TournamentArchived => "TOURNAMENT_ARCHIVED",
            Self::ConfigFrozen => "CONFIG_FROZEN",
            Self::Forbidden => "FORBIDDEN",
            Self::TransactionFailed => "TRANSACTION_FAILED",
            Self::FatalReconciliation => "FATAL_RECONCILIATION",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
