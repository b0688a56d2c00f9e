//! Engine-level error taxonomy.
//!
//! Every fallible operation in the crate resolves to an [`EngineError`].
//! The variant tells callers how to react (fix the input, wait, retry,
//! or escalate) and [`EngineError::code`] gives a stable machine-readable
//! code for wire surfaces.

use thiserror::Error;

use crate::entities::ids::TournamentId;
use crate::entities::tournaments::TournamentStatus;
use crate::errors::codes::ErrorCode;

/// Input is malformed regardless of current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationKind {
    /// Group-shape configuration is out of bounds or internally inconsistent.
    GroupConfig,
    /// Championship weight tables are malformed.
    BonusConfig,
    /// Team roster size is outside the allowed range.
    PlayerCount,
    /// A player appears more than once on the roster.
    DuplicatePlayer,
    /// A player rating is not a finite number.
    Rating,
    /// A required name is empty or blank.
    EmptyName,
    /// A submitted score has no sets.
    EmptyScore,
    /// A single set has no winner or an out-of-range game count.
    SetScore,
    /// The submitted sets produce no overall match winner.
    TiedMatch,
    /// The knockout seed list cannot form a supported bracket.
    SeedCount,
}

/// The request is well formed but the tournament is not in a state
/// that can satisfy it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PreconditionKind {
    /// Fewer active teams than the group shape requires.
    InsufficientTeams,
    /// Group-stage matches are still unplayed.
    GroupMatchesIncomplete,
    /// The finals (and third-place match, when configured) are unplayed.
    FinalsIncomplete,
    /// A match cannot accept a result while an opponent slot is TBD.
    OpponentsPending,
    /// Nothing to roll back: the phase history is empty.
    HistoryEmpty,
    /// The phase history disagrees with the stored status.
    HistoryMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    Tournament,
    Team,
    Match,
    Bracket,
    PointsApplication,
}

/// The request conflicts with concurrent activity or with an artifact
/// that is immutable in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    /// The requested phase change is not an allowed transition.
    InvalidTransition,
    /// The target match already carries a final result.
    MatchCompleted,
    /// The target match has no result to clear.
    MatchNotCompleted,
    /// The target match was cancelled and accepts no result.
    MatchCancelled,
    /// A successor match already carries a result.
    SuccessorCompleted,
    /// Another writer changed the document since it was read.
    StaleRevision,
    /// A guard on the write batch observed unexpected state.
    GuardFailed,
    /// A team with the same name is already registered.
    DuplicateTeamName,
    /// Championship points were already applied for this tournament.
    PointsAlreadyApplied,
    /// The tournament is archived and refuses mutation.
    Archived,
    /// Structural configuration cannot change once groups exist.
    ConfigFrozen,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("validation failed ({kind:?}): {detail}")]
    Validation { kind: ValidationKind, detail: String },

    #[error("precondition not met ({kind:?}): {detail}")]
    Precondition { kind: PreconditionKind, detail: String },

    #[error("{kind:?} not found: {detail}")]
    NotFound { kind: NotFoundKind, detail: String },

    #[error("conflict ({kind:?}): {detail}")]
    Conflict { kind: ConflictKind, detail: String },

    #[error("actor is not permitted to {detail}")]
    Forbidden { detail: String },

    #[error("transaction failed: {detail}")]
    Transaction { detail: String },

    #[error(
        "tournament {tournament_id} in {status} needs manual reconciliation: {detail}"
    )]
    FatalReconciliation {
        tournament_id: TournamentId,
        status: TournamentStatus,
        detail: String,
    },
}

impl EngineError {
    pub fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation {
            kind,
            detail: detail.into(),
        }
    }

    pub fn precondition(kind: PreconditionKind, detail: impl Into<String>) -> Self {
        Self::Precondition {
            kind,
            detail: detail.into(),
        }
    }

    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            detail: detail.into(),
        }
    }

    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict {
            kind,
            detail: detail.into(),
        }
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::Forbidden {
            detail: detail.into(),
        }
    }

    pub fn transaction(detail: impl Into<String>) -> Self {
        Self::Transaction {
            detail: detail.into(),
        }
    }

    pub fn fatal_reconciliation(
        tournament_id: TournamentId,
        status: TournamentStatus,
        detail: impl Into<String>,
    ) -> Self {
        Self::FatalReconciliation {
            tournament_id,
            status,
            detail: detail.into(),
        }
    }

    /// Stable code for logs and wire surfaces.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { kind, .. } => match kind {
                ValidationKind::GroupConfig => ErrorCode::InvalidGroupConfig,
                ValidationKind::BonusConfig => ErrorCode::InvalidBonusConfig,
                ValidationKind::PlayerCount => ErrorCode::InvalidPlayerCount,
                ValidationKind::DuplicatePlayer => ErrorCode::DuplicatePlayer,
                ValidationKind::Rating => ErrorCode::InvalidRating,
                ValidationKind::EmptyName => ErrorCode::EmptyName,
                ValidationKind::EmptyScore => ErrorCode::EmptyScore,
                ValidationKind::SetScore => ErrorCode::InvalidSetScore,
                ValidationKind::TiedMatch => ErrorCode::TiedMatch,
                ValidationKind::SeedCount => ErrorCode::InvalidSeedCount,
                _ => ErrorCode::ValidationFailed,
            },
            Self::Precondition { kind, .. } => match kind {
                PreconditionKind::InsufficientTeams => ErrorCode::InsufficientTeams,
                PreconditionKind::GroupMatchesIncomplete => {
                    ErrorCode::GroupMatchesIncomplete
                }
                PreconditionKind::FinalsIncomplete => ErrorCode::FinalsIncomplete,
                PreconditionKind::OpponentsPending => ErrorCode::OpponentsPending,
                PreconditionKind::HistoryEmpty => ErrorCode::PhaseHistoryEmpty,
                PreconditionKind::HistoryMismatch => ErrorCode::PhaseHistoryMismatch,
                _ => ErrorCode::PreconditionFailed,
            },
            Self::NotFound { kind, .. } => match kind {
                NotFoundKind::Tournament => ErrorCode::TournamentNotFound,
                NotFoundKind::Team => ErrorCode::TeamNotFound,
                NotFoundKind::Match => ErrorCode::MatchNotFound,
                NotFoundKind::Bracket => ErrorCode::BracketNotFound,
                NotFoundKind::PointsApplication => {
                    ErrorCode::PointsApplicationNotFound
                }
                _ => ErrorCode::NotFound,
            },
            Self::Conflict { kind, .. } => match kind {
                ConflictKind::InvalidTransition => ErrorCode::InvalidPhaseTransition,
                ConflictKind::MatchCompleted => ErrorCode::MatchAlreadyCompleted,
                ConflictKind::MatchNotCompleted => ErrorCode::MatchNotCompleted,
                ConflictKind::MatchCancelled => ErrorCode::MatchCancelled,
                ConflictKind::SuccessorCompleted => ErrorCode::SuccessorCompleted,
                ConflictKind::StaleRevision => ErrorCode::StaleRevision,
                ConflictKind::GuardFailed => ErrorCode::GuardFailed,
                ConflictKind::DuplicateTeamName => ErrorCode::DuplicateTeamName,
                ConflictKind::PointsAlreadyApplied => {
                    ErrorCode::PointsAlreadyApplied
                }
                ConflictKind::Archived => ErrorCode::TournamentArchived,
                ConflictKind::ConfigFrozen => ErrorCode::ConfigFrozen,
                _ => ErrorCode::Conflict,
            },
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::Transaction { .. } => ErrorCode::TransactionFailed,
            Self::FatalReconciliation { .. } => ErrorCode::FatalReconciliation,
        }
    }

    /// True when a retry with the same input could succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Conflict {
                kind: ConflictKind::StaleRevision | ConflictKind::GuardFailed,
                ..
            } | Self::Transaction { .. }
        )
    }
}
