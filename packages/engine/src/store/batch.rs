//! Atomic write batches and their failure modes.
//!
//! The engine never issues bare writes: every mutation travels in a
//! [`WriteBatch`] whose guards and revision checks the store evaluates
//! atomically at commit. A batch either lands whole or not at all.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::brackets::BracketSummary;
use crate::entities::ids::{MatchId, PlayerId};
use crate::entities::matches::{Match, MatchStatus};
use crate::entities::points::{PointsApplication, Tenths};
use crate::entities::standings::Standing;
use crate::entities::teams::Team;
use crate::entities::tournaments::{Tournament, TournamentStatus};
use crate::errors::{ConflictKind, EngineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Tournament,
    Team,
    Match,
    Standing,
    Bracket,
    PointsApplication,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tournament => "TOURNAMENT",
            Self::Team => "TEAM",
            Self::Match => "MATCH",
            Self::Standing => "STANDING",
            Self::Bracket => "BRACKET",
            Self::PointsApplication => "POINTS_APPLICATION",
        }
    }
}

/// Primary key of a stored document within one tournament scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocKey {
    pub kind: EntityKind,
    pub id: Uuid,
}

impl DocKey {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.as_str(), self.id)
    }
}

/// One stored document of any entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Document {
    Tournament(Tournament),
    Team(Team),
    Match(Match),
    Standing(Standing),
    Bracket(BracketSummary),
    PointsApplication(PointsApplication),
}

impl Document {
    pub fn key(&self) -> DocKey {
        match self {
            Self::Tournament(t) => DocKey::new(EntityKind::Tournament, t.id),
            Self::Team(t) => DocKey::new(EntityKind::Team, t.id),
            Self::Match(m) => DocKey::new(EntityKind::Match, m.id),
            // Standings rows are keyed by the team they describe.
            Self::Standing(s) => DocKey::new(EntityKind::Standing, s.team_id),
            Self::Bracket(b) => DocKey::new(EntityKind::Bracket, b.id),
            Self::PointsApplication(p) => DocKey::new(EntityKind::PointsApplication, p.id),
        }
    }

    /// CAS token; standings rows have none because they are only ever
    /// replaced wholesale.
    pub fn revision(&self) -> u64 {
        match self {
            Self::Tournament(t) => t.revision,
            Self::Team(t) => t.revision,
            Self::Match(m) => m.revision,
            Self::Standing(_) => 0,
            Self::Bracket(b) => b.revision,
            Self::PointsApplication(p) => p.revision,
        }
    }

    /// Store implementations bump the token when applying an update.
    pub fn set_revision(&mut self, revision: u64) {
        match self {
            Self::Tournament(t) => t.revision = revision,
            Self::Team(t) => t.revision = revision,
            Self::Match(m) => m.revision = revision,
            Self::Standing(_) => {}
            Self::Bracket(b) => b.revision = revision,
            Self::PointsApplication(p) => p.revision = revision,
        }
    }
}

/// One mutation inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert; fails when the key already exists.
    Create(Document),
    /// Replace under optimistic CAS; the store bumps the revision to
    /// `expected_revision + 1`.
    Update {
        doc: Document,
        expected_revision: u64,
    },
    /// Create-or-replace without CAS. Reserved for derived views
    /// (standings) where last-writer-wins is the intended semantics.
    Put(Document),
    /// Remove by key; deleting an absent document is a no-op.
    Delete(DocKey),
    /// Commutative adjustment of the tournament counters. Does not bump
    /// the tournament revision, so concurrent result submissions never
    /// contend on the root document.
    IncrementCounters {
        registered_teams: i64,
        total_matches: i64,
        completed_matches: i64,
    },
    /// Commutative adjustment of one player's club-wide leaderboard
    /// total, creating the entry at zero when absent.
    AdjustLeaderboard { player_id: PlayerId, delta: Tenths },
}

impl WriteOp {
    pub fn completed_matches(delta: i64) -> Self {
        Self::IncrementCounters {
            registered_teams: 0,
            total_matches: 0,
            completed_matches: delta,
        }
    }

    pub fn registered_teams(delta: i64) -> Self {
        Self::IncrementCounters {
            registered_teams: delta,
            total_matches: 0,
            completed_matches: 0,
        }
    }
}

/// Precondition evaluated atomically with the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    TournamentStatusIs(TournamentStatus),
    MatchStatusIs {
        match_id: MatchId,
        status: MatchStatus,
    },
    MatchNotCompleted {
        match_id: MatchId,
    },
    Absent(DocKey),
    Present(DocKey),
    /// No points application exists in this tournament scope.
    NoPointsApplication,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    pub ops: Vec<WriteOp>,
    pub guards: Vec<Guard>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn guard(&mut self, guard: Guard) {
        self.guards.push(guard);
    }

    /// Number of mutations; guards are reads and do not count against
    /// the store's batch cap.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Failures surfaced by a store implementation.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("guard failed: {detail}")]
    GuardFailed { detail: String },

    #[error("revision conflict on {key}: expected {expected}, found {found}")]
    RevisionConflict {
        key: DocKey,
        expected: u64,
        found: u64,
    },

    #[error("document already exists: {key}")]
    AlreadyExists { key: DocKey },

    #[error("document missing: {key}")]
    Missing { key: DocKey },

    #[error("batch of {len} operations exceeds the cap of {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("backend failure: {detail}")]
    Backend { detail: String },
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::GuardFailed { detail } => {
                EngineError::conflict(ConflictKind::GuardFailed, detail)
            }
            StoreError::RevisionConflict {
                key,
                expected,
                found,
            } => EngineError::conflict(
                ConflictKind::StaleRevision,
                format!("{key} changed underneath the write (expected revision {expected}, found {found})"),
            ),
            StoreError::AlreadyExists { key } => EngineError::conflict(
                ConflictKind::GuardFailed,
                format!("{key} already exists"),
            ),
            StoreError::Missing { key } => EngineError::conflict(
                ConflictKind::StaleRevision,
                format!("{key} vanished underneath the write"),
            ),
            StoreError::BatchTooLarge { len, max } => EngineError::transaction(format!(
                "batch of {len} operations exceeds the store cap of {max}"
            )),
            StoreError::Backend { detail } => EngineError::transaction(detail),
        }
    }
}
