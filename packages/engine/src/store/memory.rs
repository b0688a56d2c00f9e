//! In-memory reference store.
//!
//! Backs the engine's own tests and doubles as an embeddable store for
//! hosts that do not need persistence. A single mutex makes every
//! commit trivially atomic; guards and revision checks run against the
//! locked state before anything is applied.

use std::collections::HashMap;

use parking_lot::Mutex;

use async_trait::async_trait;

use crate::entities::brackets::BracketSummary;
use crate::entities::ids::{GroupNo, MatchId, PlayerId, TeamId, TournamentId};
use crate::entities::matches::{Match, MatchStatus};
use crate::entities::points::{LeaderboardEntry, PointsApplication, Tenths};
use crate::entities::standings::Standing;
use crate::entities::teams::Team;
use crate::entities::tournaments::Tournament;

use super::batch::{DocKey, Document, EntityKind, Guard, StoreError, WriteBatch, WriteOp};
use super::filters::{MatchFilter, TeamFilter};
use super::TournamentStore;

pub struct MemoryStore {
    inner: Mutex<Inner>,
    max_batch_ops: usize,
}

#[derive(Default)]
struct Inner {
    scopes: HashMap<TournamentId, Scope>,
    leaderboard: HashMap<PlayerId, Tenths>,
    seq: u64,
}

#[derive(Default)]
struct Scope {
    docs: HashMap<DocKey, Slot>,
}

struct Slot {
    /// Insertion order across the whole store; listings sort by it.
    /// Updates keep the original slot so document order is stable.
    seq: u64,
    doc: Document,
}

impl MemoryStore {
    pub const DEFAULT_MAX_BATCH_OPS: usize = 500;

    pub fn new() -> Self {
        Self::with_max_batch_ops(Self::DEFAULT_MAX_BATCH_OPS)
    }

    /// Small caps are useful in tests to force chunked deletions.
    pub fn with_max_batch_ops(max_batch_ops: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_batch_ops: max_batch_ops.max(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    fn get(&self, key: &DocKey) -> Option<&Document> {
        self.docs.get(key).map(|slot| &slot.doc)
    }

    fn tournament(&self, tournament_id: TournamentId) -> Option<&Tournament> {
        match self.get(&DocKey::new(EntityKind::Tournament, tournament_id)) {
            Some(Document::Tournament(t)) => Some(t),
            _ => None,
        }
    }

    fn match_doc(&self, match_id: MatchId) -> Option<&Match> {
        match self.get(&DocKey::new(EntityKind::Match, match_id)) {
            Some(Document::Match(m)) => Some(m),
            _ => None,
        }
    }

    fn of_kind(&self, kind: EntityKind) -> Vec<&Document> {
        let mut slots: Vec<&Slot> = self
            .docs
            .iter()
            .filter(|(key, _)| key.kind == kind)
            .map(|(_, slot)| slot)
            .collect();
        slots.sort_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| &slot.doc).collect()
    }

    fn check_guard(&self, tournament_id: TournamentId, guard: &Guard) -> Result<(), StoreError> {
        let fail = |detail: String| Err(StoreError::GuardFailed { detail });
        match guard {
            Guard::TournamentStatusIs(expected) => match self.tournament(tournament_id) {
                Some(t) if t.status == *expected => Ok(()),
                Some(t) => fail(format!(
                    "tournament status is {}, batch requires {expected}",
                    t.status
                )),
                None => fail(format!("tournament {tournament_id} is not stored")),
            },
            Guard::MatchStatusIs { match_id, status } => match self.match_doc(*match_id) {
                Some(m) if m.status == *status => Ok(()),
                Some(m) => fail(format!(
                    "match {match_id} status is {:?}, batch requires {status:?}",
                    m.status
                )),
                None => fail(format!("match {match_id} is not stored")),
            },
            Guard::MatchNotCompleted { match_id } => match self.match_doc(*match_id) {
                Some(m) if m.status != MatchStatus::Completed => Ok(()),
                Some(_) => fail(format!("match {match_id} is already completed")),
                None => fail(format!("match {match_id} is not stored")),
            },
            Guard::Absent(key) => {
                if self.docs.contains_key(key) {
                    fail(format!("{key} is present"))
                } else {
                    Ok(())
                }
            }
            Guard::Present(key) => {
                if self.docs.contains_key(key) {
                    Ok(())
                } else {
                    fail(format!("{key} is absent"))
                }
            }
            Guard::NoPointsApplication => {
                if self
                    .docs
                    .keys()
                    .any(|key| key.kind == EntityKind::PointsApplication)
                {
                    fail("a points application already exists".to_string())
                } else {
                    Ok(())
                }
            }
        }
    }

    fn check_op(&self, tournament_id: TournamentId, op: &WriteOp) -> Result<(), StoreError> {
        match op {
            WriteOp::Create(doc) => {
                let key = doc.key();
                if self.docs.contains_key(&key) {
                    Err(StoreError::AlreadyExists { key })
                } else {
                    Ok(())
                }
            }
            WriteOp::Update {
                doc,
                expected_revision,
            } => {
                let key = doc.key();
                match self.docs.get(&key) {
                    None => Err(StoreError::Missing { key }),
                    Some(slot) if slot.doc.revision() != *expected_revision => {
                        Err(StoreError::RevisionConflict {
                            key,
                            expected: *expected_revision,
                            found: slot.doc.revision(),
                        })
                    }
                    Some(_) => Ok(()),
                }
            }
            WriteOp::IncrementCounters { .. } => {
                let key = DocKey::new(EntityKind::Tournament, tournament_id);
                if self.docs.contains_key(&key) {
                    Ok(())
                } else {
                    Err(StoreError::Missing { key })
                }
            }
            WriteOp::Put(_) | WriteOp::Delete(_) | WriteOp::AdjustLeaderboard { .. } => Ok(()),
        }
    }

    fn apply_op(&mut self, tournament_id: TournamentId, seq: u64, op: WriteOp) {
        match op {
            WriteOp::Create(doc) => {
                self.docs.insert(doc.key(), Slot { seq, doc });
            }
            WriteOp::Update {
                mut doc,
                expected_revision,
            } => {
                let key = doc.key();
                doc.set_revision(expected_revision + 1);
                let seq = self.docs.get(&key).map_or(seq, |slot| slot.seq);
                self.docs.insert(key, Slot { seq, doc });
            }
            WriteOp::Put(doc) => {
                let key = doc.key();
                let seq = self.docs.get(&key).map_or(seq, |slot| slot.seq);
                self.docs.insert(key, Slot { seq, doc });
            }
            WriteOp::Delete(key) => {
                self.docs.remove(&key);
            }
            WriteOp::IncrementCounters {
                registered_teams,
                total_matches,
                completed_matches,
            } => {
                let key = DocKey::new(EntityKind::Tournament, tournament_id);
                if let Some(Slot {
                    doc: Document::Tournament(t),
                    ..
                }) = self.docs.get_mut(&key)
                {
                    t.registered_teams = bump(t.registered_teams, registered_teams);
                    t.total_matches = bump(t.total_matches, total_matches);
                    t.completed_matches = bump(t.completed_matches, completed_matches);
                }
            }
            // Handled one level up; leaderboard entries are not scoped.
            WriteOp::AdjustLeaderboard { .. } => {}
        }
    }
}

fn bump(current: u32, delta: i64) -> u32 {
    (i64::from(current) + delta).clamp(0, i64::from(u32::MAX)) as u32
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn fetch_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Option<Tournament>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .scopes
            .get(&tournament_id)
            .and_then(|scope| scope.tournament(tournament_id))
            .cloned())
    }

    async fn fetch_team(
        &self,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> Result<Option<Team>, StoreError> {
        let inner = self.inner.lock();
        let team = inner.scopes.get(&tournament_id).and_then(|scope| {
            match scope.get(&DocKey::new(EntityKind::Team, team_id)) {
                Some(Document::Team(t)) => Some(t.clone()),
                _ => None,
            }
        });
        Ok(team)
    }

    async fn list_teams(
        &self,
        tournament_id: TournamentId,
        filter: TeamFilter,
    ) -> Result<Vec<Team>, StoreError> {
        let inner = self.inner.lock();
        let Some(scope) = inner.scopes.get(&tournament_id) else {
            return Ok(Vec::new());
        };
        Ok(scope
            .of_kind(EntityKind::Team)
            .into_iter()
            .filter_map(|doc| match doc {
                Document::Team(t) if filter.matches(t) => Some(t.clone()),
                _ => None,
            })
            .collect())
    }

    async fn fetch_match(
        &self,
        tournament_id: TournamentId,
        match_id: MatchId,
    ) -> Result<Option<Match>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .scopes
            .get(&tournament_id)
            .and_then(|scope| scope.match_doc(match_id))
            .cloned())
    }

    async fn list_matches(
        &self,
        tournament_id: TournamentId,
        filter: MatchFilter,
    ) -> Result<Vec<Match>, StoreError> {
        let inner = self.inner.lock();
        let Some(scope) = inner.scopes.get(&tournament_id) else {
            return Ok(Vec::new());
        };
        Ok(scope
            .of_kind(EntityKind::Match)
            .into_iter()
            .filter_map(|doc| match doc {
                Document::Match(m) if filter.matches(m) => Some(m.clone()),
                _ => None,
            })
            .collect())
    }

    async fn list_standings(
        &self,
        tournament_id: TournamentId,
        group_no: Option<GroupNo>,
    ) -> Result<Vec<Standing>, StoreError> {
        let inner = self.inner.lock();
        let Some(scope) = inner.scopes.get(&tournament_id) else {
            return Ok(Vec::new());
        };
        Ok(scope
            .of_kind(EntityKind::Standing)
            .into_iter()
            .filter_map(|doc| match doc {
                Document::Standing(s) if group_no.is_none_or(|g| s.group_no == g) => {
                    Some(s.clone())
                }
                _ => None,
            })
            .collect())
    }

    async fn fetch_bracket(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Option<BracketSummary>, StoreError> {
        let inner = self.inner.lock();
        let summary = inner.scopes.get(&tournament_id).and_then(|scope| {
            scope
                .of_kind(EntityKind::Bracket)
                .into_iter()
                .find_map(|doc| match doc {
                    Document::Bracket(b) => Some(b.clone()),
                    _ => None,
                })
        });
        Ok(summary)
    }

    async fn fetch_points_application(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Option<PointsApplication>, StoreError> {
        let inner = self.inner.lock();
        let application = inner.scopes.get(&tournament_id).and_then(|scope| {
            scope
                .of_kind(EntityKind::PointsApplication)
                .into_iter()
                .find_map(|doc| match doc {
                    Document::PointsApplication(p) => Some(p.clone()),
                    _ => None,
                })
        });
        Ok(application)
    }

    async fn fetch_leaderboard(
        &self,
        player_id: PlayerId,
    ) -> Result<Option<LeaderboardEntry>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .leaderboard
            .get(&player_id)
            .map(|points| LeaderboardEntry {
                player_id,
                points: *points,
            }))
    }

    async fn commit(
        &self,
        tournament_id: TournamentId,
        batch: WriteBatch,
    ) -> Result<(), StoreError> {
        if batch.len() > self.max_batch_ops {
            return Err(StoreError::BatchTooLarge {
                len: batch.len(),
                max: self.max_batch_ops,
            });
        }

        let mut inner = self.inner.lock();

        // Validate everything against the locked state first; nothing
        // is applied unless the whole batch can land.
        {
            let empty = Scope::default();
            let scope = inner.scopes.get(&tournament_id).unwrap_or(&empty);
            for guard in &batch.guards {
                scope.check_guard(tournament_id, guard)?;
            }
            for op in &batch.ops {
                scope.check_op(tournament_id, op)?;
            }
        }

        for op in batch.ops {
            if let WriteOp::AdjustLeaderboard { player_id, delta } = op {
                let entry = inner.leaderboard.entry(player_id).or_insert(Tenths::ZERO);
                *entry = *entry + delta;
            } else {
                inner.seq += 1;
                let seq = inner.seq;
                let scope = inner.scopes.entry(tournament_id).or_default();
                scope.apply_op(tournament_id, seq, op);
            }
        }
        Ok(())
    }

    fn max_batch_ops(&self) -> usize {
        self.max_batch_ops
    }
}
