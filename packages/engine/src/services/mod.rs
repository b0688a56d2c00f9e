//! Orchestration layer.
//!
//! [`Engine`] is the single entry point hosts embed. Each operation
//! takes an explicit actor and tournament id, consults the
//! authorization oracle, reads through the store trait and commits one
//! or more guarded write batches. Impl blocks are split per concern
//! across the submodules.

pub mod championship;
pub mod overview;
pub mod phase_flow;
pub mod registration;
pub mod results;
pub mod standings;

#[cfg(test)]
mod tests_lifecycle;

use std::sync::Arc;

use time::OffsetDateTime;

use crate::entities::ids::{ActorId, TournamentId};
use crate::entities::tournaments::Tournament;
use crate::errors::{ConflictKind, EngineError};
use crate::store::{
    AccessOracle, Action, Clock, Guard, SystemClock, TournamentStore, WriteBatch, WriteOp,
};

/// Tournament progression engine.
///
/// Storage, authorization policy and time are injected; the engine owns
/// only the rules.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn TournamentStore>,
    oracle: Arc<dyn AccessOracle>,
    clock: Arc<dyn Clock>,
}

impl Engine {
    pub fn new(
        store: Arc<dyn TournamentStore>,
        oracle: Arc<dyn AccessOracle>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            oracle,
            clock,
        }
    }

    pub fn with_system_clock(
        store: Arc<dyn TournamentStore>,
        oracle: Arc<dyn AccessOracle>,
    ) -> Self {
        Self::new(store, oracle, Arc::new(SystemClock))
    }

    pub fn store(&self) -> &dyn TournamentStore {
        self.store.as_ref()
    }

    pub(crate) fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    pub(crate) async fn authorize(
        &self,
        actor_id: ActorId,
        tournament_id: TournamentId,
        action: Action,
    ) -> Result<(), EngineError> {
        if self
            .oracle
            .is_authorized(actor_id, tournament_id, action)
            .await
        {
            Ok(())
        } else {
            Err(EngineError::forbidden(format!(
                "{action:?} on tournament {tournament_id}"
            )))
        }
    }

    /// Commits `ops` in order, split into batches the store accepts.
    /// Each chunk carries the same guards, so a mid-flight state change
    /// aborts the remainder.
    pub(crate) async fn commit_chunked(
        &self,
        tournament_id: TournamentId,
        ops: Vec<WriteOp>,
        guards: Vec<Guard>,
    ) -> Result<(), EngineError> {
        let cap = self.store.max_batch_ops().max(1);
        for chunk in ops.chunks(cap) {
            let batch = WriteBatch {
                ops: chunk.to_vec(),
                guards: guards.clone(),
            };
            self.store.commit(tournament_id, batch).await?;
        }
        Ok(())
    }
}

pub(crate) fn ensure_not_archived(tournament: &Tournament) -> Result<(), EngineError> {
    if tournament.archived {
        Err(EngineError::conflict(
            ConflictKind::Archived,
            format!("tournament {} is archived", tournament.id),
        ))
    } else {
        Ok(())
    }
}
