//! Engine harness wiring for tests.

use std::sync::Arc;

use async_trait::async_trait;
use time::macros::datetime;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::ids::{ActorId, TournamentId};
use crate::services::Engine;
use crate::store::{AccessOracle, Action, Clock, MemoryStore};

/// Engine plus direct handles onto its collaborators, so tests can
/// reach around the facade to inspect or rig the store.
pub struct TestHarness {
    pub engine: Engine,
    pub store: Arc<MemoryStore>,
    pub actor: ActorId,
}

/// Memory-backed engine with open access and a fixed clock.
pub fn harness() -> TestHarness {
    harness_with_store(Arc::new(MemoryStore::new()))
}

pub fn harness_with_store(store: Arc<MemoryStore>) -> TestHarness {
    let engine = Engine::new(
        store.clone(),
        Arc::new(crate::store::OpenAccess),
        Arc::new(FixedClock::default()),
    );
    TestHarness {
        engine,
        store,
        actor: Uuid::new_v4(),
    }
}

/// Clock pinned to one instant; keeps timestamps assertable.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Default for FixedClock {
    fn default() -> Self {
        Self(datetime!(2026-03-14 09:00:00 UTC))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Refuses every action; for authorization tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

#[async_trait]
impl AccessOracle for DenyAll {
    async fn is_authorized(
        &self,
        _actor_id: ActorId,
        _tournament_id: TournamentId,
        _action: Action,
    ) -> bool {
        false
    }
}
