//! Phase transition rules.
//!
//! The adjacency table is the single source of truth for forward
//! movement; rollback walks the recorded history instead and never
//! consults it.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::entities::tournaments::TournamentStatus;
use crate::errors::{ConflictKind, EngineError};

use TournamentStatus::{
    Cancelled, Completed, Draft, GroupsGeneration, GroupsPhase, KnockoutPhase,
    RegistrationClosed, RegistrationOpen,
};

static ADJACENCY: Lazy<HashMap<TournamentStatus, &'static [TournamentStatus]>> =
    Lazy::new(|| {
        let mut table: HashMap<TournamentStatus, &'static [TournamentStatus]> = HashMap::new();
        table.insert(Draft, &[RegistrationOpen, Cancelled]);
        table.insert(RegistrationOpen, &[RegistrationClosed, Cancelled]);
        table.insert(RegistrationClosed, &[GroupsGeneration, Cancelled]);
        table.insert(GroupsGeneration, &[GroupsPhase, Cancelled]);
        table.insert(GroupsPhase, &[KnockoutPhase, Cancelled]);
        table.insert(KnockoutPhase, &[Completed, Cancelled]);
        // Reactivation is the one road out of a terminal state.
        table.insert(Completed, &[KnockoutPhase]);
        table.insert(Cancelled, &[]);
        table
    });

pub fn allowed(from: TournamentStatus, to: TournamentStatus) -> bool {
    ADJACENCY
        .get(&from)
        .is_some_and(|targets| targets.contains(&to))
}

/// Rejects any move the table does not list, leaving state untouched.
pub fn ensure(from: TournamentStatus, to: TournamentStatus) -> Result<(), EngineError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(EngineError::conflict(
            ConflictKind::InvalidTransition,
            format!("no transition from {from} to {to}"),
        ))
    }
}
