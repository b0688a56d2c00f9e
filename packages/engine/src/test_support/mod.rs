//! Shared fixtures for the engine's own tests: a memory-backed harness,
//! deterministic clocks and oracles, and async drivers that walk a
//! tournament through its phases.

pub mod fixtures;

pub use builders::{config_4x4, rated_players, team_names};
pub use fixtures::{harness, harness_with_store, DenyAll, FixedClock, TestHarness};
pub use flows::{
    completed_tournament, drawn_tournament, groups_phase_tournament, knockout_tournament,
    knockout_tournament_with, oriented_sets, play_group_stage, play_knockout_stage,
    registered_tournament,
};
