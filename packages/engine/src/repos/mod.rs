//! Thin read helpers over the store trait.
//!
//! Services go through these for single-document reads so the
//! missing-record errors stay uniform; bulk listings call the store
//! directly.

pub mod brackets;
pub mod matches;
pub mod points;
pub mod teams;
pub mod tournaments;
