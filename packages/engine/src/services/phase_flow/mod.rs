//! Phase state machine.
//!
//! The only code in the crate that changes `Tournament::status`. Simple
//! flips live in [`transitions`]; the artifact-producing moves (group
//! draw, knockout build) and the history-driven undo have their own
//! modules because their failure handling is heavier.

pub mod group_stage;
pub mod knockout;
pub mod rollback;
pub mod transitions;

pub use group_stage::{DrawOutcome, DrawnGroup};
