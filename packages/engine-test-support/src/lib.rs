//! Engine test support utilities
//!
//! This crate provides the unified logging initialization shared by the
//! engine's unit and property tests.

pub mod logging;
