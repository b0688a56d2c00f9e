//! Error handling for the tournament engine.

pub mod codes;
pub mod engine;

pub use codes::ErrorCode;
pub use engine::{
    ConflictKind, EngineError, NotFoundKind, PreconditionKind, ValidationKind,
};
