//! Pure tournament logic.
//!
//! Nothing in this module touches the store or the clock; every
//! function maps inputs to outputs so the algorithms can be tested
//! exhaustively without fixtures.

pub mod bracket;
pub mod championship;
pub mod group_draw;
pub mod phase;
pub mod rating;
pub mod round_robin;
pub mod rules;
pub mod score;
pub mod standings;

#[cfg(test)]
mod tests_bracket;
#[cfg(test)]
mod tests_championship;
#[cfg(test)]
mod tests_score;
