//! Set-score validation and match outcome derivation.

use crate::entities::matches::{SetScore, SlotNo};
use crate::errors::{EngineError, ValidationKind};

use super::rules::MAX_GAMES_PER_SET;

/// Aggregates derived from a validated set list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub winner_slot: SlotNo,
    pub sets1: u16,
    pub sets2: u16,
    pub games1: u32,
    pub games2: u32,
}

impl MatchOutcome {
    pub fn loser_slot(&self) -> SlotNo {
        match self.winner_slot {
            SlotNo::One => SlotNo::Two,
            SlotNo::Two => SlotNo::One,
        }
    }
}

/// Validates a submitted score and determines the winner by sets won.
///
/// Every set must have a winner and the overall set count must not tie;
/// the engine does not know best-of rules, so any decided set list of
/// plausible shape is accepted.
pub fn evaluate_sets(sets: &[SetScore]) -> Result<MatchOutcome, EngineError> {
    if sets.is_empty() {
        return Err(EngineError::validation(
            ValidationKind::EmptyScore,
            "a result needs at least one set",
        ));
    }

    let mut sets1: u16 = 0;
    let mut sets2: u16 = 0;
    let mut games1: u32 = 0;
    let mut games2: u32 = 0;

    for (idx, set) in sets.iter().enumerate() {
        if set.side1 > MAX_GAMES_PER_SET || set.side2 > MAX_GAMES_PER_SET {
            return Err(EngineError::validation(
                ValidationKind::SetScore,
                format!(
                    "set {} exceeds {} games per side",
                    idx + 1,
                    MAX_GAMES_PER_SET
                ),
            ));
        }
        if set.side1 == set.side2 {
            return Err(EngineError::validation(
                ValidationKind::SetScore,
                format!("set {} is tied {}-{}", idx + 1, set.side1, set.side2),
            ));
        }
        if set.side1 > set.side2 {
            sets1 += 1;
        } else {
            sets2 += 1;
        }
        games1 += u32::from(set.side1);
        games2 += u32::from(set.side2);
    }

    let winner_slot = match sets1.cmp(&sets2) {
        std::cmp::Ordering::Greater => SlotNo::One,
        std::cmp::Ordering::Less => SlotNo::Two,
        std::cmp::Ordering::Equal => {
            return Err(EngineError::validation(
                ValidationKind::TiedMatch,
                format!("sets split {sets1}-{sets2} with no winner"),
            ))
        }
    };

    Ok(MatchOutcome {
        winner_slot,
        sets1,
        sets2,
        games1,
        games2,
    })
}
