//! Knockout bracket construction.

use crate::entities::brackets::SeedSlot;
use crate::entities::ids::TeamId;
use crate::entities::matches::{KnockoutRound, MatchStatus, SlotNo};
use crate::errors::{EngineError, ValidationKind};

use super::rules::MAX_BRACKET_FIELD;

/// One fixture of the plan, in creation order. Links point at indices
/// into [`BracketPlan::matches`]; the caller assigns real ids.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMatch {
    pub round: KnockoutRound,
    /// 1-based within the round.
    pub match_number: u16,
    pub side1: Option<TeamId>,
    pub side2: Option<TeamId>,
    pub status: MatchStatus,
    pub winner: Option<TeamId>,
    /// Successor fixture and slot; `None` for the final and third place.
    pub next: Option<(usize, SlotNo)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BracketPlan {
    pub starting_round: KnockoutRound,
    /// Padded seed order; adjacent pairs form the opening fixtures.
    pub slots: Vec<SeedSlot>,
    pub matches: Vec<PlannedMatch>,
}

impl BracketPlan {
    /// Opening fixtures auto-completed by a bye.
    pub fn bye_completions(&self) -> usize {
        self.matches
            .iter()
            .filter(|m| m.status == MatchStatus::Completed)
            .count()
    }
}

/// Orders qualifiers so the opening round crosses groups.
///
/// `qualifiers[g]` is group g's advancing list in position order.
/// Positions are consumed in pairs: each group's place-p meets the next
/// group's place-p+1 (wrapping), so group winners dodge each other and
/// nobody replays a group rival in round one. A leftover odd position
/// is appended in group order.
pub fn cross_seed(qualifiers: &[Vec<TeamId>]) -> Vec<TeamId> {
    let n = qualifiers.len();
    let depth = qualifiers.iter().map(Vec::len).min().unwrap_or(0);
    let mut seeds = Vec::with_capacity(n * depth);
    let mut pos = 0;
    while pos + 1 < depth {
        for g in 0..n {
            seeds.push(qualifiers[g][pos]);
            seeds.push(qualifiers[(g + 1) % n][pos + 1]);
        }
        pos += 2;
    }
    if pos < depth {
        for group in qualifiers {
            seeds.push(group[pos]);
        }
    }
    seeds
}

/// Builds the full bracket for an ordered seed list.
///
/// The field is padded to the next power of two with byes placed right
/// after the top seeds, so the strongest qualifiers get the free pass
/// and no opening fixture pairs two byes. A seed walking over a bye is
/// completed immediately and propagated into its successor.
pub fn build(seeds: &[TeamId], third_place: bool) -> Result<BracketPlan, EngineError> {
    if seeds.len() < 2 {
        return Err(EngineError::validation(
            ValidationKind::SeedCount,
            format!("a knockout needs at least 2 qualifiers, got {}", seeds.len()),
        ));
    }
    let field = seeds.len().next_power_of_two();
    if field > MAX_BRACKET_FIELD {
        return Err(EngineError::validation(
            ValidationKind::SeedCount,
            format!(
                "{} qualifiers pad to a field of {field}, largest supported is {MAX_BRACKET_FIELD}",
                seeds.len()
            ),
        ));
    }
    let starting_round = match KnockoutRound::starting_round(field) {
        Some(round) => round,
        None => {
            return Err(EngineError::validation(
                ValidationKind::SeedCount,
                format!("no round shape for a field of {field}"),
            ))
        }
    };

    // Interleave byes behind the top seeds: with b byes, seeds 1..=b
    // each take a bye and the rest pair off in seed order.
    let bye_count = field - seeds.len();
    let mut slots: Vec<SeedSlot> = Vec::with_capacity(field);
    for (idx, team_id) in seeds.iter().copied().enumerate() {
        slots.push(SeedSlot::Team { team_id });
        if idx < bye_count {
            slots.push(SeedSlot::Bye);
        }
    }

    let mut matches: Vec<PlannedMatch> = Vec::new();

    // Opening round from adjacent slot pairs.
    for (i, pair) in slots.chunks(2).enumerate() {
        let side1 = pair[0].team_id();
        let side2 = pair[1].team_id();
        let walkover = match (side1, side2) {
            (Some(team), None) | (None, Some(team)) => Some(team),
            _ => None,
        };
        matches.push(PlannedMatch {
            round: starting_round,
            match_number: (i + 1) as u16,
            side1,
            side2,
            status: if walkover.is_some() {
                MatchStatus::Completed
            } else {
                MatchStatus::Scheduled
            },
            winner: walkover,
            next: None,
        });
    }

    // Placeholder rounds down to the final, linking children to parents.
    let mut round_start = 0usize;
    let mut round_len = matches.len();
    let mut round = starting_round;
    while let Some(next_round) = round.next() {
        let parent_start = matches.len();
        for number in 0..round_len / 2 {
            matches.push(PlannedMatch {
                round: next_round,
                match_number: (number + 1) as u16,
                side1: None,
                side2: None,
                status: MatchStatus::Scheduled,
                winner: None,
                next: None,
            });
        }
        for child in 0..round_len {
            let parent = parent_start + child / 2;
            let slot = if child % 2 == 0 { SlotNo::One } else { SlotNo::Two };
            matches[round_start + child].next = Some((parent, slot));
        }
        round_start = parent_start;
        round_len /= 2;
        round = next_round;
    }

    // Walkover winners take their successor slot right away. Byes never
    // sit adjacent, so this cannot cascade past one round.
    for child in 0..matches.len() {
        if let (Some(team), Some((parent, slot))) = (matches[child].winner, matches[child].next) {
            match slot {
                SlotNo::One => matches[parent].side1 = Some(team),
                SlotNo::Two => matches[parent].side2 = Some(team),
            }
        }
    }

    // The third-place fixture is fed by semifinal losers at result time,
    // so it carries no structural link. A field of 2 has no semifinals
    // and silently drops the fixture.
    if third_place && field >= 4 {
        matches.push(PlannedMatch {
            round: KnockoutRound::ThirdPlace,
            match_number: 1,
            side1: None,
            side2: None,
            status: MatchStatus::Scheduled,
            winner: None,
            next: None,
        });
    }

    Ok(BracketPlan {
        starting_round,
        slots,
        matches,
    })
}
