//! Single round-robin schedule via the circle method.

use crate::entities::ids::TeamId;

/// One scheduled group fixture. Sides are unordered for play purposes;
/// the split only fixes which score column belongs to which team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    /// 1-based round-robin round.
    pub round_no: u8,
    /// 1-based sequence across the whole group schedule.
    pub match_number: u16,
    pub side1: TeamId,
    pub side2: TeamId,
}

/// Schedules every pair exactly once, spread over rounds so no team
/// plays twice in the same round.
///
/// Odd fields get a rotating bye: the pair involving the phantom slot
/// is simply skipped. `k` teams yield `k * (k - 1) / 2` pairings in
/// `k - 1` rounds (`k` rounds when odd).
pub fn schedule(teams: &[TeamId]) -> Vec<Pairing> {
    if teams.len() < 2 {
        return Vec::new();
    }

    // Classic circle method: one slot fixed, the rest rotate each round.
    let mut ring: Vec<Option<TeamId>> = teams.iter().copied().map(Some).collect();
    if ring.len() % 2 == 1 {
        ring.push(None);
    }
    let size = ring.len();
    let rounds = size - 1;

    let mut pairings = Vec::with_capacity(teams.len() * (teams.len() - 1) / 2);
    let mut match_number: u16 = 1;
    for round in 0..rounds {
        for i in 0..size / 2 {
            let a = ring[i];
            let b = ring[size - 1 - i];
            if let (Some(side1), Some(side2)) = (a, b) {
                pairings.push(Pairing {
                    round_no: (round + 1) as u8,
                    match_number,
                    side1,
                    side2,
                });
                match_number += 1;
            }
        }
        ring[1..].rotate_right(1);
    }
    pairings
}
