//! Fixed structural rules of the tournament format.

use crate::entities::ids::GroupNo;

/// Roster bounds per team.
pub const MIN_PLAYERS_PER_TEAM: usize = 1;
pub const MAX_PLAYERS_PER_TEAM: usize = 8;

/// Groups are labelled A..Z, which caps the count at 26.
pub const MAX_GROUPS: u8 = 26;
pub const MAX_TEAMS_PER_GROUP: u8 = 32;

/// Shape bound on a single set score; keeps junk input out of the math.
pub const MAX_GAMES_PER_SET: u16 = 99;

/// Largest knockout field the bracket builder supports after padding.
pub const MAX_BRACKET_FIELD: usize = 16;

/// Display label for a 1-based group number ("Group A" for 1).
pub fn group_label(group_no: GroupNo) -> String {
    debug_assert!((1..=MAX_GROUPS).contains(&group_no));
    let letter = (b'A' + group_no.saturating_sub(1).min(MAX_GROUPS - 1)) as char;
    format!("Group {letter}")
}
