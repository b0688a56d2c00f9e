//! Persisted group standings rows.
//!
//! Standings are a derived view: the source of truth is the set of
//! completed group matches, and every row here can be rebuilt from them
//! at any time. Rows are keyed by team id and fully overwritten on each
//! recomputation.

use serde::{Deserialize, Serialize};

use crate::entities::ids::{GroupNo, TeamId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub team_id: TeamId,
    pub group_no: GroupNo,
    /// 1-based position after all tie-breaks.
    pub position: u8,
    pub played: u16,
    pub won: u16,
    pub lost: u16,
    pub sets_won: u16,
    pub sets_lost: u16,
    pub games_won: u32,
    pub games_lost: u32,
    pub points: i32,
    /// Net ladder-rating exchange accumulated over the group stage,
    /// rounded to two decimals per match.
    pub rating_delta: f64,
}

impl Standing {
    pub fn zeroed(team_id: TeamId, group_no: GroupNo) -> Self {
        Self {
            team_id,
            group_no,
            position: 0,
            played: 0,
            won: 0,
            lost: 0,
            sets_won: 0,
            sets_lost: 0,
            games_won: 0,
            games_lost: 0,
            points: 0,
            rating_delta: 0.0,
        }
    }

    pub fn set_diff(&self) -> i32 {
        i32::from(self.sets_won) - i32::from(self.sets_lost)
    }

    pub fn game_diff(&self) -> i64 {
        i64::from(self.games_won) - i64::from(self.games_lost)
    }
}
