//! Team and player documents.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::entities::ids::{GroupNo, PlayerId, TeamId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamStatus {
    Active,
    Withdrawn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Ladder rating where lower means stronger; `None` for unranked players.
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub players: Vec<Player>,
    pub status: TeamStatus,
    /// Set by the group draw, cleared when the draw is rolled back.
    pub group_no: Option<GroupNo>,
    /// 1-based draft position within the group.
    pub group_position: Option<u8>,
    pub revision: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Team {
    pub fn is_active(&self) -> bool {
        self.status == TeamStatus::Active
    }

    /// Mean rating over rated players; `None` when nobody on the roster
    /// is ranked, which seeds the team into the shuffled tail.
    pub fn rating(&self) -> Option<f64> {
        let rated: Vec<f64> = self.players.iter().filter_map(|p| p.rating).collect();
        if rated.is_empty() {
            None
        } else {
            Some(rated.iter().sum::<f64>() / rated.len() as f64)
        }
    }

    pub fn clear_group_assignment(&mut self, at: OffsetDateTime) {
        self.group_no = None;
        self.group_position = None;
        self.updated_at = at;
    }
}
