//! Listing filters shared by the store trait and its implementations.

use crate::entities::ids::GroupNo;
use crate::entities::matches::{KnockoutRound, Match, MatchStage, MatchStatus};
use crate::entities::teams::{Team, TeamStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamFilter {
    pub status: Option<TeamStatus>,
    pub group_no: Option<GroupNo>,
}

impl TeamFilter {
    pub fn active() -> Self {
        Self {
            status: Some(TeamStatus::Active),
            ..Self::default()
        }
    }

    pub fn group(group_no: GroupNo) -> Self {
        Self {
            group_no: Some(group_no),
            ..Self::default()
        }
    }

    pub fn matches(&self, team: &Team) -> bool {
        self.status.is_none_or(|s| team.status == s)
            && self.group_no.is_none_or(|g| team.group_no == Some(g))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageFilter {
    Group,
    Knockout,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchFilter {
    pub stage: Option<StageFilter>,
    pub group_no: Option<GroupNo>,
    pub round: Option<KnockoutRound>,
    pub status: Option<MatchStatus>,
}

impl MatchFilter {
    pub fn group_stage() -> Self {
        Self {
            stage: Some(StageFilter::Group),
            ..Self::default()
        }
    }

    pub fn knockout() -> Self {
        Self {
            stage: Some(StageFilter::Knockout),
            ..Self::default()
        }
    }

    pub fn in_group(group_no: GroupNo) -> Self {
        Self {
            stage: Some(StageFilter::Group),
            group_no: Some(group_no),
            ..Self::default()
        }
    }

    pub fn in_round(round: KnockoutRound) -> Self {
        Self {
            stage: Some(StageFilter::Knockout),
            round: Some(round),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: MatchStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, m: &Match) -> bool {
        let stage_ok = match self.stage {
            None => true,
            Some(StageFilter::Group) => matches!(m.stage, MatchStage::Group { .. }),
            Some(StageFilter::Knockout) => matches!(m.stage, MatchStage::Knockout { .. }),
        };
        stage_ok
            && self.group_no.is_none_or(|g| m.group_no() == Some(g))
            && self.round.is_none_or(|r| m.knockout_round() == Some(r))
            && self.status.is_none_or(|s| m.status == s)
    }
}
