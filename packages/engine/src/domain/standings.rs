//! Group table computation.
//!
//! Standings are recomputed from scratch off the completed matches on
//! every change; nothing here mutates incrementally. Equal inputs in
//! equal order always produce an identical table, which is what lets
//! the persisted rows be overwritten blindly.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::entities::ids::{GroupNo, TeamId};
use crate::entities::matches::Match;
use crate::entities::standings::Standing;
use crate::entities::tournaments::PointsRule;

use super::rating;

/// Computes the ordered table for one group.
///
/// `teams` carries every group member with its side rating, in stored
/// document order; that order is the final tie-break, so it must be
/// stable across calls. `matches` may contain fixtures in any state;
/// only completed ones with a winner count.
pub fn compute_group(
    group_no: GroupNo,
    teams: &[(TeamId, Option<f64>)],
    matches: &[Match],
    rule: &PointsRule,
) -> Vec<Standing> {
    let mut rows: Vec<Standing> = teams
        .iter()
        .map(|(team_id, _)| Standing::zeroed(*team_id, group_no))
        .collect();
    let index: HashMap<TeamId, usize> = teams
        .iter()
        .enumerate()
        .map(|(i, (team_id, _))| (*team_id, i))
        .collect();
    let ratings: HashMap<TeamId, Option<f64>> = teams.iter().copied().collect();

    let completed: Vec<&Match> = matches
        .iter()
        .filter(|m| m.is_completed() && m.winner.is_some())
        .collect();

    for m in &completed {
        let (Some(s1), Some(s2), Some(winner)) = (&m.side1, &m.side2, m.winner) else {
            continue;
        };
        let (Some(&i1), Some(&i2)) = (index.get(&s1.team_id), index.get(&s2.team_id)) else {
            continue;
        };
        let (sets1, sets2) = m.sets_won();
        let (games1, games2) = m.game_totals();

        rows[i1].played += 1;
        rows[i1].sets_won += sets1;
        rows[i1].sets_lost += sets2;
        rows[i1].games_won += games1;
        rows[i1].games_lost += games2;

        rows[i2].played += 1;
        rows[i2].sets_won += sets2;
        rows[i2].sets_lost += sets1;
        rows[i2].games_won += games2;
        rows[i2].games_lost += games1;

        let (wi, li, w_games, l_games) = if winner == s1.team_id {
            (i1, i2, games1, games2)
        } else {
            (i2, i1, games2, games1)
        };
        rows[wi].won += 1;
        rows[wi].points += rule.win;
        rows[li].lost += 1;
        rows[li].points += rule.loss;

        let exchange = rating::delta(
            ratings.get(&rows[wi].team_id).copied().flatten(),
            ratings.get(&rows[li].team_id).copied().flatten(),
            w_games,
            l_games,
        );
        rows[wi].rating_delta += exchange;
        rows[li].rating_delta -= exchange;
    }

    for row in &mut rows {
        row.rating_delta = (row.rating_delta * 100.0).round() / 100.0;
    }

    order_rows(&mut rows, &completed);
    for (idx, row) in rows.iter_mut().enumerate() {
        row.position = (idx + 1) as u8;
    }
    rows
}

/// Applies the tie-break cascade: points, then for exactly two tied
/// teams their direct meeting (winner first, else the set margin of
/// those meetings), then set difference, sets won, game difference,
/// games won, and finally the incoming document order.
fn order_rows(rows: &mut [Standing], completed: &[&Match]) {
    // Stable, so document order survives every full tie.
    rows.sort_by(|a, b| b.points.cmp(&a.points));

    let mut start = 0;
    while start < rows.len() {
        let points = rows[start].points;
        let mut end = start + 1;
        while end < rows.len() && rows[end].points == points {
            end += 1;
        }
        let cluster = &mut rows[start..end];
        if cluster.len() == 2 {
            order_pair(cluster, completed);
        } else if cluster.len() > 2 {
            cluster.sort_by(secondary_order);
        }
        start = end;
    }
}

fn order_pair(pair: &mut [Standing], completed: &[&Match]) {
    let (a, b) = (pair[0].team_id, pair[1].team_id);
    let (wins_a, wins_b, margin_a) = head_to_head(a, b, completed);

    let ordering = if wins_a != wins_b {
        wins_b.cmp(&wins_a)
    } else if margin_a != 0 {
        0.cmp(&margin_a)
    } else {
        secondary_order(&pair[0], &pair[1])
    };
    if ordering == Ordering::Greater {
        pair.swap(0, 1);
    }
}

/// Mutual record of two teams: wins for each and the first team's net
/// set margin over their meetings.
fn head_to_head(a: TeamId, b: TeamId, completed: &[&Match]) -> (u32, u32, i32) {
    let mut wins_a = 0;
    let mut wins_b = 0;
    let mut margin_a = 0;
    for m in completed {
        if !(m.involves(a) && m.involves(b)) {
            continue;
        }
        match m.winner {
            Some(w) if w == a => wins_a += 1,
            Some(w) if w == b => wins_b += 1,
            _ => continue,
        }
        let (sets1, sets2) = m.sets_won();
        let signed = i32::from(sets1) - i32::from(sets2);
        if m.side1.as_ref().is_some_and(|s| s.team_id == a) {
            margin_a += signed;
        } else {
            margin_a -= signed;
        }
    }
    (wins_a, wins_b, margin_a)
}

fn secondary_order(a: &Standing, b: &Standing) -> Ordering {
    b.set_diff()
        .cmp(&a.set_diff())
        .then_with(|| b.sets_won.cmp(&a.sets_won))
        .then_with(|| b.game_diff().cmp(&a.game_diff()))
        .then_with(|| b.games_won.cmp(&a.games_won))
}
