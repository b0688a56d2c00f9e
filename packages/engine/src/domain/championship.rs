//! Championship points calculation.
//!
//! Runs over a finished tournament and produces per-team totals plus
//! per-player awards with full provenance. The calculation is pure; the
//! service layer decides when to apply it and how to undo it.

use std::collections::HashMap;

use crate::entities::ids::{GroupNo, TeamId};
use crate::entities::matches::{Match, MatchStage};
use crate::entities::points::{
    PlayerAward, PointsEvent, PointsSource, TeamPointsTotal, Tenths,
};
use crate::entities::teams::Team;
use crate::entities::tournaments::ChampionshipWeights;

use super::rating;

#[derive(Debug, Clone, PartialEq)]
pub struct ChampionshipOutcome {
    pub teams: Vec<TeamPointsTotal>,
    pub awards: Vec<PlayerAward>,
}

#[derive(Default)]
struct Accumulator {
    rating_points: f64,
    placement_bonus: f64,
    knockout_bonus: f64,
    events: Vec<PointsEvent>,
}

/// Computes totals and awards for every team that left a trace in the
/// tournament (a completed match or a final group position).
///
/// Group losers concede their rating exchange; knockout losers concede
/// nothing because elimination already is the penalty, but their
/// zero-amount entries stay in the breakdown so the provenance reads
/// complete. Totals are rounded to one decimal and clamped at zero
/// before they reach players.
pub fn calculate(
    weights: &ChampionshipWeights,
    teams: &[Team],
    matches: &[Match],
    placements: &HashMap<TeamId, (GroupNo, u8)>,
) -> ChampionshipOutcome {
    let ratings: HashMap<TeamId, Option<f64>> =
        teams.iter().map(|t| (t.id, t.rating())).collect();
    let mut acc: HashMap<TeamId, Accumulator> = HashMap::new();

    for m in matches.iter().filter(|m| m.is_completed()) {
        let Some(winner) = m.winner else { continue };
        let knockout_round = m.knockout_round();

        if let Some(round) = knockout_round {
            let bonus = weights.round_points(round);
            let entry = acc.entry(winner).or_default();
            entry.knockout_bonus += bonus;
            entry.events.push(PointsEvent {
                source: PointsSource::Progression {
                    match_id: m.id,
                    round,
                    won: true,
                },
                amount: bonus,
            });
        }

        // Rating exchanges need a real opponent; bye fixtures stop here.
        let Some(loser) = m.loser() else { continue };
        let (winner_games, loser_games) = {
            let (g1, g2) = m.game_totals();
            if m.side1.as_ref().is_some_and(|s| s.team_id == winner) {
                (g1, g2)
            } else {
                (g2, g1)
            }
        };
        let exchange = rating::delta(
            ratings.get(&winner).copied().flatten(),
            ratings.get(&loser).copied().flatten(),
            winner_games,
            loser_games,
        ) * weights.rating_multiplier;

        let winner_acc = acc.entry(winner).or_default();
        winner_acc.rating_points += exchange;
        winner_acc.events.push(PointsEvent {
            source: PointsSource::RatingExchange {
                match_id: m.id,
                opponent: loser,
                round: knockout_round,
                won: true,
            },
            amount: exchange,
        });

        let loser_amount = if knockout_round.is_some() { 0.0 } else { -exchange };
        let loser_acc = acc.entry(loser).or_default();
        loser_acc.rating_points += loser_amount;
        loser_acc.events.push(PointsEvent {
            source: PointsSource::RatingExchange {
                match_id: m.id,
                opponent: winner,
                round: knockout_round,
                won: false,
            },
            amount: loser_amount,
        });
        if let Some(round) = knockout_round {
            loser_acc.events.push(PointsEvent {
                source: PointsSource::Progression {
                    match_id: m.id,
                    round,
                    won: false,
                },
                amount: 0.0,
            });
        }
    }

    for (team_id, (group_no, position)) in placements {
        let bonus = weights.placement_points(*position);
        let entry = acc.entry(*team_id).or_default();
        entry.placement_bonus += bonus;
        entry.events.push(PointsEvent {
            source: PointsSource::Placement {
                group_no: *group_no,
                position: *position,
            },
            amount: bonus,
        });
    }

    let mut totals = Vec::new();
    let mut awards = Vec::new();
    // Input team order keeps the application document deterministic.
    for team in teams {
        let Some(entry) = acc.get(&team.id) else { continue };
        let rating_points = round2(entry.rating_points);
        let placement_bonus = round2(entry.placement_bonus);
        let knockout_bonus = round2(entry.knockout_bonus);
        let raw_total = Tenths::from_points(rating_points + placement_bonus + knockout_bonus);
        let awarded_total = raw_total.clamp_non_negative();
        totals.push(TeamPointsTotal {
            team_id: team.id,
            rating_points,
            placement_bonus,
            knockout_bonus,
            raw_total,
            awarded_total,
        });
        for player in &team.players {
            awards.push(PlayerAward {
                player_id: player.id,
                team_id: team.id,
                amount: awarded_total,
                contributions: entry.events.clone(),
            });
        }
    }

    ChampionshipOutcome { teams: totals, awards }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
