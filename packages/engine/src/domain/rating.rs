//! Ladder-rating exchange for a decided match.
//!
//! Ratings are ladder positions where a lower number means a stronger
//! team. The exchange follows a logistic expectation curve scaled by
//! how one-sided the games were, so an upset over a much stronger
//! opponent moves more points than a routine win.

/// Rating assumed for sides without any ranked player.
pub const DEFAULT_RATING: f64 = 1000.0;

/// Rating gap at which the stronger side is a 10:1 favourite.
const SPREAD: f64 = 400.0;

/// Base exchange for a fully unexpected, maximally one-sided win.
const BASE_K: f64 = 30.0;

/// Points exchanged for one decided match, rounded to two decimals.
///
/// The winner gains the returned amount and the loser concedes it.
/// Always non-negative; a heavy favourite cruising past an outsider
/// earns close to zero.
pub fn delta(
    winner_rating: Option<f64>,
    loser_rating: Option<f64>,
    winner_games: u32,
    loser_games: u32,
) -> f64 {
    let winner = winner_rating.unwrap_or(DEFAULT_RATING);
    let loser = loser_rating.unwrap_or(DEFAULT_RATING);

    // Lower rating is stronger, so a negative gap means the winner was
    // the favourite and the expectation climbs above one half.
    let gap = winner - loser;
    let expected_win = 1.0 / (1.0 + 10f64.powf(gap / SPREAD));

    let total_games = winner_games + loser_games;
    let margin = if total_games == 0 {
        1.0
    } else {
        0.5 + f64::from(winner_games) / f64::from(total_games)
    };

    let raw = BASE_K * (1.0 - expected_win) * margin;
    round2(raw.max(0.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
