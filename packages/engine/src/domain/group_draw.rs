//! Seeding order and serpentine group distribution.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::entities::ids::TeamId;
use crate::errors::{EngineError, PreconditionKind};

/// Minimal team view the draw needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawEntrant {
    pub team_id: TeamId,
    /// Lower is stronger; `None` for unranked rosters.
    pub rating: Option<f64>,
}

/// Ranks entrants for the serpentine draw.
///
/// Rated teams come first, sorted ascending by rating (strongest
/// first); unrated teams follow in an order shuffled by the stored
/// draw seed so re-running the draw reproduces it exactly.
pub fn seeding_order(entrants: &[DrawEntrant], draw_seed: u64) -> Vec<TeamId> {
    let mut rated: Vec<&DrawEntrant> = entrants.iter().filter(|e| e.rating.is_some()).collect();
    let mut unrated: Vec<&DrawEntrant> = entrants.iter().filter(|e| e.rating.is_none()).collect();

    // Stable sort keeps registration order between equal ratings.
    rated.sort_by(|a, b| {
        a.rating
            .partial_cmp(&b.rating)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    unrated.shuffle(&mut ChaCha20Rng::seed_from_u64(draw_seed));

    rated
        .into_iter()
        .chain(unrated)
        .map(|e| e.team_id)
        .collect()
}

/// Distributes the top of a seeding order into groups serpentine-wise.
///
/// Pass 0 fills groups left to right, pass 1 right to left, and so on,
/// so the strength sums stay balanced. Entrants beyond
/// `group_count * teams_per_group` are left out of the draw.
///
/// Returns one vec per group; the index within a group vec is the
/// 0-based draft position.
pub fn serpentine(
    seeded: &[TeamId],
    group_count: u8,
    teams_per_group: u8,
) -> Result<Vec<Vec<TeamId>>, EngineError> {
    let need = usize::from(group_count) * usize::from(teams_per_group);
    if seeded.len() < need {
        return Err(EngineError::precondition(
            PreconditionKind::InsufficientTeams,
            format!(
                "draw needs {need} active teams ({group_count} groups of {teams_per_group}), have {}",
                seeded.len()
            ),
        ));
    }

    let n = usize::from(group_count);
    let mut groups: Vec<Vec<TeamId>> = vec![Vec::with_capacity(usize::from(teams_per_group)); n];
    for (idx, team_id) in seeded.iter().take(need).enumerate() {
        let pass = idx / n;
        let offset = idx % n;
        let group = if pass % 2 == 0 { offset } else { n - 1 - offset };
        groups[group].push(*team_id);
    }
    Ok(groups)
}
