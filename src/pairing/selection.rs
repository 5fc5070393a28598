use std::collections::HashSet;

use log::warn;
use rand::RngCore;
use rand::seq::SliceRandom;

use super::round::PlannedMatch;
use super::team_split::TeamSplitOptimizer;
use crate::config::{PairingSettings, RatingSettings};
use crate::domain::{Player, PlayerId};
use crate::history::MatchupKey;

/// Players on court for one doubles match
pub const GROUP_SIZE: usize = 4;

/// Inputs to a player's selection priority
pub struct PriorityWeights<'a> {
    pub pairing: &'a PairingSettings,
    pub rating: &'a RatingSettings,
    pub skill_matching: bool,
}

/// Higher is picked first.
///
/// Sitting out the previous round is worth a large bonus, every match fewer
/// than the busiest player is worth a medium one, and with skill matching the
/// player's level adds a small amount.
pub fn priority_score(
    player: &Player,
    max_played: u32,
    last_round: &HashSet<PlayerId>,
    weights: &PriorityWeights,
) -> f64 {
    let mut score = 0.0;

    if !last_round.contains(&player.id) {
        score += weights.pairing.not_in_last_round_bonus;
    }

    let fewer = max_played.saturating_sub(player.matches_played);
    score += fewer as f64 * weights.pairing.fewer_matches_bonus;

    if weights.skill_matching {
        score += player.level(weights.rating) as f64;
    }

    score
}

/// Players by descending priority; equal priorities are shuffled by `rng`.
pub fn rank_by_priority<'p>(
    players: &[&'p Player],
    last_round: &HashSet<PlayerId>,
    weights: &PriorityWeights,
    rng: &mut dyn RngCore,
) -> Vec<&'p Player> {
    let max_played = players.iter().map(|p| p.matches_played).max().unwrap_or(0);

    let mut scored: Vec<(f64, &Player)> = players
        .iter()
        .map(|&p| (priority_score(p, max_played, last_round, weights), p))
        .collect();

    scored.shuffle(rng);
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored.into_iter().map(|(_, p)| p).collect()
}

/// Players by ascending match count; equal counts are shuffled by `rng`.
pub fn least_played<'p>(players: &[&'p Player], rng: &mut dyn RngCore) -> Vec<&'p Player> {
    let mut ordered = players.to_vec();
    ordered.shuffle(rng);
    ordered.sort_by_key(|p| p.matches_played);
    ordered
}

/// Relaxed match from the least-played players, for when a planner's own
/// search came up empty. Earlier pairings and matchups are allowed; only a
/// matchup already scheduled in this generation pass is refused.
pub fn least_played_match(
    remaining: &[&Player],
    optimizer: &TeamSplitOptimizer,
    emitted_matchups: &HashSet<MatchupKey>,
    rng: &mut dyn RngCore,
) -> Option<PlannedMatch> {
    if remaining.len() < GROUP_SIZE {
        return None;
    }

    let ordered = least_played(remaining, rng);
    let split = optimizer
        .rank(&ordered[..GROUP_SIZE])
        .ok()?
        .into_iter()
        .find(|c| !emitted_matchups.contains(&MatchupKey::new(&c.team1, &c.team2)));

    if split.is_none() {
        warn!("Every split of the least-played group was already scheduled in this pass");
    }

    split.map(|s| PlannedMatch {
        team1: s.team1,
        team2: s.team2,
        relaxed: true,
    })
}
