use std::collections::HashSet;

use log::{debug, warn};
use rand::RngCore;
use rand::seq::SliceRandom;

use super::round::{PlanContext, PlannedMatch, RoundPlanner};
use super::selection::{least_played_match, rank_by_priority, PriorityWeights, GROUP_SIZE};
use super::team_split::TeamSplitOptimizer;
use crate::config::{PairingSettings, RatingSettings};
use crate::domain::{Player, PlayerId};

/// Priority selection followed by the best repeat-free team split.
///
/// Each attempt draws a group of four from a window over the priority order
/// that widens by one player per attempt. When no attempt yields a split
/// without any earlier pairing or matchup, the least-played players are used
/// and only an identical matchup from the same generation pass is refused.
pub struct WeightedSplitPlanner<'a> {
    pairing: &'a PairingSettings,
    rating: &'a RatingSettings,
}

impl<'a> WeightedSplitPlanner<'a> {
    pub fn new(pairing: &'a PairingSettings, rating: &'a RatingSettings) -> Self {
        Self { pairing, rating }
    }

    fn plan_one(
        &self,
        remaining: &[&Player],
        ctx: &PlanContext,
        rng: &mut dyn RngCore,
    ) -> Option<PlannedMatch> {
        let weights = PriorityWeights {
            pairing: self.pairing,
            rating: self.rating,
            skill_matching: ctx.skill_matching,
        };
        let ranked = rank_by_priority(remaining, ctx.last_round, &weights, rng);
        let optimizer =
            TeamSplitOptimizer::new(ctx.ledger, self.pairing.repeat_weight, ctx.skill_matching);

        for attempt in 0..self.pairing.max_attempts {
            let group = draw_group(&ranked, attempt, rng);

            let fresh = optimizer
                .rank(&group)
                .ok()?
                .into_iter()
                .find(|c| ctx.ledger.is_fresh(&c.team1, &c.team2));

            if let Some(split) = fresh {
                debug!("Repeat-free split found on attempt {}", attempt + 1);
                return Some(PlannedMatch {
                    team1: split.team1,
                    team2: split.team2,
                    relaxed: false,
                });
            }
        }

        warn!(
            "No repeat-free grouping after {} attempts, falling back to least-played players",
            self.pairing.max_attempts
        );
        least_played_match(remaining, &optimizer, ctx.emitted_matchups, rng)
    }
}

impl RoundPlanner for WeightedSplitPlanner<'_> {
    fn plan(&self, ctx: &PlanContext, rng: &mut dyn RngCore) -> Vec<PlannedMatch> {
        let mut taken: HashSet<PlayerId> = HashSet::new();
        let mut matches = Vec::new();

        while matches.len() < ctx.matches_wanted {
            let remaining: Vec<&Player> =
                ctx.pool.iter().filter(|p| !taken.contains(&p.id)).collect();
            if remaining.len() < GROUP_SIZE {
                break;
            }

            match self.plan_one(&remaining, ctx, rng) {
                Some(m) => {
                    taken.extend(m.participants());
                    matches.push(m);
                }
                None => break,
            }
        }

        matches
    }
}

/// First attempt takes the top four; later ones sample four from a wider window
fn draw_group<'p>(
    ranked: &[&'p Player],
    attempt: usize,
    rng: &mut dyn RngCore,
) -> Vec<&'p Player> {
    if attempt == 0 {
        return ranked[..GROUP_SIZE].to_vec();
    }

    let window = (GROUP_SIZE + attempt).min(ranked.len());
    let indices: Vec<usize> = (0..window).collect();
    let mut positions: Vec<usize> = indices.choose_multiple(rng, GROUP_SIZE).copied().collect();
    positions.sort_unstable();

    positions.into_iter().map(|i| ranked[i]).collect()
}
