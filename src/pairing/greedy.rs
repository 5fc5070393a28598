use std::collections::{BTreeMap, HashSet};

use log::{debug, warn};
use rand::RngCore;

use super::round::{PlanContext, PlannedMatch, RoundPlanner};
use super::selection::{least_played_match, GROUP_SIZE};
use super::team_split::TeamSplitOptimizer;
use crate::config::{PairingSettings, RatingSettings};
use crate::domain::{Player, PlayerId, Team};
use crate::history::{HistoryLedger, MatchupKey, PairKey};

/// Diversity-first alternative to the weighted split.
///
/// Players with the most byes choose partners first, each taking the
/// candidate with the lowest pair score (earlier encountered wins ties).
/// Teams are then matched greedily by lowest matchup score. With skill
/// matching, partners are only sought inside the same level bucket. Courts
/// the buckets cannot fill go to relaxed matches of the least-played
/// leftovers.
pub struct GreedyDiversityPlanner<'a> {
    pairing: &'a PairingSettings,
    rating: &'a RatingSettings,
}

impl<'a> GreedyDiversityPlanner<'a> {
    pub fn new(pairing: &'a PairingSettings, rating: &'a RatingSettings) -> Self {
        Self { pairing, rating }
    }

    fn groups<'p>(&self, pool: &'p [Player], skill_matching: bool) -> Vec<Vec<&'p Player>> {
        if !skill_matching {
            return vec![pool.iter().collect()];
        }

        let mut by_level: BTreeMap<u8, Vec<&Player>> = BTreeMap::new();
        for player in pool {
            by_level.entry(player.level(self.rating)).or_default().push(player);
        }

        by_level.into_values().filter(|g| g.len() >= GROUP_SIZE).collect()
    }

    fn form_pairs(
        &self,
        group: &[&Player],
        ledger: &HistoryLedger,
        recent_pairs: &HashSet<PairKey>,
    ) -> Vec<Team> {
        if group.len() < GROUP_SIZE {
            return Vec::new();
        }

        let mut by_byes = group.to_vec();
        by_byes.sort_by(|a, b| ledger.bye_count(b.id).cmp(&ledger.bye_count(a.id)));

        let mut used: HashSet<PlayerId> = HashSet::new();
        let mut pairs = Vec::new();

        for player in by_byes {
            if used.contains(&player.id) {
                continue;
            }

            let mut best: Option<(&Player, f64)> = None;
            for candidate in group.iter().filter(|c| c.id != player.id && !used.contains(&c.id)) {
                let score = self.pair_score(player, candidate, ledger, recent_pairs);
                if best.is_none_or(|(_, s)| score < s) {
                    best = Some((*candidate, score));
                }
            }

            if let Some((partner, _)) = best {
                used.insert(player.id);
                used.insert(partner.id);
                pairs.push([player.id, partner.id]);
            }
        }

        pairs
    }

    fn pair_score(
        &self,
        a: &Player,
        b: &Player,
        ledger: &HistoryLedger,
        recent_pairs: &HashSet<PairKey>,
    ) -> f64 {
        let key = PairKey::new(a.id, b.id);
        let base = ledger.pairing_count(&key) as f64 * self.pairing.pair_count_weight;

        let recent = if recent_pairs.contains(&key) {
            self.pairing.recent_pair_penalty
        } else {
            0.0
        };

        let rating_gap = (a.rating - b.rating).abs() * self.pairing.rating_diff_weight;

        base + recent + rating_gap
    }

    fn form_matches(
        &self,
        mut pairs: Vec<Team>,
        wanted: usize,
        ledger: &HistoryLedger,
        recent_matchups: &HashSet<MatchupKey>,
    ) -> Vec<PlannedMatch> {
        let mut matches = Vec::new();

        while pairs.len() >= 2 && matches.len() < wanted {
            let mut best: Option<(usize, usize, f64)> = None;

            for i in 0..pairs.len() {
                for j in i + 1..pairs.len() {
                    let score = self.matchup_score(&pairs[i], &pairs[j], ledger, recent_matchups);
                    if best.is_none_or(|(_, _, s)| score < s) {
                        best = Some((i, j, score));
                    }
                }
            }

            let Some((i, j, _)) = best else { break };
            let team2 = pairs.remove(j);
            let team1 = pairs.remove(i);
            matches.push(PlannedMatch { team1, team2, relaxed: false });
        }

        matches
    }

    fn matchup_score(
        &self,
        team1: &Team,
        team2: &Team,
        ledger: &HistoryLedger,
        recent_matchups: &HashSet<MatchupKey>,
    ) -> f64 {
        let key = MatchupKey::new(team1, team2);
        let base = ledger.matchup_count(&key) as f64;

        if recent_matchups.contains(&key) {
            base + self.pairing.recent_matchup_penalty
        } else {
            base
        }
    }
}

impl RoundPlanner for GreedyDiversityPlanner<'_> {
    fn plan(&self, ctx: &PlanContext, rng: &mut dyn RngCore) -> Vec<PlannedMatch> {
        let recent_pairs: HashSet<PairKey> = ctx
            .recent_rounds
            .iter()
            .flatten()
            .flat_map(|(a, b)| [PairKey::of(a), PairKey::of(b)])
            .collect();
        let recent_matchups: HashSet<MatchupKey> = ctx
            .recent_rounds
            .iter()
            .flatten()
            .map(|(a, b)| MatchupKey::new(a, b))
            .collect();

        let pairs: Vec<Team> = self
            .groups(ctx.pool, ctx.skill_matching)
            .iter()
            .flat_map(|g| self.form_pairs(g, ctx.ledger, &recent_pairs))
            .collect();
        debug!("Greedy pairing formed {} teams", pairs.len());

        let mut matches =
            self.form_matches(pairs, ctx.matches_wanted, ctx.ledger, &recent_matchups);
        if matches.len() < ctx.matches_wanted {
            self.fill_relaxed(&mut matches, ctx, rng);
        }
        matches
    }
}

impl GreedyDiversityPlanner<'_> {
    fn fill_relaxed(
        &self,
        matches: &mut Vec<PlannedMatch>,
        ctx: &PlanContext,
        rng: &mut dyn RngCore,
    ) {
        warn!(
            "Greedy pairing filled {} of {} courts, falling back to least-played players",
            matches.len(),
            ctx.matches_wanted
        );

        let optimizer =
            TeamSplitOptimizer::new(ctx.ledger, self.pairing.repeat_weight, ctx.skill_matching);
        let mut taken: HashSet<PlayerId> =
            matches.iter().flat_map(|m| m.participants()).collect();

        while matches.len() < ctx.matches_wanted {
            let remaining: Vec<&Player> =
                ctx.pool.iter().filter(|p| !taken.contains(&p.id)).collect();
            let Some(m) = least_played_match(&remaining, &optimizer, ctx.emitted_matchups, rng)
            else {
                break;
            };
            taken.extend(m.participants());
            matches.push(m);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::round::RoundPairings;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn pool(ratings: &[f64]) -> Vec<Player> {
        ratings
            .iter()
            .enumerate()
            .map(|(i, &r)| Player::new(i as i64 + 1, format!("p{}", i + 1), r))
            .collect()
    }

    fn plan(
        players: &[Player],
        ledger: &HistoryLedger,
        recent: &[RoundPairings],
        wanted: usize,
        skill: bool,
    ) -> Vec<PlannedMatch> {
        let (pairing, rating) = (PairingSettings::default(), RatingSettings::default());
        let planner = GreedyDiversityPlanner::new(&pairing, &rating);
        let (last, emitted) = (HashSet::new(), HashSet::new());
        let ctx = PlanContext {
            pool: players,
            ledger,
            last_round: &last,
            recent_rounds: recent,
            emitted_matchups: &emitted,
            matches_wanted: wanted,
            skill_matching: skill,
        };
        planner.plan(&ctx, &mut StdRng::seed_from_u64(0))
    }

    #[test]
    fn bye_heavy_players_choose_first() {
        let players = pool(&[1200.0; 4]);
        let mut ledger = HistoryLedger::new();
        ledger.increment_bye(3);

        let matches = plan(&players, &ledger, &[], 1, false);
        assert_eq!(matches.len(), 1);
        // player 3 picks first and takes the first equal-score candidate
        assert_eq!(matches[0].team1, [3, 1]);
        assert_eq!(matches[0].team2, [2, 4]);
    }

    #[test]
    fn partners_avoid_previous_pairings() {
        let players = pool(&[1200.0; 4]);
        let mut ledger = HistoryLedger::new();
        ledger.increment_pairing(&[1, 2]);

        let matches = plan(&players, &ledger, &[], 1, false);
        assert_eq!(matches[0].team1, [1, 3]);
        assert_eq!(matches[0].team2, [2, 4]);
    }

    #[test]
    fn recent_pairing_penalty_outweighs_counts() {
        let players = pool(&[1200.0; 4]);
        let mut ledger = HistoryLedger::new();
        // 1-3 paired four times long ago, 1-2 once but in the last round
        for _ in 0..4 {
            ledger.increment_pairing(&[1, 3]);
        }
        ledger.increment_pairing(&[1, 2]);
        let recent: Vec<RoundPairings> = vec![vec![([1, 2], [3, 4])]];

        let matches = plan(&players, &ledger, &recent, 1, false);
        // 1-2: 10 + 50 = 60, 1-3: 40, 1-4: 0
        assert_eq!(matches[0].team1, [1, 4]);
    }

    #[test]
    fn rating_gap_is_a_small_penalty() {
        let players = pool(&[1200.0, 1500.0, 1210.0, 1490.0]);
        let ledger = HistoryLedger::new();

        let matches = plan(&players, &ledger, &[], 1, false);
        assert_eq!(matches[0].team1, [1, 3]);
        assert_eq!(matches[0].team2, [2, 4]);
    }

    #[test]
    fn matches_limited_to_wanted() {
        let players = pool(&[1200.0; 12]);
        let ledger = HistoryLedger::new();

        assert_eq!(plan(&players, &ledger, &[], 2, false).len(), 2);
        assert_eq!(plan(&players, &ledger, &[], 5, false).len(), 3);
    }

    #[test]
    fn skill_matching_keeps_levels_apart() {
        // four level-2 players and four level-4 players
        let players = pool(&[1050.0, 1100.0, 1150.0, 1000.0, 1450.0, 1500.0, 1550.0, 1400.0]);
        let ledger = HistoryLedger::new();

        let matches = plan(&players, &ledger, &[], 2, true);
        assert_eq!(matches.len(), 2);
        for m in &matches {
            let low = m.participants().iter().filter(|&&id| id <= 4).count();
            assert!(low == 0 || low == 4);
        }
    }

    #[test]
    fn small_level_buckets_fall_back_to_least_played() {
        let mut players = pool(&[1000.0, 1010.0, 1020.0, 1500.0, 1510.0]);
        players[3].matches_played = 2;
        let ledger = HistoryLedger::new();

        let matches = plan(&players, &ledger, &[], 1, true);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].relaxed);
        let mut ids = matches[0].participants().to_vec();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3, 5]);
    }

    #[test]
    fn fallback_only_fills_courts_the_buckets_left_open() {
        // four level-2 players, two level-4 players, two level-5 players
        let players = pool(&[1050.0, 1100.0, 1150.0, 1000.0, 1450.0, 1500.0, 1650.0, 1700.0]);
        let ledger = HistoryLedger::new();

        let matches = plan(&players, &ledger, &[], 2, true);
        assert_eq!(matches.len(), 2);
        assert!(!matches[0].relaxed);
        assert!(matches[0].participants().iter().all(|&id| id <= 4));
        assert!(matches[1].relaxed);
        assert!(matches[1].participants().iter().all(|&id| id > 4));
    }
}
