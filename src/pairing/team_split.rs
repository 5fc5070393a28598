use crate::domain::{Player, Team};
use crate::errors::{EngineError, EngineResult};
use crate::history::{HistoryLedger, PairKey};
use crate::rating::RatingModel;

/// One of the three ways to split four players into two teams
#[derive(Debug, Clone, PartialEq)]
pub struct SplitCandidate {
    pub team1: Team,
    pub team2: Team,
    /// Absolute difference of the team rating averages
    pub balance: f64,
    /// Both internal pairing counts plus the matchup count
    pub repeats: u32,
    pub score: f64,
}

/// Picks the team split of four players with the lowest weighted score.
///
/// The score is the rating gap between the teams (only when skill balancing
/// is on) plus `repeat_weight` per earlier pairing or matchup, so repeats
/// mostly break ties between similarly balanced splits.
pub struct TeamSplitOptimizer<'a> {
    ledger: &'a HistoryLedger,
    repeat_weight: f64,
    skill_balance: bool,
}

impl<'a> TeamSplitOptimizer<'a> {
    pub fn new(ledger: &'a HistoryLedger, repeat_weight: f64, skill_balance: bool) -> Self {
        Self {
            ledger,
            repeat_weight,
            skill_balance,
        }
    }

    /// The three candidates in enumeration order:
    /// (p1,p2|p3,p4), (p1,p3|p2,p4), (p1,p4|p2,p3)
    pub fn candidates(&self, players: &[&Player]) -> EngineResult<Vec<SplitCandidate>> {
        let [p1, p2, p3, p4] = validate_group(players)?;

        let splits = [
            ([p1, p2], [p3, p4]),
            ([p1, p3], [p2, p4]),
            ([p1, p4], [p2, p3]),
        ];

        Ok(splits
            .into_iter()
            .map(|(a, b)| self.score_split(a, b))
            .collect())
    }

    /// All candidates, best first; equal scores keep enumeration order
    pub fn rank(&self, players: &[&Player]) -> EngineResult<Vec<SplitCandidate>> {
        let mut candidates = self.candidates(players)?;
        candidates.sort_by(|a, b| a.score.total_cmp(&b.score));
        Ok(candidates)
    }

    pub fn best_split(&self, players: &[&Player]) -> EngineResult<SplitCandidate> {
        let candidates = self.candidates(players)?;
        let mut best: Option<SplitCandidate> = None;

        for candidate in candidates {
            let better = match &best {
                Some(current) => candidate.score < current.score,
                None => true,
            };
            if better {
                best = Some(candidate);
            }
        }

        best.ok_or(EngineError::InvalidSplitInput(players.len()))
    }

    fn score_split(&self, a: [&Player; 2], b: [&Player; 2]) -> SplitCandidate {
        let team1: Team = [a[0].id, a[1].id];
        let team2: Team = [b[0].id, b[1].id];

        let avg1 = RatingModel::team_average(&[a[0].rating, a[1].rating]);
        let avg2 = RatingModel::team_average(&[b[0].rating, b[1].rating]);
        let balance = (avg1 - avg2).abs();

        let repeats = self.ledger.pairing_count(&PairKey::of(&team1))
            + self.ledger.pairing_count(&PairKey::of(&team2))
            + self.ledger.matchup_count_for(&team1, &team2);

        let balance_weight = if self.skill_balance { 1.0 } else { 0.0 };
        let score = balance_weight * balance + self.repeat_weight * repeats as f64;

        SplitCandidate {
            team1,
            team2,
            balance,
            repeats,
            score,
        }
    }
}

fn validate_group<'p>(players: &[&'p Player]) -> EngineResult<[&'p Player; 4]> {
    let group: [&Player; 4] = players
        .try_into()
        .map_err(|_| EngineError::InvalidSplitInput(players.len()))?;

    for i in 0..4 {
        for j in i + 1..4 {
            if group[i].id == group[j].id {
                return Err(EngineError::InvalidTeams(format!(
                    "player {} appears more than once",
                    group[i].id
                )));
            }
        }
    }

    Ok(group)
}
