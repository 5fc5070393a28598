use log::{info, warn};
use rand::RngCore;
use serde::Serialize;

use super::greedy::GreedyDiversityPlanner;
use super::round::{RoundPairingEngine, RoundPlanner, ScheduleState};
use super::weighted::WeightedSplitPlanner;
use crate::config::{PairingSettings, PairingStrategy, RatingSettings};
use crate::domain::{Match, PlayerId};
use crate::errors::{EngineError, EngineResult};

/// What the caller asked one generation pass to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleRequest {
    pub courts: usize,
    pub match_count: usize,
    pub skill_matching: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub requested: usize,
    pub rounds: u32,
    pub matches: Vec<Match>,
    /// One entry per player per round sat out
    pub byes: Vec<PlayerId>,
    pub relaxed_matches: usize,
}

impl GenerationReport {
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.matches.len())
    }

    pub fn is_complete(&self) -> bool {
        self.shortfall() == 0
    }
}

/// Runs rounds until the requested number of matches exists or the pool
/// cannot yield another one.
pub struct MatchScheduler<'a> {
    pairing: &'a PairingSettings,
    rating: &'a RatingSettings,
}

impl<'a> MatchScheduler<'a> {
    pub fn new(pairing: &'a PairingSettings, rating: &'a RatingSettings) -> Self {
        Self { pairing, rating }
    }

    pub fn validate(&self, request: &ScheduleRequest) -> EngineResult<()> {
        if request.courts == 0 || request.courts > self.pairing.max_courts {
            return Err(EngineError::InvalidRequest(format!(
                "court count must be between 1 and {}, got {}",
                self.pairing.max_courts, request.courts
            )));
        }

        let max_matches = self.pairing.max_matches_per_generation;
        if request.match_count == 0 || request.match_count > max_matches {
            return Err(EngineError::InvalidRequest(format!(
                "match count must be between 1 and {}, got {}",
                max_matches, request.match_count
            )));
        }

        Ok(())
    }

    pub fn schedule(
        &self,
        state: &mut ScheduleState,
        request: &ScheduleRequest,
        rng: &mut dyn RngCore,
    ) -> EngineResult<GenerationReport> {
        self.validate(request)?;

        let planner = self.planner();
        let engine = RoundPairingEngine::new(planner.as_ref(), self.pairing.min_players);
        let mut report = GenerationReport {
            requested: request.match_count,
            ..Default::default()
        };

        while report.matches.len() < request.match_count {
            let remaining = request.match_count - report.matches.len();
            let outcome = engine.generate_round(
                state,
                request.courts,
                remaining,
                request.skill_matching,
                rng,
            )?;

            if outcome.matches.is_empty() {
                break;
            }

            report.rounds += 1;
            report.relaxed_matches += outcome.relaxed;
            report.byes.extend(outcome.byes);
            report.matches.extend(outcome.matches);
        }

        info!(
            "  → Generated {} of {} requested matches in {} round(s) using {}",
            report.matches.len(),
            report.requested,
            report.rounds,
            self.pairing.strategy.as_str()
        );
        if !report.is_complete() {
            warn!(
                "Shortfall of {} match(es): the available pool cannot support more without repeats",
                report.shortfall()
            );
        }

        Ok(report)
    }

    fn planner(&self) -> Box<dyn RoundPlanner + 'a> {
        match self.pairing.strategy {
            PairingStrategy::WeightedSplit => {
                Box::new(WeightedSplitPlanner::new(self.pairing, self.rating))
            }
            PairingStrategy::GreedyDiversity => {
                Box::new(GreedyDiversityPlanner::new(self.pairing, self.rating))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ParticipantStatus, Player};
    use crate::history::HistoryLedger;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn state(n: i64) -> ScheduleState {
        let players = (1..=n)
            .map(|id| {
                let mut p = Player::new(id, format!("p{id}"), 1200.0);
                p.status = ParticipantStatus::Active;
                p
            })
            .collect();
        ScheduleState::from_history(players, &[], HistoryLedger::new(), 3)
    }

    fn request(courts: usize, match_count: usize) -> ScheduleRequest {
        ScheduleRequest { courts, match_count, skill_matching: false }
    }

    #[test]
    fn reports_shortfall_when_pool_runs_out_of_fresh_matchups() {
        let (pairing, rating) = (PairingSettings::default(), RatingSettings::default());
        let scheduler = MatchScheduler::new(&pairing, &rating);
        let mut state = state(4);

        let report = scheduler
            .schedule(&mut state, &request(1, 5), &mut StdRng::seed_from_u64(2))
            .unwrap();

        // four players admit exactly three distinct team splits
        assert_eq!(report.matches.len(), 3);
        assert_eq!(report.shortfall(), 2);
        assert!(!report.is_complete());
        assert_eq!(report.rounds, 3);
        assert!(state.players.iter().all(|p| p.matches_played == 3));
    }

    #[test]
    fn multiple_rounds_fill_the_request() {
        let (pairing, rating) = (PairingSettings::default(), RatingSettings::default());
        let scheduler = MatchScheduler::new(&pairing, &rating);
        let mut state = state(8);

        let report = scheduler
            .schedule(&mut state, &request(2, 4), &mut StdRng::seed_from_u64(6))
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.rounds, 2);
        let rounds: Vec<u32> = report.matches.iter().map(|m| m.round_index).collect();
        assert_eq!(rounds, vec![1, 1, 2, 2]);
        let ids: Vec<i64> = report.matches.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn same_seed_same_schedule() {
        let (pairing, rating) = (PairingSettings::default(), RatingSettings::default());
        let scheduler = MatchScheduler::new(&pairing, &rating);

        let run = |seed| {
            let mut state = state(10);
            scheduler
                .schedule(&mut state, &request(2, 6), &mut StdRng::seed_from_u64(seed))
                .unwrap()
                .matches
        };

        assert_eq!(run(17), run(17));
    }

    #[test]
    fn greedy_strategy_keeps_players_disjoint_per_round() {
        let pairing = PairingSettings {
            strategy: PairingStrategy::GreedyDiversity,
            ..Default::default()
        };
        let rating = RatingSettings::default();
        let scheduler = MatchScheduler::new(&pairing, &rating);
        let mut state = state(9);

        let report = scheduler
            .schedule(&mut state, &request(2, 4), &mut StdRng::seed_from_u64(1))
            .unwrap();

        assert_eq!(report.matches.len(), 4);
        for round in [1, 2] {
            let mut seen: Vec<PlayerId> = report
                .matches
                .iter()
                .filter(|m| m.round_index == round)
                .flat_map(|m| m.participants())
                .collect();
            let total = seen.len();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), total);
        }
        // one player sits out each round
        assert_eq!(report.byes.len(), 2);
    }

    #[test]
    fn rejects_out_of_range_requests() {
        let (pairing, rating) = (PairingSettings::default(), RatingSettings::default());
        let scheduler = MatchScheduler::new(&pairing, &rating);

        assert!(matches!(scheduler.validate(&request(0, 1)), Err(EngineError::InvalidRequest(_))));
        assert!(matches!(scheduler.validate(&request(11, 1)), Err(EngineError::InvalidRequest(_))));
        assert!(matches!(scheduler.validate(&request(1, 0)), Err(EngineError::InvalidRequest(_))));
        assert!(matches!(scheduler.validate(&request(1, 21)), Err(EngineError::InvalidRequest(_))));
        assert!(scheduler.validate(&request(10, 20)).is_ok());
    }

    #[test]
    fn too_few_players_is_an_error_not_a_panic() {
        let (pairing, rating) = (PairingSettings::default(), RatingSettings::default());
        let scheduler = MatchScheduler::new(&pairing, &rating);
        let mut state = state(3);

        let err = scheduler
            .schedule(&mut state, &request(1, 1), &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(err.is_recoverable());
    }
}
