use ndarray::Array1;
use serde::Serialize;

use super::ledger::HistoryLedger;

const FAIRNESS_CEILING: f64 = 100.0;
const FAIRNESS_STD_DEV_SCALE: f64 = 10.0;

/// Spread of a set of repeat counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiversityStats {
    pub samples: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub fairness_score: f64,
    pub max: u32,
    pub min: u32,
}

impl DiversityStats {
    pub fn from_counts(counts: impl IntoIterator<Item = u32>) -> Self {
        let counts: Vec<u32> = counts.into_iter().collect();

        if counts.is_empty() {
            return Self::empty();
        }

        let values = Array1::from_iter(counts.iter().map(|&c| c as f64));
        let mean = values.mean().unwrap_or(0.0);
        let std_dev = values.std(0.0);

        Self {
            samples: counts.len(),
            mean,
            std_dev,
            fairness_score: fairness_score(std_dev),
            max: counts.iter().copied().max().unwrap_or(0),
            min: counts.iter().copied().min().unwrap_or(0),
        }
    }

    fn empty() -> Self {
        Self {
            samples: 0,
            mean: 0.0,
            std_dev: 0.0,
            fairness_score: FAIRNESS_CEILING,
            max: 0,
            min: 0,
        }
    }
}

/// 100 for a perfectly even spread, falling by 10 per unit of std-dev, never below 0
pub fn fairness_score(std_dev: f64) -> f64 {
    (FAIRNESS_CEILING - std_dev * FAIRNESS_STD_DEV_SCALE).max(0.0)
}

pub fn pairing_diversity(ledger: &HistoryLedger) -> DiversityStats {
    DiversityStats::from_counts(ledger.pairings().values().copied())
}

pub fn matchup_diversity(ledger: &HistoryLedger) -> DiversityStats {
    DiversityStats::from_counts(ledger.matchups().values().copied())
}
