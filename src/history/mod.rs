pub mod ledger;
pub mod stats;

pub use ledger::{HistoryLedger, MatchupKey, PairKey};
pub use stats::{matchup_diversity, pairing_diversity, DiversityStats};
