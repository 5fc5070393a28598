use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub struct RatingSettings {
    pub k_factor: f64,
    pub default_rating: f64,
    pub rating_floor: f64,
    pub level_bucket_width: f64,
    pub min_level: u8,
    pub max_level: u8,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            k_factor: 32.0,
            default_rating: 1200.0,
            rating_floor: 0.0,
            level_bucket_width: 200.0,
            min_level: 1,
            max_level: 5,
        }
    }
}

/// Which round engine builds the matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[clap(rename_all = "kebab-case")]
pub enum PairingStrategy {
    /// Rank players by priority, then pick the best of the 3 team splits
    #[default]
    WeightedSplit,
    /// Bye-first greedy partner search, then least-repeated opponents
    GreedyDiversity,
}

impl PairingStrategy {
    pub fn as_str(&self) -> &str {
        match self {
            PairingStrategy::WeightedSplit => "weighted-split",
            PairingStrategy::GreedyDiversity => "greedy-diversity",
        }
    }
}

pub struct PairingSettings {
    pub strategy: PairingStrategy,
    pub min_players: usize,
    pub max_courts: usize,
    pub max_matches_per_generation: usize,
    pub max_attempts: usize,
    pub recent_rounds_window: usize,

    // weighted split
    pub repeat_weight: f64,
    pub not_in_last_round_bonus: f64,
    pub fewer_matches_bonus: f64,

    // greedy diversity
    pub pair_count_weight: f64,
    pub recent_pair_penalty: f64,
    pub rating_diff_weight: f64,
    pub recent_matchup_penalty: f64,
}

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            strategy: PairingStrategy::WeightedSplit,
            min_players: 4,
            max_courts: 10,
            max_matches_per_generation: 20,
            max_attempts: 100,
            recent_rounds_window: 3,
            repeat_weight: 1.0,
            not_in_last_round_bonus: 1000.0,
            fewer_matches_bonus: 100.0,
            pair_count_weight: 10.0,
            recent_pair_penalty: 50.0,
            rating_diff_weight: 0.1,
            recent_matchup_penalty: 100.0,
        }
    }
}

pub struct DatabaseSettings {
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "doubles_matchmaker.db".to_string()),
        }
    }
}

pub struct AppConfig {
    pub rating: RatingSettings,
    pub pairing: PairingSettings,
    pub database: DatabaseSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            rating: RatingSettings::default(),
            pairing: PairingSettings::default(),
            database: DatabaseSettings::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: PairingStrategy) -> Self {
        self.pairing.strategy = strategy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let config = AppConfig::new();
        assert_eq!(config.rating.k_factor, 32.0);
        assert_eq!(config.rating.default_rating, 1200.0);
        assert_eq!(config.pairing.max_attempts, 100);
        assert_eq!(config.pairing.strategy, PairingStrategy::WeightedSplit);
    }

    #[test]
    fn strategy_override() {
        let config = AppConfig::new().with_strategy(PairingStrategy::GreedyDiversity);
        assert_eq!(config.pairing.strategy.as_str(), "greedy-diversity");
    }
}
