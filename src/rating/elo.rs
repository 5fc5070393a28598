use log::debug;

use super::types::{Outcome, RatingAdjustment, RatingValue};
use crate::config::RatingSettings;

/// Team Elo: the same delta is added to every member of a team.
#[derive(Debug, Clone, Copy)]
pub struct RatingModel {
    k_factor: f64,
    floor: RatingValue,
}

impl RatingModel {
    pub fn new(settings: &RatingSettings) -> Self {
        Self {
            k_factor: settings.k_factor,
            floor: settings.rating_floor,
        }
    }

    pub fn floor(&self) -> RatingValue {
        self.floor
    }

    /// Expected score of side A against side B
    pub fn expected_score(rating_a: RatingValue, rating_b: RatingValue) -> f64 {
        1.0 / (1.0 + 10.0_f64.powf((rating_b - rating_a) / 400.0))
    }

    pub fn team_average(ratings: &[RatingValue]) -> RatingValue {
        if ratings.is_empty() {
            return 0.0;
        }
        ratings.iter().sum::<f64>() / ratings.len() as f64
    }

    /// Delta for team A; team B receives the negation.
    pub fn delta(&self, team_a_avg: RatingValue, team_b_avg: RatingValue, outcome: Outcome) -> f64 {
        let expected = Self::expected_score(team_a_avg, team_b_avg);
        self.k_factor * (outcome.actual_score() - expected)
    }

    pub fn apply_delta(&self, rating: RatingValue, delta: f64) -> RatingValue {
        (rating + delta).max(self.floor)
    }

    /// Not an exact inverse once the floor clamp has been hit
    pub fn revert_delta(&self, rating: RatingValue, delta: f64) -> RatingValue {
        self.apply_delta(rating, -delta)
    }

    /// Undo a recorded adjustment.
    ///
    /// Restores the recorded rating exactly when nothing has moved it since;
    /// otherwise subtracts the change that was applied, clamped at the floor.
    pub fn undo(&self, current: RatingValue, adjustment: &RatingAdjustment) -> RatingValue {
        if current == adjustment.after {
            return adjustment.before;
        }

        debug!(
            "Rating of player {} moved since adjustment ({} -> {}), subtracting {:.2}",
            adjustment.player_id,
            adjustment.after,
            current,
            adjustment.delta()
        );
        self.revert_delta(current, adjustment.delta())
    }
}
