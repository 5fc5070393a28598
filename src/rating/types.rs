use serde::{Deserialize, Serialize};

use crate::config::RatingSettings;
use crate::domain::PlayerId;

pub type RatingValue = f64;

/// Result of a match from one team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    pub fn from_scores(score_for: i32, score_against: i32) -> Self {
        if score_for > score_against {
            Outcome::Win
        } else if score_for < score_against {
            Outcome::Loss
        } else {
            Outcome::Draw
        }
    }

    /// 1 for a win, 0.5 for a draw, 0 for a loss
    pub fn actual_score(&self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Draw => 0.5,
            Outcome::Loss => 0.0,
        }
    }
}

/// Rating of one player immediately before and after a completed match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingAdjustment {
    pub player_id: PlayerId,
    pub before: RatingValue,
    pub after: RatingValue,
}

impl RatingAdjustment {
    /// Change actually applied, after the floor clamp
    pub fn delta(&self) -> f64 {
        self.after - self.before
    }
}

/// Ordinal skill bucket; the default rating sits in the middle level.
pub fn level_for(rating: RatingValue, settings: &RatingSettings) -> u8 {
    let mid_level = (settings.min_level as i64 + settings.max_level as i64) / 2;
    let offset = ((rating - settings.default_rating) / settings.level_bucket_width).floor() as i64;

    (mid_level + offset).clamp(settings.min_level as i64, settings.max_level as i64) as u8
}
