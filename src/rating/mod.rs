pub mod elo;
pub mod types;

pub use elo::RatingModel;
pub use types::{level_for, Outcome, RatingAdjustment, RatingValue};
