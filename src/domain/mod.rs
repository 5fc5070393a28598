pub mod models;
mod summary;

pub use models::*;
pub use summary::{RoundSummary, StatusSummary};
