pub mod settings;

pub use settings::{AppConfig, DatabaseSettings, PairingSettings, PairingStrategy, RatingSettings};
