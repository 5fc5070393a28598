pub mod matchmaking;
pub mod players;
pub mod rating_update;
pub mod store;

pub use matchmaking::{MatchmakingService, Regeneration};
pub use players::{PlayerService, Roster, RosterImport};
pub use rating_update::RatingUpdateService;
pub use store::{ChangeSet, Store};
