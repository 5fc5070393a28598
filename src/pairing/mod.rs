pub mod greedy;
pub mod round;
pub mod scheduler;
pub mod selection;
pub mod team_split;
pub mod weighted;

pub use greedy::GreedyDiversityPlanner;
pub use round::{
    PlanContext, PlannedMatch, RoundOutcome, RoundPairingEngine, RoundPairings, RoundPlanner,
    ScheduleState,
};
pub use scheduler::{GenerationReport, MatchScheduler, ScheduleRequest};
pub use team_split::{SplitCandidate, TeamSplitOptimizer};
pub use weighted::WeightedSplitPlanner;
