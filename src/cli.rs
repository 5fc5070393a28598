use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::config::PairingStrategy;
use crate::domain::{MatchId, ParticipantStatus, PlayerId};

#[derive(Parser, Debug)]
#[command(author, version, about = "Doubles matchmaking and rating engine")]
pub struct Cli {
    /// Print JSON instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// Create the database schema
    Init {
        /// Drop all existing data first
        #[arg(long)]
        reset: bool,
    },
    /// Register a new player
    AddPlayer {
        name: String,
        /// Starting rating (defaults to 1200)
        #[arg(short, long)]
        rating: Option<f64>,
    },
    /// Delete a player who has not played any match
    RemovePlayer { id: PlayerId },
    /// Set whether a player takes part in today's session
    Status {
        id: PlayerId,
        #[arg(value_enum)]
        status: ParticipantStatus,
    },
    /// Toggle resting for an active player
    Rest { id: PlayerId },
    /// List players by rating
    Players,
    /// Print every player name as a `{"Name": [...]}` roster
    ExportPlayers,
    /// Register the names of a `{"Name": [...]}` roster file
    ImportPlayers {
        file: PathBuf,
        /// Also mark the imported players active
        #[arg(long)]
        activate: bool,
    },
    /// Generate matches from the available players
    Generate {
        /// Number of courts
        #[arg(short, long, default_value_t = 1)]
        courts: usize,
        /// Number of matches to generate
        #[arg(short = 'n', long, default_value_t = 1)]
        matches: usize,
        /// Balance teams by rating
        #[arg(long)]
        skill: bool,
        /// Pairing strategy (overrides the configured one)
        #[arg(long, value_enum)]
        strategy: Option<PairingStrategy>,
        /// Seed for reproducible tie-breaks
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Replace the rounds nobody has scored yet with a fresh schedule
    Regenerate {
        /// Number of courts
        #[arg(short, long, default_value_t = 1)]
        courts: usize,
        /// Number of matches to generate (defaults to the number dropped)
        #[arg(short = 'n', long)]
        matches: Option<usize>,
        /// Balance teams by rating
        #[arg(long)]
        skill: bool,
        /// Pairing strategy (overrides the configured one)
        #[arg(long, value_enum)]
        strategy: Option<PairingStrategy>,
        /// Seed for reproducible tie-breaks
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Record the score of a match
    Complete {
        id: MatchId,
        #[arg(allow_negative_numbers = true)]
        score1: i32,
        #[arg(allow_negative_numbers = true)]
        score2: i32,
    },
    /// Change the score of a match
    Edit {
        id: MatchId,
        #[arg(allow_negative_numbers = true)]
        score1: i32,
        #[arg(allow_negative_numbers = true)]
        score2: i32,
    },
    /// Undo the result of a completed match
    Revert { id: MatchId },
    /// Delete a match and undo everything it counted for
    Delete { id: MatchId },
    /// Delete every match of a round
    DeleteRound { round: u32 },
    /// Show all rounds
    Rounds,
    /// Show pairing and matchup diversity
    Stats {
        /// Recompute the counters from the stored matches first
        #[arg(long)]
        rebuild: bool,
    },
    /// Mark everyone inactive and clear the bye counts
    ResetSession,
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
