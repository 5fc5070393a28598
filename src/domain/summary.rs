use std::collections::BTreeMap;

use serde::Serialize;

use super::models::{Match, ParticipantStatus, Player};

/// Progress of the session's rounds
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoundSummary {
    pub total_rounds: usize,
    pub completed_rounds: usize,
    pub total_matches: usize,
    pub completed_matches: usize,
}

impl RoundSummary {
    pub fn from_matches(matches: &[Match]) -> Self {
        let rounds = group_by_round(matches);

        Self {
            total_rounds: rounds.len(),
            completed_rounds: rounds.values().filter(|done| **done).count(),
            total_matches: matches.len(),
            completed_matches: matches.iter().filter(|m| m.is_completed).count(),
        }
    }
}

// round index -> every match in the round completed
fn group_by_round(matches: &[Match]) -> BTreeMap<u32, bool> {
    let mut rounds = BTreeMap::new();
    for m in matches {
        let done = rounds.entry(m.round_index).or_insert(true);
        *done &= m.is_completed;
    }
    rounds
}

/// Head count per participation status
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub left: usize,
    pub resting: usize,
    pub available: usize,
}

impl StatusSummary {
    pub fn from_players(players: &[Player]) -> Self {
        let count =
            |status: ParticipantStatus| players.iter().filter(|p| p.status == status).count();

        Self {
            total: players.len(),
            active: count(ParticipantStatus::Active),
            inactive: count(ParticipantStatus::Inactive),
            left: count(ParticipantStatus::Left),
            resting: players
                .iter()
                .filter(|p| p.is_participating_today() && p.is_resting)
                .count(),
            available: players.iter().filter(|p| p.is_available()).count(),
        }
    }

    pub fn can_play(&self, min_players: usize) -> bool {
        self.available >= min_players
    }
}
