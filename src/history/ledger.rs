use std::collections::{BTreeMap, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::domain::{Match, PlayerId, Team};

/// Canonical key of an unordered pair of players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey(PlayerId, PlayerId);

impl PairKey {
    pub fn new(a: PlayerId, b: PlayerId) -> Self {
        if a <= b { PairKey(a, b) } else { PairKey(b, a) }
    }

    pub fn of(team: &Team) -> Self {
        Self::new(team[0], team[1])
    }

    pub fn players(&self) -> (PlayerId, PlayerId) {
        (self.0, self.1)
    }
}

/// Canonical key of two opposing teams, independent of which side is which
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchupKey(PairKey, PairKey);

impl MatchupKey {
    pub fn new(team1: &Team, team2: &Team) -> Self {
        Self::from_pairs(PairKey::of(team1), PairKey::of(team2))
    }

    pub fn from_pairs(a: PairKey, b: PairKey) -> Self {
        if a <= b { MatchupKey(a, b) } else { MatchupKey(b, a) }
    }

    pub fn teams(&self) -> (PairKey, PairKey) {
        (self.0, self.1)
    }
}

/// Counters of how often players partnered, teams met and players sat out.
///
/// Zero counts are never stored, so two ledgers built from the same matches
/// compare equal regardless of the order of increments and decrements.
/// Byes handed out by a round are also kept per round so they can be taken
/// back once that round is gone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryLedger {
    pairings: HashMap<PairKey, u32>,
    matchups: HashMap<MatchupKey, u32>,
    byes: HashMap<PlayerId, u32>,
    round_byes: BTreeMap<u32, Vec<PlayerId>>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_counts(
        pairings: HashMap<PairKey, u32>,
        matchups: HashMap<MatchupKey, u32>,
        byes: HashMap<PlayerId, u32>,
    ) -> Self {
        let mut ledger = Self {
            pairings,
            matchups,
            byes,
            round_byes: BTreeMap::new(),
        };
        ledger.pairings.retain(|_, c| *c > 0);
        ledger.matchups.retain(|_, c| *c > 0);
        ledger.byes.retain(|_, c| *c > 0);
        ledger
    }

    /// Attach the per-round bye lists; bye counts are left as they are
    pub fn with_round_byes(mut self, mut round_byes: BTreeMap<u32, Vec<PlayerId>>) -> Self {
        round_byes.retain(|_, ids| !ids.is_empty());
        self.round_byes = round_byes;
        self
    }

    /// Cold start: rebuild pairing and matchup counters from existing matches.
    /// Bye counts cannot be recovered from matches and start empty.
    pub fn replay<'a>(matches: impl IntoIterator<Item = &'a Match>) -> Self {
        let mut ledger = Self::new();
        let mut replayed = 0;
        for m in matches {
            ledger.record_match(m);
            replayed += 1;
        }
        debug!("Replayed {} matches into history ledger", replayed);
        ledger
    }

    /// Hot path: account for one newly scheduled match
    pub fn record_match(&mut self, m: &Match) {
        self.increment_pairing(&m.team1);
        self.increment_pairing(&m.team2);
        self.increment_matchup(&m.team1, &m.team2);
    }

    pub fn unrecord_match(&mut self, m: &Match) {
        self.decrement_pairing(&m.team1);
        self.decrement_pairing(&m.team2);
        self.decrement_matchup(&m.team1, &m.team2);
    }

    pub fn increment_pairing(&mut self, team: &Team) {
        increment(&mut self.pairings, PairKey::of(team));
    }

    pub fn decrement_pairing(&mut self, team: &Team) {
        decrement(&mut self.pairings, PairKey::of(team));
    }

    pub fn increment_matchup(&mut self, team1: &Team, team2: &Team) {
        increment(&mut self.matchups, MatchupKey::new(team1, team2));
    }

    pub fn decrement_matchup(&mut self, team1: &Team, team2: &Team) {
        decrement(&mut self.matchups, MatchupKey::new(team1, team2));
    }

    pub fn increment_bye(&mut self, player_id: PlayerId) {
        increment(&mut self.byes, player_id);
    }

    pub fn decrement_bye(&mut self, player_id: PlayerId) {
        decrement(&mut self.byes, player_id);
    }

    /// Count a bye for every player in `players` and remember them as the
    /// sit-outs of `round_index`
    pub fn record_round_byes(&mut self, round_index: u32, players: &[PlayerId]) {
        if players.is_empty() {
            return;
        }
        for &id in players {
            self.increment_bye(id);
        }
        self.round_byes.entry(round_index).or_default().extend_from_slice(players);
    }

    /// Take back the byes of a round that no longer has any match
    pub fn release_round_byes(&mut self, round_index: u32) -> Vec<PlayerId> {
        let released = self.round_byes.remove(&round_index).unwrap_or_default();
        for &id in &released {
            self.decrement_bye(id);
        }
        if !released.is_empty() {
            debug!("Released {} bye(s) of round {}", released.len(), round_index);
        }
        released
    }

    /// Drop every bye of a player leaving the roster
    pub fn forget_player(&mut self, player_id: PlayerId) {
        self.byes.remove(&player_id);
        for ids in self.round_byes.values_mut() {
            ids.retain(|&id| id != player_id);
        }
        self.round_byes.retain(|_, ids| !ids.is_empty());
    }

    /// New session: nobody has sat out yet
    pub fn clear_byes(&mut self) {
        self.byes.clear();
        self.round_byes.clear();
    }

    pub fn pairing_count(&self, key: &PairKey) -> u32 {
        self.pairings.get(key).copied().unwrap_or(0)
    }

    pub fn matchup_count(&self, key: &MatchupKey) -> u32 {
        self.matchups.get(key).copied().unwrap_or(0)
    }

    pub fn matchup_count_for(&self, team1: &Team, team2: &Team) -> u32 {
        self.matchup_count(&MatchupKey::new(team1, team2))
    }

    pub fn bye_count(&self, player_id: PlayerId) -> u32 {
        self.byes.get(&player_id).copied().unwrap_or(0)
    }

    /// True when neither team has partnered before and the teams never met
    pub fn is_fresh(&self, team1: &Team, team2: &Team) -> bool {
        self.pairing_count(&PairKey::of(team1)) == 0
            && self.pairing_count(&PairKey::of(team2)) == 0
            && self.matchup_count_for(team1, team2) == 0
    }

    pub fn pairings(&self) -> &HashMap<PairKey, u32> {
        &self.pairings
    }

    pub fn matchups(&self) -> &HashMap<MatchupKey, u32> {
        &self.matchups
    }

    pub fn byes(&self) -> &HashMap<PlayerId, u32> {
        &self.byes
    }

    pub fn round_byes(&self) -> &BTreeMap<u32, Vec<PlayerId>> {
        &self.round_byes
    }

    /// Pair with the highest count; ties go to the smallest key
    pub fn most_repeated_pairing(&self) -> Option<(PairKey, u32)> {
        self.pairings
            .iter()
            .map(|(k, c)| (*k, *c))
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
    }

    pub fn is_empty(&self) -> bool {
        self.pairings.is_empty()
            && self.matchups.is_empty()
            && self.byes.is_empty()
            && self.round_byes.is_empty()
    }
}

fn increment<K: std::hash::Hash + Eq>(counts: &mut HashMap<K, u32>, key: K) {
    *counts.entry(key).or_insert(0) += 1;
}

fn decrement<K: std::hash::Hash + Eq>(counts: &mut HashMap<K, u32>, key: K) {
    if let Some(count) = counts.get_mut(&key) {
        *count = count.saturating_sub(1);
        if *count == 0 {
            counts.remove(&key);
        }
    }
}
