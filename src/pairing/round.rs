use std::collections::{BTreeMap, HashSet};

use log::debug;
use rand::RngCore;

use crate::domain::{Match, MatchId, Player, PlayerId, Team};
use crate::errors::{EngineError, EngineResult};
use crate::history::{HistoryLedger, MatchupKey};

/// Team pairs of one generated round, in match order
pub type RoundPairings = Vec<(Team, Team)>;

/// Read-only view a planner gets of the session
pub struct PlanContext<'a> {
    /// Available players, in stored order
    pub pool: &'a [Player],
    pub ledger: &'a HistoryLedger,
    /// Everyone who played in the previous round
    pub last_round: &'a HashSet<PlayerId>,
    /// Most recent rounds, oldest first
    pub recent_rounds: &'a [RoundPairings],
    /// Matchups already scheduled earlier in this generation pass
    pub emitted_matchups: &'a HashSet<MatchupKey>,
    pub matches_wanted: usize,
    pub skill_matching: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMatch {
    pub team1: Team,
    pub team2: Team,
    /// Produced by the fallback path, so it may repeat earlier combinations
    pub relaxed: bool,
}

impl PlannedMatch {
    pub fn participants(&self) -> [PlayerId; 4] {
        [self.team1[0], self.team1[1], self.team2[0], self.team2[1]]
    }
}

/// Chooses the teams of one round. Implementations never reuse a player
/// within the returned matches and never return more than `matches_wanted`.
pub trait RoundPlanner {
    fn plan(&self, ctx: &PlanContext, rng: &mut dyn RngCore) -> Vec<PlannedMatch>;
}

/// Session state threaded through consecutive rounds of one generation pass
#[derive(Debug, Clone)]
pub struct ScheduleState {
    pub players: Vec<Player>,
    pub ledger: HistoryLedger,
    pub next_match_id: MatchId,
    pub next_round_index: u32,
    pub next_match_index: u32,
    pub last_round: HashSet<PlayerId>,
    pub recent_rounds: Vec<RoundPairings>,
    pub emitted_matchups: HashSet<MatchupKey>,
    window: usize,
}

impl ScheduleState {
    /// Continue numbering after `matches` and remember the last `window` rounds
    pub fn from_history(
        players: Vec<Player>,
        matches: &[Match],
        ledger: HistoryLedger,
        window: usize,
    ) -> Self {
        let next_match_id = matches.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        let next_round_index = matches.iter().map(|m| m.round_index).max().unwrap_or(0) + 1;
        let next_match_index = matches.iter().map(|m| m.match_index).max().unwrap_or(0) + 1;

        let mut rounds: BTreeMap<u32, Vec<&Match>> = BTreeMap::new();
        for m in matches {
            rounds.entry(m.round_index).or_default().push(m);
        }

        let last_round: HashSet<PlayerId> = rounds
            .values()
            .next_back()
            .map(|ms| ms.iter().flat_map(|m| m.participants()).collect())
            .unwrap_or_default();

        let recent_rounds: Vec<RoundPairings> = rounds
            .values()
            .rev()
            .take(window)
            .rev()
            .map(|ms| -> RoundPairings {
                let mut ms = ms.clone();
                ms.sort_by_key(|m| m.match_index);
                ms.iter().map(|m| (m.team1, m.team2)).collect()
            })
            .collect();

        Self {
            players,
            ledger,
            next_match_id,
            next_round_index,
            next_match_index,
            last_round,
            recent_rounds,
            emitted_matchups: HashSet::new(),
            window,
        }
    }

    pub fn available(&self) -> Vec<Player> {
        self.players.iter().filter(|p| p.is_available()).cloned().collect()
    }

    fn push_round(&mut self, pairings: RoundPairings) {
        self.recent_rounds.push(pairings);
        if self.recent_rounds.len() > self.window {
            let excess = self.recent_rounds.len() - self.window;
            self.recent_rounds.drain(..excess);
        }
    }
}

/// Matches and sit-outs produced by one round
#[derive(Debug, Clone, Default)]
pub struct RoundOutcome {
    pub matches: Vec<Match>,
    pub byes: Vec<PlayerId>,
    pub relaxed: usize,
}

/// Turns a planner's teams into court-assigned matches and books them.
pub struct RoundPairingEngine<'a> {
    planner: &'a dyn RoundPlanner,
    min_players: usize,
}

impl<'a> RoundPairingEngine<'a> {
    pub fn new(planner: &'a dyn RoundPlanner, min_players: usize) -> Self {
        Self { planner, min_players }
    }

    /// Generate one round on at most `courts` courts.
    ///
    /// Emitted matches bump `matches_played` of their players and the pairing
    /// and matchup counters; available players left out get a bye. A round
    /// that produces no match changes nothing.
    pub fn generate_round(
        &self,
        state: &mut ScheduleState,
        courts: usize,
        matches_wanted: usize,
        skill_matching: bool,
        rng: &mut dyn RngCore,
    ) -> EngineResult<RoundOutcome> {
        let pool = state.available();
        if pool.len() < self.min_players {
            return Err(EngineError::InsufficientPlayers {
                available: pool.len(),
                required: self.min_players,
            });
        }
        if courts == 0 {
            return Err(EngineError::InvalidRequest("at least one court is required".to_string()));
        }

        let wanted = matches_wanted.min(courts).min(pool.len() / 4);
        if wanted == 0 {
            return Ok(RoundOutcome::default());
        }

        let planned = {
            let ctx = PlanContext {
                pool: &pool,
                ledger: &state.ledger,
                last_round: &state.last_round,
                recent_rounds: &state.recent_rounds,
                emitted_matchups: &state.emitted_matchups,
                matches_wanted: wanted,
                skill_matching,
            };
            self.planner.plan(&ctx, rng)
        };

        let matches = self.build_matches(state, &pool, &planned, courts)?;
        if matches.is_empty() {
            return Ok(RoundOutcome::default());
        }

        let selected: HashSet<PlayerId> = matches.iter().flat_map(|m| m.participants()).collect();

        for m in &matches {
            for player in state.players.iter_mut().filter(|p| m.involves(p.id)) {
                player.matches_played += 1;
            }
            state.ledger.record_match(m);
            state.emitted_matchups.insert(MatchupKey::new(&m.team1, &m.team2));
            debug!(
                "Round {} court {}: {:?} vs {:?}",
                m.round_index, m.court, m.team1, m.team2
            );
        }

        let byes: Vec<PlayerId> = pool
            .iter()
            .map(|p| p.id)
            .filter(|id| !selected.contains(id))
            .collect();
        state.ledger.record_round_byes(state.next_round_index, &byes);

        state.next_match_id += matches.len() as MatchId;
        state.next_match_index += matches.len() as u32;
        state.next_round_index += 1;
        state.last_round = selected;
        state.push_round(matches.iter().map(|m| (m.team1, m.team2)).collect());

        Ok(RoundOutcome {
            relaxed: planned.iter().filter(|p| p.relaxed).count(),
            matches,
            byes,
        })
    }

    /// Validate everything before the state is touched
    fn build_matches(
        &self,
        state: &ScheduleState,
        pool: &[Player],
        planned: &[PlannedMatch],
        courts: usize,
    ) -> EngineResult<Vec<Match>> {
        let pool_ids: HashSet<PlayerId> = pool.iter().map(|p| p.id).collect();
        let mut used: HashSet<PlayerId> = HashSet::new();
        let mut matches = Vec::with_capacity(planned.len());

        for (ordinal, plan) in planned.iter().enumerate() {
            for id in plan.participants() {
                if !pool_ids.contains(&id) {
                    return Err(EngineError::UnknownPlayer(id));
                }
                if !used.insert(id) {
                    return Err(EngineError::InvalidTeams(format!(
                        "player {} scheduled twice in one round",
                        id
                    )));
                }
            }

            matches.push(Match::scheduled(
                state.next_match_id + ordinal as MatchId,
                state.next_round_index,
                state.next_match_index + ordinal as u32,
                (ordinal % courts) as u32 + 1,
                plan.team1,
                plan.team2,
            )?);
        }

        Ok(matches)
    }
}
