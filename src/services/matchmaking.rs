use std::collections::BTreeSet;

use log::{info, warn};
use rand::RngCore;
use serde::Serialize;

use super::rating_update::backout_matches;
use super::store::{ChangeSet, Store};
use crate::config::AppConfig;
use crate::domain::{Match, Player, RoundSummary};
use crate::errors::{with_store_context, EngineResult};
use crate::history::{matchup_diversity, pairing_diversity, DiversityStats, HistoryLedger, PairKey};
use crate::pairing::{GenerationReport, MatchScheduler, ScheduleRequest, ScheduleState};
use crate::rating::RatingModel;

/// Unplayed rounds that were thrown away and what replaced them
#[derive(Debug, Clone, Serialize)]
pub struct Regeneration {
    pub dropped: Vec<Match>,
    pub report: GenerationReport,
}

/// Generates rounds against the stored session and reports on its history.
pub struct MatchmakingService<'a> {
    store: &'a dyn Store,
    config: &'a AppConfig,
}

impl<'a> MatchmakingService<'a> {
    pub fn new(store: &'a dyn Store, config: &'a AppConfig) -> Self {
        Self { store, config }
    }

    /// Schedule up to `request.match_count` matches from the available players.
    ///
    /// Nothing is written unless at least one match was produced; players,
    /// matches and counters are then saved together.
    pub fn generate_round(
        &self,
        request: &ScheduleRequest,
        rng: &mut dyn RngCore,
    ) -> EngineResult<GenerationReport> {
        let scheduler = MatchScheduler::new(&self.config.pairing, &self.config.rating);
        scheduler.validate(request)?;

        let players = self.players()?;
        let matches = self.matches()?;
        let ledger = self.ledger()?;

        let mut state = ScheduleState::from_history(
            players.clone(),
            &matches,
            ledger,
            self.config.pairing.recent_rounds_window,
        );
        let report = scheduler.schedule(&mut state, request, rng)?;

        if report.matches.is_empty() {
            return Ok(report);
        }

        let changes = scheduled_changes(ChangeSet::new(), &players, state, &report);
        with_store_context(self.store.apply(&changes), "save generated matches")?;

        Ok(report)
    }

    /// Matches of rounds in which nothing has been scored yet
    pub fn pending_matches(&self) -> EngineResult<Vec<Match>> {
        let matches = self.matches()?;
        let pending = pending_rounds(&matches);
        Ok(matches
            .into_iter()
            .filter(|m| pending.contains(&m.round_index))
            .collect())
    }

    /// Replace every unplayed round after the roster changed.
    ///
    /// Rounds without any scored match are dropped together with their
    /// participation counts, counters and byes, then `request` is scheduled
    /// from what remains. Nothing is written unless the new schedule is built.
    pub fn regenerate_pending(
        &self,
        request: &ScheduleRequest,
        rng: &mut dyn RngCore,
    ) -> EngineResult<Regeneration> {
        let scheduler = MatchScheduler::new(&self.config.pairing, &self.config.rating);
        scheduler.validate(request)?;

        let players = self.players()?;
        let matches = self.matches()?;
        let mut ledger = self.ledger()?;

        let pending = pending_rounds(&matches);
        let (dropped, kept): (Vec<Match>, Vec<Match>) = matches
            .into_iter()
            .partition(|m| pending.contains(&m.round_index));

        let mut remaining = players.clone();
        let model = RatingModel::new(&self.config.rating);
        backout_matches(&model, &dropped, &mut remaining, &mut ledger)?;
        for round in &pending {
            ledger.release_round_byes(*round);
        }

        let mut state = ScheduleState::from_history(
            remaining,
            &kept,
            ledger,
            self.config.pairing.recent_rounds_window,
        );
        let report = scheduler.schedule(&mut state, request, rng)?;

        let deletions = dropped
            .iter()
            .fold(ChangeSet::new(), |changes, m| changes.with_deleted_match(m.id));
        let changes = scheduled_changes(deletions, &players, state, &report);
        with_store_context(self.store.apply(&changes), "regenerate rounds")?;

        info!(
            "  → Replaced {} unplayed match(es) in {} round(s) with {}",
            dropped.len(),
            pending.len(),
            report.matches.len()
        );
        Ok(Regeneration { dropped, report })
    }

    fn players(&self) -> EngineResult<Vec<Player>> {
        with_store_context(self.store.load_all_players(), "load players")
    }

    pub fn matches(&self) -> EngineResult<Vec<Match>> {
        with_store_context(self.store.load_all_matches(), "load matches")
    }

    pub fn ledger(&self) -> EngineResult<HistoryLedger> {
        with_store_context(self.store.load_ledger(), "load history ledger")
    }

    pub fn pairing_diversity_stats(&self) -> EngineResult<DiversityStats> {
        Ok(pairing_diversity(&self.ledger()?))
    }

    pub fn matchup_diversity_stats(&self) -> EngineResult<DiversityStats> {
        Ok(matchup_diversity(&self.ledger()?))
    }

    pub fn most_repeated_pairing(&self) -> EngineResult<Option<(PairKey, u32)>> {
        Ok(self.ledger()?.most_repeated_pairing())
    }

    pub fn round_summary(&self) -> EngineResult<RoundSummary> {
        Ok(RoundSummary::from_matches(&self.matches()?))
    }

    /// True when the stored pairing and matchup counters equal a replay of
    /// the stored matches
    pub fn ledger_is_consistent(&self) -> EngineResult<bool> {
        let stored = self.ledger()?;
        let replayed = HistoryLedger::replay(&self.matches()?);

        Ok(stored.pairings() == replayed.pairings() && stored.matchups() == replayed.matchups())
    }

    /// Recompute pairing and matchup counters from the stored matches.
    /// Bye counts are kept as stored.
    pub fn rebuild_ledger(&self) -> EngineResult<HistoryLedger> {
        let stored = self.ledger()?;
        let matches = self.matches()?;
        let replayed = HistoryLedger::replay(&matches);

        let ledger = HistoryLedger::from_counts(
            replayed.pairings().clone(),
            replayed.matchups().clone(),
            stored.byes().clone(),
        );

        if ledger != stored {
            warn!("Stored history counters differed from the match history, rebuilt");
        }
        with_store_context(
            self.store.apply(&ChangeSet::new().with_ledger(ledger.clone())),
            "save history ledger",
        )?;
        info!("  → Rebuilt history from {} matches", matches.len());
        Ok(ledger)
    }
}

/// Rounds none of whose matches has been scored
fn pending_rounds(matches: &[Match]) -> BTreeSet<u32> {
    let rounds: BTreeSet<u32> = matches.iter().map(|m| m.round_index).collect();
    rounds
        .into_iter()
        .filter(|round| !matches.iter().any(|m| m.round_index == *round && m.is_completed))
        .collect()
}

/// Players whose counts moved, the new matches and the updated ledger
fn scheduled_changes(
    changes: ChangeSet,
    before: &[Player],
    state: ScheduleState,
    report: &GenerationReport,
) -> ChangeSet {
    let changed: Vec<Player> = state
        .players
        .into_iter()
        .filter(|p| !before.contains(p))
        .collect();

    changes
        .with_players(changed)
        .with_matches(report.matches.iter().cloned())
        .with_ledger(state.ledger)
}
