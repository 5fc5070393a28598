use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use log::{debug, info};

use super::store::{ChangeSet, Store};
use crate::config::AppConfig;
use crate::domain::{Match, MatchId, Player, PlayerId, Team};
use crate::errors::{with_store_context, EngineError, EngineResult};
use crate::history::HistoryLedger;
use crate::rating::{Outcome, RatingAdjustment, RatingModel};

/// Completes, edits, reverts and deletes matches.
///
/// Every operation validates first, computes the new player and match state
/// on copies and persists it as one change set, so a failure leaves both the
/// store and the caller's data untouched.
pub struct RatingUpdateService<'a> {
    store: &'a dyn Store,
    model: RatingModel,
}

impl<'a> RatingUpdateService<'a> {
    pub fn new(store: &'a dyn Store, config: &AppConfig) -> Self {
        Self {
            store,
            model: RatingModel::new(&config.rating),
        }
    }

    pub fn complete_match(&self, id: MatchId, score1: i32, score2: i32) -> EngineResult<Match> {
        validate_scores(score1, score2)?;
        let mut m = self.find_match(id)?;
        if m.is_completed {
            return Err(EngineError::AlreadyCompleted(id));
        }

        let mut players = self.participants(&m)?;
        apply_result(&self.model, &mut m, &mut players, score1, score2, Utc::now())?;

        let changes = ChangeSet::new().with_players(players).with_matches([m.clone()]);
        self.persist(changes, "complete match")?;
        info!("  → Match {} completed {}-{}", id, score1, score2);
        Ok(m)
    }

    pub fn revert_match(&self, id: MatchId) -> EngineResult<Match> {
        let mut m = self.find_match(id)?;
        if !m.is_completed {
            return Err(EngineError::NotCompleted(id));
        }

        let mut players = self.participants(&m)?;
        undo_result(&self.model, &mut m, &mut players)?;

        let changes = ChangeSet::new().with_players(players).with_matches([m.clone()]);
        self.persist(changes, "revert match")?;
        info!("  → Match {} reverted", id);
        Ok(m)
    }

    /// Replace the score of a match; an unscored match is simply completed
    pub fn edit_match(&self, id: MatchId, score1: i32, score2: i32) -> EngineResult<Match> {
        validate_scores(score1, score2)?;
        let mut m = self.find_match(id)?;
        let mut players = self.participants(&m)?;

        if m.is_completed {
            undo_result(&self.model, &mut m, &mut players)?;
        }
        apply_result(&self.model, &mut m, &mut players, score1, score2, Utc::now())?;

        let changes = ChangeSet::new().with_players(players).with_matches([m.clone()]);
        self.persist(changes, "edit match")?;
        info!("  → Match {} now {}-{}", id, score1, score2);
        Ok(m)
    }

    /// Remove a match and everything it contributed: rating, wins, the
    /// participation count and the pairing and matchup counters. When it was
    /// the last match of its round, the byes of that round go too.
    pub fn delete_match(&self, id: MatchId) -> EngineResult<Match> {
        let matches = self.all_matches()?;
        let (doomed, kept): (Vec<Match>, Vec<Match>) =
            matches.into_iter().partition(|m| m.id == id);
        let Some(deleted) = doomed.first().cloned() else {
            return Err(EngineError::UnknownMatch(id));
        };

        self.remove_matches(&doomed, &kept, "delete match")?;
        info!("  → Match {} deleted", id);
        Ok(deleted)
    }

    /// Delete every match of a round along with its byes
    pub fn delete_round(&self, round_index: u32) -> EngineResult<Vec<Match>> {
        let matches = self.all_matches()?;
        let (doomed, kept): (Vec<Match>, Vec<Match>) =
            matches.into_iter().partition(|m| m.round_index == round_index);
        if doomed.is_empty() {
            return Err(EngineError::UnknownRound(round_index));
        }

        self.remove_matches(&doomed, &kept, "delete round")?;
        info!("  → Round {} deleted ({} matches)", round_index, doomed.len());
        Ok(doomed)
    }

    fn remove_matches(
        &self,
        doomed: &[Match],
        kept: &[Match],
        operation: &str,
    ) -> EngineResult<()> {
        let original = with_store_context(self.store.load_all_players(), "load players")?;
        let mut players = original.clone();
        let mut ledger = with_store_context(self.store.load_ledger(), "load history ledger")?;

        backout_matches(&self.model, doomed, &mut players, &mut ledger)?;

        let emptied: BTreeSet<u32> = doomed
            .iter()
            .map(|m| m.round_index)
            .filter(|round| !kept.iter().any(|m| m.round_index == *round))
            .collect();
        for round in emptied {
            ledger.release_round_byes(round);
        }

        let changed: Vec<Player> =
            players.into_iter().filter(|p| !original.contains(p)).collect();
        let changes = doomed
            .iter()
            .fold(ChangeSet::new(), |changes, m| changes.with_deleted_match(m.id))
            .with_players(changed)
            .with_ledger(ledger);
        self.persist(changes, operation)
    }

    fn all_matches(&self) -> EngineResult<Vec<Match>> {
        with_store_context(self.store.load_all_matches(), "load matches")
    }

    fn find_match(&self, id: MatchId) -> EngineResult<Match> {
        self.all_matches()?
            .into_iter()
            .find(|m| m.id == id)
            .ok_or(EngineError::UnknownMatch(id))
    }

    fn participants(&self, m: &Match) -> EngineResult<Vec<Player>> {
        let players = with_store_context(self.store.load_all_players(), "load players")?;

        m.participants()
            .into_iter()
            .map(|id| {
                players
                    .iter()
                    .find(|p| p.id == id)
                    .cloned()
                    .ok_or(EngineError::UnknownPlayer(id))
            })
            .collect()
    }

    fn persist(&self, changes: ChangeSet, operation: &str) -> EngineResult<()> {
        with_store_context(self.store.apply(&changes), operation)
    }
}

pub fn validate_scores(score1: i32, score2: i32) -> EngineResult<()> {
    if score1 < 0 || score2 < 0 {
        return Err(EngineError::InvalidScore { score1, score2 });
    }
    Ok(())
}

/// Score `m` and move the ratings and wins of `players` accordingly.
///
/// Both teams are averaged, team 1 gains `K * (actual - expected)` and team 2
/// loses the same amount, each member clamped at the rating floor. The
/// applied before/after values are kept on the match for an exact undo.
pub fn apply_result(
    model: &RatingModel,
    m: &mut Match,
    players: &mut [Player],
    score1: i32,
    score2: i32,
    completed_at: DateTime<Utc>,
) -> EngineResult<()> {
    validate_scores(score1, score2)?;

    let delta = team_delta(model, m, players, Outcome::from_scores(score1, score2))?;
    let mut adjustments = Vec::with_capacity(4);

    for (team, change) in [(m.team1, delta), (m.team2, -delta)] {
        for id in team {
            let player = find_mut(players, id)?;
            let before = player.rating;
            player.rating = model.apply_delta(before, change);
            adjustments.push(RatingAdjustment { player_id: id, before, after: player.rating });
            debug!("Player {} rating {:.1} -> {:.1}", id, before, player.rating);
        }
    }

    m.score1 = score1;
    m.score2 = score2;
    m.is_completed = true;
    m.completed_at = Some(completed_at);
    m.adjustments = adjustments;

    if let Some(side) = m.winner_team() {
        for id in *m.team(side) {
            find_mut(players, id)?.wins += 1;
        }
    }

    Ok(())
}

/// Take back what `apply_result` did and leave `m` unscored.
///
/// Matches stored without adjustments are reverted by recomputing the delta
/// from the current ratings, which is only approximate.
pub fn undo_result(model: &RatingModel, m: &mut Match, players: &mut [Player]) -> EngineResult<()> {
    if !m.is_completed {
        return Err(EngineError::NotCompleted(m.id));
    }

    if m.adjustments.is_empty() {
        let delta = team_delta(model, m, players, Outcome::from_scores(m.score1, m.score2))?;
        for (team, change) in [(m.team1, delta), (m.team2, -delta)] {
            for id in team {
                let player = find_mut(players, id)?;
                player.rating = model.revert_delta(player.rating, change);
            }
        }
    } else {
        for adjustment in &m.adjustments {
            let player = find_mut(players, adjustment.player_id)?;
            player.rating = model.undo(player.rating, adjustment);
        }
    }

    if let Some(side) = m.winner_team() {
        for id in *m.team(side) {
            let player = find_mut(players, id)?;
            player.wins = player.wins.saturating_sub(1);
        }
    }

    m.reset_result();
    Ok(())
}

/// Undo everything `matches` contributed to `players` and `ledger`: results
/// of completed ones, one participation per player and the pairing and
/// matchup counters. Round byes are left to the caller.
pub fn backout_matches(
    model: &RatingModel,
    matches: &[Match],
    players: &mut [Player],
    ledger: &mut HistoryLedger,
) -> EngineResult<()> {
    for m in matches {
        let mut m = m.clone();
        if m.is_completed {
            undo_result(model, &mut m, players)?;
        }
        for id in m.participants() {
            let player = find_mut(players, id)?;
            player.matches_played = player.matches_played.saturating_sub(1);
        }
        ledger.unrecord_match(&m);
    }
    Ok(())
}

fn team_delta(
    model: &RatingModel,
    m: &Match,
    players: &[Player],
    team1_outcome: Outcome,
) -> EngineResult<f64> {
    let avg1 = team_average(players, &m.team1)?;
    let avg2 = team_average(players, &m.team2)?;
    Ok(model.delta(avg1, avg2, team1_outcome))
}

fn team_average(players: &[Player], team: &Team) -> EngineResult<f64> {
    let ratings = team
        .iter()
        .map(|id| rating_of(players, *id))
        .collect::<EngineResult<Vec<f64>>>()?;
    Ok(RatingModel::team_average(&ratings))
}

fn rating_of(players: &[Player], id: PlayerId) -> EngineResult<f64> {
    players
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.rating)
        .ok_or(EngineError::UnknownPlayer(id))
}

fn find_mut(players: &mut [Player], id: PlayerId) -> EngineResult<&mut Player> {
    players
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or(EngineError::UnknownPlayer(id))
}
