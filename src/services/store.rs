use anyhow::Result;

use crate::domain::{Match, MatchId, Player, PlayerId};
use crate::history::HistoryLedger;

/// Everything one service operation wants persisted
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub players: Vec<Player>,
    pub matches: Vec<Match>,
    pub deleted_matches: Vec<MatchId>,
    pub removed_players: Vec<PlayerId>,
    pub ledger: Option<HistoryLedger>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_players(mut self, players: impl IntoIterator<Item = Player>) -> Self {
        self.players.extend(players);
        self
    }

    pub fn with_matches(mut self, matches: impl IntoIterator<Item = Match>) -> Self {
        self.matches.extend(matches);
        self
    }

    pub fn with_deleted_match(mut self, id: MatchId) -> Self {
        self.deleted_matches.push(id);
        self
    }

    pub fn with_removed_player(mut self, id: PlayerId) -> Self {
        self.removed_players.push(id);
        self
    }

    pub fn with_ledger(mut self, ledger: HistoryLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
            && self.matches.is_empty()
            && self.deleted_matches.is_empty()
            && self.removed_players.is_empty()
            && self.ledger.is_none()
    }
}

/// Storage collaborator of the engine.
///
/// `apply` must be all-or-nothing; the default implementation is only
/// sequential and suits stores that cannot fail halfway.
pub trait Store {
    fn load_all_players(&self) -> Result<Vec<Player>>;
    fn load_all_matches(&self) -> Result<Vec<Match>>;
    fn save_player(&self, player: &Player) -> Result<()>;
    fn save_match(&self, m: &Match) -> Result<()>;
    fn delete_match(&self, id: MatchId) -> Result<bool>;

    fn load_ledger(&self) -> Result<HistoryLedger>;
    fn save_ledger(&self, ledger: &HistoryLedger) -> Result<()>;

    fn add_player(&self, name: &str, rating: f64) -> Result<Player>;
    fn remove_player(&self, id: PlayerId) -> Result<bool>;

    fn apply(&self, changes: &ChangeSet) -> Result<()> {
        for id in &changes.deleted_matches {
            self.delete_match(*id)?;
        }
        for player in &changes.players {
            self.save_player(player)?;
        }
        for id in &changes.removed_players {
            self.remove_player(*id)?;
        }
        for m in &changes.matches {
            self.save_match(m)?;
        }
        if let Some(ledger) = &changes.ledger {
            self.save_ledger(ledger)?;
        }
        Ok(())
    }
}
