use anyhow::{Context, Result};
use log::{debug, info};

use super::connection::{create_memory_pool, create_pool, get_connection, DbConn, DbPool};
use super::{counters, matches, players, setup};
use crate::domain::{Match, MatchId, Player, PlayerId};
use crate::history::HistoryLedger;
use crate::services::{ChangeSet, Store};

/// SQLite-backed store; every `apply` runs in one transaction
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn open(database_path: &str) -> Result<Self> {
        let store = Self {
            pool: create_pool(database_path)?,
        };
        store.init(false)?;
        info!("  → Opened database {}", database_path);
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let store = Self {
            pool: create_memory_pool()?,
        };
        store.init(false)?;
        Ok(store)
    }

    /// Create missing tables, or drop everything first when `reset` is set
    pub fn init(&self, reset: bool) -> Result<()> {
        let conn = self.conn()?;
        if reset {
            setup::reset_database(&conn)
        } else {
            setup::ensure_schema(&conn)
        }
    }

    fn conn(&self) -> Result<DbConn> {
        get_connection(&self.pool)
    }
}

impl Store for SqliteStore {
    fn load_all_players(&self) -> Result<Vec<Player>> {
        players::list_all(&*self.conn()?)
    }

    fn load_all_matches(&self) -> Result<Vec<Match>> {
        matches::list_all(&*self.conn()?)
    }

    fn save_player(&self, player: &Player) -> Result<()> {
        players::save_player(&*self.conn()?, player)
    }

    fn save_match(&self, m: &Match) -> Result<()> {
        matches::save_match(&*self.conn()?, m)
    }

    fn delete_match(&self, id: MatchId) -> Result<bool> {
        matches::delete_match(&*self.conn()?, id)
    }

    fn load_ledger(&self) -> Result<HistoryLedger> {
        counters::load_ledger(&*self.conn()?)
    }

    fn save_ledger(&self, ledger: &HistoryLedger) -> Result<()> {
        counters::save_ledger(&*self.conn()?, ledger)
    }

    fn add_player(&self, name: &str, rating: f64) -> Result<Player> {
        players::insert_player(&*self.conn()?, name, rating)
    }

    fn remove_player(&self, id: PlayerId) -> Result<bool> {
        players::delete_player(&*self.conn()?, id)
    }

    fn apply(&self, changes: &ChangeSet) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().context("Failed to begin transaction")?;

        for id in &changes.deleted_matches {
            matches::delete_match(&tx, *id)?;
        }
        for player in &changes.players {
            players::save_player(&tx, player)?;
        }
        for id in &changes.removed_players {
            players::delete_player(&tx, *id)?;
        }
        for m in &changes.matches {
            matches::save_match(&tx, m)?;
        }
        if let Some(ledger) = &changes.ledger {
            counters::save_ledger(&tx, ledger)?;
        }

        tx.commit().context("Failed to commit transaction")?;
        debug!(
            "Committed change set: {} players, {} matches, {} deletions",
            changes.players.len(),
            changes.matches.len(),
            changes.deleted_matches.len()
        );
        Ok(())
    }
}
