use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::store::{ChangeSet, Store};
use crate::config::AppConfig;
use crate::domain::{ParticipantStatus, Player, PlayerId, StatusSummary};
use crate::errors::{with_store_context, EngineError, EngineResult};

/// Player names in the `{"Name": [...]}` layout used for bulk registration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(rename = "Name")]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RosterImport {
    pub added: Vec<Player>,
    pub duplicates: Vec<String>,
    pub activated: usize,
}

/// Roster management: who exists, who is here today, who sits out.
pub struct PlayerService<'a> {
    store: &'a dyn Store,
    config: &'a AppConfig,
}

impl<'a> PlayerService<'a> {
    pub fn new(store: &'a dyn Store, config: &'a AppConfig) -> Self {
        Self { store, config }
    }

    pub fn add_player(&self, name: &str, rating: Option<f64>) -> EngineResult<Player> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidPlayer("name must not be blank".to_string()));
        }

        let rating = rating.unwrap_or(self.config.rating.default_rating);
        if !rating.is_finite() || rating < self.config.rating.rating_floor {
            return Err(EngineError::InvalidPlayer(format!(
                "rating {} is below the floor of {}",
                rating, self.config.rating.rating_floor
            )));
        }

        let players = self.players()?;
        if players.iter().any(|p| p.name.eq_ignore_ascii_case(name)) {
            return Err(EngineError::InvalidPlayer(format!("{} already exists", name)));
        }

        let player = with_store_context(self.store.add_player(name, rating), "add player")?;
        info!("  → Added player {} ({}) at {:.0}", player.name, player.id, player.rating);
        Ok(player)
    }

    /// Delete a player who never appeared in a match
    pub fn remove_player(&self, id: PlayerId) -> EngineResult<Player> {
        let player = self.find(id)?;

        let matches = with_store_context(self.store.load_all_matches(), "load matches")?;
        let referenced = matches.iter().filter(|m| m.involves(id)).count();
        if referenced > 0 {
            return Err(EngineError::InvalidPlayer(format!(
                "{} appears in {} match(es) and cannot be removed",
                player.name, referenced
            )));
        }

        let mut ledger = with_store_context(self.store.load_ledger(), "load history ledger")?;
        ledger.forget_player(id);

        let changes = ChangeSet::new().with_removed_player(id).with_ledger(ledger);
        with_store_context(self.store.apply(&changes), "remove player")?;
        info!("  → Removed player {}", player.name);
        Ok(player)
    }

    /// Leaving or going inactive also ends any rest
    pub fn set_status(&self, id: PlayerId, status: ParticipantStatus) -> EngineResult<Player> {
        let mut player = self.find(id)?;
        player.status = status;
        if status != ParticipantStatus::Active {
            player.is_resting = false;
        }

        self.save(&player, "update player status")?;
        info!("  → {} is now {}", player.name, status.as_str());
        Ok(player)
    }

    pub fn toggle_rest(&self, id: PlayerId) -> EngineResult<Player> {
        let mut player = self.find(id)?;
        if !player.is_participating_today() {
            return Err(EngineError::InvalidPlayer(format!(
                "{} is {} and cannot rest",
                player.name,
                player.status.as_str()
            )));
        }

        player.is_resting = !player.is_resting;
        self.save(&player, "update player rest")?;
        Ok(player)
    }

    pub fn players(&self) -> EngineResult<Vec<Player>> {
        with_store_context(self.store.load_all_players(), "load players")
    }

    /// Highest rating first; ties by name
    pub fn standings(&self) -> EngineResult<Vec<Player>> {
        let mut players = self.players()?;
        players.sort_by(|a, b| b.rating.total_cmp(&a.rating).then_with(|| a.name.cmp(&b.name)));
        Ok(players)
    }

    pub fn status_summary(&self) -> EngineResult<StatusSummary> {
        Ok(StatusSummary::from_players(&self.players()?))
    }

    /// Start a fresh session: everyone inactive and the bye counts cleared.
    /// Ratings, wins, recorded matches and the pairing and matchup counters
    /// derived from them stay.
    pub fn reset_session(&self) -> EngineResult<usize> {
        let players: Vec<Player> = self
            .players()?
            .into_iter()
            .map(|mut p| {
                p.status = ParticipantStatus::Inactive;
                p.is_resting = false;
                p
            })
            .collect();
        let count = players.len();

        let mut ledger = with_store_context(self.store.load_ledger(), "load history ledger")?;
        ledger.clear_byes();

        let changes = ChangeSet::new().with_players(players).with_ledger(ledger);
        with_store_context(self.store.apply(&changes), "reset session")?;
        info!("  → Session reset for {} players", count);
        Ok(count)
    }

    /// Every registered name, in id order
    pub fn export_roster(&self) -> EngineResult<Roster> {
        let names = self.players()?.into_iter().map(|p| p.name).collect();
        Ok(Roster { names })
    }

    /// Register every new name in the roster. Names already taken are
    /// counted as duplicates; blank ones are skipped. With `activate` the
    /// added and the duplicate players are all marked active.
    pub fn import_roster(&self, roster: &Roster, activate: bool) -> EngineResult<RosterImport> {
        if roster.names.iter().all(|n| n.trim().is_empty()) {
            return Err(EngineError::InvalidPlayer("roster has no names".to_string()));
        }

        let mut report = RosterImport::default();
        let mut to_activate = Vec::new();
        for name in roster.names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            let existing = self
                .players()?
                .into_iter()
                .find(|p| p.name.eq_ignore_ascii_case(name));
            match existing {
                Some(player) => {
                    warn!("  → {} is already registered", player.name);
                    report.duplicates.push(player.name);
                    to_activate.push(player.id);
                }
                None => {
                    let player = self.add_player(name, None)?;
                    to_activate.push(player.id);
                    report.added.push(player);
                }
            }
        }

        if activate {
            let players: Vec<Player> = self
                .players()?
                .into_iter()
                .filter(|p| to_activate.contains(&p.id) && p.status != ParticipantStatus::Active)
                .map(|mut p| {
                    p.status = ParticipantStatus::Active;
                    p
                })
                .collect();
            report.activated = players.len();
            with_store_context(
                self.store.apply(&ChangeSet::new().with_players(players)),
                "activate imported players",
            )?;
            for added in &mut report.added {
                added.status = ParticipantStatus::Active;
            }
        }

        info!(
            "  → Imported roster: {} added, {} already registered",
            report.added.len(),
            report.duplicates.len()
        );
        Ok(report)
    }

    fn find(&self, id: PlayerId) -> EngineResult<Player> {
        self.players()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or(EngineError::UnknownPlayer(id))
    }

    fn save(&self, player: &Player, operation: &str) -> EngineResult<()> {
        let changes = ChangeSet::new().with_players([player.clone()]);
        with_store_context(self.store.apply(&changes), operation)
    }
}
