#![allow(dead_code)]

use doubles_matchmaker::config::AppConfig;
use doubles_matchmaker::database::SqliteStore;
use doubles_matchmaker::domain::{ParticipantStatus, Player};
use doubles_matchmaker::services::PlayerService;
use rand::SeedableRng;
use rand::rngs::StdRng;

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// In-memory store holding one active player per rating
pub fn store_with_active(config: &AppConfig, ratings: &[f64]) -> (SqliteStore, Vec<Player>) {
    let store = SqliteStore::in_memory().unwrap();
    let players = PlayerService::new(&store, config);

    let added = ratings
        .iter()
        .enumerate()
        .map(|(i, &r)| {
            let p = players.add_player(&format!("player{}", i + 1), Some(r)).unwrap();
            players.set_status(p.id, ParticipantStatus::Active).unwrap()
        })
        .collect();

    (store, added)
}
