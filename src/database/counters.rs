use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::domain::PlayerId;
use crate::history::{HistoryLedger, MatchupKey, PairKey};

pub fn load_ledger(conn: &Connection) -> Result<HistoryLedger> {
    let pairings = load_pairings(conn)?;
    let matchups = load_matchups(conn)?;
    let byes = load_byes(conn)?;
    let round_byes = load_round_byes(conn)?;

    Ok(HistoryLedger::from_counts(pairings, matchups, byes).with_round_byes(round_byes))
}

fn load_pairings(conn: &Connection) -> Result<HashMap<PairKey, u32>> {
    let mut stmt = conn.prepare("SELECT player_a, player_b, count FROM pairing_counts")?;
    let rows = stmt
        .query_map([], |row| Ok((PairKey::new(row.get(0)?, row.get(1)?), row.get(2)?)))?
        .collect::<rusqlite::Result<HashMap<_, _>>>()
        .context("Failed to load pairing counts")?;

    Ok(rows)
}

fn load_matchups(conn: &Connection) -> Result<HashMap<MatchupKey, u32>> {
    let mut stmt =
        conn.prepare("SELECT team1_a, team1_b, team2_a, team2_b, count FROM matchup_counts")?;
    let rows = stmt
        .query_map([], |row| {
            let team1 = PairKey::new(row.get(0)?, row.get(1)?);
            let team2 = PairKey::new(row.get(2)?, row.get(3)?);
            Ok((MatchupKey::from_pairs(team1, team2), row.get(4)?))
        })?
        .collect::<rusqlite::Result<HashMap<_, _>>>()
        .context("Failed to load matchup counts")?;

    Ok(rows)
}

fn load_byes(conn: &Connection) -> Result<HashMap<PlayerId, u32>> {
    let mut stmt = conn.prepare("SELECT player_id, count FROM bye_counts")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<HashMap<_, _>>>()
        .context("Failed to load bye counts")?;

    Ok(rows)
}

fn load_round_byes(conn: &Connection) -> Result<BTreeMap<u32, Vec<PlayerId>>> {
    let mut stmt =
        conn.prepare("SELECT round_index, player_id FROM round_byes ORDER BY round_index, rowid")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, PlayerId>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to load round byes")?;

    let mut round_byes: BTreeMap<u32, Vec<PlayerId>> = BTreeMap::new();
    for (round_index, player_id) in rows {
        round_byes.entry(round_index).or_default().push(player_id);
    }
    Ok(round_byes)
}

/// Replace the stored counters with the contents of `ledger`
pub fn save_ledger(conn: &Connection, ledger: &HistoryLedger) -> Result<()> {
    clear_counters(conn)?;

    let mut pair_stmt =
        conn.prepare("INSERT INTO pairing_counts (player_a, player_b, count) VALUES (?1, ?2, ?3)")?;
    for (key, count) in ledger.pairings() {
        let (a, b) = key.players();
        pair_stmt
            .execute(params![a, b, count])
            .context("Failed to save pairing count")?;
    }

    let mut matchup_stmt = conn.prepare(
        "INSERT INTO matchup_counts (team1_a, team1_b, team2_a, team2_b, count)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (key, count) in ledger.matchups() {
        let (team1, team2) = key.teams();
        let ((a1, b1), (a2, b2)) = (team1.players(), team2.players());
        matchup_stmt
            .execute(params![a1, b1, a2, b2, count])
            .context("Failed to save matchup count")?;
    }

    let mut bye_stmt = conn.prepare("INSERT INTO bye_counts (player_id, count) VALUES (?1, ?2)")?;
    for (player_id, count) in ledger.byes() {
        bye_stmt
            .execute(params![player_id, count])
            .context("Failed to save bye count")?;
    }

    let mut round_stmt =
        conn.prepare("INSERT INTO round_byes (round_index, player_id) VALUES (?1, ?2)")?;
    for (round_index, players) in ledger.round_byes() {
        for player_id in players {
            round_stmt
                .execute(params![round_index, player_id])
                .context("Failed to save round bye")?;
        }
    }

    log::debug!(
        "Saved ledger: {} pairings, {} matchups, {} byes",
        ledger.pairings().len(),
        ledger.matchups().len(),
        ledger.byes().len()
    );
    Ok(())
}

pub fn clear_counters(conn: &Connection) -> Result<()> {
    for table in ["pairing_counts", "matchup_counts", "bye_counts", "round_byes"] {
        conn.execute(&format!("DELETE FROM {}", table), [])
            .with_context(|| format!("Failed to clear {}", table))?;
    }
    Ok(())
}
