use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection};

use crate::domain::{ParticipantStatus, Player, PlayerId};

const PLAYER_COLUMNS: &str =
    "id, name, rating, matches_played, wins, status, is_resting, created_at";

pub fn insert_player(conn: &Connection, name: &str, rating: f64) -> Result<Player> {
    let sql = format!(
        "INSERT INTO players (name, rating) VALUES (?1, ?2) RETURNING {}",
        PLAYER_COLUMNS
    );

    conn.query_row(&sql, params![name, rating], parse_player_row)
        .with_context(|| format!("Failed to insert player {}", name))
}

/// Insert or overwrite every mutable column of `player`
pub fn save_player(conn: &Connection, player: &Player) -> Result<()> {
    let sql = "INSERT INTO players (id, name, rating, matches_played, wins, status, is_resting) \
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
               ON CONFLICT(id) DO UPDATE SET name = excluded.name, rating = excluded.rating, \
               matches_played = excluded.matches_played, wins = excluded.wins, \
               status = excluded.status, is_resting = excluded.is_resting";

    conn.execute(
        sql,
        params![
            player.id,
            player.name,
            player.rating,
            player.matches_played,
            player.wins,
            player.status.as_str(),
            player.is_resting
        ],
    )
    .with_context(|| format!("Failed to save player {}", player.id))?;

    Ok(())
}

fn parse_player_row(row: &rusqlite::Row) -> rusqlite::Result<Player> {
    let status: String = row.get(5)?;
    let status = ParticipantStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            format!("unknown participant status '{}'", status).into(),
        )
    })?;

    Ok(Player {
        id: row.get(0)?,
        name: row.get(1)?,
        rating: row.get(2)?,
        matches_played: row.get(3)?,
        wins: row.get(4)?,
        status,
        is_resting: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub fn list_all(conn: &Connection) -> Result<Vec<Player>> {
    let sql = format!("SELECT {} FROM players ORDER BY id", PLAYER_COLUMNS);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], parse_player_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to list players")?;

    Ok(rows)
}

pub fn delete_player(conn: &Connection, id: PlayerId) -> Result<bool> {
    let affected = conn
        .execute("DELETE FROM players WHERE id = ?1", params![id])
        .context("Failed to delete player")?;

    Ok(affected > 0)
}
