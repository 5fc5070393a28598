use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection};

use crate::domain::{Match, MatchId};

const MATCH_COLUMNS: &str = "id, round_index, match_index, court, \
    team1_player1, team1_player2, team2_player1, team2_player2, \
    score1, score2, is_completed, completed_at, adjustments";

/// Insert or overwrite the match with `m.id`
pub fn save_match(conn: &Connection, m: &Match) -> Result<()> {
    let adjustments =
        serde_json::to_string(&m.adjustments).context("Failed to serialize rating adjustments")?;

    let sql = format!(
        "INSERT INTO matches ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
         ON CONFLICT(id) DO UPDATE SET round_index = excluded.round_index, \
         match_index = excluded.match_index, court = excluded.court, \
         team1_player1 = excluded.team1_player1, team1_player2 = excluded.team1_player2, \
         team2_player1 = excluded.team2_player1, team2_player2 = excluded.team2_player2, \
         score1 = excluded.score1, score2 = excluded.score2, is_completed = excluded.is_completed, \
         completed_at = excluded.completed_at, adjustments = excluded.adjustments",
        MATCH_COLUMNS
    );

    conn.execute(
        &sql,
        params![
            m.id,
            m.round_index,
            m.match_index,
            m.court,
            m.team1[0],
            m.team1[1],
            m.team2[0],
            m.team2[1],
            m.score1,
            m.score2,
            m.is_completed,
            m.completed_at,
            adjustments
        ],
    )
    .with_context(|| format!("Failed to save match {}", m.id))?;

    Ok(())
}

fn parse_match_row(row: &rusqlite::Row) -> rusqlite::Result<Match> {
    let adjustments: String = row.get(12)?;
    let adjustments = serde_json::from_str(&adjustments)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(12, Type::Text, Box::new(e)))?;

    Ok(Match {
        id: row.get(0)?,
        round_index: row.get(1)?,
        match_index: row.get(2)?,
        court: row.get(3)?,
        team1: [row.get(4)?, row.get(5)?],
        team2: [row.get(6)?, row.get(7)?],
        score1: row.get(8)?,
        score2: row.get(9)?,
        is_completed: row.get(10)?,
        completed_at: row.get(11)?,
        adjustments,
    })
}

/// All matches in creation order
pub fn list_all(conn: &Connection) -> Result<Vec<Match>> {
    let sql = format!("SELECT {} FROM matches ORDER BY match_index, id", MATCH_COLUMNS);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], parse_match_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to list matches")?;

    Ok(rows)
}

pub fn delete_match(conn: &Connection, id: MatchId) -> Result<bool> {
    let affected = conn
        .execute("DELETE FROM matches WHERE id = ?1", params![id])
        .context("Failed to delete match")?;

    Ok(affected > 0)
}
