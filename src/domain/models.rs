use chrono::{DateTime, NaiveDateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::RatingSettings;
use crate::errors::{EngineError, EngineResult};
use crate::rating::{self, RatingAdjustment};

pub type PlayerId = i64;
pub type MatchId = i64;

/// Two teammates. Order inside the array carries no meaning.
pub type Team = [PlayerId; 2];

/// Whether a player is taking part in today's session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[clap(rename_all = "lower_case")]
pub enum ParticipantStatus {
    /// Checked in and eligible for matches (unless resting)
    Active,
    /// Not playing today
    #[default]
    Inactive,
    /// Played earlier today but has gone home
    Left,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ParticipantStatus::Active => "active",
            ParticipantStatus::Inactive => "inactive",
            ParticipantStatus::Left => "left",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(ParticipantStatus::Active),
            "inactive" => Some(ParticipantStatus::Inactive),
            "left" => Some(ParticipantStatus::Left),
            _ => None,
        }
    }
}

/// Player data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub rating: f64,
    pub matches_played: u32,
    pub wins: u32,
    pub status: ParticipantStatus,
    pub is_resting: bool,
    pub created_at: Option<NaiveDateTime>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, rating: f64) -> Self {
        Self {
            id,
            name: name.into(),
            rating,
            matches_played: 0,
            wins: 0,
            status: ParticipantStatus::Inactive,
            is_resting: false,
            created_at: None,
        }
    }

    pub fn is_participating_today(&self) -> bool {
        self.status == ParticipantStatus::Active
    }

    /// Participating and not sitting out by choice
    pub fn is_available(&self) -> bool {
        self.is_participating_today() && !self.is_resting
    }

    pub fn win_rate(&self) -> f64 {
        if self.matches_played == 0 {
            return 0.0;
        }
        self.wins as f64 / self.matches_played as f64
    }

    pub fn level(&self, settings: &RatingSettings) -> u8 {
        rating::level_for(self.rating, settings)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Team1,
    Team2,
}

/// A doubles match on one court
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub round_index: u32,
    pub match_index: u32,
    pub court: u32,
    pub team1: Team,
    pub team2: Team,
    pub score1: i32,
    pub score2: i32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// Rating changes applied when the match was completed
    pub adjustments: Vec<RatingAdjustment>,
}

impl Match {
    /// Build an unscored match, rejecting overlapping or self-paired teams.
    pub fn scheduled(
        id: MatchId,
        round_index: u32,
        match_index: u32,
        court: u32,
        team1: Team,
        team2: Team,
    ) -> EngineResult<Self> {
        validate_teams(&team1, &team2)?;

        Ok(Self {
            id,
            round_index,
            match_index,
            court,
            team1,
            team2,
            score1: 0,
            score2: 0,
            is_completed: false,
            completed_at: None,
            adjustments: Vec::new(),
        })
    }

    pub fn participants(&self) -> [PlayerId; 4] {
        [self.team1[0], self.team1[1], self.team2[0], self.team2[1]]
    }

    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.participants().contains(&player_id)
    }

    pub fn team(&self, side: Side) -> &Team {
        match side {
            Side::Team1 => &self.team1,
            Side::Team2 => &self.team2,
        }
    }

    /// `None` while unscored, and for drawn matches
    pub fn winner_team(&self) -> Option<Side> {
        if !self.is_completed {
            return None;
        }
        winner_from_scores(self.score1, self.score2)
    }

    /// Back to the unscored state it was generated in
    pub fn reset_result(&mut self) {
        self.score1 = 0;
        self.score2 = 0;
        self.is_completed = false;
        self.completed_at = None;
        self.adjustments.clear();
    }
}

pub fn winner_from_scores(score1: i32, score2: i32) -> Option<Side> {
    if score1 > score2 {
        Some(Side::Team1)
    } else if score2 > score1 {
        Some(Side::Team2)
    } else {
        None
    }
}

pub fn validate_teams(team1: &Team, team2: &Team) -> EngineResult<()> {
    let all = [team1[0], team1[1], team2[0], team2[1]];

    for (i, a) in all.iter().enumerate() {
        if all[i + 1..].contains(a) {
            return Err(EngineError::InvalidTeams(format!(
                "player {} appears more than once",
                a
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(score1: i32, score2: i32) -> Match {
        let mut m = Match::scheduled(1, 1, 1, 1, [1, 2], [3, 4]).unwrap();
        m.score1 = score1;
        m.score2 = score2;
        m.is_completed = true;
        m
    }

    #[test]
    fn winner_follows_scores() {
        assert_eq!(completed(11, 9).winner_team(), Some(Side::Team1));
        assert_eq!(completed(7, 11).winner_team(), Some(Side::Team2));
        assert_eq!(completed(10, 10).winner_team(), None);
    }

    #[test]
    fn unscored_match_has_no_winner() {
        let mut m = completed(11, 2);
        m.is_completed = false;
        assert_eq!(m.winner_team(), None);
    }

    #[test]
    fn rejects_overlapping_teams() {
        assert!(Match::scheduled(1, 1, 1, 1, [1, 2], [2, 3]).is_err());
        assert!(Match::scheduled(1, 1, 1, 1, [1, 1], [2, 3]).is_err());
    }

    #[test]
    fn team_lookup() {
        let m = completed(1, 0);
        assert_eq!(m.team(Side::Team2), &[3, 4]);
        assert!(m.involves(3));
        assert!(!m.involves(9));
    }

    #[test]
    fn win_rate_is_zero_without_matches() {
        let mut player = Player::new(1, "Aki", 1200.0);
        assert_eq!(player.win_rate(), 0.0);
        player.matches_played = 4;
        player.wins = 3;
        assert_eq!(player.win_rate(), 0.75);
    }

    #[test]
    fn availability_requires_active_and_not_resting() {
        let mut player = Player::new(1, "Aki", 1200.0);
        assert!(!player.is_available());
        player.status = ParticipantStatus::Active;
        assert!(player.is_available());
        player.is_resting = true;
        assert!(!player.is_available());
        assert_eq!(ParticipantStatus::parse("left"), Some(ParticipantStatus::Left));
    }
}
