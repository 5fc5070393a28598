pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod errors;
pub mod history;
pub mod pairing;
pub mod rating;
pub mod services;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::cli::Cli;
use crate::config::{AppConfig, PairingStrategy};
use crate::database::SqliteStore;
use crate::domain::{Match, MatchId, ParticipantStatus, Player, PlayerId, Team};
use crate::history::DiversityStats;
use crate::pairing::{GenerationReport, ScheduleRequest};
use crate::services::{MatchmakingService, PlayerService, RatingUpdateService, Roster};

pub fn interpret() -> Cli {
    Cli::parse()
}

pub fn handle_init(reset: bool) -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;
    store.init(reset)?;
    println!("{} {}", "Database ready:".green(), config.database.path);
    Ok(())
}

pub fn handle_add_player(name: &str, rating: Option<f64>, json: bool) -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;
    let player = PlayerService::new(&store, &config).add_player(name, rating)?;

    if json {
        return print_json(&player);
    }
    println!("{} {} (#{}, {:.0})", "Added".green(), player.name.bold(), player.id, player.rating);
    Ok(())
}

pub fn handle_remove_player(id: PlayerId) -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;
    let player = PlayerService::new(&store, &config).remove_player(id)?;
    println!("{} {}", "Removed".yellow(), player.name);
    Ok(())
}

pub fn handle_status(id: PlayerId, status: ParticipantStatus) -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;
    let player = PlayerService::new(&store, &config).set_status(id, status)?;
    println!("{} is now {}", player.name.bold(), status_label(&player));
    Ok(())
}

pub fn handle_rest(id: PlayerId) -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;
    let player = PlayerService::new(&store, &config).toggle_rest(id)?;
    println!("{} is now {}", player.name.bold(), status_label(&player));
    Ok(())
}

pub fn handle_players(json: bool) -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;
    let service = PlayerService::new(&store, &config);
    let standings = service.standings()?;

    if json {
        return print_json(&standings);
    }

    println!(
        "{:>4}  {:<20} {:>7} {:>5} {:>4} {:>6} {:>5}  {}",
        "#", "Name", "Rating", "Level", "Won", "Played", "Win%", "Status"
    );
    for player in &standings {
        println!(
            "{:>4}  {:<20} {:>7.1} {:>5} {:>4} {:>6} {:>4.0}%  {}",
            player.id,
            player.name,
            player.rating,
            player.level(&config.rating),
            player.wins,
            player.matches_played,
            player.win_rate() * 100.0,
            status_label(player)
        );
    }

    let summary = service.status_summary()?;
    println!(
        "\n{} active ({} resting), {} inactive, {} left; {} available",
        summary.active, summary.resting, summary.inactive, summary.left, summary.available
    );
    if !summary.can_play(config.pairing.min_players) {
        println!("{}", "Not enough available players for a match".yellow());
    }
    Ok(())
}

pub fn handle_generate(
    courts: usize,
    matches: usize,
    skill: bool,
    strategy: Option<PairingStrategy>,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let config = config_with(strategy);
    let store = open_store(&config)?;

    let request = ScheduleRequest {
        courts,
        match_count: matches,
        skill_matching: skill,
    };
    let report =
        MatchmakingService::new(&store, &config).generate_round(&request, &mut seeded_rng(seed))?;

    if json {
        return print_json(&report);
    }

    let names = player_names(&store, &config)?;
    print_report(&report, &names);
    Ok(())
}

pub fn handle_regenerate(
    courts: usize,
    matches: Option<usize>,
    skill: bool,
    strategy: Option<PairingStrategy>,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let config = config_with(strategy);
    let store = open_store(&config)?;
    let service = MatchmakingService::new(&store, &config);

    let match_count = match matches {
        Some(count) => count,
        None => service.pending_matches()?.len().max(1),
    };
    let request = ScheduleRequest {
        courts,
        match_count,
        skill_matching: skill,
    };
    let regeneration = service.regenerate_pending(&request, &mut seeded_rng(seed))?;

    if json {
        return print_json(&regeneration);
    }

    println!(
        "{} {} unplayed match(es)",
        "Dropped".yellow(),
        regeneration.dropped.len()
    );
    let names = player_names(&store, &config)?;
    print_report(&regeneration.report, &names);
    Ok(())
}

pub fn handle_complete(id: MatchId, score1: i32, score2: i32, json: bool) -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;
    let m = RatingUpdateService::new(&store, &config).complete_match(id, score1, score2)?;
    print_result(&store, &config, &m, json)
}

pub fn handle_edit(id: MatchId, score1: i32, score2: i32, json: bool) -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;
    let m = RatingUpdateService::new(&store, &config).edit_match(id, score1, score2)?;
    print_result(&store, &config, &m, json)
}

pub fn handle_revert(id: MatchId) -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;
    RatingUpdateService::new(&store, &config).revert_match(id)?;
    println!("{} match {}", "Reverted".yellow(), id);
    Ok(())
}

pub fn handle_delete(id: MatchId) -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;
    RatingUpdateService::new(&store, &config).delete_match(id)?;
    println!("{} match {}", "Deleted".red(), id);
    Ok(())
}

pub fn handle_delete_round(round: u32, json: bool) -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;
    let deleted = RatingUpdateService::new(&store, &config).delete_round(round)?;

    if json {
        return print_json(&deleted);
    }
    println!("{} round {} ({} match(es))", "Deleted".red(), round, deleted.len());
    Ok(())
}

pub fn handle_rounds(json: bool) -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;
    let service = MatchmakingService::new(&store, &config);
    let matches = service.matches()?;

    if json {
        return print_json(&matches);
    }

    let names = player_names(&store, &config)?;
    print_rounds(&matches, &names);

    let summary = service.round_summary()?;
    println!(
        "\n{}/{} rounds complete, {}/{} matches scored",
        summary.completed_rounds,
        summary.total_rounds,
        summary.completed_matches,
        summary.total_matches
    );
    Ok(())
}

#[derive(Serialize)]
struct StatsView {
    pairings: DiversityStats,
    matchups: DiversityStats,
    most_repeated: Option<(PlayerId, PlayerId, u32)>,
    consistent: bool,
}

pub fn handle_stats(rebuild: bool, json: bool) -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;
    let service = MatchmakingService::new(&store, &config);

    if rebuild {
        service.rebuild_ledger()?;
    }

    let view = StatsView {
        pairings: service.pairing_diversity_stats()?,
        matchups: service.matchup_diversity_stats()?,
        most_repeated: service.most_repeated_pairing()?.map(|(key, count)| {
            let (a, b) = key.players();
            (a, b, count)
        }),
        consistent: service.ledger_is_consistent()?,
    };

    if json {
        return print_json(&view);
    }

    print_diversity("Pairings", &view.pairings);
    print_diversity("Matchups", &view.matchups);

    if let Some((a, b, count)) = view.most_repeated {
        let names = player_names(&store, &config)?;
        println!(
            "Most repeated pairing: {} & {} ({} times)",
            name_of(&names, a),
            name_of(&names, b),
            count
        );
    }
    if !view.consistent {
        println!("{}", "Counters differ from match history; run with --rebuild".yellow());
    }
    Ok(())
}

pub fn handle_export_players() -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;
    let roster = PlayerService::new(&store, &config).export_roster()?;
    print_json(&roster)
}

pub fn handle_import_players(file: &Path, activate: bool, json: bool) -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;

    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read roster {}", file.display()))?;
    let roster: Roster = serde_json::from_str(&text)
        .with_context(|| format!("Roster {} is not a Name list", file.display()))?;
    let report = PlayerService::new(&store, &config).import_roster(&roster, activate)?;

    if json {
        return print_json(&report);
    }
    for player in &report.added {
        println!("{} {} (#{})", "Added".green(), player.name.bold(), player.id);
    }
    if !report.duplicates.is_empty() {
        println!(
            "{} {}",
            "Already registered:".yellow(),
            report.duplicates.join(", ")
        );
    }
    if activate {
        println!("{} player(s) marked active", report.activated);
    }
    Ok(())
}

pub fn handle_reset_session() -> Result<()> {
    let config = AppConfig::new();
    let store = open_store(&config)?;
    let count = PlayerService::new(&store, &config).reset_session()?;
    println!("{} ({} players now inactive)", "Session reset".green(), count);
    Ok(())
}

pub fn handle_completions(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    Ok(())
}

fn config_with(strategy: Option<PairingStrategy>) -> AppConfig {
    let config = AppConfig::new();
    match strategy {
        Some(strategy) => config.with_strategy(strategy),
        None => config,
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn print_report(report: &GenerationReport, names: &HashMap<PlayerId, String>) {
    print_rounds(&report.matches, names);

    if !report.byes.is_empty() {
        let byes: Vec<&str> = report.byes.iter().map(|id| name_of(names, *id)).collect();
        println!("{} {}", "Sitting out:".dimmed(), byes.join(", "));
    }
    if report.relaxed_matches > 0 {
        let warning = format!(
            "{} match(es) repeat an earlier pairing or matchup",
            report.relaxed_matches
        );
        println!("{}", warning.yellow());
    }
    if !report.is_complete() {
        println!(
            "{}",
            format!(
                "Generated {} of {} requested matches ({} short)",
                report.matches.len(),
                report.requested,
                report.shortfall()
            )
            .yellow()
            .bold()
        );
    }
}

fn open_store(config: &AppConfig) -> Result<SqliteStore> {
    SqliteStore::open(&config.database.path)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn player_names(store: &SqliteStore, config: &AppConfig) -> Result<HashMap<PlayerId, String>> {
    let players = PlayerService::new(store, config).players()?;
    Ok(players.into_iter().map(|p| (p.id, p.name)).collect())
}

fn name_of(names: &HashMap<PlayerId, String>, id: PlayerId) -> &str {
    names.get(&id).map(String::as_str).unwrap_or("?")
}

fn team_label(names: &HashMap<PlayerId, String>, team: &Team) -> String {
    format!("{} & {}", name_of(names, team[0]), name_of(names, team[1]))
}

fn print_rounds(matches: &[Match], names: &HashMap<PlayerId, String>) {
    let mut current_round = None;

    for m in matches {
        if current_round != Some(m.round_index) {
            println!("{}", format!("Round {}", m.round_index).bold());
            current_round = Some(m.round_index);
        }

        let score = if m.is_completed {
            format!("{}-{}", m.score1, m.score2).green().to_string()
        } else {
            "pending".dimmed().to_string()
        };
        println!(
            "  Court {}  #{:<4} {}  vs  {}  [{}]",
            m.court,
            m.id,
            team_label(names, &m.team1),
            team_label(names, &m.team2),
            score
        );
    }
}

fn print_result(store: &SqliteStore, config: &AppConfig, m: &Match, json: bool) -> Result<()> {
    if json {
        return print_json(m);
    }

    let names = player_names(store, config)?;
    println!(
        "Match #{}: {} {}-{} {}",
        m.id,
        team_label(&names, &m.team1),
        m.score1,
        m.score2,
        team_label(&names, &m.team2)
    );
    for adjustment in &m.adjustments {
        let delta = adjustment.delta();
        let change = format!("{:+.1}", delta);
        let change = if delta >= 0.0 { change.green() } else { change.red() };
        println!(
            "  {:<20} {:>7.1} -> {:>7.1} ({})",
            name_of(&names, adjustment.player_id),
            adjustment.before,
            adjustment.after,
            change
        );
    }
    Ok(())
}

fn print_diversity(label: &str, stats: &DiversityStats) {
    println!(
        "{:<9} {} combos, mean {:.2}, std-dev {:.2}, max {}, fairness {:.1}",
        label.bold(),
        stats.samples,
        stats.mean,
        stats.std_dev,
        stats.max,
        stats.fairness_score
    );
}

fn status_label(player: &Player) -> String {
    match (player.status, player.is_resting) {
        (ParticipantStatus::Active, true) => "resting".yellow().to_string(),
        (ParticipantStatus::Active, false) => "active".green().to_string(),
        (status, _) => status.as_str().dimmed().to_string(),
    }
}
