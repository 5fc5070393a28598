use anyhow::Result;

use doubles_matchmaker::cli::{Cli, Command};
use doubles_matchmaker::errors::EngineError;
use doubles_matchmaker::{
    handle_add_player, handle_complete, handle_completions, handle_delete, handle_delete_round,
    handle_edit, handle_export_players, handle_generate, handle_import_players, handle_init,
    handle_players, handle_regenerate, handle_remove_player, handle_reset_session, handle_rest,
    handle_revert, handle_rounds, handle_stats, handle_status, interpret,
};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(exit_code(&e));
    });
}

/// 2 when the input can be corrected and retried, 1 for everything else
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<EngineError>() {
        Some(engine) if engine.is_recoverable() => 2,
        _ => 1,
    }
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let cli = interpret();
    execute_command(&cli)
}

fn execute_command(cli: &Cli) -> Result<()> {
    let json = cli.json;

    match &cli.command {
        Command::Init { reset } => handle_init(*reset),
        Command::AddPlayer { name, rating } => handle_add_player(name, *rating, json),
        Command::RemovePlayer { id } => handle_remove_player(*id),
        Command::Status { id, status } => handle_status(*id, *status),
        Command::Rest { id } => handle_rest(*id),
        Command::Players => handle_players(json),
        Command::ExportPlayers => handle_export_players(),
        Command::ImportPlayers { file, activate } => handle_import_players(file, *activate, json),
        Command::Generate {
            courts,
            matches,
            skill,
            strategy,
            seed,
        } => handle_generate(*courts, *matches, *skill, *strategy, *seed, json),
        Command::Regenerate {
            courts,
            matches,
            skill,
            strategy,
            seed,
        } => handle_regenerate(*courts, *matches, *skill, *strategy, *seed, json),
        Command::Complete { id, score1, score2 } => handle_complete(*id, *score1, *score2, json),
        Command::Edit { id, score1, score2 } => handle_edit(*id, *score1, *score2, json),
        Command::Revert { id } => handle_revert(*id),
        Command::Delete { id } => handle_delete(*id),
        Command::DeleteRound { round } => handle_delete_round(*round, json),
        Command::Rounds => handle_rounds(json),
        Command::Stats { rebuild } => handle_stats(*rebuild, json),
        Command::ResetSession => handle_reset_session(),
        Command::Completions { shell } => handle_completions(*shell),
    }
}
