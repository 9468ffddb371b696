use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swiss_pairing::config::AppConfig;
use swiss_pairing::storage::{
    append_games, read_games, read_players, write_games, write_players, StorageConfig,
};
use swiss_pairing::{
    generate_swiss_round, rank_standings, recompute_standings, GameResult, PlayerId,
    PlayerStanding, TournamentId,
};

#[derive(Parser)]
#[command(name = "swiss-pairing")]
#[command(about = "Swiss-system tournament pairing engine")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a player with the next free pairing number
    AddPlayer {
        #[arg(long)]
        tournament: String,

        #[arg(long)]
        id: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Withdraw a player from all future rounds
    Withdraw {
        #[arg(long)]
        tournament: String,

        #[arg(long)]
        id: String,
    },

    /// Pair the next round
    Pair {
        #[arg(long)]
        tournament: String,

        /// Round to pair (defaults to the round after the last one paired)
        #[arg(long)]
        round: Option<u32>,

        /// Print the pairings without saving them
        #[arg(long)]
        dry_run: bool,
    },

    /// Record (or correct) the result of a game
    Report {
        #[arg(long)]
        tournament: String,

        #[arg(long)]
        round: u32,

        #[arg(long)]
        board: u32,

        /// 1-0, 0-1 or 1/2-1/2
        #[arg(long)]
        result: GameResult,
    },

    /// Print the current standings
    Standings {
        #[arg(long)]
        tournament: String,

        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        AppConfig::from_file(&cli.config)
            .with_context(|| format!("Failed to load config from {:?}", cli.config))?
    } else {
        AppConfig::default()
    };

    // Initialize tracing
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let storage = StorageConfig::new(cli.data_dir.clone().unwrap_or_else(|| config.data_dir.clone()));
    tracing::debug!("Using data directory {:?}", storage.data_dir);

    match cli.command {
        Commands::AddPlayer {
            tournament,
            id,
            name,
        } => add_player(&storage, &TournamentId::from(tournament), PlayerId::from(id), name),
        Commands::Withdraw { tournament, id } => {
            withdraw(&storage, &TournamentId::from(tournament), &PlayerId::from(id))
        }
        Commands::Pair {
            tournament,
            round,
            dry_run,
        } => pair(
            &storage,
            &config,
            &TournamentId::from(tournament),
            round,
            dry_run,
        ),
        Commands::Report {
            tournament,
            round,
            board,
            result,
        } => report(
            &storage,
            &TournamentId::from(tournament),
            round,
            board,
            result,
        ),
        Commands::Standings { tournament, json } => {
            standings(&storage, &TournamentId::from(tournament), json)
        }
    }
}

fn add_player(
    storage: &StorageConfig,
    tournament: &TournamentId,
    id: PlayerId,
    name: Option<String>,
) -> Result<()> {
    let mut players = read_players(storage, tournament)?;
    if players.iter().any(|p| p.id == id) {
        bail!("Player {} is already registered in {}", id, tournament);
    }

    let pairing_number = players.iter().map(|p| p.pairing_number).max().unwrap_or(0) + 1;
    let mut player = PlayerStanding::new(id.clone(), pairing_number);
    if let Some(name) = name {
        player = player.with_name(name);
    }
    players.push(player);
    write_players(storage, tournament, &players)?;

    tracing::info!(player = %id, pairing_number, "player registered");
    println!("Registered {} as #{}", id, pairing_number);
    Ok(())
}

fn withdraw(storage: &StorageConfig, tournament: &TournamentId, id: &PlayerId) -> Result<()> {
    let mut players = read_players(storage, tournament)?;
    let player = players
        .iter_mut()
        .find(|p| &p.id == id)
        .with_context(|| format!("No player {} in {}", id, tournament))?;

    if player.withdrawn {
        println!("{} is already withdrawn", id);
        return Ok(());
    }
    player.withdrawn = true;
    write_players(storage, tournament, &players)?;

    tracing::info!(player = %id, "player withdrawn");
    println!("Withdrew {}", id);
    Ok(())
}

fn pair(
    storage: &StorageConfig,
    config: &AppConfig,
    tournament: &TournamentId,
    round: Option<u32>,
    dry_run: bool,
) -> Result<()> {
    let players = read_players(storage, tournament)?;
    if players.is_empty() {
        bail!("Tournament {} has no players", tournament);
    }
    let games = read_games(storage, tournament)?;

    if let Some(game) = games.iter().find(|g| !g.is_scored()) {
        bail!(
            "Round {} board {} has no reported result yet",
            game.round,
            game.board
        );
    }

    let round = round.unwrap_or_else(|| games.last().map_or(1, |g| g.round + 1));
    let standings = recompute_standings(&players, &games)?;

    let pairing = generate_swiss_round(&standings, &games, round, tournament, &config.pairing)
        .map_err(|e| {
            if e.is_fatal() {
                tracing::error!(round, "pairing engine failed: {}", e);
            }
            e
        })?;

    println!("=== {} round {} ===", tournament, round);
    for game in &pairing.games {
        match &game.black {
            Some(black) => println!("Board {:>3}: {} - {}", game.board, game.white, black),
            None => println!("Bye      : {}", game.white),
        }
    }
    if !pairing.relaxations.is_empty() {
        println!("\nRelaxed constraints:");
        for event in &pairing.relaxations {
            println!("  - {}", event);
        }
    }

    if dry_run {
        println!("\n(dry run - no pairings written to disk)");
        return Ok(());
    }

    append_games(storage, tournament, &pairing.games)?;
    write_players(storage, tournament, &standings)?;
    Ok(())
}

fn report(
    storage: &StorageConfig,
    tournament: &TournamentId,
    round: u32,
    board: u32,
    result: GameResult,
) -> Result<()> {
    let mut games = read_games(storage, tournament)?;
    let game = games
        .iter_mut()
        .find(|g| g.round == round && g.board == board)
        .with_context(|| format!("No game on board {} in round {}", board, round))?;

    if game.is_bye() {
        bail!("Board {} of round {} is a bye", board, round);
    }
    if let Some(previous) = game.result.filter(|&r| r != result) {
        tracing::warn!(round, board, %previous, corrected = %result, "correcting reported result");
    }
    game.result = Some(result);
    game.reported_at = Some(Utc::now());
    let line = format!(
        "Round {} board {}: {} {} {}",
        round,
        board,
        game.white,
        result,
        game.black.as_ref().map_or("", |b| b.as_str())
    );

    let players = read_players(storage, tournament)?;
    let standings = recompute_standings(&players, &games)?;
    write_games(storage, tournament, &games)?;
    write_players(storage, tournament, &standings)?;

    println!("{}", line);
    Ok(())
}

fn standings(storage: &StorageConfig, tournament: &TournamentId, json: bool) -> Result<()> {
    let players = read_players(storage, tournament)?;
    let games = read_games(storage, tournament)?;
    let rows = rank_standings(&recompute_standings(&players, &games)?);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:>4}  {:<24} {:>6} {:>8} {:>5} {:>4}",
        "Rank", "Player", "Score", "Buchholz", "Games", "Col"
    );
    for row in &rows {
        let name = row.name.as_deref().unwrap_or(row.player_id.as_str());
        let marker = if row.withdrawn { " (withdrawn)" } else { "" };
        println!(
            "{:>4}  {:<24} {:>6.1} {:>8.1} {:>5} {:>+4}{}",
            row.rank, name, row.score, row.buchholz, row.games_played, row.color_balance, marker
        );
    }
    Ok(())
}
