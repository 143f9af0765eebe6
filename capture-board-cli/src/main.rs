//! capture-board CLI - a command-line host for the board engine.
//!
//! Commands:
//! - `capture-board show`: Print every stage with its acquisitions
//! - `capture-board move-column <id> <index>`: Reorder a stage
//! - `capture-board move-card <id> <stage>`: Move an acquisition to a stage
//! - `capture-board add-column <title>`: Append a stage
//! - `capture-board delete-column <id>`: Delete an empty stage
//! - `capture-board delete-card <id>`: Delete an acquisition
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error

mod cli;
mod table;

use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use capture_board::{
    BoardApi, BoardEngine, BoardEvents, BoardSnapshot, CardId, ClientConfig, ColumnId, HttpBoardApi,
    ReconcileOutcome, ReconcileResult, RemoteProjection,
};
use cli::{Cli, Commands};

/// Stage changes reported by the engine, persisted after the drop settles.
#[derive(Default)]
struct PendingMoves(Mutex<Vec<(CardId, ColumnId)>>);

impl PendingMoves {
    fn take(&self) -> Vec<(CardId, ColumnId)> {
        self.0
            .lock()
            .map(|mut moves| std::mem::take(&mut *moves))
            .unwrap_or_default()
    }
}

impl BoardEvents for PendingMoves {
    fn on_card_move(&self, card: &CardId, _from: &ColumnId, to: &ColumnId) {
        if let Ok(mut moves) = self.0.lock() {
            moves.push((card.clone(), to.clone()));
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("capture_board=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn client_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::load(cli.config.as_deref()).context("invalid configuration")?;
    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url);
    }
    if let Some(token) = &cli.token {
        config = config.with_token(token);
    }
    if let Some(user) = &cli.user {
        config = config.with_user(user);
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = client_config(&cli)?;
    let api = Arc::new(HttpBoardApi::new(&config)?);
    let moves = Arc::new(PendingMoves::default());
    let projection = Arc::new(RemoteProjection::new(Arc::clone(&api)));
    let mut engine = BoardEngine::with_parts(Arc::clone(&api), projection, moves.clone());

    engine
        .mount()
        .await
        .with_context(|| format!("could not load the board from {}", api.endpoint()))?;

    match cli.command {
        Commands::Show { json } => print_board(&engine, json)?,

        Commands::MoveColumn { column, index } => {
            let outcome = engine.move_column(&ColumnId::from(column), index).await;
            let outcome = finish(&mut engine, outcome)?;
            report(&engine, outcome)?;
        }

        Commands::MoveCard {
            card,
            column,
            index,
        } => {
            let card = CardId::from(card);
            let column = ColumnId::from(column);
            if same_stage(engine.snapshot(), &card, &column) {
                bail!(
                    "{card} is already in {column}; order within a stage is not stored by the server"
                );
            }
            let outcome = engine.move_card(&card, &column, index).await;
            let outcome = finish(&mut engine, outcome)?;
            for (card, to) in moves.take() {
                api.move_card_to_column(&card, &to)
                    .await
                    .with_context(|| format!("could not move {card} to {to}"))?;
            }
            report(&engine, outcome)?;
        }

        Commands::AddColumn { title } => {
            let result = engine.create_column(&title).await;
            let column = finish(&mut engine, result)?;
            println!(
                "Created stage '{}' ({}) at order {}",
                column.title, column.id, column.order
            );
        }

        Commands::DeleteColumn { column } => {
            let result = engine.delete_column(&ColumnId::from(column.as_str())).await;
            finish(&mut engine, result)?;
            println!("Deleted stage {column}");
        }

        Commands::DeleteCard { card } => {
            let result = engine.delete_card(&CardId::from(card.as_str())).await;
            finish(&mut engine, result)?;
            println!("Deleted acquisition {card}");
        }
    }
    Ok(())
}

/// Whether `card` already sits in `column`. The API stores a card's stage
/// but not its position inside the stage.
fn same_stage(board: &BoardSnapshot, card: &CardId, column: &ColumnId) -> bool {
    board
        .locate_card(card)
        .is_some_and(|(current, _)| current == column)
}

/// Print pending notices, then surface the engine result.
fn finish<A: BoardApi, T>(
    engine: &mut BoardEngine<A>,
    result: capture_board::Result<T>,
) -> Result<T> {
    for notice in engine.notices_mut().drain() {
        eprintln!("{:?}: {}", notice.level, notice.message);
    }
    Ok(result?)
}

fn report<A: BoardApi>(engine: &BoardEngine<A>, outcome: Option<ReconcileOutcome>) -> Result<()> {
    match outcome {
        None => println!("Already in place, nothing to do"),
        Some(ReconcileOutcome {
            result: ReconcileResult::Persisted { orders },
            revision,
        }) => {
            tracing::debug!(revision, updated = orders.len(), "move persisted");
            println!("{}", table::board_table(engine.snapshot()));
        }
        Some(ReconcileOutcome {
            result: ReconcileResult::Failed { message, .. },
            ..
        }) => bail!("the server rejected the move, nothing was changed: {message}"),
    }
    Ok(())
}

fn print_board<A: BoardApi>(engine: &BoardEngine<A>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(engine.snapshot())?);
    } else {
        println!("{}", table::board_table(engine.snapshot()));
    }
    Ok(())
}
