use clap::Parser;
use gather_core::db;
use gather_core::error::CoreError;
use gather_core::repository::SqliteRepository;
use owo_colors::{OwoColorize, Style};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let (config, config_error) = config::Config::load();
    init_tracing(&config.log_level);
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "invalid configuration, using defaults");
    }

    tracing::debug!(database = %config.database_path, "opening database");
    let db_pool = match db::establish_connection(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            handle_error(e.into());
            std::process::exit(1);
        }
    };
    let repository = SqliteRepository::new(db_pool, config.generation_config());

    let result = match cli.command {
        cli::Commands::Series(command) => commands::series::series_command(&repository, &config, command).await,
        cli::Commands::Event(command) => commands::event::event_command(&repository, &config, command).await,
        cli::Commands::Category(command) => commands::category::category_command(&repository, command).await,
        cli::Commands::Intake(command) => commands::intake::intake_command(&repository, command).await,
        cli::Commands::Refresh => commands::refresh::refresh(&repository).await,
        cli::Commands::Upcoming => commands::refresh::upcoming(&repository).await,
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so tables on stdout stay clean. `RUST_LOG` wins over
/// the configured level.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();
    let core_error = err.chain().find_map(|e| e.downcast_ref::<CoreError>());

    match core_error {
        Some(CoreError::NotFound(s)) => {
            eprintln!("{} {}", "Error:".style(error_style), s);
        }
        Some(CoreError::AmbiguousId(matches)) => {
            eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
            eprintln!("Did you mean one of these?");
            for (id, title) in matches {
                eprintln!("  {} ({})", id.yellow(), title);
            }
        }
        Some(CoreError::InvalidInput(s)) => {
            eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
        }
        Some(CoreError::InvalidTimezone(tz)) => {
            eprintln!(
                "{} Unknown timezone '{}'. Use IANA names like 'America/Denver'.",
                "Error:".style(error_style),
                tz.yellow()
            );
        }
        Some(CoreError::Database(e)) => {
            eprintln!("{} Database error: {}", "Error:".style(error_style), e);
        }
        Some(CoreError::Migration(e)) => {
            eprintln!("{} Could not migrate database: {}", "Error:".style(error_style), e);
        }
        Some(CoreError::Io(e)) => {
            eprintln!("{} {}", "Error:".style(error_style), e);
        }
        None => eprintln!("{} {}", "Error:".style(error_style), err),
    }
}
