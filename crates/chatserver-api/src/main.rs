//! chatd entry point.
//!
//! Parses CLI arguments, loads configuration, initializes tracing and the
//! database, then dispatches to the chat command handlers.

mod cli;
mod handler;
mod state;

use std::process::ExitCode;

use clap::Parser;

use chatserver_infra::config::{load_config, load_config_file, resolve_data_dir, resolve_database_url};
use chatserver_observe::tracing_setup::init_tracing;

use cli::{Cli, Commands, Output};
use handler::error::{ApiError, ApiStatus};
use state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::from_cli(&cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let api_error = match err.downcast::<ApiError>() {
                Ok(api_error) => api_error,
                Err(other) => ApiError::internal(format!("{other:#}")),
            };
            report_error(&api_error, output);
            ExitCode::from(api_error.status.exit_code())
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let data_dir = resolve_data_dir();
    let config = match &cli.config {
        Some(path) => load_config_file(path).await,
        None => load_config(&data_dir).await,
    };

    // Verbosity flags win over the configured filter
    let filter = match cli.verbose {
        0 if cli.quiet => "error".to_string(),
        0 => config.log_filter.clone().unwrap_or_else(|| "warn".to_string()),
        1 => "info,chatserver=debug".to_string(),
        _ => "trace".to_string(),
    };
    let tracing_guard = init_tracing(&filter, cli.otel).map_err(|e| anyhow::anyhow!(e))?;
    tracing::debug!(filter = %filter, otel = tracing_guard.otel_enabled(), "tracing initialized");

    let database_url = resolve_database_url(&config, &data_dir, cli.database_url.as_deref());
    let state = AppState::init(data_dir, config, &database_url).await?;

    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("interrupt received, cancelling in-flight request");
        shutdown.cancel();
    });

    let output = Output::from_cli(&cli);
    let result = match cli.command {
        Commands::Create { users } => cli::chat::create_chat(&state, users, output).await,
        Commands::Delete { chat_id } => cli::chat::delete_chat(&state, chat_id, output).await,
        Commands::Send {
            chat_id,
            from,
            text,
        } => cli::chat::send_message(&state, chat_id, from, text, output).await,
        Commands::Check => cli::chat::check(&state, output).await,
    };

    state.db_pool.close().await;
    result
}

fn report_error(err: &ApiError, output: Output) {
    if output.json {
        println!("{}", err.to_envelope());
        return;
    }

    let label = match err.status {
        ApiStatus::InvalidArgument => "invalid argument",
        ApiStatus::NotFound => "not found",
        ApiStatus::Cancelled => "cancelled",
        ApiStatus::DeadlineExceeded => "deadline exceeded",
        ApiStatus::Internal => "error",
    };
    eprintln!(
        "  {} {}: {}",
        console::style("✗").red().bold(),
        console::style(label).red(),
        err.message
    );
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
