//! CertPath CLI
//!
//! Main entry point for the CertPath adaptive certification server.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use certpath_gemini::{GeminiClient, API_KEY_ENV};
use certpath_orchestrator::{
    create_router, AppState, Catalog, Config, EventBroadcaster, LessonGenerator, Orchestrator,
    QuizGenerator,
};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// CertPath - Adaptive Certification Tutor
///
/// Serves an HTTP API that walks learners through certification curricula,
/// generating lessons and quizzes with Gemini and adapting to quiz scores.
#[derive(Parser, Debug)]
#[command(name = "certpath")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: certpath.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Address to bind the HTTP server to (overrides the config file)
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// Port for the HTTP server (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("CertPath starting");
    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Loads configuration, wires the orchestrator, and serves until Ctrl+C.
async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(ref host) = args.host {
        config.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    // Re-validate after overrides
    config.validate()?;

    print_config(&config);

    let gemini = Arc::new(GeminiClient::from_env(config.gemini.clone())?);
    if !gemini.is_available() {
        tracing::warn!(
            "{API_KEY_ENV} is not set; lesson requests will fail and quizzes will be empty"
        );
    }

    let orchestrator = Orchestrator::new(
        Catalog::builtin(),
        Arc::clone(&gemini) as Arc<dyn LessonGenerator>,
        gemini as Arc<dyn QuizGenerator>,
    )
    .with_events(EventBroadcaster::new(config.event_buffer_size));

    for certification in orchestrator.catalog().certifications() {
        tracing::debug!(%certification, "Certification available");
    }

    let router = create_router(AppState::new(orchestrator));

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to bind to {}:{}: {e}\n\nSuggestion: Try a different port with --port",
                config.host,
                config.port
            )
        })?;
    let addr = listener.local_addr()?;

    println!("HTTP API server running on http://{addr}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("CertPath stopped");
    Ok(())
}

/// Loads configuration from `config_path`, or `certpath.json` in the
/// working directory when no path is given.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Ok(Config::load_from_file(path)?)
        }
        None => Ok(Config::load()?),
    }
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    println!();
    println!("Shutting down...");
}

fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Address: {}:{}", config.host, config.port);
    println!("  Model: {}", config.gemini.model);
    println!("  Request timeout: {}s", config.gemini.timeout_seconds);
    println!("  Quiz questions: {}", config.gemini.quiz.question_count);
}
