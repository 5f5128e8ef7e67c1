//! happy - prototyping framework runtime

mod banner;
mod color;
mod config;
mod demo;
mod flag_parser;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use happy_collab::{Level, TracingLogger};
use happy_core::{Address, OptionStore, Session};
use happy_engine::Engine;

use flag_parser::ClapFlagParser;

/// Reserved global flags (spec §6): `--debug`, `--system-debug`,
/// `--verbose`, `--no-color`, `--version`, `--help`, `--profile`, `-x`.
#[derive(Parser, Debug)]
#[command(name = "happy", version, styles = color::styles())]
struct Cli {
    /// Enable debug-level logging.
    #[arg(long, global = true)]
    debug: bool,

    /// Enable system-debug-level logging (below debug, most verbose).
    #[arg(long, global = true)]
    system_debug: bool,

    /// Enable verbose (info-level) logging.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Disable ANSI color in logs and banner output.
    #[arg(long, global = true)]
    no_color: bool,

    /// Load addon/profile settings from this TOML file.
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// Reserved experimental-features flag; no behavior is gated on it yet.
    #[arg(short = 'x', global = true)]
    experimental: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the engine with the bundled demo addon and run until interrupted.
    Run,
}

fn log_level(cli: &Cli) -> Level {
    if cli.system_debug {
        Level::SystemDebug
    } else if cli.debug {
        Level::Debug
    } else if cli.verbose {
        Level::Info
    } else {
        Level::Notice
    }
}

/// Mirrors `happy_collab::Level`'s own mapping onto `tracing::Level` (that
/// mapping is private to the collaborator trait, not reusable here).
fn env_filter_directive(level: Level) -> &'static str {
    match level {
        Level::SystemDebug | Level::Debug => "debug",
        Level::Warn | Level::Deprecated | Level::NotImplemented => "warn",
        Level::Error | Level::Issue => "error",
        Level::Info | Level::Task | Level::Ok | Level::Notice | Level::Out => "info",
    }
}

fn setup_logging(level: Level, no_color: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter_directive(level)));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(!no_color && color::should_colorize()))
        .init();
}

fn build_options(cli: &Cli) -> anyhow::Result<OptionStore> {
    let store = OptionStore::new(false);
    store.set_defaults(vec![(
        "demo.heartbeat.every_n_ticks".to_string(),
        happy_collab::Variable::Int(50),
        happy_core::OptionKind::Setting,
        false,
    )]);
    if let Some(path) = &cli.profile {
        config::load_into(&store, path)?;
    }
    if cli.experimental {
        store.set("app.experimental", happy_collab::Variable::Bool(true))?;
    }
    Ok(store)
}

/// Registers the bundled demo addon, starts the engine, and blocks until
/// the session's signal trap (or a terminal engine error) closes `Done`.
async fn run(session: Arc<Session>) -> anyhow::Result<()> {
    let engine = Engine::new(session.clone());
    demo::addon()
        .register(session.clone(), &engine)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    engine.start().await.map_err(|e| anyhow::anyhow!(e))?;
    session.logger().ok("engine started, awaiting interrupt", &[]);

    session.done().await;
    engine.stop().await;

    match session.err() {
        Some(err) if !err.is_session_destroyed() => Err(anyhow::anyhow!(err)),
        _ => Ok(()),
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let command = Cli::command();
    let matches = command.get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => {
            e.exit();
        }
    };
    // Never consulted by this binary's own flags (clap already parsed
    // them); constructed so addons depending on `happy_collab::FlagParser`
    // have a production implementation to call.
    let _flags = ClapFlagParser::new("happy", &matches);

    let Some(command) = cli.command else {
        banner::print_version(cli.no_color);
        return std::process::ExitCode::SUCCESS;
    };

    setup_logging(log_level(&cli), cli.no_color);

    let options = match build_options(&cli) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    let logger = Arc::new(TracingLogger::new(log_level(&cli)));
    let session = Session::new(logger, options, Address::current());
    session.start();

    let outcome = match command {
        Commands::Run => run(session).await,
    };

    match outcome {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", color::header("error:"));
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
