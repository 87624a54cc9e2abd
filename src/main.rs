//! session-monitor: dashboard engine for AI coding agent sessions
//!
//! Receives session pushes over a Unix socket, or simulates activity in demo
//! mode, and prints the priority-sorted dashboard on every change.

use clap::{Parser, ValueEnum};
use session_monitor::bridge::UpdateEvent;
use session_monitor::demo::DemoProvider;
use session_monitor::demo_mode::DemoMode;
use session_monitor::display::render_dashboard;
use session_monitor::preferences::{
    CustomNames, JsonFileStore, MemoryStore, PreferenceStore, load_demo_flag, save_custom_name,
    save_demo_flag,
};
use session_monitor::simulation::{DEFAULT_INTERVAL, Simulation};
use session_monitor::{SessionStore, ipc, server};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "session-monitor", about = "Session monitor for AI coding agents")]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Demo simulation tick interval in milliseconds
    #[arg(
        long,
        default_value_t = DEFAULT_INTERVAL.as_millis() as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval_ms: u64,

    /// Dashboard width in columns
    #[arg(long, default_value_t = 100)]
    width: usize,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Show or change the persisted demo-mode preference.
    ///
    /// A running monitor picks the change up on its next start.
    Demo {
        #[arg(value_enum)]
        action: DemoAction,
    },
    /// Send an update event to a running monitor
    Push {
        /// JSON file holding one event, or `-` for stdin
        file: PathBuf,
    },
    /// Show or set a session's display name; an empty name clears it
    Name {
        session_id: String,
        name: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DemoAction {
    On,
    Off,
    Status,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("SESSION_MONITOR_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_preferences() -> Option<JsonFileStore> {
    match JsonFileStore::open_default() {
        Ok(store) => Some(store),
        Err(e) => {
            eprintln!("error: {e}");
            None
        }
    }
}

fn demo_status_line(enabled: bool, changed: bool) -> String {
    let state = if enabled { "on" } else { "off" };
    if changed {
        format!("demo mode: {state} (applies when the monitor next starts)")
    } else {
        format!("demo mode: {state}")
    }
}

fn run_demo_command(action: DemoAction) -> ExitCode {
    let Some(store) = open_preferences() else {
        return ExitCode::FAILURE;
    };

    let before = load_demo_flag(&store);
    match action {
        DemoAction::On => save_demo_flag(&store, true),
        DemoAction::Off => save_demo_flag(&store, false),
        DemoAction::Status => {}
    }
    let after = load_demo_flag(&store);
    println!("{}", demo_status_line(after, before != after));
    ExitCode::SUCCESS
}

fn run_name_command(session_id: &str, name: Option<&str>) -> ExitCode {
    let Some(store) = open_preferences() else {
        return ExitCode::FAILURE;
    };

    if let Some(name) = name {
        save_custom_name(&store, session_id, name);
    }
    match CustomNames::load(&store).get(session_id) {
        Some(name) => println!("{session_id}: {name}"),
        None => println!("{session_id}: (no custom name)"),
    }
    ExitCode::SUCCESS
}

async fn push(file: &Path) -> session_monitor::Result<()> {
    let contents = if file == Path::new("-") {
        std::io::read_to_string(std::io::stdin())?
    } else {
        std::fs::read_to_string(file)?
    };
    let event: UpdateEvent = serde_json::from_str(&contents)?;
    ipc::send_event(&ipc::socket_path(), &event).await
}

async fn run_monitor(interval: Duration, width: usize) {
    let store = SessionStore::new();

    let file_store = match JsonFileStore::open_default() {
        Ok(preferences) => Some(preferences),
        Err(e) => {
            warn!("Preferences unavailable, demo mode will not persist: {}", e);
            None
        }
    };
    let preferences: Box<dyn PreferenceStore> = match file_store.clone() {
        Some(preferences) => Box::new(preferences),
        None => Box::new(MemoryStore::new()),
    };
    let simulation =
        Simulation::new(store.clone(), Arc::new(DemoProvider::new())).with_interval(interval);
    let mut demo = DemoMode::new(simulation, preferences);

    // Names are reread on every render so `session-monitor name` applies live
    let _dashboard = store.subscribe(move |sessions| {
        let names = file_store
            .as_ref()
            .map(|store| CustomNames::load(store))
            .unwrap_or_default();
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", render_dashboard(sessions, &names, width));
    });

    if demo.load_if_active() {
        info!("demo mode active, simulating sessions");
    }

    // Keep serving the simulation even if the socket cannot be bound
    let server = tokio::spawn(server::start(store.clone()));
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
    }
    info!("shutting down");
    server.abort();
    drop(demo);
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Some(Command::Demo { action }) => return run_demo_command(*action),
        Some(Command::Name { session_id, name }) => {
            return run_name_command(session_id, name.as_deref());
        }
        _ => {}
    }

    // Single-threaded runtime: ticks and pushes run to completion one at a time
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(Command::Push { file }) => match runtime.block_on(push(&file)) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        },
        Some(Command::Demo { .. } | Command::Name { .. }) => ExitCode::SUCCESS,
        None => {
            runtime.block_on(run_monitor(
                Duration::from_millis(cli.interval_ms),
                cli.width,
            ));
            ExitCode::SUCCESS
        }
    }
}
