// services/guard-dash/src/main.rs
//
// Terminal dashboard for a face-recognition door-access device
// Live captures, door lock status and manual lock control
//
// Run with: cargo run --bin guard-dash -- --demo

use std::fs::OpenOptions;
use std::io::stdout;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use guard_dash::components::{self, ConnectionPanel, DoorPanel};
use guard_dash::config::{self, GuardDashConfig, SourceMode};
use guard_dash::source::build_source;
use guard_dash::Controller;
use guardkit::config::ObservabilityConfig;

#[derive(Parser, Debug)]
#[command(name = "guard-dash")]
#[command(about = "Terminal dashboard for a face-recognition door-access device")]
#[command(version = "0.1.0")]
struct Args {
    #[arg(short, long, default_value = "config/guard-dash.yaml")]
    config: String,

    /// Run in demo mode with sample data (no backend required)
    #[arg(long, short)]
    demo: bool,

    /// How live data is received
    #[arg(long, value_enum)]
    mode: Option<SourceMode>,

    /// Backend HTTP API base address
    #[arg(long)]
    api_url: Option<String>,

    /// Device WebSocket address
    #[arg(long)]
    ws_url: Option<String>,

    /// UI refresh interval in milliseconds
    #[arg(long, default_value = "100")]
    refresh_ms: u64,
}

impl Args {
    fn apply(&self, config: &mut GuardDashConfig) {
        if self.demo {
            config.dashboard.demo = true;
        }
        if let Some(mode) = self.mode {
            config.dashboard.mode = mode;
        }
        if let Some(api_url) = &self.api_url {
            config.backend.api_url = api_url.clone();
        }
        if let Some(ws_url) = &self.ws_url {
            config.backend.ws_url = ws_url.clone();
        }
    }
}

fn init_tracing(observability: &ObservabilityConfig) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&observability.log_file)
        .with_context(|| format!("opening log file {}", observability.log_file))?;

    let level = &observability.log_level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("guard_dash={level},guardkit={level}").into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = config::load_config(&args.config)?;
    args.apply(&mut config);
    init_tracing(&config.observability)?;

    info!(
        "Starting guard-dash (demo: {}, mode: {:?})",
        config.dashboard.demo, config.dashboard.mode
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    let source = build_source(&config)?;
    let mut controller = Controller::new(&config, source, runtime.handle().clone())?;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Run app
    controller.start();
    let result = run_app(&mut terminal, &mut controller, Duration::from_millis(args.refresh_ms));
    controller.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    runtime.shutdown_timeout(Duration::from_secs(1));
    info!("guard-dash stopped");

    result
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    controller: &mut Controller,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        // Draw UI
        terminal.draw(|frame| components::draw_ui(frame, controller))?;

        // Handle input
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Esc => {
                            if controller.state().expanded.is_some() {
                                controller.collapse();
                            } else {
                                return Ok(());
                            }
                        }
                        KeyCode::Char(' ') => {
                            if DoorPanel::from_state(controller.state()).toggle_enabled() {
                                controller.toggle_door();
                            }
                        }
                        KeyCode::Char('c') => {
                            let panel = ConnectionPanel::new(controller.state(), controller.source());
                            if panel.reconnect_available() {
                                controller.reconnect();
                            }
                        }
                        KeyCode::Enter => controller.toggle_expanded_selected(),
                        KeyCode::Char('d') => controller.download_current(),
                        KeyCode::Char('r') => controller.refresh(),
                        KeyCode::Up => controller.select_prev(),
                        KeyCode::Down => controller.select_next(),
                        _ => {}
                    }
                }
            }
        }

        // Apply background results
        if last_tick.elapsed() >= tick_rate {
            controller.pump();
            last_tick = Instant::now();
        }
    }
}
