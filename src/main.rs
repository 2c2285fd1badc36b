//! pinchpad - pinch-gesture calculator keypad.
//!
//! Reads hand landmark frames, turns pinches over keypad buttons into key
//! presses, and writes one render snapshot per tick to stdout.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use pinchpad::backend::{self, BackendType, LoopConfig};
use pinchpad::config::Config;
use pinchpad::render::RenderMode;
use pinchpad::session::Session;

#[derive(Parser, Debug)]
#[command(name = "pinchpad", about = "Pinch-gesture calculator keypad")]
struct Cli {
    /// TOML config file (default: built-in settings)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Landmark source: replay or stdin
    #[arg(long, default_value = "stdin")]
    source: String,

    /// Landmark file for the replay source
    #[arg(long)]
    input: Option<PathBuf>,

    /// Snapshot output: every, changes, or none
    #[arg(long, default_value = "changes")]
    render: String,

    /// Exit after N ticks
    #[arg(long)]
    exit_after_frames: Option<u64>,

    /// Override gesture.pinch_threshold (pixels)
    #[arg(long)]
    pinch_threshold: Option<f32>,

    /// Override gesture.click_delay_ms
    #[arg(long)]
    click_delay_ms: Option<f64>,

    /// Override calculator.history_cap
    #[arg(long)]
    history_cap: Option<usize>,

    /// Seconds between status log lines
    #[arg(long, default_value_t = 60)]
    status_interval: u64,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("pinchpad {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Logs go to stderr; stdout carries snapshots.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pinchpad=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(v) = cli.pinch_threshold {
        config.gesture.pinch_threshold = v;
    }
    if let Some(v) = cli.click_delay_ms {
        config.gesture.click_delay_ms = v;
    }
    if let Some(v) = cli.history_cap {
        config.calculator.history_cap = v;
    }
    config.validate()?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    info!("pinchpad v{} starting", env!("CARGO_PKG_VERSION"));
    info!("source: {}", cli.source);

    let backend_type = match cli.source.as_str() {
        "replay" => BackendType::Replay,
        "stdin" => BackendType::Stdin,
        other => {
            eprintln!("Unknown source: {other}. Use: replay or stdin");
            std::process::exit(1);
        }
    };

    let render = match cli.render.as_str() {
        "every" => RenderMode::Every,
        "changes" => RenderMode::Changes,
        "none" => RenderMode::Off,
        other => {
            eprintln!("Unknown render mode: {other}. Use: every, changes, or none");
            std::process::exit(1);
        }
    };

    let mut session = Session::new(&config)?;
    let loop_config = LoopConfig {
        exit_after_frames: cli.exit_after_frames,
        status_interval: Duration::from_secs(cli.status_interval.max(1)),
    };

    backend::run(backend_type, cli.input, &mut session, render, loop_config)?;
    info!("Final state: {}", session.status_sexp());
    Ok(())
}
