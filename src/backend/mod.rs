//! Backend abstraction — landmark sources and the headless tick loop.

pub mod headless;
pub mod source;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::render::{RenderMode, SexpSink};
use crate::session::Session;
pub use headless::{LoopConfig, LoopStats};
pub use source::{Frame, LandmarkSource, SexpSource, SourceEvent};

/// Landmark source selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Recorded frames from a file.
    Replay,
    /// Live frames piped on stdin.
    Stdin,
}

impl BackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replay => "replay",
            Self::Stdin => "stdin",
        }
    }
}

/// Run a session with the selected source, rendering to stdout.
pub fn run(
    backend: BackendType,
    input: Option<PathBuf>,
    session: &mut Session,
    render: RenderMode,
    loop_config: LoopConfig,
) -> Result<LoopStats> {
    // Signal handling via libc
    headless::install_signal_handlers();

    let stdout = io::stdout();
    let mut sink = SexpSink::new(stdout.lock(), render);
    info!("Rendering snapshots: {}", render.as_str());

    let stats = match backend {
        BackendType::Replay => {
            let path = input.context("Replay source needs --input FILE")?;
            let file = File::open(&path)
                .with_context(|| format!("Failed to open replay file: {}", path.display()))?;
            info!("Replaying landmarks from {}", path.display());
            let mut source = SexpSource::new(BufReader::new(file));
            headless::run_loop(session, &mut source, &mut sink, &loop_config)?
        }
        BackendType::Stdin => {
            info!("Reading landmarks from stdin");
            let stdin = io::stdin();
            let mut source = SexpSource::new(stdin.lock());
            headless::run_loop(session, &mut source, &mut sink, &loop_config)?
        }
    };
    Ok(stats)
}
