//! Headless tick loop — drives a session from a landmark source.
//!
//! One source frame is one tick.  The loop samples the clock once per tick,
//! runs the session pipeline, hands the snapshot to the sink, and handles
//! graceful shutdown and periodic status logging.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, warn};

use super::source::{LandmarkSource, SourceEvent};
use crate::calculator::KeyOutcome;
use crate::render::RenderSink;
use crate::session::Session;

/// Global flag set by SIGTERM/SIGINT handlers.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Loop settings.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Stop after N ticks.
    pub exit_after_frames: Option<u64>,
    /// How often to log a status line.
    pub status_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            exit_after_frames: None,
            status_interval: Duration::from_secs(60),
        }
    }
}

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames: u64,
    pub malformed: u64,
    pub activations: u64,
}

/// Tick clock.  Frame timestamps win; untimed streams fall back to wall
/// time since the loop started.  Never runs backwards.
#[derive(Debug)]
pub struct TickClock {
    start: Instant,
    last_ms: f64,
    timestamped: bool,
}

impl TickClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last_ms: 0.0,
            timestamped: false,
        }
    }

    pub fn sample(&mut self, t_ms: Option<f64>) -> f64 {
        let now = match t_ms {
            Some(t) if t.is_finite() => {
                self.timestamped = true;
                t
            }
            // A timestamped stream with a gap holds the last time.
            _ if self.timestamped => self.last_ms,
            _ => self.start.elapsed().as_secs_f64() * 1000.0,
        };
        self.last_ms = self.last_ms.max(now);
        self.last_ms
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Install signal handlers for graceful shutdown (SIGTERM, SIGINT).
pub fn install_signal_handlers() {
    unsafe {
        let handler = signal_handler as extern "C" fn(libc::c_int) as libc::sighandler_t;
        libc::signal(libc::SIGTERM, handler);
        libc::signal(libc::SIGINT, handler);
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Run ticks until the source ends, the frame limit is hit, or a shutdown
/// signal arrives.
pub fn run_loop(
    session: &mut Session,
    source: &mut dyn LandmarkSource,
    sink: &mut dyn RenderSink,
    config: &LoopConfig,
) -> Result<LoopStats> {
    let mut clock = TickClock::new();
    let mut stats = LoopStats::default();
    let mut last_status_log = Instant::now();

    info!("Entering tick loop");

    loop {
        if SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
            info!("Shutdown signal received, exiting");
            break;
        }

        if let Some(limit) = config.exit_after_frames {
            if stats.frames >= limit {
                info!("Frame limit reached after {} tick(s)", limit);
                break;
            }
        }

        let (t_ms, hand) = match source.next_frame()? {
            SourceEvent::End => {
                info!("Landmark source ended");
                break;
            }
            SourceEvent::Frame(frame) => (frame.t_ms, frame.hand),
            SourceEvent::Malformed(e) => {
                warn!("Skipping malformed frame: {}", e);
                stats.malformed += 1;
                (None, None)
            }
        };

        let now_ms = clock.sample(t_ms);
        let outcome = session.tick(hand.as_ref(), now_ms);
        stats.frames += 1;

        if let Some(event) = &outcome.event {
            stats.activations += 1;
            match &outcome.applied {
                Some(KeyOutcome::Evaluated(result)) => {
                    info!("{} -> {}", event.key.label(), result)
                }
                Some(KeyOutcome::Failed(e)) => info!("{} -> error: {}", event.key.label(), e),
                _ => debug!("{} at {:.0}ms", event.key.label(), event.at_ms),
            }
        }

        sink.present(&session.snapshot(now_ms))?;

        if last_status_log.elapsed() >= config.status_interval {
            info!(
                "Status: {} tick(s), {} activation(s), {} malformed, display {:?}",
                stats.frames,
                stats.activations,
                stats.malformed,
                session.engine.display()
            );
            last_status_log = Instant::now();
        }
    }

    info!(
        "Tick loop finished ({} tick(s), {} activation(s), {} malformed)",
        stats.frames, stats.activations, stats.malformed
    );
    Ok(stats)
}
