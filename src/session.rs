//! Session state — the single context object the tick pipeline runs on.
//!
//! One `Session` owns everything mutable: hand tracking, the keypad and its
//! feedback flags, the activation debouncer and the expression engine.
//! Each camera frame is one call to [`Session::tick`].

use anyhow::{Context, Result};
use tracing::info;

use crate::calculator::{ExpressionEngine, KeyOutcome};
use crate::config::Config;
use crate::keypad::KeypadLayout;
use crate::render::RenderSnapshot;
use crate::tracking::{
    classify, ActivationDebouncer, ActivationEvent, HandLandmarks, HandTrackingState,
    PinchSignal,
};

/// What one tick produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// `None` when no hand was detected.
    pub signal: Option<PinchSignal>,
    pub event: Option<ActivationEvent>,
    /// Result of applying `event` to the expression engine.
    pub applied: Option<KeyOutcome>,
}

/// Central session state.
pub struct Session {
    pub tracking: HandTrackingState,
    pub keypad: KeypadLayout,
    pub debouncer: ActivationDebouncer,
    pub engine: ExpressionEngine,
    /// Ticks processed.
    pub frames: u64,
    /// Ticks whose frame was absent or malformed.
    pub skipped_frames: u64,
}

impl Session {
    pub fn new(config: &Config) -> Result<Self> {
        let keypad = KeypadLayout::new(&config.keypad).context("Invalid keypad layout")?;
        info!(
            "Session ready: {} buttons, pinch < {:.0}px, click delay {:.0}ms, history cap {}",
            keypad.len(),
            config.gesture.pinch_threshold,
            config.gesture.click_delay_ms,
            config.calculator.history_cap
        );
        Ok(Self {
            tracking: HandTrackingState::new(config.tracking.clone()),
            keypad,
            debouncer: ActivationDebouncer::new(config.gesture.clone()),
            engine: ExpressionEngine::new(config.calculator.clone()),
            frames: 0,
            skipped_frames: 0,
        })
    }

    /// Run one frame through the pipeline.
    ///
    /// `hand` is `None` when the source reported no hand or the frame could
    /// not be read.  `now_ms` is the tick clock, sampled once by the caller.
    pub fn tick(&mut self, hand: Option<&HandLandmarks>, now_ms: f64) -> TickOutcome {
        self.frames += 1;
        if hand.is_none() {
            self.skipped_frames += 1;
        }

        let tips = self.tracking.update(hand);
        let signal = classify(tips.as_ref(), &self.debouncer.config);
        let event = self
            .debouncer
            .update(&mut self.keypad, signal.as_ref(), now_ms);
        let applied = event.as_ref().map(|e| self.engine.apply(e));

        TickOutcome {
            signal,
            event,
            applied,
        }
    }

    /// Read-only view for the render sink.
    pub fn snapshot(&self, now_ms: f64) -> RenderSnapshot {
        RenderSnapshot::capture(
            &self.keypad,
            &self.engine,
            self.tracking.tips(),
            now_ms,
            self.debouncer.config.press_feedback_ms,
        )
    }

    pub fn status_sexp(&self) -> String {
        format!(
            "(:frames {} :skipped {} :tracking {} :debounce {} :calculator {})",
            self.frames,
            self.skipped_frames,
            self.tracking.status_sexp(),
            self.debouncer.status_sexp(),
            self.engine.status_sexp(),
        )
    }
}
