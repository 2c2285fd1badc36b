//! Render snapshot and the bundled s-expression render sink.
//!
//! The session hands a read-only [`RenderSnapshot`] to a [`RenderSink`]
//! once per tick.  Pixel output belongs to the sink; the snapshot only
//! carries what to draw: display text, history, buttons with their press
//! feedback, and the tracked fingertips.

use std::io::Write;

use anyhow::{Context, Result};
use tracing::trace;

use crate::calculator::ExpressionEngine;
use crate::keypad::{KeypadLayout, Point};
use crate::tracking::FingertipPair;

/// How far (pixels) a button shrinks at the moment it fires.
pub const PRESS_SHRINK_PX: f32 = 8.0;

/// One button as the sink should draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonView {
    pub label: String,
    pub center: Point,
    /// Hit radius minus the press animation shrink.
    pub radius: f32,
    pub pressed: bool,
}

/// Everything a frame needs to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnapshot {
    /// Expression buffer, or the error marker.
    pub display: String,
    pub error: bool,
    /// Newest first.
    pub history: Vec<String>,
    pub buttons: Vec<ButtonView>,
    pub fingertips: Option<FingertipPair>,
}

impl RenderSnapshot {
    pub fn capture(
        keypad: &KeypadLayout,
        engine: &ExpressionEngine,
        fingertips: Option<FingertipPair>,
        now_ms: f64,
        feedback_ms: f64,
    ) -> Self {
        let buttons = keypad
            .buttons()
            .iter()
            .map(|b| {
                let shrink = match b.last_activated_at {
                    Some(t) if b.activation_state => press_shrink(now_ms - t, feedback_ms),
                    _ => 0.0,
                };
                ButtonView {
                    label: b.key.label(),
                    center: b.center,
                    radius: b.radius - shrink,
                    pressed: b.activation_state,
                }
            })
            .collect();

        Self {
            display: engine.display().to_string(),
            error: engine.is_error(),
            history: engine.history().iter().cloned().collect(),
            buttons,
            fingertips,
        }
    }

    /// Serialize as a single-line s-expression.
    pub fn to_sexp(&self) -> String {
        let history = if self.history.is_empty() {
            "nil".to_string()
        } else {
            format!(
                "({})",
                self.history
                    .iter()
                    .map(|h| quote(h))
                    .collect::<Vec<_>>()
                    .join(" ")
            )
        };
        let buttons = self
            .buttons
            .iter()
            .map(|b| {
                format!(
                    "(:label {} :x {:.1} :y {:.1} :radius {:.1} :pressed {})",
                    quote(&b.label),
                    b.center.x,
                    b.center.y,
                    b.radius,
                    if b.pressed { "t" } else { "nil" },
                )
            })
            .collect::<Vec<_>>()
            .join(" ");
        let hand = match &self.fingertips {
            Some(t) => format!(
                "(:index ({:.1} {:.1}) :thumb ({:.1} {:.1}))",
                t.index.x, t.index.y, t.thumb.x, t.thumb.y
            ),
            None => "nil".to_string(),
        };
        format!(
            "(:display {} :error {} :history {} :buttons ({}) :hand {})",
            quote(&self.display),
            if self.error { "t" } else { "nil" },
            history,
            buttons,
            hand,
        )
    }
}

/// Quote a string for an s-expression.
pub fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Radius reduction `elapsed_ms` into a press: full shrink at the moment of
/// firing, easing linearly back to zero over the feedback window.
pub fn press_shrink(elapsed_ms: f64, feedback_ms: f64) -> f32 {
    if feedback_ms <= 0.0 || elapsed_ms >= feedback_ms {
        return 0.0;
    }
    let remaining = ((feedback_ms - elapsed_ms.max(0.0)) / feedback_ms) as f32;
    PRESS_SHRINK_PX * remaining
}

// ── Sinks ──────────────────────────────────────────────────

/// Consumer of per-tick snapshots.
pub trait RenderSink {
    fn present(&mut self, snapshot: &RenderSnapshot) -> Result<()>;
}

/// When the s-expression sink writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// One line per tick.
    Every,
    /// Only when the snapshot differs from the last one written.
    Changes,
    /// Discard snapshots.
    Off,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Every => "every",
            Self::Changes => "changes",
            Self::Off => "none",
        }
    }
}

/// Writes snapshots as one s-expression per line.
pub struct SexpSink<W: Write> {
    out: W,
    mode: RenderMode,
    last: Option<String>,
    /// Lines written.
    pub written: u64,
}

impl<W: Write> SexpSink<W> {
    pub fn new(out: W, mode: RenderMode) -> Self {
        Self {
            out,
            mode,
            last: None,
            written: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderSink for SexpSink<W> {
    fn present(&mut self, snapshot: &RenderSnapshot) -> Result<()> {
        if self.mode == RenderMode::Off {
            return Ok(());
        }
        let line = snapshot.to_sexp();
        if self.mode == RenderMode::Changes && self.last.as_deref() == Some(line.as_str()) {
            trace!("snapshot unchanged, skipping");
            return Ok(());
        }
        writeln!(self.out, "{}", line).context("Failed to write render snapshot")?;
        self.out.flush().context("Failed to flush render sink")?;
        self.written += 1;
        self.last = Some(line);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::CalculatorConfig;
    use crate::keypad::{Key, KeypadSpec};

    fn fixtures() -> (KeypadLayout, ExpressionEngine) {
        let pad = KeypadLayout::new(&KeypadSpec::default()).unwrap();
        let engine = ExpressionEngine::new(CalculatorConfig::default());
        (pad, engine)
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("1+2"), "\"1+2\"");
        assert_eq!(quote("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }

    #[test]
    fn test_press_shrink() {
        assert_eq!(press_shrink(0.0, 200.0), 8.0);
        assert_eq!(press_shrink(100.0, 200.0), 4.0);
        assert_eq!(press_shrink(200.0, 200.0), 0.0);
        assert_eq!(press_shrink(500.0, 200.0), 0.0);
        assert_eq!(press_shrink(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_capture_idle() {
        let (pad, engine) = fixtures();
        let snap = RenderSnapshot::capture(&pad, &engine, None, 0.0, 200.0);
        assert_eq!(snap.display, "");
        assert!(!snap.error);
        assert_eq!(snap.buttons.len(), 16);
        assert!(snap.buttons.iter().all(|b| !b.pressed && b.radius == 85.0));
        assert_eq!(snap.buttons[3].label, "÷");
    }

    #[test]
    fn test_capture_pressed_button_shrinks() {
        let (mut pad, mut engine) = fixtures();
        pad.set_active(0, 1000.0);
        engine.apply_key(Key::Digit(7));
        let snap = RenderSnapshot::capture(&pad, &engine, None, 1100.0, 200.0);
        assert!(snap.buttons[0].pressed);
        assert_eq!(snap.buttons[0].radius, 81.0);
        assert_eq!(snap.display, "7");
    }

    #[test]
    fn test_sexp_format() {
        let (pad, mut engine) = fixtures();
        for k in [Key::Digit(2), Key::Add, Key::Digit(2), Key::Equals] {
            engine.apply_key(k);
        }
        let tips = FingertipPair {
            index: Point::new(10.0, 20.0),
            thumb: Point::new(30.0, 40.0),
        };
        let snap = RenderSnapshot::capture(&pad, &engine, Some(tips), 0.0, 200.0);
        let sexp = snap.to_sexp();
        assert!(sexp.starts_with("(:display \"4\" :error nil :history (\"2+2 = 4\")"));
        assert!(sexp.contains("(:label \"7\" :x 220.0 :y 280.0 :radius 85.0 :pressed nil)"));
        assert!(sexp.ends_with(":hand (:index (10.0 20.0) :thumb (30.0 40.0)))"));
        lexpr::from_str(&sexp).unwrap();
    }

    #[test]
    fn test_sink_changes_mode() {
        let (pad, engine) = fixtures();
        let snap = RenderSnapshot::capture(&pad, &engine, None, 0.0, 200.0);
        let mut sink = SexpSink::new(Vec::new(), RenderMode::Changes);
        sink.present(&snap).unwrap();
        sink.present(&snap).unwrap();
        assert_eq!(sink.written, 1);
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn test_sink_every_and_off() {
        let (pad, engine) = fixtures();
        let snap = RenderSnapshot::capture(&pad, &engine, None, 0.0, 200.0);

        let mut every = SexpSink::new(Vec::new(), RenderMode::Every);
        every.present(&snap).unwrap();
        every.present(&snap).unwrap();
        assert_eq!(every.written, 2);

        let mut off = SexpSink::new(Vec::new(), RenderMode::Off);
        off.present(&snap).unwrap();
        assert!(off.into_inner().is_empty());
    }
}
