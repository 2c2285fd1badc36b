//! Activation debouncing: continuous pinch signal in, one-shot key presses out.
//!
//! A contact is a continuous pinch over one button.  Each contact fires at
//! most once.  Firing the same button again additionally requires
//! `click_delay_ms` to have passed since its last activation, even across a
//! release, so tracking jitter that briefly breaks the pinch cannot
//! double-fire.  Moving the pinch onto a different button fires immediately.

use tracing::debug;

use super::gesture::{GestureConfig, PinchSignal};
use crate::keypad::{Key, KeypadLayout};

// ── Events ─────────────────────────────────────────────────

/// A single discrete key press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationEvent {
    pub key: Key,
    /// Index of the button in the keypad layout.
    pub button: usize,
    /// Tick time (ms) the event fired.
    pub at_ms: f64,
}

// ── Contact state ──────────────────────────────────────────

/// Debounce state of the current contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    /// No pinch, or pinching over empty space.
    Idle,
    /// Pinching over a button whose activation is still suppressed.
    Contacting { button: usize },
    /// This contact already fired.
    Cooldown { button: usize },
}

impl ContactPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Contacting { .. } => "contacting",
            Self::Cooldown { .. } => "cooldown",
        }
    }

    pub fn button(&self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Contacting { button } | Self::Cooldown { button } => Some(*button),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LastActivation {
    button: usize,
    at_ms: f64,
}

// ── Debouncer ──────────────────────────────────────────────

/// Per-session activation state machine.
pub struct ActivationDebouncer {
    pub config: GestureConfig,
    phase: ContactPhase,
    /// Survives releases; only the click delay check reads it.
    last: Option<LastActivation>,
    /// Total events fired this session.
    activations: u64,
}

impl ActivationDebouncer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            phase: ContactPhase::Idle,
            last: None,
            activations: 0,
        }
    }

    pub fn phase(&self) -> ContactPhase {
        self.phase
    }

    pub fn activations(&self) -> u64 {
        self.activations
    }

    /// Advance one tick.
    ///
    /// `signal` is `None` when no hand was detected.  Also expires the
    /// press feedback on `keypad`.  Returns at most one event.
    pub fn update(
        &mut self,
        keypad: &mut KeypadLayout,
        signal: Option<&PinchSignal>,
        now_ms: f64,
    ) -> Option<ActivationEvent> {
        keypad.refresh_feedback(now_ms, self.config.press_feedback_ms);

        let target = match signal {
            Some(s) if s.pinched => keypad.hit_test(s.point),
            _ => None,
        };

        let Some(button) = target else {
            if self.phase != ContactPhase::Idle {
                debug!(
                    "Contact ended ({}): {} -> idle",
                    match signal {
                        None => "hand lost",
                        Some(s) if !s.pinched => "released",
                        Some(_) => "left button",
                    },
                    self.phase.as_str()
                );
                self.phase = ContactPhase::Idle;
            }
            return None;
        };

        let phase = self.phase;
        match phase {
            ContactPhase::Cooldown { button: b } if b == button => None,
            _ if self.should_fire(button, now_ms) => self.fire(keypad, button, now_ms),
            ContactPhase::Contacting { button: b } if b == button => None,
            _ => {
                debug!("Contact on button {} suppressed by click delay", button);
                self.phase = ContactPhase::Contacting { button };
                None
            }
        }
    }

    /// Different button, or the click delay has passed.
    fn should_fire(&self, button: usize, now_ms: f64) -> bool {
        match self.last {
            None => true,
            Some(last) => last.button != button || now_ms - last.at_ms > self.config.click_delay_ms,
        }
    }

    fn fire(
        &mut self,
        keypad: &mut KeypadLayout,
        button: usize,
        now_ms: f64,
    ) -> Option<ActivationEvent> {
        let key = keypad.button(button)?.key;
        keypad.set_active(button, now_ms);
        self.phase = ContactPhase::Cooldown { button };
        self.last = Some(LastActivation {
            button,
            at_ms: now_ms,
        });
        self.activations += 1;
        debug!("Activation: {:?} (button {}) at {:.0}ms", key, button, now_ms);
        Some(ActivationEvent {
            key,
            button,
            at_ms: now_ms,
        })
    }

    /// Forget the contact and the click delay history.
    pub fn reset(&mut self) {
        self.phase = ContactPhase::Idle;
        self.last = None;
    }

    pub fn status_sexp(&self) -> String {
        let button = self
            .phase
            .button()
            .map(|b| b.to_string())
            .unwrap_or_else(|| "nil".to_string());
        format!(
            "(:phase {} :button {} :activations {} :pinch-threshold {:.1} :click-delay-ms {:.0})",
            self.phase.as_str(),
            button,
            self.activations,
            self.config.pinch_threshold,
            self.config.click_delay_ms,
        )
    }
}

// ── Test helpers ───────────────────────────────────────────

#[cfg(test)]
fn keypad() -> KeypadLayout {
    KeypadLayout::new(&crate::keypad::KeypadSpec::default()).unwrap()
}

/// Pinch (or open hand) with the index fingertip on a button's center.
#[cfg(test)]
fn signal_on(pad: &KeypadLayout, key: Key, pinched: bool) -> PinchSignal {
    let b = pad.button(pad.find(key).unwrap()).unwrap();
    PinchSignal {
        pinched,
        distance: if pinched { 10.0 } else { 120.0 },
        point: b.center,
    }
}

// ── Tests ──────────────────────────────────────────────────
