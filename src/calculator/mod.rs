//! Expression engine — input buffer, evaluation and bounded history.
//!
//! Applies key activations one at a time.  Digits and operators extend the
//! buffer, `C` clears it, `=` evaluates it with the restricted evaluator in
//! [`eval`] and chains the result into the next expression.

pub mod eval;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::EvalError;
use crate::keypad::Key;
use crate::render::quote;
use crate::tracking::ActivationEvent;

pub use eval::{eval_expression, format_number};

/// Text shown in place of the buffer after a failed evaluation.
pub const ERROR_MARKER: &str = "Error";

// ── Config ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Maximum retained history entries.
    pub history_cap: usize,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self { history_cap: 15 }
    }
}

// ── Buffer ─────────────────────────────────────────────────

/// The input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Buffer {
    Input(String),
    /// The last evaluation failed.
    Error,
}

impl Buffer {
    /// What the display shows.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Input(s) => s,
            Self::Error => ERROR_MARKER,
        }
    }
}

/// What applying one key did.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Appended(char),
    /// Leading operator on an empty buffer, or `=` with nothing to evaluate.
    Ignored,
    Cleared,
    /// `=` succeeded; carries the history entry.
    Evaluated(String),
    Failed(EvalError),
}

// ── Engine ─────────────────────────────────────────────────

pub struct ExpressionEngine {
    pub config: CalculatorConfig,
    buffer: Buffer,
    /// Newest first.
    history: VecDeque<String>,
}

impl ExpressionEngine {
    pub fn new(config: CalculatorConfig) -> Self {
        let history = VecDeque::with_capacity(config.history_cap);
        Self {
            config,
            buffer: Buffer::Input(String::new()),
            history,
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Display text: the expression, or the error marker.
    pub fn display(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn is_error(&self) -> bool {
        self.buffer == Buffer::Error
    }

    /// Completed `"expr = result"` entries, newest first.
    pub fn history(&self) -> &VecDeque<String> {
        &self.history
    }

    pub fn apply(&mut self, event: &ActivationEvent) -> KeyOutcome {
        self.apply_key(event.key)
    }

    pub fn apply_key(&mut self, key: Key) -> KeyOutcome {
        match key {
            Key::Clear => {
                self.buffer = Buffer::Input(String::new());
                debug!("Buffer cleared");
                KeyOutcome::Cleared
            }
            Key::Equals => self.evaluate(),
            _ => {
                let Some(ch) = key.input_char() else {
                    return KeyOutcome::Ignored;
                };
                // Any input after an error starts a fresh expression.
                if self.buffer == Buffer::Error {
                    self.buffer = Buffer::Input(String::new());
                }
                let Buffer::Input(text) = &mut self.buffer else {
                    return KeyOutcome::Ignored;
                };
                if text.is_empty() && key.is_operator() && key != Key::Sub {
                    debug!("Leading operator {:?} ignored", key);
                    return KeyOutcome::Ignored;
                }
                text.push(ch);
                KeyOutcome::Appended(ch)
            }
        }
    }

    fn evaluate(&mut self) -> KeyOutcome {
        let expr = match &self.buffer {
            Buffer::Input(s) if !s.is_empty() => s.clone(),
            _ => return KeyOutcome::Ignored,
        };

        match eval_expression(&expr) {
            Ok(value) => {
                let result = format_number(value);
                let entry = format!("{} = {}", expr, result);
                debug!("Evaluated {}", entry);
                self.push_history(entry.clone());
                self.buffer = Buffer::Input(result);
                KeyOutcome::Evaluated(entry)
            }
            Err(e) => {
                warn!("Evaluation of {:?} failed: {}", expr, e);
                self.buffer = Buffer::Error;
                KeyOutcome::Failed(e)
            }
        }
    }

    fn push_history(&mut self, entry: String) {
        self.history.push_front(entry);
        self.history.truncate(self.config.history_cap);
    }

    pub fn status_sexp(&self) -> String {
        format!(
            "(:buffer {} :error {} :history-len {} :history-cap {})",
            quote(self.display()),
            if self.is_error() { "t" } else { "nil" },
            self.history.len(),
            self.config.history_cap,
        )
    }
}
