//! Virtual keypad layout and hit testing.
//!
//! Builds the fixed button grid from a [`KeypadSpec`], rejects grids whose
//! circular hit regions would overlap, and maps fingertip positions (frame
//! pixels) to buttons.  Also carries the per-button press feedback flags the
//! render sink draws.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LayoutError;

// ── Geometry ───────────────────────────────────────────────

/// A point in frame pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

// ── Keys ───────────────────────────────────────────────────

/// Logical keys on the calculator keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Digit(u8),
    Add,
    Sub,
    Mul,
    Div,
    Equals,
    Clear,
}

impl Key {
    /// Parse a layout label.  Operators accept both ASCII and display forms.
    pub fn from_label(label: &str) -> Option<Key> {
        let key = match label.trim() {
            "+" => Self::Add,
            "-" | "−" => Self::Sub,
            "*" | "×" | "x" => Self::Mul,
            "/" | "÷" => Self::Div,
            "=" => Self::Equals,
            "C" | "c" => Self::Clear,
            s if s.len() == 1 => {
                let d = s.chars().next()?.to_digit(10)?;
                Self::Digit(d as u8)
            }
            _ => return None,
        };
        Some(key)
    }

    /// Character appended to the input buffer, if this key inputs one.
    pub fn input_char(&self) -> Option<char> {
        match self {
            Self::Digit(d) => char::from_digit(u32::from(*d), 10),
            Self::Add => Some('+'),
            Self::Sub => Some('-'),
            Self::Mul => Some('*'),
            Self::Div => Some('/'),
            Self::Equals | Self::Clear => None,
        }
    }

    /// Label drawn on the button.
    pub fn label(&self) -> String {
        match self {
            Self::Digit(d) => d.to_string(),
            Self::Add => "+".to_string(),
            Self::Sub => "−".to_string(),
            Self::Mul => "×".to_string(),
            Self::Div => "÷".to_string(),
            Self::Equals => "=".to_string(),
            Self::Clear => "C".to_string(),
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div)
    }
}

// ── Button ─────────────────────────────────────────────────

/// One interactive instance of a [`Key`].
#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub key: Key,
    /// Center in frame pixels.
    pub center: Point,
    /// Hit radius in pixels.
    pub radius: f32,
    /// True while the post-activation feedback window is open.
    pub activation_state: bool,
    /// Tick time (ms) of the last activation, if any.
    pub last_activated_at: Option<f64>,
}

impl Button {
    /// Whether `p` lies strictly inside this button's hit circle.
    pub fn contains(&self, p: Point) -> bool {
        self.center.distance(p) < self.radius
    }
}

// ── Grid spec ──────────────────────────────────────────────

/// Grid description the keypad is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeypadSpec {
    /// Distance between neighbouring cell centers (pixels).
    pub spacing: f32,
    /// Hit radius of every button (pixels).
    pub radius: f32,
    /// Key labels, row by row.
    pub rows: Vec<Vec<String>>,
    /// Center of the top-left cell (pixels).
    pub origin: Point,
}

impl Default for KeypadSpec {
    fn default() -> Self {
        let rows = [
            ["7", "8", "9", "÷"],
            ["4", "5", "6", "×"],
            ["1", "2", "3", "−"],
            ["C", "0", "=", "+"],
        ];
        Self {
            spacing: 175.0,
            radius: 85.0,
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
            origin: Point::new(220.0, 280.0),
        }
    }
}

// ── Layout ─────────────────────────────────────────────────

/// The fixed button set for a session.
#[derive(Debug, Clone)]
pub struct KeypadLayout {
    buttons: Vec<Button>,
    /// Index of the button currently shown pressed.
    active: Option<usize>,
}

impl KeypadLayout {
    /// Build the button grid, validating geometry and labels.
    pub fn new(spec: &KeypadSpec) -> Result<Self, LayoutError> {
        let (radius, spacing) = (spec.radius, spec.spacing);
        if !(radius.is_finite() && spacing.is_finite()) || radius <= 0.0 || spacing <= 0.0 {
            return Err(LayoutError::InvalidGeometry { radius, spacing });
        }
        if spacing <= 2.0 * radius {
            return Err(LayoutError::Overlap { radius, spacing });
        }

        let cols = spec.rows.first().map(Vec::len).unwrap_or(0);
        if cols == 0 {
            return Err(LayoutError::EmptyGrid);
        }

        let mut buttons = Vec::with_capacity(spec.rows.len() * cols);
        for (row_idx, row) in spec.rows.iter().enumerate() {
            if row.len() != cols {
                return Err(LayoutError::RaggedRow {
                    row: row_idx,
                    expected: cols,
                    found: row.len(),
                });
            }
            for (col_idx, label) in row.iter().enumerate() {
                let key =
                    Key::from_label(label).ok_or_else(|| LayoutError::UnknownKey(label.clone()))?;
                buttons.push(Button {
                    key,
                    center: Point::new(
                        spec.origin.x + col_idx as f32 * spacing,
                        spec.origin.y + row_idx as f32 * spacing,
                    ),
                    radius,
                    activation_state: false,
                    last_activated_at: None,
                });
            }
        }

        debug!(
            "Keypad built: {} buttons ({}x{}), radius {}, spacing {}",
            buttons.len(),
            spec.rows.len(),
            cols,
            radius,
            spacing
        );
        Ok(Self {
            buttons,
            active: None,
        })
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn button(&self, index: usize) -> Option<&Button> {
        self.buttons.get(index)
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    /// Index of the first button bound to `key`.
    pub fn find(&self, key: Key) -> Option<usize> {
        self.buttons.iter().position(|b| b.key == key)
    }

    /// Index of the button whose hit circle contains `p`.
    ///
    /// First match in layout order wins if regions were ever to overlap.
    pub fn hit_test(&self, p: Point) -> Option<usize> {
        self.buttons.iter().position(|b| b.contains(p))
    }

    /// The button whose hit circle contains `p`.
    pub fn button_at(&self, p: Point) -> Option<&Button> {
        self.hit_test(p).map(|i| &self.buttons[i])
    }

    /// Index of the button currently shown pressed.
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Mark a button as just activated.  Clears every other pressed flag.
    pub fn set_active(&mut self, index: usize, now_ms: f64) {
        if index >= self.buttons.len() {
            return;
        }
        for (i, b) in self.buttons.iter_mut().enumerate() {
            b.activation_state = i == index;
        }
        self.buttons[index].last_activated_at = Some(now_ms);
        self.active = Some(index);
    }

    /// Close the feedback window once `window_ms` has passed since the press.
    pub fn refresh_feedback(&mut self, now_ms: f64, window_ms: f64) {
        let Some(i) = self.active else {
            return;
        };
        let expired = self.buttons[i]
            .last_activated_at
            .map_or(true, |t| now_ms - t >= window_ms);
        if expired {
            self.buttons[i].activation_state = false;
            self.active = None;
        }
    }
}

// ── Tests ──────────────────────────────────────────────────
