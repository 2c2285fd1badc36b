//! Domain error types.
//!
//! Layout and evaluation failures are typed so callers can match on them;
//! application plumbing wraps them in `anyhow`.

use thiserror::Error;

/// Keypad construction failures, rejected at startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// The grid has no rows or no columns.
    #[error("keypad grid is empty")]
    EmptyGrid,

    /// A row has a different number of cells than the first row.
    #[error("keypad row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A cell label is not part of the key alphabet.
    #[error("unknown key label {0:?}")]
    UnknownKey(String),

    /// Hit radius or spacing is zero, negative or not finite.
    #[error("invalid keypad geometry: radius {radius}, spacing {spacing}")]
    InvalidGeometry { radius: f32, spacing: f32 },

    /// Neighbouring hit regions would overlap.
    #[error("hit regions overlap: spacing {spacing} must exceed twice the radius {radius}")]
    Overlap { radius: f32, spacing: f32 },
}

/// Arithmetic evaluation failures. All are recoverable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,

    #[error("unsupported character {ch:?} at {pos}")]
    UnsupportedToken { ch: char, pos: usize },

    #[error("malformed number {0:?}")]
    BadNumber(String),

    #[error("unexpected token at {0}")]
    UnexpectedToken(usize),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unbalanced parentheses")]
    UnbalancedParens,

    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NonFinite,
}

/// A landmark frame that could not be decoded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("malformed s-expression: {0}")]
    Syntax(String),

    #[error("frame is not a property list")]
    NotPlist,

    #[error("bad point for {key}: expected (x y)")]
    BadPoint { key: &'static str },

    #[error("expected {expected} landmarks, got {found}")]
    LandmarkCount { expected: usize, found: usize },
}
