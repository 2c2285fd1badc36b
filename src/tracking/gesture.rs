//! Pinch classification from fingertip positions.
//!
//! A pinch is the index fingertip and thumb tip closer than
//! `pinch_threshold` pixels.  Stateless: every frame is classified on its own.

use serde::{Deserialize, Serialize};

use super::hand_tracking::FingertipPair;
use crate::keypad::Point;

// ── Config ─────────────────────────────────────────────────

/// Thresholds for pinch detection and activation debouncing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Fingertip distance (pixels) below which the hand counts as pinched.
    pub pinch_threshold: f32,
    /// Minimum interval (ms) before the same button can fire again.
    pub click_delay_ms: f64,
    /// How long (ms) a fired button is shown pressed.
    pub press_feedback_ms: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: 50.0,
            click_delay_ms: 600.0,
            press_feedback_ms: 200.0,
        }
    }
}

// ── Signal ─────────────────────────────────────────────────

/// Result of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchSignal {
    pub pinched: bool,
    /// Fingertip distance that produced `pinched`.
    pub distance: f32,
    /// Point used for hit testing (the index fingertip).
    pub point: Point,
}

/// Classify two fingertip positions.
pub fn classify_pinch(index: Point, thumb: Point, threshold: f32) -> PinchSignal {
    let distance = index.distance(thumb);
    PinchSignal {
        pinched: distance < threshold,
        distance,
        point: index,
    }
}

/// Classify the current frame.  No hand means no signal.
pub fn classify(tips: Option<&FingertipPair>, config: &GestureConfig) -> Option<PinchSignal> {
    tips.map(|t| classify_pinch(t.index, t.thumb, config.pinch_threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinch_below_threshold() {
        let s = classify_pinch(Point::new(100.0, 100.0), Point::new(106.0, 108.0), 50.0);
        assert!(s.pinched);
        assert!((s.distance - 10.0).abs() < 0.001);
        assert_eq!(s.point, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // 3-4-5 triangle scaled to exactly 50px
        let s = classify_pinch(Point::new(0.0, 0.0), Point::new(30.0, 40.0), 50.0);
        assert!((s.distance - 50.0).abs() < 0.001);
        assert!(!s.pinched);
    }

    #[test]
    fn test_open_hand() {
        let s = classify_pinch(Point::new(0.0, 0.0), Point::new(200.0, 0.0), 50.0);
        assert!(!s.pinched);
        assert!((s.distance - 200.0).abs() < 0.001);
    }

    #[test]
    fn test_no_hand_no_signal() {
        assert!(classify(None, &GestureConfig::default()).is_none());
    }

    #[test]
    fn test_classify_uses_index_tip() {
        let tips = FingertipPair {
            index: Point::new(395.0, 455.0),
            thumb: Point::new(400.0, 460.0),
        };
        let s = classify(Some(&tips), &GestureConfig::default()).unwrap();
        assert!(s.pinched);
        assert_eq!(s.point, tips.index);
    }
}
