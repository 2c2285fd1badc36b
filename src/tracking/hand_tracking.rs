//! Hand landmark data structures and per-frame tracking state.
//!
//! Models the 21-point hand landmark set emitted by camera-based hand
//! detectors (normalized image coordinates).  Projects the two fingertips
//! the keypad cares about into frame pixels, gates on detection confidence,
//! and optionally smooths them across frames.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::keypad::Point;

// ── Landmark definitions ───────────────────────────────────

/// The 21 hand landmarks, in detector output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }
}

// ── Landmark frame ─────────────────────────────────────────

/// One detected hand: normalized `[x, y]` per landmark plus confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    /// 21 normalized positions indexed by [`HandLandmark`].
    pub points: Vec<[f32; 2]>,
    /// Detection confidence (0.0-1.0).
    pub confidence: f32,
}

impl HandLandmarks {
    /// Build a landmark set where only the index and thumb tips are known.
    pub fn from_tips(index_tip: [f32; 2], thumb_tip: [f32; 2], confidence: f32) -> Self {
        let mut points = vec![[0.0, 0.0]; LANDMARK_COUNT];
        points[HandLandmark::IndexTip.index()] = index_tip;
        points[HandLandmark::ThumbTip.index()] = thumb_tip;
        Self { points, confidence }
    }

    /// Normalized position of a landmark.
    pub fn get(&self, landmark: HandLandmark) -> Option<[f32; 2]> {
        self.points.get(landmark.index()).copied()
    }
}

/// Index fingertip and thumb tip in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FingertipPair {
    pub index: Point,
    pub thumb: Point,
}

// ── Config ─────────────────────────────────────────────────

/// Configuration for landmark projection and filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandTrackingConfig {
    /// Frames below this detection confidence count as "no hand".
    pub min_confidence: f32,
    /// Smoothing factor (0.0 = no smoothing, towards 1.0 = heavier).
    pub smoothing: f32,
    /// Frame width in pixels (normalized x is scaled by this).
    pub frame_width: f32,
    /// Frame height in pixels.
    pub frame_height: f32,
    /// Mirror x so the keypad behaves like a selfie view.
    pub mirror: bool,
}

impl Default for HandTrackingConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            smoothing: 0.0,
            frame_width: 1600.0,
            frame_height: 900.0,
            mirror: false,
        }
    }
}

impl HandTrackingConfig {
    /// Map a normalized landmark into frame pixels.
    pub fn project(&self, p: [f32; 2]) -> Point {
        let x = if self.mirror { 1.0 - p[0] } else { p[0] };
        Point::new(x * self.frame_width, p[1] * self.frame_height)
    }
}

// ── State ──────────────────────────────────────────────────

/// Per-session hand tracking state.
pub struct HandTrackingState {
    pub config: HandTrackingConfig,
    /// Last accepted fingertip pair (after smoothing).
    tips: Option<FingertipPair>,
    /// Whether the last frame had a hand above the confidence floor.
    pub tracking_active: bool,
    /// Confidence of the last accepted frame.
    pub confidence: f32,
}

impl HandTrackingState {
    pub fn new(config: HandTrackingConfig) -> Self {
        Self {
            config,
            tips: None,
            tracking_active: false,
            confidence: 0.0,
        }
    }

    /// Feed one frame.  Returns the fingertips in pixels, or `None` when the
    /// hand is absent or below the confidence floor.
    pub fn update(&mut self, frame: Option<&HandLandmarks>) -> Option<FingertipPair> {
        let Some(hand) = frame else {
            if self.tracking_active {
                debug!("Hand lost");
            }
            self.reset();
            return None;
        };

        if hand.confidence < self.config.min_confidence {
            debug!(
                "Hand tracking: confidence {:.2} below {:.2}, ignoring frame",
                hand.confidence, self.config.min_confidence
            );
            self.reset();
            return None;
        }

        let (Some(index), Some(thumb)) = (
            hand.get(HandLandmark::IndexTip),
            hand.get(HandLandmark::ThumbTip),
        ) else {
            debug!(
                "Hand tracking: expected {} landmarks, got {}",
                LANDMARK_COUNT,
                hand.points.len()
            );
            self.reset();
            return None;
        };

        let raw = FingertipPair {
            index: self.config.project(index),
            thumb: self.config.project(thumb),
        };

        let alpha = self.config.smoothing.clamp(0.0, 0.99);
        let tips = match self.tips {
            Some(prev) if self.tracking_active && alpha > 0.0 => FingertipPair {
                index: lerp_point(prev.index, raw.index, 1.0 - alpha),
                thumb: lerp_point(prev.thumb, raw.thumb, 1.0 - alpha),
            },
            _ => raw,
        };

        self.tips = Some(tips);
        self.tracking_active = true;
        self.confidence = hand.confidence;
        Some(tips)
    }

    /// Last accepted fingertip pair.
    pub fn tips(&self) -> Option<FingertipPair> {
        self.tips
    }

    /// Drop all tracking data.
    pub fn reset(&mut self) {
        self.tips = None;
        self.tracking_active = false;
        self.confidence = 0.0;
    }

    pub fn status_sexp(&self) -> String {
        format!(
            "(:tracking {} :confidence {:.2} :min-confidence {:.2} :smoothing {:.2} :mirror {})",
            if self.tracking_active { "t" } else { "nil" },
            self.confidence,
            self.config.min_confidence,
            self.config.smoothing,
            if self.config.mirror { "t" } else { "nil" },
        )
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn lerp_point(a: Point, b: Point, t: f32) -> Point {
    Point::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t))
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(index: [f32; 2], thumb: [f32; 2]) -> HandLandmarks {
        HandLandmarks::from_tips(index, thumb, 0.9)
    }

    #[test]
    fn test_landmark_indices() {
        assert_eq!(HandLandmark::Wrist.index(), 0);
        assert_eq!(HandLandmark::ThumbTip.index(), 4);
        assert_eq!(HandLandmark::IndexTip.index(), 8);
        assert_eq!(HandLandmark::PinkyTip.index(), LANDMARK_COUNT - 1);
        assert_eq!(HandLandmark::IndexTip.as_str(), "index-tip");
    }

    #[test]
    fn test_projection() {
        let state = HandTrackingState::new(HandTrackingConfig::default());
        let p = state.config.project([0.5, 0.5]);
        assert_eq!(p, Point::new(800.0, 450.0));
    }

    #[test]
    fn test_mirrored_projection() {
        let config = HandTrackingConfig {
            mirror: true,
            ..HandTrackingConfig::default()
        };
        let p = config.project([0.25, 0.0]);
        assert_eq!(p, Point::new(1200.0, 0.0));
    }

    #[test]
    fn test_update_valid() {
        let mut state = HandTrackingState::new(HandTrackingConfig::default());
        let tips = state.update(Some(&hand([0.5, 0.5], [0.25, 0.5]))).unwrap();
        assert_eq!(tips.index, Point::new(800.0, 450.0));
        assert_eq!(tips.thumb, Point::new(400.0, 450.0));
        assert!(state.tracking_active);
    }

    #[test]
    fn test_absent_hand_resets() {
        let mut state = HandTrackingState::new(HandTrackingConfig::default());
        state.update(Some(&hand([0.5, 0.5], [0.5, 0.5])));
        assert!(state.update(None).is_none());
        assert!(!state.tracking_active);
        assert!(state.tips().is_none());
    }

    #[test]
    fn test_low_confidence_is_absent() {
        let mut state = HandTrackingState::new(HandTrackingConfig::default());
        let mut h = hand([0.5, 0.5], [0.5, 0.5]);
        h.confidence = 0.5;
        assert!(state.update(Some(&h)).is_none());
        assert!(!state.tracking_active);
    }

    #[test]
    fn test_short_landmark_set_is_absent() {
        let mut state = HandTrackingState::new(HandTrackingConfig::default());
        let h = HandLandmarks {
            points: vec![[0.5, 0.5]; 5],
            confidence: 0.9,
        };
        assert!(state.update(Some(&h)).is_none());
    }

    #[test]
    fn test_smoothing() {
        let mut state = HandTrackingState::new(HandTrackingConfig {
            smoothing: 0.5,
            ..HandTrackingConfig::default()
        });

        // First frame is taken as-is
        let first = state.update(Some(&hand([0.5, 0.5], [0.5, 0.5]))).unwrap();
        assert_eq!(first.index.x, 800.0);

        // Second frame moves halfway: lerp(800, 1600, 0.5) = 1200
        let second = state.update(Some(&hand([1.0, 0.5], [0.5, 0.5]))).unwrap();
        assert!(
            (second.index.x - 1200.0).abs() < 0.01,
            "Expected ~1200 after smoothing, got {}",
            second.index.x
        );
    }

    #[test]
    fn test_smoothing_restarts_after_loss() {
        let mut state = HandTrackingState::new(HandTrackingConfig {
            smoothing: 0.5,
            ..HandTrackingConfig::default()
        });
        state.update(Some(&hand([0.5, 0.5], [0.5, 0.5])));
        state.update(None);
        let tips = state.update(Some(&hand([1.0, 0.5], [0.5, 0.5]))).unwrap();
        assert_eq!(tips.index.x, 1600.0);
    }

    #[test]
    fn test_status_sexp() {
        let state = HandTrackingState::new(HandTrackingConfig::default());
        let sexp = state.status_sexp();
        assert!(sexp.contains(":tracking nil"));
        assert!(sexp.contains(":min-confidence 0.70"));
        assert!(sexp.contains(":mirror nil"));
    }
}
