//! Hand tracking pipeline — landmarks to pinch signal to key activations.
//!
//! Provides:
//! - `hand_tracking`: landmark model, pixel projection, confidence gate, smoothing
//! - `gesture`: stateless pinch classifier
//! - `activation`: per-contact debounce state machine

pub mod activation;
pub mod gesture;
pub mod hand_tracking;

pub use activation::{ActivationDebouncer, ActivationEvent, ContactPhase};
pub use gesture::{classify, classify_pinch, GestureConfig, PinchSignal};
pub use hand_tracking::{
    FingertipPair, HandLandmark, HandLandmarks, HandTrackingConfig, HandTrackingState,
    LANDMARK_COUNT,
};
