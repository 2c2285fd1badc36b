//! pinchpad — a calculator keypad driven by pinch gestures.
//!
//! Hand landmarks come in once per camera frame; a pinch over a keypad
//! button types that key into an arithmetic expression buffer.

pub mod backend;
pub mod calculator;
pub mod config;
pub mod error;
pub mod keypad;
pub mod render;
pub mod session;
pub mod tracking;
