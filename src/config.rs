//! Configuration loading and validation.
//!
//! Settings live in a TOML file with one table per subsystem.  Every field
//! has a default, so a partial file (or none at all) is valid.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::calculator::CalculatorConfig;
use crate::keypad::{KeypadLayout, KeypadSpec};
use crate::tracking::{GestureConfig, HandTrackingConfig};

/// Effective configuration for a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gesture: GestureConfig,
    pub tracking: HandTrackingConfig,
    pub calculator: CalculatorConfig,
    pub keypad: KeypadSpec,
}

impl Config {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Check value ranges and that the keypad can be built.
    pub fn validate(&self) -> Result<()> {
        let g = &self.gesture;
        if !(g.pinch_threshold.is_finite() && g.pinch_threshold > 0.0) {
            anyhow::bail!(
                "gesture.pinch_threshold must be a positive number, got {}",
                g.pinch_threshold
            );
        }
        if !(g.click_delay_ms.is_finite() && g.click_delay_ms >= 0.0) {
            anyhow::bail!("gesture.click_delay_ms must be >= 0, got {}", g.click_delay_ms);
        }
        if !(g.press_feedback_ms.is_finite() && g.press_feedback_ms >= 0.0) {
            anyhow::bail!(
                "gesture.press_feedback_ms must be >= 0, got {}",
                g.press_feedback_ms
            );
        }

        let t = &self.tracking;
        if !(0.0..=1.0).contains(&t.min_confidence) {
            anyhow::bail!(
                "tracking.min_confidence must be within 0.0-1.0, got {}",
                t.min_confidence
            );
        }
        if !(0.0..1.0).contains(&t.smoothing) {
            anyhow::bail!("tracking.smoothing must be within 0.0-1.0 (exclusive), got {}", t.smoothing);
        }
        if !(t.frame_width > 0.0 && t.frame_height > 0.0) {
            anyhow::bail!(
                "tracking frame size must be positive, got {}x{}",
                t.frame_width,
                t.frame_height
            );
        }

        if self.calculator.history_cap == 0 {
            anyhow::bail!("calculator.history_cap must be at least 1");
        }

        KeypadLayout::new(&self.keypad).context("Invalid keypad layout")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.gesture.pinch_threshold, 50.0);
        assert_eq!(config.gesture.click_delay_ms, 600.0);
        assert_eq!(config.calculator.history_cap, 15);
        assert_eq!(config.keypad.radius, 85.0);
        assert_eq!(config.keypad.spacing, 175.0);
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml(
            r#"
            [gesture]
            click_delay_ms = 400.0

            [calculator]
            history_cap = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.gesture.click_delay_ms, 400.0);
        assert_eq!(config.gesture.pinch_threshold, 50.0);
        assert_eq!(config.calculator.history_cap, 5);
        assert_eq!(config.keypad, KeypadSpec::default());
    }

    #[test]
    fn test_custom_keypad() {
        let config = Config::from_toml(
            r#"
            [keypad]
            spacing = 120.0
            radius = 50.0
            rows = [["1", "2", "+"], ["C", "0", "="]]
            origin = { x = 100.0, y = 100.0 }
            "#,
        )
        .unwrap();
        let pad = KeypadLayout::new(&config.keypad).unwrap();
        assert_eq!(pad.len(), 6);
    }

    #[test]
    fn test_overlapping_keypad_rejected() {
        let err = Config::from_toml(
            r#"
            [keypad]
            spacing = 100.0
            radius = 60.0
            "#,
        )
        .unwrap_err();
        assert!(
            format!("{:#}", err).contains("overlap"),
            "unexpected error: {:#}",
            err
        );
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(Config::from_toml("[gesture]\npinch_threshold = 0.0").is_err());
        assert!(Config::from_toml("[gesture]\nclick_delay_ms = -1.0").is_err());
        assert!(Config::from_toml("[tracking]\nmin_confidence = 1.5").is_err());
        assert!(Config::from_toml("[tracking]\nsmoothing = 1.0").is_err());
        assert!(Config::from_toml("[calculator]\nhistory_cap = 0").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gesture]\npinch_threshold = 35.0").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.gesture.pinch_threshold, 35.0);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }

    #[test]
    fn test_load_or_default() {
        let config = Config::load_or_default(None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }
}
