use std::path::Path;

use anyhow::Context;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::snapping::SnapSettings;

/// Tuning values for the placement controls.
///
/// The host owns persistence; this struct only describes the shape and
/// accepts JSON so a settings file can be dropped next to the project.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacerSettings {
    /// Seconds between two presses of the same axis key that count as a double tap.
    pub double_tap_window: f64,
    /// Seconds a typed number stays open without further input.
    pub numeric_grace_period: f64,
    /// World units per pixel per unit of camera distance for free grabs.
    pub mouse_translate_sensitivity: f32,
    /// Radians per pixel of horizontal mouse motion.
    pub mouse_rotation_sensitivity: f32,
    /// Scale units per pixel of horizontal mouse motion.
    pub mouse_scale_sensitivity: f32,
    pub height_step: f32,
    pub position_step: f32,
    pub rotation_step_degrees: f32,
    pub scale_step: f32,
    pub wheel_height_step: f32,
    pub wheel_rotation_step_degrees: f32,
    pub wheel_scale_step: f32,
    /// Lower bound applied to every scale component.
    pub min_scale: f32,
    pub snap: SnapSettings,
}

impl Default for PlacerSettings {
    fn default() -> Self {
        Self {
            double_tap_window: 0.3,
            numeric_grace_period: 3.0,
            mouse_translate_sensitivity: 0.003,
            mouse_rotation_sensitivity: 0.01,
            mouse_scale_sensitivity: 0.005,
            height_step: 0.1,
            position_step: 0.25,
            rotation_step_degrees: 15.0,
            scale_step: 0.1,
            wheel_height_step: 0.05,
            wheel_rotation_step_degrees: 5.0,
            wheel_scale_step: 0.05,
            min_scale: 0.01,
            snap: SnapSettings::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to parse placer settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("setting `{name}` must be a finite, non-negative number (got {value})")]
    InvalidValue { name: &'static str, value: f64 },
    #[error("setting `min_scale` must be greater than zero")]
    NonPositiveMinScale,
}

impl PlacerSettings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json_string(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let checks: [(&'static str, f64); 16] = [
            ("double_tap_window", self.double_tap_window),
            ("numeric_grace_period", self.numeric_grace_period),
            ("mouse_translate_sensitivity", self.mouse_translate_sensitivity as f64),
            ("mouse_rotation_sensitivity", self.mouse_rotation_sensitivity as f64),
            ("mouse_scale_sensitivity", self.mouse_scale_sensitivity as f64),
            ("height_step", self.height_step as f64),
            ("position_step", self.position_step as f64),
            ("rotation_step_degrees", self.rotation_step_degrees as f64),
            ("scale_step", self.scale_step as f64),
            ("wheel_height_step", self.wheel_height_step as f64),
            ("wheel_rotation_step_degrees", self.wheel_rotation_step_degrees as f64),
            ("wheel_scale_step", self.wheel_scale_step as f64),
            ("min_scale", self.min_scale as f64),
            ("snap.translate_increment", self.snap.translate_increment as f64),
            ("snap.rotate_increment", self.snap.rotate_increment as f64),
            ("snap.scale_increment", self.snap.scale_increment as f64),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::InvalidValue { name, value });
            }
        }
        if self.min_scale <= 0.0 {
            return Err(SettingsError::NonPositiveMinScale);
        }
        Ok(())
    }
}

/// Read and validate a JSON settings file.
pub fn load_settings_file(path: &Path) -> anyhow::Result<PlacerSettings> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading placer settings from {}", path.display()))?;
    PlacerSettings::from_json_str(&json)
        .with_context(|| format!("loading placer settings from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(PlacerSettings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings =
            PlacerSettings::from_json_str(r#"{ "height_step": 0.5, "snap": { "translate_snap": true } }"#)
                .unwrap();
        assert_eq!(settings.height_step, 0.5);
        assert!(settings.snap.translate_snap);
        assert_eq!(settings.snap.translate_increment, 0.25);
        assert_eq!(settings.double_tap_window, 0.3);
    }

    #[test]
    fn test_negative_value_rejected() {
        let err = PlacerSettings::from_json_str(r#"{ "scale_step": -1.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidValue {
                name: "scale_step",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_min_scale_rejected() {
        let err = PlacerSettings::from_json_str(r#"{ "min_scale": 0.0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::NonPositiveMinScale));
    }

    #[test]
    fn test_malformed_json() {
        let err = PlacerSettings::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = PlacerSettings::default();
        settings.rotation_step_degrees = 45.0;
        let json = settings.to_json_string().unwrap();
        assert_eq!(PlacerSettings::from_json_str(&json).unwrap(), settings);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_settings_file(Path::new("/nonexistent/placer.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/placer.json"));
    }
}
