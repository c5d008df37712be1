use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::control_mode::ControlMode;

/// Grid, angle and scale steps used while a modal grab runs.
///
/// Each mode has its own on/off flag. Holding Ctrl flips the flag for the
/// current frame without touching the stored value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    pub translate_snap: bool,
    /// World units.
    pub translate_increment: f32,
    pub rotate_snap: bool,
    /// Radians.
    pub rotate_increment: f32,
    pub scale_snap: bool,
    pub scale_increment: f32,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            translate_snap: false,
            translate_increment: 0.25,
            rotate_snap: false,
            rotate_increment: 15.0_f32.to_radians(),
            scale_snap: false,
            scale_increment: 0.1,
        }
    }
}

impl SnapSettings {
    /// Stored flag for the operation `mode` drives.
    pub fn enabled_for(&self, mode: ControlMode) -> bool {
        match mode {
            ControlMode::Position => self.translate_snap,
            ControlMode::Rotation => self.rotate_snap,
            ControlMode::Scale => self.scale_snap,
        }
    }

    pub fn increment_for(&self, mode: ControlMode) -> f32 {
        match mode {
            ControlMode::Position => self.translate_increment,
            ControlMode::Rotation => self.rotate_increment,
            ControlMode::Scale => self.scale_increment,
        }
    }

    /// Flip the stored flag for `mode` and return the new value.
    pub fn toggle_for(&mut self, mode: ControlMode) -> bool {
        let flag = match mode {
            ControlMode::Position => &mut self.translate_snap,
            ControlMode::Rotation => &mut self.rotate_snap,
            ControlMode::Scale => &mut self.scale_snap,
        };
        *flag = !*flag;
        *flag
    }

    /// Whether snapping applies this frame: the stored flag, inverted by Ctrl.
    pub fn active_for(&self, mode: ControlMode, ctrl_held: bool) -> bool {
        self.enabled_for(mode) != ctrl_held
    }

    /// Round each component of `v` to the mode's increment when snapping applies.
    pub fn snap_vec3(&self, mode: ControlMode, v: Vec3, ctrl_held: bool) -> Vec3 {
        if !self.active_for(mode, ctrl_held) {
            return v;
        }
        let step = self.increment_for(mode);
        if step > 0.0 {
            (v / step).round() * step
        } else {
            v
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_inverts_snapping() {
        let settings = SnapSettings::default();
        let v = Vec3::new(0.3, 0.0, -0.6);
        assert!(!settings.active_for(ControlMode::Position, false));
        assert!(settings.active_for(ControlMode::Position, true));
        assert_eq!(settings.snap_vec3(ControlMode::Position, v, false), v);
        assert_eq!(
            settings.snap_vec3(ControlMode::Position, v, true),
            Vec3::new(0.25, 0.0, -0.5)
        );
    }

    #[test]
    fn test_ctrl_disables_enabled_snapping() {
        let settings = SnapSettings {
            rotate_snap: true,
            ..default()
        };
        let v = Vec3::new(0.0, 0.1, 0.0);
        assert_eq!(settings.snap_vec3(ControlMode::Rotation, v, false), Vec3::ZERO);
        assert_eq!(settings.snap_vec3(ControlMode::Rotation, v, true), v);
    }

    #[test]
    fn test_toggle_for_mode() {
        let mut settings = SnapSettings::default();
        assert!(settings.toggle_for(ControlMode::Rotation));
        assert!(settings.enabled_for(ControlMode::Rotation));
        assert!(!settings.enabled_for(ControlMode::Position));
        assert!(!settings.toggle_for(ControlMode::Rotation));
    }

    #[test]
    fn test_zero_increment_leaves_value() {
        let settings = SnapSettings {
            scale_snap: true,
            scale_increment: 0.0,
            ..default()
        };
        let v = Vec3::splat(1.234);
        assert_eq!(settings.snap_vec3(ControlMode::Scale, v, false), v);
    }
}
