use bevy::prelude::*;
use placer_geometry::{Axis, AxisMask};
use serde::{Deserialize, Serialize};

use crate::axis_constraint::{AxisConstraintState, AxisPress};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum ControlMode {
    #[default]
    Position,
    Rotation,
    Scale,
}

impl ControlMode {
    pub const fn label(self) -> &'static str {
        match self {
            ControlMode::Position => "position",
            ControlMode::Rotation => "rotation",
            ControlMode::Scale => "scale",
        }
    }
}

/// Modal state of a placement or transform session.
///
/// Axis constraints only steer movement while a modal grab is active;
/// leaving modal through any path clears them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlModeState {
    mode: ControlMode,
    modal_active: bool,
    axes: AxisConstraintState,
}

impl ControlModeState {
    pub fn new(double_tap_window: f64) -> Self {
        Self {
            axes: AxisConstraintState::new(double_tap_window),
            ..default()
        }
    }

    pub fn switch_to_position_mode(&mut self, activate_modal: bool) {
        self.switch_to(ControlMode::Position, activate_modal);
    }

    pub fn switch_to_rotation_mode(&mut self, activate_modal: bool) {
        self.switch_to(ControlMode::Rotation, activate_modal);
    }

    pub fn switch_to_scale_mode(&mut self, activate_modal: bool) {
        self.switch_to(ControlMode::Scale, activate_modal);
    }

    /// Set the mode. `activate_modal == false` ends any running grab.
    pub fn switch_to(&mut self, mode: ControlMode, activate_modal: bool) {
        self.mode = mode;
        if activate_modal {
            self.modal_active = true;
        } else {
            self.deactivate_modal();
        }
    }

    pub fn deactivate_modal(&mut self) {
        self.modal_active = false;
        self.axes.clear();
    }

    pub fn reset(&mut self) {
        self.mode = ControlMode::Position;
        self.deactivate_modal();
    }

    pub fn process_axis_key_press(&mut self, axis: Axis, now: f64, current_position: Vec3) -> AxisPress {
        self.axes.process_axis_key_press(axis, now, current_position)
    }

    pub fn process_plane_key_press(&mut self, excluded: Axis, now: f64, current_position: Vec3) {
        self.axes.process_plane_key_press(excluded, now, current_position);
    }

    pub fn control_mode(&self) -> ControlMode {
        self.mode
    }

    pub fn is_modal_active(&self) -> bool {
        self.modal_active
    }

    pub fn is_position_mode(&self) -> bool {
        self.mode == ControlMode::Position
    }

    pub fn is_rotation_mode(&self) -> bool {
        self.mode == ControlMode::Rotation
    }

    pub fn is_scale_mode(&self) -> bool {
        self.mode == ControlMode::Scale
    }

    pub fn has_axis_constraint(&self) -> bool {
        self.axes.has_axis_constraint()
    }

    pub fn is_x_constrained(&self) -> bool {
        self.axes.is_x_constrained()
    }

    pub fn is_y_constrained(&self) -> bool {
        self.axes.is_y_constrained()
    }

    pub fn is_z_constrained(&self) -> bool {
        self.axes.is_z_constrained()
    }

    pub fn axis_constraints(&self) -> AxisMask {
        self.axes.locked_mask()
    }

    pub fn constraint_origin(&self) -> Option<Vec3> {
        self.axes.constraint_origin()
    }

    pub fn has_constraint_origin(&self) -> bool {
        self.constraint_origin().is_some()
    }
}
