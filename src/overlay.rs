use bevy::{gizmos::config::GizmoConfigStore, prelude::*};
use placer_geometry::{Axis, AxisMask};

use crate::{PlacerSet, control_mode::ControlMode, router::OverlaySink};

const LINE_LENGTH: f32 = 50.0;

/// What the placer wants shown on screen this frame.
///
/// Hosts read [`OverlayState::status_line`] for their own status bar; the
/// constraint lines are drawn here with gizmos.
#[derive(Resource, Clone, Debug, Default, PartialEq)]
pub struct OverlayState {
    pub mode: ControlMode,
    pub modal_active: bool,
    pub constraints: AxisMask,
    pub constraint_origin: Option<Vec3>,
    pub numeric_text: Option<String>,
}

impl OverlaySink for OverlayState {
    fn show_mode(&mut self, mode: ControlMode, modal_active: bool) {
        self.mode = mode;
        self.modal_active = modal_active;
    }

    fn show_axis_constraints(&mut self, constraints: AxisMask, origin: Option<Vec3>) {
        self.constraints = constraints;
        self.constraint_origin = origin;
    }

    fn show_numeric_input(&mut self, text: Option<String>) {
        self.numeric_text = text;
    }
}

impl OverlayState {
    /// e.g. `Rotation [Z] rotate_z +45`.
    pub fn status_line(&self) -> String {
        let mut line = match self.mode {
            ControlMode::Position => "Position",
            ControlMode::Rotation => "Rotation",
            ControlMode::Scale => "Scale",
        }
        .to_string();
        if !self.modal_active {
            line.push_str(" (idle)");
        }
        if !self.constraints.is_empty() {
            let axes: String = self.constraints.axes().map(Axis::label).collect();
            line.push_str(&format!(" [{axes}]"));
        }
        if let Some(text) = &self.numeric_text {
            line.push(' ');
            line.push_str(text);
        }
        line
    }
}

pub struct OverlayPlugin;

impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OverlayState>()
            .add_systems(
                Update,
                draw_constraint_lines
                    .after(PlacerSet::Route)
                    .run_if(resource_exists::<GizmoConfigStore>),
            );
    }
}

fn draw_constraint_lines(overlay: Res<OverlayState>, mut gizmos: Gizmos) {
    if !overlay.modal_active {
        return;
    }
    let Some(origin) = overlay.constraint_origin else {
        return;
    };

    // A plane shows both of its axes dimmed.
    let alpha = if overlay.constraints.count() > 1 { 0.4 } else { 1.0 };
    for axis in overlay.constraints.axes() {
        let dir = axis.unit();
        gizmos.line(
            origin - dir * LINE_LENGTH,
            origin + dir * LINE_LENGTH,
            axis_color(axis).with_alpha(alpha),
        );
    }
}

fn axis_color(axis: Axis) -> Color {
    match axis {
        Axis::X => Color::srgb(1.0, 0.2, 0.2),
        Axis::Y => Color::srgb(0.2, 1.0, 0.2),
        Axis::Z => Color::srgb(0.2, 0.4, 1.0),
    }
}
