//! Per-frame input routing.
//!
//! [`TransformActionRouter::route`] turns one [`InputSnapshot`] into one merged
//! [`TransformCommand`]. Each input path builds its own partial command tagged
//! with its [`SourceTag`], so a typed number never fights the mouse for the
//! same field: the merge decides.

use bevy::prelude::*;
use placer_geometry::{Axis, AxisMask, CameraBasis, CursorRay, calculate_constrained_position};
use serde_json::{Value, json};

use crate::{
    axis_constraint::AxisPress,
    control_mode::{ControlMode, ControlModeState},
    numeric_input::{NumericAction, NumericInputAccumulator, PrefixMode},
    settings::PlacerSettings,
    transform_command::{SnapOverride, SourceTag, TransformCommand},
};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Discrete, host-independent keys the router understands.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlacerKey {
    Grab,
    Rotate,
    Scale,
    Axis(Axis),
    Digit(char),
    DecimalPoint,
    Plus,
    Minus,
    Equals,
    Backspace,
    SnapToggle,
    /// A direct step for `action`. `reverse` flips the step direction for
    /// height, rotation and scale; directional moves carry their own direction.
    Step { action: NumericAction, reverse: bool },
}

/// Everything the router reads about one frame of raw input.
#[derive(Resource, Clone, Debug, Default)]
pub struct InputSnapshot {
    /// Seconds since startup.
    pub now: f64,
    pub cursor_position: Option<Vec2>,
    /// Cursor motion since the previous frame, in viewport pixels.
    pub cursor_delta: Vec2,
    pub cursor_ray: Option<CursorRay>,
    pub camera: Option<CameraBasis>,
    /// Wheel notches this frame, positive away from the user.
    pub wheel_delta: f32,
    pub shift_held: bool,
    pub ctrl_held: bool,
    /// Keys newly pressed this frame, in press order.
    pub just_pressed: Vec<PlacerKey>,
    pub confirm: bool,
    pub cancel: bool,
}

impl InputSnapshot {
    pub fn pressed(&self, key: PlacerKey) -> bool {
        self.just_pressed.contains(&key)
    }
}

/// Raw pointer data handed back for hosts that raycast the preview themselves.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PositionInput {
    pub cursor_position: Option<Vec2>,
    pub cursor_ray: Option<CursorRay>,
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Read access to the transform being edited.
pub trait TransformProvider {
    fn current_position(&self) -> Vec3;
    /// Euler angles in radians about X, Y and Z.
    fn current_rotation(&self) -> Vec3;
    fn current_scale(&self) -> Vec3;
}

impl TransformProvider for Transform {
    fn current_position(&self) -> Vec3 {
        self.translation
    }

    fn current_rotation(&self) -> Vec3 {
        let (y, x, z) = self.rotation.to_euler(EulerRot::YXZ);
        Vec3::new(x, y, z)
    }

    fn current_scale(&self) -> Vec3 {
        self.scale
    }
}

/// Receives overlay updates (mode label, locked axes, typed value).
pub trait OverlaySink {
    fn show_mode(&mut self, mode: ControlMode, modal_active: bool);
    fn show_axis_constraints(&mut self, constraints: AxisMask, origin: Option<Vec3>);
    fn show_numeric_input(&mut self, text: Option<String>);
}

impl OverlaySink for () {
    fn show_mode(&mut self, _mode: ControlMode, _modal_active: bool) {}
    fn show_axis_constraints(&mut self, _constraints: AxisMask, _origin: Option<Vec3>) {}
    fn show_numeric_input(&mut self, _text: Option<String>) {}
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SessionKind {
    /// Placing a new asset: the host's preview raycast drives free movement.
    #[default]
    Placement,
    /// Transforming an existing object.
    Transform,
}

impl SessionKind {
    pub const fn label(self) -> &'static str {
        match self {
            SessionKind::Placement => "placement",
            SessionKind::Transform => "transform",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteResult {
    pub command: TransformCommand,
    /// The host should not run its own default mouse tracking this frame.
    pub skip_normal_input: bool,
    pub numeric_was_confirmed: bool,
    pub position_input: PositionInput,
}

/// Accumulated state of the running modal grab.
///
/// Offsets are kept raw and snapped as a whole so that per-frame deltas add
/// up to a snapped total.
#[derive(Clone, Debug, Default)]
struct ModalDrag {
    constraints: AxisMask,
    start_position: Vec3,
    /// Offset between the first projected hit and the anchor, so the grab
    /// starts without a jump.
    anchor: Option<Vec3>,
    screen_offset: Vec3,
    raw_rotation: Vec3,
    applied_rotation: Vec3,
    raw_scale: Vec3,
    applied_scale: Vec3,
}

impl ModalDrag {
    fn new(constraints: AxisMask, start_position: Vec3) -> Self {
        Self {
            constraints,
            start_position,
            ..default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct TransformActionRouter {
    kind: SessionKind,
    control: ControlModeState,
    numeric: NumericInputAccumulator,
    settings: PlacerSettings,
    drag: Option<ModalDrag>,
}

impl Default for TransformActionRouter {
    fn default() -> Self {
        Self::new(SessionKind::default(), PlacerSettings::default())
    }
}

impl TransformActionRouter {
    pub fn new(kind: SessionKind, settings: PlacerSettings) -> Self {
        Self {
            kind,
            control: ControlModeState::new(settings.double_tap_window),
            numeric: NumericInputAccumulator::new(settings.numeric_grace_period),
            settings,
            drag: None,
        }
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn control(&self) -> &ControlModeState {
        &self.control
    }

    pub fn numeric(&self) -> &NumericInputAccumulator {
        &self.numeric
    }

    pub fn settings(&self) -> &PlacerSettings {
        &self.settings
    }

    /// Replace the settings. Resets the session since timing windows change.
    pub fn set_settings(&mut self, settings: PlacerSettings) {
        *self = Self::new(self.kind, settings);
    }

    /// Start over with a new session of `kind`.
    pub fn begin_session(&mut self, kind: SessionKind) {
        self.kind = kind;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.control = ControlModeState::new(self.settings.double_tap_window);
        self.numeric = NumericInputAccumulator::new(self.settings.numeric_grace_period);
        self.drag = None;
    }

    /// Resolve one frame of input into a transform command.
    pub fn route(
        &mut self,
        input: &InputSnapshot,
        transform: &impl TransformProvider,
        overlay: &mut impl OverlaySink,
    ) -> RouteResult {
        let position_input = PositionInput {
            cursor_position: input.cursor_position,
            cursor_ray: input.cursor_ray,
        };

        if self.numeric.expire_if_stale(input.now) {
            debug!("Placer: numeric input timed out");
        }

        if input.cancel {
            let mut command = TransformCommand::new();
            command.request_cancel();
            if self.control.is_modal_active() {
                info!("Placer: {} cancelled", self.control.control_mode().label());
            }
            self.control.deactivate_modal();
            self.drag = None;
            self.numeric.reset();
            self.write_metadata(&mut command);
            self.publish_overlay(overlay);
            return RouteResult {
                command,
                skip_normal_input: false,
                numeric_was_confirmed: false,
                position_input,
            };
        }

        let current = transform.current_position();
        self.handle_mode_keys(input, current);
        self.handle_axis_keys(input, current);
        self.handle_numeric_keys(input);

        let mut command = TransformCommand::new();
        let mut numeric_was_confirmed = false;

        if input.confirm {
            if self.numeric.is_pending() {
                self.numeric.confirm_action();
            }
            if self.numeric.is_confirmed() {
                if let Some(action) = self.numeric.active_action() {
                    let numeric = numeric_command(action, &self.numeric, transform, input.camera.as_ref());
                    command.merge(&numeric);
                    info!("Placer: applied {} {:?}", action.label(), self.numeric.numeric_value());
                }
                self.numeric.reset();
                numeric_was_confirmed = true;
            }

            if self.control.is_modal_active() {
                info!("Placer: {} confirmed", self.control.control_mode().label());
                command.request_confirm();
                self.control.deactivate_modal();
                self.drag = None;
            } else if !numeric_was_confirmed {
                command.request_confirm();
            }
        }

        if self.control.is_modal_active() && !self.numeric.is_pending() {
            let modal = self.modal_command(input, transform);
            command.merge(&modal);
        }

        if !self.numeric.is_pending() {
            let direct = self.direct_command(input);
            command.merge(&direct);
            let wheel = self.wheel_command(input);
            command.merge(&wheel);
        }

        if input.ctrl_held {
            let mut snap = TransformCommand::new();
            snap.set_snap_override(
                SnapOverride {
                    invert: true,
                    ..default()
                },
                SourceTag::KeyDirect,
            );
            command.merge(&snap);
        }

        self.write_metadata(&mut command);
        self.publish_overlay(overlay);

        RouteResult {
            command,
            skip_normal_input: self.numeric.is_pending(),
            numeric_was_confirmed,
            position_input,
        }
    }

    // -----------------------------------------------------------------------
    // Discrete keys
    // -----------------------------------------------------------------------

    fn handle_mode_keys(&mut self, input: &InputSnapshot, current: Vec3) {
        for key in &input.just_pressed {
            let mode = match key {
                PlacerKey::Grab => ControlMode::Position,
                PlacerKey::Rotate => ControlMode::Rotation,
                PlacerKey::Scale => ControlMode::Scale,
                PlacerKey::SnapToggle => {
                    let mode = self.control.control_mode();
                    let enabled = self.settings.snap.toggle_for(mode);
                    info!("Placer: {} snapping {}", mode.label(), if enabled { "on" } else { "off" });
                    continue;
                }
                _ => continue,
            };
            if self.control.is_modal_active() && self.control.control_mode() == mode {
                continue;
            }
            self.control.switch_to(mode, true);
            self.numeric.reset();
            self.drag = Some(ModalDrag::new(self.control.axis_constraints(), current));
            info!("Placer: {} modal activated", mode.label());
        }
    }

    fn handle_axis_keys(&mut self, input: &InputSnapshot, current: Vec3) {
        if !self.control.is_modal_active() {
            return;
        }
        for key in &input.just_pressed {
            let PlacerKey::Axis(axis) = *key else {
                continue;
            };
            if input.shift_held {
                self.control.process_plane_key_press(axis, input.now, current);
                debug!("Placer: plane constraint excluding {:?}", axis);
            } else {
                let outcome = self.control.process_axis_key_press(axis, input.now, current);
                if outcome != AxisPress::Unchanged {
                    debug!("Placer: axis {:?} {:?}", axis, outcome);
                }
            }
        }
    }

    fn handle_numeric_keys(&mut self, input: &InputSnapshot) {
        for key in &input.just_pressed {
            let now = input.now;
            match *key {
                PlacerKey::Digit(c) => {
                    self.arm_numeric_from_mode(now);
                    self.numeric.push_digit(c, now);
                }
                PlacerKey::DecimalPoint => {
                    self.arm_numeric_from_mode(now);
                    self.numeric.push_digit('.', now);
                }
                PlacerKey::Plus => {
                    self.arm_numeric_from_mode(now);
                    self.numeric.push_prefix('+', now);
                }
                PlacerKey::Minus => {
                    self.arm_numeric_from_mode(now);
                    self.numeric.push_prefix('-', now);
                }
                PlacerKey::Equals => {
                    self.arm_numeric_from_mode(now);
                    self.numeric.push_prefix('=', now);
                }
                PlacerKey::Backspace => {
                    self.numeric.backspace(now);
                }
                _ => {}
            }
        }
    }

    /// During a modal grab, typing without a tapped action targets the grab itself.
    fn arm_numeric_from_mode(&mut self, now: f64) {
        if self.numeric.has_context() || !self.control.is_modal_active() {
            return;
        }
        let constraints = self.control.axis_constraints();
        let single = single_lock(constraints);
        let action = match self.control.control_mode() {
            ControlMode::Rotation => match single {
                Some(Axis::X) => NumericAction::RotateX,
                Some(Axis::Z) => NumericAction::RotateZ,
                _ => NumericAction::RotateY,
            },
            ControlMode::Scale => NumericAction::Scale,
            ControlMode::Position => match single {
                Some(Axis::Y) => NumericAction::Height,
                _ => return,
            },
        };
        self.numeric.set_action_context(action, now);
    }

    // -----------------------------------------------------------------------
    // Partial commands
    // -----------------------------------------------------------------------

    fn modal_command(&mut self, input: &InputSnapshot, transform: &impl TransformProvider) -> TransformCommand {
        let mut command = TransformCommand::new();
        let current = transform.current_position();
        let constraints = self.control.axis_constraints();
        let origin = self.control.constraint_origin();

        let drag = self
            .drag
            .get_or_insert_with(|| ModalDrag::new(constraints, current));
        if drag.constraints != constraints {
            // Re-anchor so changing the lock does not snap the object around.
            *drag = ModalDrag {
                raw_rotation: drag.raw_rotation,
                applied_rotation: drag.applied_rotation,
                raw_scale: drag.raw_scale,
                applied_scale: drag.applied_scale,
                ..ModalDrag::new(constraints, origin.unwrap_or(current))
            };
        }

        let snap = &self.settings.snap;
        let ctrl = input.ctrl_held;

        match self.control.control_mode() {
            ControlMode::Position => {
                let free_placement = constraints.is_empty() && self.kind == SessionKind::Placement;
                if free_placement {
                    return command;
                }
                let effective = if constraints.is_empty() {
                    AxisMask::plane_excluding(Axis::Y)
                } else {
                    constraints
                };
                let Some(raw_offset) = modal_position_offset(drag, effective, input, &self.settings) else {
                    return command;
                };
                let target = drag.start_position + snap.snap_vec3(ControlMode::Position, raw_offset, ctrl);
                command.set_position_delta(target - current, SourceTag::MouseModal);
            }
            ControlMode::Rotation => {
                let axis = single_lock(constraints).unwrap_or(Axis::Y);
                drag.raw_rotation +=
                    axis.unit() * input.cursor_delta.x * self.settings.mouse_rotation_sensitivity;
                let total = snap.snap_vec3(ControlMode::Rotation, drag.raw_rotation, ctrl);
                let delta = total - drag.applied_rotation;
                drag.applied_rotation = total;
                if delta != Vec3::ZERO {
                    command.set_rotation_delta(delta, SourceTag::MouseModal);
                }
            }
            ControlMode::Scale => {
                let amount = input.cursor_delta.x * self.settings.mouse_scale_sensitivity;
                let mask = if constraints.is_empty() {
                    Vec3::ONE
                } else {
                    constraints.axes().map(Axis::unit).sum::<Vec3>()
                };
                drag.raw_scale += mask * amount;
                let total = snap.snap_vec3(ControlMode::Scale, drag.raw_scale, ctrl);
                let delta = total - drag.applied_scale;
                drag.applied_scale = total;
                if delta != Vec3::ZERO {
                    command.set_scale_delta(delta, SourceTag::MouseModal);
                }
            }
        }

        command.set_axis_constraints(constraints, SourceTag::MouseModal);
        command
    }

    fn direct_command(&mut self, input: &InputSnapshot) -> TransformCommand {
        let mut command = TransformCommand::new();
        let mut position = Vec3::ZERO;
        let mut rotation = Vec3::ZERO;
        let mut scale = Vec3::ZERO;
        let mut touched = (false, false, false);

        for key in &input.just_pressed {
            let PlacerKey::Step { action, reverse } = *key else {
                continue;
            };
            let sign = if reverse { -1.0 } else { 1.0 };
            let rotation_step = self.settings.rotation_step_degrees.to_radians() * sign;
            match action {
                NumericAction::Height => {
                    position.y += self.settings.height_step * sign;
                    touched.0 = true;
                }
                NumericAction::PositionForward
                | NumericAction::PositionBack
                | NumericAction::PositionLeft
                | NumericAction::PositionRight => {
                    position += direction_for(action, input.camera.as_ref()) * self.settings.position_step;
                    touched.0 = true;
                }
                NumericAction::RotateX => {
                    rotation.x += rotation_step;
                    touched.1 = true;
                }
                NumericAction::RotateY => {
                    rotation.y += rotation_step;
                    touched.1 = true;
                }
                NumericAction::RotateZ => {
                    rotation.z += rotation_step;
                    touched.1 = true;
                }
                NumericAction::Scale => {
                    scale += Vec3::splat(self.settings.scale_step * sign);
                    touched.2 = true;
                }
            }
            self.numeric.set_action_context(action, input.now);
        }

        if touched.0 {
            command.set_position_delta(position, SourceTag::KeyDirect);
        }
        if touched.1 {
            command.set_rotation_delta(rotation, SourceTag::KeyDirect);
        }
        if touched.2 {
            command.set_scale_delta(scale, SourceTag::KeyDirect);
        }
        command
    }

    fn wheel_command(&self, input: &InputSnapshot) -> TransformCommand {
        let mut command = TransformCommand::new();
        if input.wheel_delta == 0.0 {
            return command;
        }
        let notches = input.wheel_delta;
        match self.control.control_mode() {
            ControlMode::Position => {
                command.set_position_delta(
                    Vec3::Y * notches * self.settings.wheel_height_step,
                    SourceTag::Wheel,
                );
            }
            ControlMode::Rotation => {
                let axis = single_lock(self.control.axis_constraints()).unwrap_or(Axis::Y);
                command.set_rotation_delta(
                    axis.unit() * notches * self.settings.wheel_rotation_step_degrees.to_radians(),
                    SourceTag::Wheel,
                );
            }
            ControlMode::Scale => {
                command.set_scale_delta(
                    Vec3::splat(notches * self.settings.wheel_scale_step),
                    SourceTag::Wheel,
                );
            }
        }
        command
    }

    // -----------------------------------------------------------------------
    // Reporting
    // -----------------------------------------------------------------------

    fn write_metadata(&self, command: &mut TransformCommand) {
        command.set_metadata("session", self.kind.label());
        command.set_metadata("mode", self.control.control_mode().label());
        command.set_metadata("modal_active", self.control.is_modal_active());
        command.set_metadata(
            "numeric",
            self.numeric.display_text().map_or(Value::Null, Value::from),
        );
        let origin = self
            .control
            .constraint_origin()
            .map_or(Value::Null, |o| json!([o.x, o.y, o.z]));
        command.set_metadata("constraint_origin", origin);
    }

    fn publish_overlay(&self, overlay: &mut impl OverlaySink) {
        overlay.show_mode(self.control.control_mode(), self.control.is_modal_active());
        overlay.show_axis_constraints(self.control.axis_constraints(), self.control.constraint_origin());
        overlay.show_numeric_input(self.numeric.display_text());
    }
}

/// Offset from the drag anchor the pointer asks for, or `None` when there is
/// nothing usable this frame.
fn modal_position_offset(
    drag: &mut ModalDrag,
    constraints: AxisMask,
    input: &InputSnapshot,
    settings: &PlacerSettings,
) -> Option<Vec3> {
    if let Some(ray) = input.cursor_ray {
        if ray.direction.length_squared() < 1e-12 {
            debug!("Placer: degenerate cursor ray, holding position");
            return None;
        }
        let projected =
            calculate_constrained_position(ray.origin, ray.direction, drag.start_position, constraints);
        let raw = projected - drag.start_position;
        let anchor = *drag.anchor.get_or_insert(raw);
        return Some(raw - anchor);
    }

    let camera = input.camera?;
    let scale = camera.drag_scale(drag.start_position, settings.mouse_translate_sensitivity);
    let delta = input.cursor_delta;

    // A vertical lock takes screen Y directly; otherwise keep the locked
    // components of the ground-plane motion.
    let step = if single_lock(constraints) == Some(Axis::Y) {
        Vec3::Y * (-delta.y) * scale
    } else {
        let planar =
            camera.right_horizontal() * delta.x * scale + camera.forward_horizontal() * (-delta.y) * scale;
        constraints
            .axes()
            .map(|a| a.unit() * a.component(planar))
            .sum::<Vec3>()
    };
    drag.screen_offset += step;
    Some(drag.screen_offset)
}

/// The locked axis when exactly one is locked.
fn single_lock(constraints: AxisMask) -> Option<Axis> {
    if constraints.count() == 1 {
        constraints.single()
    } else {
        None
    }
}

/// World direction of a directional move, relative to the camera when known.
fn direction_for(action: NumericAction, camera: Option<&CameraBasis>) -> Vec3 {
    let forward = camera
        .map(CameraBasis::forward_horizontal)
        .filter(|v| *v != Vec3::ZERO)
        .unwrap_or(Vec3::NEG_Z);
    let right = camera
        .map(CameraBasis::right_horizontal)
        .filter(|v| *v != Vec3::ZERO)
        .unwrap_or(Vec3::X);
    match action {
        NumericAction::PositionForward => forward,
        NumericAction::PositionBack => -forward,
        NumericAction::PositionLeft => -right,
        NumericAction::PositionRight => right,
        _ => Vec3::ZERO,
    }
}

/// Build the `Numeric` command for a confirmed typed value.
///
/// Rotations are typed in degrees and edit one YXZ Euler angle, the same
/// frame [`TransformProvider::current_rotation`] reports in. Directional
/// moves use the value as a distance; only the `-` prefix reverses them.
/// A delta that is not finite is dropped.
fn numeric_command(
    action: NumericAction,
    numeric: &NumericInputAccumulator,
    transform: &impl TransformProvider,
    camera: Option<&CameraBasis>,
) -> TransformCommand {
    let mut command = TransformCommand::new();
    let Some(value) = numeric.numeric_value() else {
        return command;
    };

    let (delta, field) = match action {
        NumericAction::RotateX | NumericAction::RotateY | NumericAction::RotateZ => {
            let axis = match action {
                NumericAction::RotateX => Axis::X,
                NumericAction::RotateY => Axis::Y,
                _ => Axis::Z,
            };
            let euler = transform.current_rotation();
            let current = axis.component(euler).to_degrees();
            let mut target = euler;
            target[axis.index()] = numeric.apply_to_value(current).to_radians();
            (rotation_between(euler, target), ControlMode::Rotation)
        }
        NumericAction::Scale => {
            let scale = transform.current_scale();
            let uniform = (scale.x + scale.y + scale.z) / 3.0;
            let target = numeric.apply_to_value(uniform);
            (Vec3::splat(target) - scale, ControlMode::Scale)
        }
        NumericAction::Height => {
            let current = transform.current_position().y;
            let target = numeric.apply_to_value(current);
            (Vec3::Y * (target - current), ControlMode::Position)
        }
        NumericAction::PositionForward
        | NumericAction::PositionBack
        | NumericAction::PositionLeft
        | NumericAction::PositionRight => {
            let sign = if numeric.prefix_mode() == PrefixMode::RelativeSub {
                -1.0
            } else {
                1.0
            };
            (direction_for(action, camera) * value * sign, ControlMode::Position)
        }
    };

    if !delta.is_finite() {
        warn!("Placer: ignoring non-finite {} value", action.label());
        return command;
    }
    match field {
        ControlMode::Position => command.set_position_delta(delta, SourceTag::Numeric),
        ControlMode::Rotation => command.set_rotation_delta(delta, SourceTag::Numeric),
        ControlMode::Scale => command.set_scale_delta(delta, SourceTag::Numeric),
    };
    command
}

/// World-axis rotation delta that turns YXZ Euler angles `from` into `to`.
///
/// Expressed in the Z, X, Y order [`TransformCommand::apply_to`] composes.
fn rotation_between(from: Vec3, to: Vec3) -> Vec3 {
    let from = Quat::from_euler(EulerRot::YXZ, from.y, from.x, from.z);
    let to = Quat::from_euler(EulerRot::YXZ, to.y, to.x, to.z);
    let (z, x, y) = (to * from.inverse()).normalize().to_euler(EulerRot::ZXY);
    Vec3::new(x, y, z)
}
