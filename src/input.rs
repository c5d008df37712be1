use bevy::{
    input::mouse::{AccumulatedMouseScroll, MouseScrollUnit},
    prelude::*,
};
use placer_geometry::{Axis, CameraBasis, CursorRay};

use crate::{
    PlacerCamera, PlacerSet,
    numeric_input::NumericAction,
    placement::TransformSession,
    router::{InputSnapshot, PlacerKey},
};

/// Pixel-unit wheels report roughly this many pixels per notch.
const PIXELS_PER_WHEEL_NOTCH: f32 = 100.0;

pub struct PlacerInputPlugin;

impl Plugin for PlacerInputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<InputSnapshot>()
            .add_systems(Update, capture_input.in_set(PlacerSet::Input));
    }
}

// ---------------------------------------------------------------------------
// Key mapping
// ---------------------------------------------------------------------------

/// Map a physical key to a placer key.
///
/// Period doubles as the decimal point once a value is being typed and as the
/// snap toggle otherwise; a value that starts with a fraction needs the
/// numpad decimal or a leading `0`. Shift switches axis keys to planes, `=` to
/// `+` and the horizontal arrows to Z rotation.
pub fn placer_key_for(key: KeyCode, shift: bool, numeric_typing: bool) -> Option<PlacerKey> {
    let step = |action, reverse| Some(PlacerKey::Step { action, reverse });
    match key {
        KeyCode::KeyG => Some(PlacerKey::Grab),
        KeyCode::KeyR => Some(PlacerKey::Rotate),
        KeyCode::KeyL => Some(PlacerKey::Scale),
        KeyCode::KeyX => Some(PlacerKey::Axis(Axis::X)),
        KeyCode::KeyY => Some(PlacerKey::Axis(Axis::Y)),
        KeyCode::KeyZ => Some(PlacerKey::Axis(Axis::Z)),
        KeyCode::Period if numeric_typing => Some(PlacerKey::DecimalPoint),
        KeyCode::Period => Some(PlacerKey::SnapToggle),
        KeyCode::NumpadDecimal => Some(PlacerKey::DecimalPoint),
        KeyCode::Equal if shift => Some(PlacerKey::Plus),
        KeyCode::Equal | KeyCode::NumpadEqual => Some(PlacerKey::Equals),
        KeyCode::NumpadAdd => Some(PlacerKey::Plus),
        KeyCode::Minus | KeyCode::NumpadSubtract => Some(PlacerKey::Minus),
        KeyCode::Backspace => Some(PlacerKey::Backspace),
        KeyCode::KeyQ => step(NumericAction::Height, false),
        KeyCode::KeyE => step(NumericAction::Height, true),
        KeyCode::KeyW => step(NumericAction::PositionForward, false),
        KeyCode::KeyS => step(NumericAction::PositionBack, false),
        KeyCode::KeyA => step(NumericAction::PositionLeft, false),
        KeyCode::KeyD => step(NumericAction::PositionRight, false),
        KeyCode::ArrowLeft if shift => step(NumericAction::RotateZ, true),
        KeyCode::ArrowRight if shift => step(NumericAction::RotateZ, false),
        KeyCode::ArrowLeft => step(NumericAction::RotateY, true),
        KeyCode::ArrowRight => step(NumericAction::RotateY, false),
        KeyCode::ArrowUp => step(NumericAction::RotateX, false),
        KeyCode::ArrowDown => step(NumericAction::RotateX, true),
        KeyCode::PageUp => step(NumericAction::Scale, false),
        KeyCode::PageDown => step(NumericAction::Scale, true),
        other => digit_for(other).map(PlacerKey::Digit),
    }
}

fn digit_for(key: KeyCode) -> Option<char> {
    let digit = match key {
        KeyCode::Digit0 | KeyCode::Numpad0 => '0',
        KeyCode::Digit1 | KeyCode::Numpad1 => '1',
        KeyCode::Digit2 | KeyCode::Numpad2 => '2',
        KeyCode::Digit3 | KeyCode::Numpad3 => '3',
        KeyCode::Digit4 | KeyCode::Numpad4 => '4',
        KeyCode::Digit5 | KeyCode::Numpad5 => '5',
        KeyCode::Digit6 | KeyCode::Numpad6 => '6',
        KeyCode::Digit7 | KeyCode::Numpad7 => '7',
        KeyCode::Digit8 | KeyCode::Numpad8 => '8',
        KeyCode::Digit9 | KeyCode::Numpad9 => '9',
        _ => return None,
    };
    Some(digit)
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// Fill [`InputSnapshot`] from Bevy's input resources for this frame.
fn capture_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    scroll: Option<Res<AccumulatedMouseScroll>>,
    time: Res<Time>,
    windows: Query<&Window>,
    camera_query: Query<(&Camera, &GlobalTransform), With<PlacerCamera>>,
    session: Res<TransformSession>,
    mut last_cursor: Local<Option<Vec2>>,
    mut snapshot: ResMut<InputSnapshot>,
) {
    let shift = keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
    let ctrl = keyboard.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]);
    let numeric_typing = session.router.numeric().is_active();

    let cursor_position = windows.iter().find_map(Window::cursor_position);
    let cursor_delta = match (cursor_position, *last_cursor) {
        (Some(now), Some(before)) => now - before,
        _ => Vec2::ZERO,
    };
    *last_cursor = cursor_position;

    let camera = camera_query.iter().next();
    let cursor_ray = match (camera, cursor_position) {
        (Some((camera, cam_tf)), Some(cursor)) => {
            camera.viewport_to_world(cam_tf, cursor).ok().map(CursorRay::from)
        }
        _ => None,
    };
    let camera_basis = camera.map(|(_, cam_tf)| CameraBasis {
        position: cam_tf.translation(),
        right: cam_tf.right().as_vec3(),
        forward: cam_tf.forward().as_vec3(),
    });

    let wheel_delta = scroll.map_or(0.0, |scroll| match scroll.unit {
        MouseScrollUnit::Line => scroll.delta.y,
        MouseScrollUnit::Pixel => scroll.delta.y / PIXELS_PER_WHEEL_NOTCH,
    });

    *snapshot = InputSnapshot {
        now: time.elapsed_secs_f64(),
        cursor_position,
        cursor_delta,
        cursor_ray,
        camera: camera_basis,
        wheel_delta,
        shift_held: shift,
        ctrl_held: ctrl,
        just_pressed: keyboard
            .get_just_pressed()
            .filter_map(|key| placer_key_for(*key, shift, numeric_typing))
            .collect(),
        confirm: keyboard.any_just_pressed([KeyCode::Enter, KeyCode::NumpadEnter])
            || mouse.just_pressed(MouseButton::Left),
        cancel: keyboard.just_pressed(KeyCode::Escape) || mouse.just_pressed(MouseButton::Right),
    };
}
