use std::path::PathBuf;

use asset_placer::{
    AssetPlacerPlugin, PlacementTarget, PlacerSettings, TransformCancelled, TransformConfirmed,
    TransformSession, control_mode::ControlMode, overlay::OverlayState,
};
use bevy::prelude::*;

#[derive(Resource, Default)]
struct Outcomes {
    confirmed: Vec<Transform>,
    cancelled: Vec<Transform>,
}

fn app_with(plugin: AssetPlacerPlugin) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .init_resource::<ButtonInput<KeyCode>>()
        .init_resource::<ButtonInput<MouseButton>>()
        .init_resource::<Outcomes>()
        .add_plugins(plugin)
        .add_observer(|event: On<TransformConfirmed>, mut outcomes: ResMut<Outcomes>| {
            outcomes.confirmed.push(event.transform);
        })
        .add_observer(|event: On<TransformCancelled>, mut outcomes: ResMut<Outcomes>| {
            outcomes.cancelled.push(event.restored);
        });
    app
}

fn spawn_target(app: &mut App, at: Vec3) -> Entity {
    app.world_mut()
        .spawn((PlacementTarget, Transform::from_translation(at)))
        .id()
}

/// Press `key` for exactly one frame.
fn tap(app: &mut App, key: KeyCode) {
    app.world_mut().resource_mut::<ButtonInput<KeyCode>>().press(key);
    app.update();
    let mut keyboard = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
    keyboard.release(key);
    keyboard.clear();
}

fn translation(app: &App, entity: Entity) -> Vec3 {
    app.world()
        .get::<Transform>(entity)
        .map(|t| t.translation)
        .unwrap_or(Vec3::NAN)
}

#[test]
fn cancel_restores_transform_from_before_grab() {
    let mut app = app_with(AssetPlacerPlugin::default());
    let target = spawn_target(&mut app, Vec3::new(1.0, 2.0, 3.0));
    app.update();

    tap(&mut app, KeyCode::KeyG);
    assert!(app.world().resource::<TransformSession>().router.control().is_modal_active());

    tap(&mut app, KeyCode::KeyQ);
    assert!((translation(&app, target).y - 2.1).abs() < 1e-5);

    tap(&mut app, KeyCode::Escape);
    assert_eq!(translation(&app, target), Vec3::new(1.0, 2.0, 3.0));
    assert!(!app.world().resource::<TransformSession>().router.control().is_modal_active());

    let outcomes = app.world().resource::<Outcomes>();
    assert_eq!(outcomes.cancelled.len(), 1);
    assert!(outcomes.confirmed.is_empty());
}

#[test]
fn typed_height_then_commit() {
    let mut app = app_with(AssetPlacerPlugin::default());
    let target = spawn_target(&mut app, Vec3::new(0.0, 2.0, 0.0));
    app.update();

    tap(&mut app, KeyCode::KeyQ);
    tap(&mut app, KeyCode::Digit5);
    assert!(app.world().resource::<TransformSession>().last_result().skip_normal_input);
    assert_eq!(
        app.world().resource::<OverlayState>().numeric_text.as_deref(),
        Some("height 5")
    );

    // First Enter applies the number, the second commits the placement.
    tap(&mut app, KeyCode::Enter);
    assert!((translation(&app, target).y - 5.0).abs() < 1e-5);
    assert!(app.world().resource::<Outcomes>().confirmed.is_empty());

    tap(&mut app, KeyCode::Enter);
    let outcomes = app.world().resource::<Outcomes>();
    assert_eq!(outcomes.confirmed.len(), 1);
    assert!((outcomes.confirmed[0].translation.y - 5.0).abs() < 1e-5);
}

#[test]
fn rotation_mode_shows_in_overlay() {
    let mut app = app_with(AssetPlacerPlugin::default());
    spawn_target(&mut app, Vec3::ZERO);
    app.update();

    tap(&mut app, KeyCode::KeyR);
    tap(&mut app, KeyCode::KeyZ);
    let overlay = app.world().resource::<OverlayState>();
    assert_eq!(overlay.mode, ControlMode::Rotation);
    assert!(overlay.modal_active);
    assert_eq!(overlay.status_line(), "Rotation [Z]");
}

#[test]
fn snap_toggle_is_persisted_to_settings() {
    let mut app = app_with(AssetPlacerPlugin::default());
    spawn_target(&mut app, Vec3::ZERO);
    app.update();

    tap(&mut app, KeyCode::Period);
    assert!(app.world().resource::<PlacerSettings>().snap.translate_snap);
    // Writing the toggle back does not restart the session.
    tap(&mut app, KeyCode::KeyG);
    app.update();
    assert!(app.world().resource::<TransformSession>().router.control().is_modal_active());
}

#[test]
fn missing_settings_file_falls_back_to_defaults() {
    let app = app_with(AssetPlacerPlugin {
        settings_path: Some(PathBuf::from("/nonexistent/placer.json")),
    });
    assert_eq!(*app.world().resource::<PlacerSettings>(), PlacerSettings::default());
}

#[test]
fn settings_file_is_loaded() {
    let path = std::env::temp_dir().join(format!(
        "asset_placer_settings_{}_{:?}.json",
        std::process::id(),
        std::thread::current().id()
    ));
    std::fs::write(&path, r#"{ "height_step": 0.5 }"#).unwrap();

    let mut app = app_with(AssetPlacerPlugin {
        settings_path: Some(path.clone()),
    });
    let target = spawn_target(&mut app, Vec3::ZERO);
    app.update();
    tap(&mut app, KeyCode::KeyQ);
    std::fs::remove_file(&path).ok();

    assert!((translation(&app, target).y - 0.5).abs() < 1e-5);
}

#[test]
fn period_after_step_toggles_snap_until_typing_starts() {
    let mut app = app_with(AssetPlacerPlugin::default());
    let target = spawn_target(&mut app, Vec3::ZERO);
    app.update();

    tap(&mut app, KeyCode::KeyQ);
    tap(&mut app, KeyCode::Period);
    assert!(app.world().resource::<PlacerSettings>().snap.translate_snap);

    tap(&mut app, KeyCode::Digit1);
    tap(&mut app, KeyCode::Period);
    tap(&mut app, KeyCode::Digit5);
    assert_eq!(
        app.world().resource::<OverlayState>().numeric_text.as_deref(),
        Some("height 1.5")
    );
    assert!(app.world().resource::<PlacerSettings>().snap.translate_snap);

    tap(&mut app, KeyCode::Enter);
    assert!((translation(&app, target).y - 1.5).abs() < 1e-5);
}
