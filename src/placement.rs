use bevy::prelude::*;

use crate::{
    PlacerSet,
    overlay::OverlayState,
    router::{InputSnapshot, RouteResult, SessionKind, TransformActionRouter},
    settings::PlacerSettings,
};

// ---------------------------------------------------------------------------
// Components, resources, events
// ---------------------------------------------------------------------------

/// Marks the entity the placer edits: the preview of an asset being placed
/// or the object being transformed. Only one should exist at a time.
#[derive(Component, Default)]
pub struct PlacementTarget;

#[derive(Resource, Default)]
pub struct TransformSession {
    pub router: TransformActionRouter,
    /// Target transform before the running modal edit; restored on cancel.
    start: Option<(Entity, Transform)>,
    last_result: RouteResult,
}

impl TransformSession {
    pub fn begin(&mut self, kind: SessionKind) {
        info!("Placer: begin {} session", kind.label());
        self.router.begin_session(kind);
        self.start = None;
        self.last_result = RouteResult::default();
    }

    /// Result of the most recent frame, for hosts that run their own input.
    pub fn last_result(&self) -> &RouteResult {
        &self.last_result
    }

    pub fn start_transform(&self) -> Option<Transform> {
        self.start.map(|(_, transform)| transform)
    }
}

/// Triggered when an edit is committed with Enter or left click.
#[derive(Event, Debug, Clone)]
pub struct TransformConfirmed {
    pub entity: Entity,
    pub transform: Transform,
}

/// Triggered when an edit is abandoned; `restored` is the transform put back.
#[derive(Event, Debug, Clone)]
pub struct TransformCancelled {
    pub entity: Entity,
    pub restored: Transform,
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct PlacementPlugin;

impl Plugin for PlacementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TransformSession>()
            .add_systems(Update, route_transform.in_set(PlacerSet::Route));
    }
}

// ---------------------------------------------------------------------------
// Route: apply this frame's command to the target
// ---------------------------------------------------------------------------

fn route_transform(
    snapshot: Res<InputSnapshot>,
    mut session: ResMut<TransformSession>,
    mut settings: ResMut<PlacerSettings>,
    mut overlay: ResMut<OverlayState>,
    mut targets: Query<(Entity, &mut Transform), With<PlacementTarget>>,
    mut commands: Commands,
) {
    let session = &mut *session;

    if settings.is_changed() && *settings != *session.router.settings() {
        debug!("Placer: settings changed, restarting session");
        session.router.set_settings(settings.clone());
    }

    let Ok((entity, mut transform)) = targets.single_mut() else {
        session.start = None;
        return;
    };

    let retargeted = session.start.is_some_and(|(e, _)| e != entity);
    if retargeted {
        session.router.reset();
    }
    if retargeted || !session.router.control().is_modal_active() {
        session.start = Some((entity, *transform));
    }

    let result = session.router.route(&snapshot, &*transform, &mut *overlay);
    let command = &result.command;

    if command.is_cancel() {
        if let Some((_, start)) = session.start {
            *transform = start;
        }
        commands.trigger(TransformCancelled {
            entity,
            restored: *transform,
        });
    } else {
        if command.has_transform_change() {
            let min_scale = session.router.settings().min_scale;
            *transform = command.apply_to(&transform, min_scale);
        }
        if command.is_confirm() {
            info!("Placer: committed {:?}", transform.translation);
            commands.trigger(TransformConfirmed {
                entity,
                transform: *transform,
            });
        }
    }

    // Persist in-session changes such as the snap toggle.
    if *session.router.settings() != *settings {
        *settings = session.router.settings().clone();
    }
    session.last_result = result;
}
