pub mod axis_constraint;
pub mod control_mode;
pub mod input;
pub mod numeric_input;
pub mod overlay;
pub mod placement;
pub mod router;
pub mod settings;
pub mod snapping;
pub mod transform_command;

use std::path::PathBuf;

use bevy::prelude::*;

pub use placer_geometry;
pub use placement::{PlacementTarget, TransformCancelled, TransformConfirmed, TransformSession};
pub use router::{SessionKind, TransformActionRouter};
pub use settings::PlacerSettings;
pub use transform_command::{SourceTag, TransformCommand};

/// Camera whose view drives cursor rays and screen-space movement.
#[derive(Component, Default)]
pub struct PlacerCamera;

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlacerSet {
    /// Raw input is collected into an `InputSnapshot`.
    Input,
    /// The snapshot is routed and the resulting command applied.
    Route,
}

/// Keyboard and mouse placement controls for a single target entity.
#[derive(Default)]
pub struct AssetPlacerPlugin {
    /// Optional JSON settings file. Missing or invalid files fall back to
    /// defaults with a warning.
    pub settings_path: Option<PathBuf>,
}

impl Plugin for AssetPlacerPlugin {
    fn build(&self, app: &mut App) {
        let settings = match &self.settings_path {
            Some(path) => match settings::load_settings_file(path) {
                Ok(settings) => {
                    info!("Placer: loaded settings from {}", path.display());
                    settings
                }
                Err(err) => {
                    warn!("Placer: using default settings: {err:#}");
                    PlacerSettings::default()
                }
            },
            None => PlacerSettings::default(),
        };

        app.insert_resource(settings)
            .configure_sets(Update, (PlacerSet::Input, PlacerSet::Route).chain())
            .add_plugins((
                input::PlacerInputPlugin,
                placement::PlacementPlugin,
                overlay::OverlayPlugin,
            ));
    }
}
