//! Stateless geometry for axis-constrained placement.
//!
//! Everything here works on plain world-space vectors so it can be driven
//! from any viewport: the caller supplies the camera ray, we hand back a
//! position. Degenerate input never fails; it falls back to the anchor point.

pub mod projection;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub use projection::{
    MAX_PROJECTION_DISTANCE, WORLD_SANITY_LIMIT, calculate_constrained_position, project_to_line,
    project_to_plane,
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    /// Single-letter label, also used as the key in serialized constraint maps.
    pub const fn label(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "X" | "x" => Some(Axis::X),
            "Y" | "y" => Some(Axis::Y),
            "Z" | "z" => Some(Axis::Z),
            _ => None,
        }
    }

    /// Read this axis' component out of a vector.
    pub fn component(self, v: Vec3) -> f32 {
        v[self.index()]
    }
}

/// Which world axes movement is restricted to.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Serialize, Deserialize)]
pub struct AxisMask {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl AxisMask {
    pub const NONE: AxisMask = AxisMask {
        x: false,
        y: false,
        z: false,
    };

    pub fn only(axis: Axis) -> Self {
        let mut mask = Self::NONE;
        mask.set(axis, true);
        mask
    }

    /// The two axes spanning the plane that excludes `axis`.
    pub fn plane_excluding(axis: Axis) -> Self {
        let mut mask = AxisMask {
            x: true,
            y: true,
            z: true,
        };
        mask.set(axis, false);
        mask
    }

    pub fn contains(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn set(&mut self, axis: Axis, locked: bool) {
        match axis {
            Axis::X => self.x = locked,
            Axis::Y => self.y = locked,
            Axis::Z => self.z = locked,
        }
    }

    pub fn count(&self) -> usize {
        [self.x, self.y, self.z].into_iter().filter(|l| *l).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn axes(&self) -> impl Iterator<Item = Axis> + '_ {
        Axis::ALL.into_iter().filter(|a| self.contains(*a))
    }

    /// The first locked axis, if any.
    pub fn single(&self) -> Option<Axis> {
        self.axes().next()
    }

    /// The one unlocked axis when exactly two are locked.
    pub fn free_axis(&self) -> Option<Axis> {
        if self.count() != 2 {
            return None;
        }
        Axis::ALL.into_iter().find(|a| !self.contains(*a))
    }
}

/// A world-space ray cast from the camera through the cursor.
///
/// Unlike [`Ray3d`] the direction is an unchecked vector: projection code
/// must cope with zero-length directions coming from degenerate viewports.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct CursorRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl CursorRay {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }
}

impl From<Ray3d> for CursorRay {
    fn from(ray: Ray3d) -> Self {
        Self {
            origin: ray.origin,
            direction: *ray.direction,
        }
    }
}

/// Camera orientation used for screen-delta movement when no ray is available.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CameraBasis {
    pub position: Vec3,
    pub right: Vec3,
    pub forward: Vec3,
}

impl CameraBasis {
    /// Camera right flattened onto the ground plane.
    pub fn right_horizontal(&self) -> Vec3 {
        Vec3::new(self.right.x, 0.0, self.right.z).normalize_or_zero()
    }

    /// Camera forward flattened onto the ground plane.
    pub fn forward_horizontal(&self) -> Vec3 {
        Vec3::new(self.forward.x, 0.0, self.forward.z).normalize_or_zero()
    }

    /// World units per pixel of mouse motion at `target`.
    pub fn drag_scale(&self, target: Vec3, sensitivity: f32) -> f32 {
        (self.position - target).length() * sensitivity
    }
}
