//! Per-frame transform intent and its source-priority merge.
//!
//! Every input path (modal mouse, typed numbers, direct keys, wheel) builds
//! its own partial [`TransformCommand`]; the router folds them together with
//! [`TransformCommand::merge`]. Each vector field remembers the priority of the
//! source that last won it, and an incoming write wins when its priority is
//! greater than or equal to the stored one. Equal priorities therefore resolve
//! to the last writer, so merge order only matters inside a tier.

use std::collections::BTreeSet;

use bevy::prelude::*;
use placer_geometry::{Axis, AxisMask};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum SourceTag {
    MouseModal,
    Numeric,
    KeyDirect,
    Wheel,
    Gamepad,
}

impl SourceTag {
    pub const fn priority(self) -> u16 {
        match self {
            SourceTag::MouseModal => 300,
            SourceTag::Numeric => 200,
            SourceTag::KeyDirect | SourceTag::Wheel | SourceTag::Gamepad => 100,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SourceTag::MouseModal => "mouse_modal",
            SourceTag::Numeric => "numeric",
            SourceTag::KeyDirect => "key_direct",
            SourceTag::Wheel => "wheel",
            SourceTag::Gamepad => "gamepad",
        }
    }
}

/// A value paired with the priority of whoever wrote it.
///
/// Priority `0` means untouched this frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrioritizedField<T> {
    value: T,
    priority: u16,
}

impl<T: Clone + Default> PrioritizedField<T> {
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn priority(&self) -> u16 {
        self.priority
    }

    pub fn is_set(&self) -> bool {
        self.priority > 0
    }

    /// Write `value` if `priority` is at least the stored one.
    pub fn set(&mut self, value: T, priority: u16) -> bool {
        if priority >= self.priority {
            self.value = value;
            self.priority = priority;
            true
        } else {
            false
        }
    }

    /// Take `other`'s value under the same rule. Untouched fields never win.
    pub fn combine(&mut self, other: &Self) -> bool {
        other.is_set() && self.set(other.value.clone(), other.priority)
    }

    pub fn clear(&mut self) {
        self.value = T::default();
        self.priority = 0;
    }
}

/// Snapping adjustments requested for this frame. `None` leaves the setting alone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapOverride {
    /// Invert the configured snap state (Ctrl held).
    pub invert: bool,
    pub translate_increment: Option<f32>,
    pub rotate_increment: Option<f32>,
    pub scale_increment: Option<f32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformCommand {
    position_delta: PrioritizedField<Vec3>,
    rotation_delta: PrioritizedField<Vec3>,
    scale_delta: PrioritizedField<Vec3>,
    snap_override: PrioritizedField<SnapOverride>,
    axis_constraints: PrioritizedField<AxisMask>,
    confirm: bool,
    cancel: bool,
    metadata: Map<String, Value>,
    source_flags: BTreeSet<SourceTag>,
}

impl TransformCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position_delta(&mut self, delta: Vec3, source: SourceTag) -> bool {
        self.source_flags.insert(source);
        self.position_delta.set(delta, source.priority())
    }

    /// Radians about the world X, Y and Z axes.
    pub fn set_rotation_delta(&mut self, delta: Vec3, source: SourceTag) -> bool {
        self.source_flags.insert(source);
        self.rotation_delta.set(delta, source.priority())
    }

    pub fn set_scale_delta(&mut self, delta: Vec3, source: SourceTag) -> bool {
        self.source_flags.insert(source);
        self.scale_delta.set(delta, source.priority())
    }

    pub fn set_snap_override(&mut self, snap: SnapOverride, source: SourceTag) -> bool {
        self.source_flags.insert(source);
        self.snap_override.set(snap, source.priority())
    }

    pub fn set_axis_constraints(&mut self, mask: AxisMask, source: SourceTag) -> bool {
        self.source_flags.insert(source);
        self.axis_constraints.set(mask, source.priority())
    }

    /// Accept the `{"X": true, "Y": false, "Z": false}` shape hosts tend to pass around.
    pub fn set_axis_constraints_from_map(&mut self, map: &Map<String, Value>, source: SourceTag) -> bool {
        let mut mask = AxisMask::NONE;
        for (key, value) in map {
            if let Some(axis) = Axis::from_label(key) {
                mask.set(axis, value.as_bool().unwrap_or(false));
            }
        }
        self.set_axis_constraints(mask, source)
    }

    /// Ask to commit the transform. Ignored once cancelled.
    pub fn request_confirm(&mut self) {
        if !self.cancel {
            self.confirm = true;
        }
    }

    pub fn request_cancel(&mut self) {
        self.cancel = true;
        self.confirm = false;
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Fold `other` into `self`.
    pub fn merge(&mut self, other: &TransformCommand) {
        self.position_delta.combine(&other.position_delta);
        self.rotation_delta.combine(&other.rotation_delta);
        self.scale_delta.combine(&other.scale_delta);
        self.snap_override.combine(&other.snap_override);
        self.axis_constraints.combine(&other.axis_constraints);

        if self.cancel || other.cancel {
            self.cancel = true;
            self.confirm = false;
        } else {
            self.confirm |= other.confirm;
        }

        for (key, value) in &other.metadata {
            self.metadata.insert(key.clone(), value.clone());
        }
        self.source_flags.extend(other.source_flags.iter().copied());
    }

    pub fn clear(&mut self) {
        self.position_delta.clear();
        self.rotation_delta.clear();
        self.scale_delta.clear();
        self.snap_override.clear();
        self.axis_constraints.clear();
        self.confirm = false;
        self.cancel = false;
        self.metadata.clear();
        self.source_flags.clear();
    }

    pub fn position_delta(&self) -> Vec3 {
        *self.position_delta.value()
    }

    pub fn rotation_delta(&self) -> Vec3 {
        *self.rotation_delta.value()
    }

    pub fn scale_delta(&self) -> Vec3 {
        *self.scale_delta.value()
    }

    pub fn snap_override(&self) -> Option<SnapOverride> {
        self.snap_override
            .is_set()
            .then(|| *self.snap_override.value())
    }

    pub fn axis_constraints(&self) -> AxisMask {
        *self.axis_constraints.value()
    }

    pub fn position_priority(&self) -> u16 {
        self.position_delta.priority()
    }

    pub fn rotation_priority(&self) -> u16 {
        self.rotation_delta.priority()
    }

    pub fn scale_priority(&self) -> u16 {
        self.scale_delta.priority()
    }

    pub fn is_confirm(&self) -> bool {
        self.confirm
    }

    pub fn is_cancel(&self) -> bool {
        self.cancel
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn source_flags(&self) -> &BTreeSet<SourceTag> {
        &self.source_flags
    }

    pub fn has_source(&self, source: SourceTag) -> bool {
        self.source_flags.contains(&source)
    }

    /// True if any delta field was written this frame.
    pub fn has_transform_change(&self) -> bool {
        self.position_delta.is_set() || self.rotation_delta.is_set() || self.scale_delta.is_set()
    }

    /// Apply the deltas to `base`.
    ///
    /// Rotation deltas are world-axis rotations (Y, then X, then Z) applied on
    /// top of the current orientation. Scale is clamped to `min_scale`.
    pub fn apply_to(&self, base: &Transform, min_scale: f32) -> Transform {
        let mut out = *base;
        out.translation += self.position_delta();

        let r = self.rotation_delta();
        if r != Vec3::ZERO {
            let delta = Quat::from_rotation_z(r.z) * Quat::from_rotation_x(r.x) * Quat::from_rotation_y(r.y);
            out.rotation = (delta * base.rotation).normalize();
        }

        out.scale = (base.scale + self.scale_delta()).max(Vec3::splat(min_scale));
        out
    }
}
