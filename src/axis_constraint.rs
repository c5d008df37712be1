use bevy::prelude::*;
use placer_geometry::{Axis, AxisMask};

/// Default double-tap window for axis keys, in seconds (inclusive).
pub const DEFAULT_DOUBLE_TAP_WINDOW: f64 = 0.3;

/// What an axis key press did to the constraint set.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AxisPress {
    Locked,
    Unlocked,
    /// Axis was already locked and the press fell outside the double-tap window.
    Unchanged,
}

/// Which world axes a modal grab is locked to, and where the lock started.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisConstraintState {
    locked: [bool; 3],
    origin: Option<Vec3>,
    last_press: [Option<f64>; 3],
    double_tap_window: f64,
}

impl Default for AxisConstraintState {
    fn default() -> Self {
        Self::new(DEFAULT_DOUBLE_TAP_WINDOW)
    }
}

impl AxisConstraintState {
    pub fn new(double_tap_window: f64) -> Self {
        Self {
            locked: [false; 3],
            origin: None,
            last_press: [None; 3],
            double_tap_window,
        }
    }

    pub fn double_tap_window(&self) -> f64 {
        self.double_tap_window
    }

    /// Toggle an axis lock.
    ///
    /// The first lock records `current_position` as the constraint origin. A
    /// second press on a locked axis within the double-tap window unlocks it,
    /// and the origin is dropped once nothing is locked.
    pub fn process_axis_key_press(&mut self, axis: Axis, now: f64, current_position: Vec3) -> AxisPress {
        let i = axis.index();

        if !self.locked[i] {
            if !self.has_axis_constraint() {
                self.origin = Some(current_position);
            }
            self.locked[i] = true;
            self.last_press[i] = Some(now);
            return AxisPress::Locked;
        }

        let within_window = self.last_press[i]
            .is_some_and(|last| now - last <= self.double_tap_window);
        if within_window {
            self.locked[i] = false;
            self.last_press[i] = None;
            if !self.has_axis_constraint() {
                self.origin = None;
            }
            AxisPress::Unlocked
        } else {
            self.last_press[i] = Some(now);
            AxisPress::Unchanged
        }
    }

    /// Lock the plane that excludes `excluded`, replacing any previous locks.
    pub fn process_plane_key_press(&mut self, excluded: Axis, now: f64, current_position: Vec3) {
        let origin = self.origin.unwrap_or(current_position);
        let mask = AxisMask::plane_excluding(excluded);
        for axis in Axis::ALL {
            let i = axis.index();
            self.locked[i] = mask.contains(axis);
            self.last_press[i] = if self.locked[i] { Some(now) } else { None };
        }
        self.origin = Some(origin);
    }

    pub fn has_axis_constraint(&self) -> bool {
        self.locked.iter().any(|l| *l)
    }

    pub fn is_constrained(&self, axis: Axis) -> bool {
        self.locked[axis.index()]
    }

    pub fn is_x_constrained(&self) -> bool {
        self.is_constrained(Axis::X)
    }

    pub fn is_y_constrained(&self) -> bool {
        self.is_constrained(Axis::Y)
    }

    pub fn is_z_constrained(&self) -> bool {
        self.is_constrained(Axis::Z)
    }

    pub fn locked_count(&self) -> usize {
        self.locked.iter().filter(|l| **l).count()
    }

    pub fn locked_mask(&self) -> AxisMask {
        AxisMask {
            x: self.locked[0],
            y: self.locked[1],
            z: self.locked[2],
        }
    }

    /// World position captured when the first axis was locked.
    pub fn constraint_origin(&self) -> Option<Vec3> {
        if self.has_axis_constraint() {
            self.origin
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.locked = [false; 3];
        self.origin = None;
        self.last_press = [None; 3];
    }
}
