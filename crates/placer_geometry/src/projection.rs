use bevy::prelude::*;

use crate::{Axis, AxisMask};

/// Rays flatter than this against the line's projection plane are ignored.
const LINE_PARALLEL_EPSILON: f32 = 0.01;
/// Rays flatter than this against a constraint plane are ignored.
const PLANE_PARALLEL_EPSILON: f32 = 0.0001;
const MIN_DIRECTION_LENGTH_SQUARED: f32 = 1e-12;

/// Largest offset a single projection may move the target from its anchor.
pub const MAX_PROJECTION_DISTANCE: f32 = 100_000.0;
/// Results farther than this from the world origin are treated as blow-ups.
pub const WORLD_SANITY_LIMIT: f32 = 1_000_000.0;

/// Project a camera ray onto the line through `line_point` along `axis`.
///
/// The ray is intersected with the plane that contains the line and faces the
/// camera best, then the hit is dropped onto the line. Returns `line_point`
/// unchanged for degenerate rays and numerically unsafe results.
pub fn project_to_line(ray_origin: Vec3, ray_dir: Vec3, line_point: Vec3, axis: Vec3) -> Vec3 {
    if ray_dir.length_squared() < MIN_DIRECTION_LENGTH_SQUARED
        || axis.length_squared() < MIN_DIRECTION_LENGTH_SQUARED
    {
        return line_point;
    }
    let dir = ray_dir.normalize();
    let axis = axis.normalize();

    let reference = if axis.dot(Vec3::Y).abs() > 0.99 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let perp_a = axis.cross(reference).normalize();
    let perp_b = axis.cross(perp_a).normalize();

    let normal = if dir.dot(perp_a).abs() >= dir.dot(perp_b).abs() {
        perp_a
    } else {
        perp_b
    };

    let denom = dir.dot(normal);
    if denom.abs() < LINE_PARALLEL_EPSILON {
        debug!("Line projection: ray parallel to projection plane, keeping anchor");
        return line_point;
    }

    let t = (line_point - ray_origin).dot(normal) / denom;
    let hit = ray_origin + dir * t;
    let distance = (hit - line_point).dot(axis);
    if !distance.is_finite() {
        return line_point;
    }
    let distance = distance.clamp(-MAX_PROJECTION_DISTANCE, MAX_PROJECTION_DISTANCE);

    let result = line_point + axis * distance;
    if !result.is_finite() || result.length() > WORLD_SANITY_LIMIT {
        debug!("Line projection: result {result} out of bounds, keeping anchor");
        return line_point;
    }
    result
}

/// Intersect a camera ray with the plane spanned by exactly two locked axes.
///
/// The unlocked axis is the plane normal. Any other lock count, or a ray
/// running along the plane, returns `plane_point` unchanged.
pub fn project_to_plane(
    ray_origin: Vec3,
    ray_dir: Vec3,
    plane_point: Vec3,
    locked: AxisMask,
) -> Vec3 {
    let Some(free) = locked.free_axis() else {
        return plane_point;
    };
    if ray_dir.length_squared() < MIN_DIRECTION_LENGTH_SQUARED {
        return plane_point;
    }
    let dir = ray_dir.normalize();
    let normal = free.unit();

    let denom = dir.dot(normal);
    if denom.abs() < PLANE_PARALLEL_EPSILON {
        debug!("Plane projection: ray parallel to {:?} plane, keeping anchor", free);
        return plane_point;
    }

    let t = (plane_point - ray_origin).dot(normal) / denom;
    let hit = ray_origin + dir * t;
    if !hit.is_finite() {
        return plane_point;
    }
    hit
}

/// Resolve where a constrained drag should put the target this frame.
///
/// Dispatches on the number of locked axes (none or all: stay at `origin`,
/// one: line, two: plane) and caps the final offset from `origin`.
pub fn calculate_constrained_position(
    ray_origin: Vec3,
    ray_dir: Vec3,
    origin: Vec3,
    locked: AxisMask,
) -> Vec3 {
    let projected = match locked.count() {
        1 => {
            let axis = locked.single().map(Axis::unit).unwrap_or(Vec3::ZERO);
            project_to_line(ray_origin, ray_dir, origin, axis)
        }
        2 => project_to_plane(ray_origin, ray_dir, origin, locked),
        _ => origin,
    };

    let offset = projected - origin;
    if offset.length() > MAX_PROJECTION_DISTANCE {
        origin + offset.normalize() * MAX_PROJECTION_DISTANCE
    } else {
        projected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-3;

    #[test]
    fn test_line_projection_follows_ray() {
        let result = project_to_line(
            Vec3::new(5.0, 5.0, 10.0),
            Vec3::NEG_Z,
            Vec3::ZERO,
            Vec3::X,
        );
        assert!((result - Vec3::new(5.0, 0.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_line_projection_parallel_ray_keeps_anchor() {
        // Along the axis itself: perpendicular to both candidate normals.
        let anchor = Vec3::new(1.0, 2.0, 3.0);
        let result = project_to_line(Vec3::new(0.0, 0.0, 10.0), Vec3::X, anchor, Vec3::X);
        assert_eq!(result, anchor);
    }

    #[test]
    fn test_line_projection_zero_direction_keeps_anchor() {
        let anchor = Vec3::new(4.0, 0.0, 0.0);
        assert_eq!(
            project_to_line(Vec3::ONE, Vec3::ZERO, anchor, Vec3::Y),
            anchor
        );
    }

    #[test]
    fn test_line_projection_clamps_distance() {
        let dir = Vec3::new(1.0, 0.0, -0.015).normalize();
        let result = project_to_line(Vec3::new(0.0, 0.0, 10_000.0), dir, Vec3::ZERO, Vec3::X);
        assert!((result.x - MAX_PROJECTION_DISTANCE).abs() < 1.0);
        assert_eq!(result.y, 0.0);
        assert_eq!(result.z, 0.0);
    }

    #[test]
    fn test_line_projection_beyond_sanity_limit_keeps_anchor() {
        let anchor = Vec3::new(0.0, 999_000.0, 0.0);
        let dir = Vec3::new(1.0, 0.0, -0.015).normalize();
        let result = project_to_line(Vec3::new(0.0, 999_000.0, 10_000.0), dir, anchor, Vec3::X);
        assert_eq!(result, anchor);
    }

    #[test]
    fn test_vertical_line_projection() {
        // Looking along -Z at the Y axis from the side.
        let result = project_to_line(
            Vec3::new(0.0, 3.0, 10.0),
            Vec3::NEG_Z,
            Vec3::ZERO,
            Vec3::Y,
        );
        assert!((result - Vec3::new(0.0, 3.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_plane_projection_hits_ground() {
        let locked = AxisMask::plane_excluding(Axis::Y);
        let result = project_to_plane(
            Vec3::new(3.0, 10.0, 4.0),
            Vec3::NEG_Y,
            Vec3::new(0.0, 2.0, 0.0),
            locked,
        );
        assert!((result - Vec3::new(3.0, 2.0, 4.0)).length() < EPSILON);
    }

    #[test]
    fn test_plane_projection_parallel_ray_keeps_anchor() {
        let anchor = Vec3::new(0.0, 2.0, 0.0);
        let result = project_to_plane(
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::X,
            anchor,
            AxisMask::plane_excluding(Axis::Y),
        );
        assert_eq!(result, anchor);
    }

    #[test]
    fn test_plane_projection_requires_two_axes() {
        let anchor = Vec3::new(1.0, 1.0, 1.0);
        let all = AxisMask {
            x: true,
            y: true,
            z: true,
        };
        assert_eq!(project_to_plane(Vec3::ZERO, Vec3::NEG_Y, anchor, all), anchor);
        assert_eq!(
            project_to_plane(Vec3::ZERO, Vec3::NEG_Y, anchor, AxisMask::only(Axis::X)),
            anchor
        );
    }

    #[test]
    fn test_constrained_position_dispatch() {
        let origin = Vec3::new(0.0, 1.0, 0.0);
        let ray_origin = Vec3::new(2.0, 6.0, 5.0);
        let ray_dir = Vec3::NEG_Y;

        assert_eq!(
            calculate_constrained_position(ray_origin, ray_dir, origin, AxisMask::NONE),
            origin
        );

        let on_plane = calculate_constrained_position(
            ray_origin,
            ray_dir,
            origin,
            AxisMask::plane_excluding(Axis::Y),
        );
        assert!((on_plane - Vec3::new(2.0, 1.0, 5.0)).length() < EPSILON);

        let all = AxisMask {
            x: true,
            y: true,
            z: true,
        };
        assert_eq!(
            calculate_constrained_position(ray_origin, ray_dir, origin, all),
            origin
        );
    }

    #[test]
    fn test_constrained_position_caps_plane_offset() {
        // Nearly grazing the ground plane lands very far away.
        let dir = Vec3::new(1.0, -0.0002, 0.0).normalize();
        let result = calculate_constrained_position(
            Vec3::new(0.0, 100.0, 0.0),
            dir,
            Vec3::ZERO,
            AxisMask::plane_excluding(Axis::Y),
        );
        assert!(result.length() <= MAX_PROJECTION_DISTANCE + 1.0);
        assert!(result.x > 0.0);
    }
}
