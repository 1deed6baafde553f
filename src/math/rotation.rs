use nalgebra::Unit;

use super::{Rotation3, Vector3, TOLERANCE};

/// Builds the rotation taking `normal` onto `axis` (both assumed nonzero)
/// via the standard axis-angle construction: rotation axis `normal × axis`,
/// angle the angle between the two vectors.
///
/// Returns `None` when the vectors are already parallel or antiparallel, in
/// which case no rotation is needed (the caller keeps the facet as-is, the
/// same shortcut the boundary-aligned facets take).
#[must_use]
pub fn align_to_axis(normal: &Vector3, axis: &Vector3) -> Option<Rotation3> {
    let angle = normal.angle(axis);
    if angle < TOLERANCE || (std::f64::consts::PI - angle) < TOLERANCE {
        return None;
    }
    let rotation_axis = Unit::new_normalize(normal.cross(axis));
    Some(Rotation3::from_axis_angle(&rotation_axis, angle))
}
