pub mod hull2d;
pub mod hull3d;
pub mod rotation;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3D rotation type.
pub type Rotation3 = nalgebra::Rotation3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Tolerance for the convex-hull half-space membership test, loose enough to
/// absorb rounding of voxel centers sitting exactly on a facet plane.
pub const HALF_SPACE_TOLERANCE: f64 = 1e-7;
