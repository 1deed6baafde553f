use chull::ConvexHullWrapper;

use crate::error::GeometryError;

use super::{Point3, Vector3, TOLERANCE};

/// The convex hull of a pore's vertex set in half-space form.
///
/// Each hull facet contributes an inward-pointing unit normal `n` and offset
/// `d = n · a` (for `a` a facet vertex); a point lies inside the hull iff
/// `n · p >= d - tol` for every facet.
#[derive(Debug, Clone)]
pub struct HullFacets {
    half_spaces: Vec<(Vector3, f64)>,
    min: Point3,
    max: Point3,
}

impl HullFacets {
    /// Builds the hull of a point set and converts its facet triangles into
    /// inward half-spaces.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` when fewer than four distinct
    /// points are supplied or the set is coplanar, so no solid hull exists.
    pub fn from_points(points: &[Point3]) -> Result<Self, GeometryError> {
        if points.len() < 4 {
            return Err(GeometryError::Degenerate(format!(
                "convex hull needs at least 4 vertices, got {}",
                points.len()
            )));
        }

        let rows: Vec<Vec<f64>> = points.iter().map(|p| vec![p.x, p.y, p.z]).collect();
        let hull = ConvexHullWrapper::try_new(&rows, None)
            .map_err(|e| GeometryError::Degenerate(format!("hull construction failed: {e:?}")))?;
        let (verts, indices) = hull.vertices_indices();

        let centroid = points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / points.len() as f64;

        let mut half_spaces = Vec::with_capacity(indices.len() / 3);
        for tri in indices.chunks_exact(3) {
            let a = Vector3::new(verts[tri[0]][0], verts[tri[0]][1], verts[tri[0]][2]);
            let b = Vector3::new(verts[tri[1]][0], verts[tri[1]][1], verts[tri[1]][2]);
            let c = Vector3::new(verts[tri[2]][0], verts[tri[2]][1], verts[tri[2]][2]);
            let mut normal = (a - b).cross(&(a - c));
            let len = normal.norm();
            if len < TOLERANCE {
                // Sliver triangle; its plane is covered by a neighbor.
                continue;
            }
            normal /= len;
            // Flip so the normal points toward the hull interior.
            if (centroid - a).dot(&normal) < 0.0 {
                normal = -normal;
            }
            let offset = normal.dot(&a);
            half_spaces.push((normal, offset));
        }
        if half_spaces.is_empty() {
            return Err(GeometryError::Degenerate(
                "all hull facets are degenerate".into(),
            ));
        }

        let mut min = points[0];
        let mut max = points[0];
        for p in &points[1..] {
            min = Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
        }

        Ok(Self {
            half_spaces,
            min,
            max,
        })
    }

    /// Tests hull membership with a tolerance toward the outside, so points
    /// on a facet plane count as inside.
    #[must_use]
    pub fn contains(&self, point: &Point3, tol: f64) -> bool {
        self.half_spaces
            .iter()
            .all(|(n, d)| n.dot(&point.coords) >= d - tol)
    }

    /// Minimum corner of the axis-aligned box over the input points.
    #[must_use]
    pub fn min(&self) -> &Point3 {
        &self.min
    }

    /// Maximum corner of the axis-aligned box over the input points.
    #[must_use]
    pub fn max(&self) -> &Point3 {
        &self.max
    }
}
