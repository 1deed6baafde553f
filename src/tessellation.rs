use crate::error::{GeometryError, InputError};
use crate::math::hull2d::convex_hull_indices;
use crate::math::{Point3, Vector3, TOLERANCE};

/// A pore of the tessellation: a Voronoi cell described by the unordered
/// vertex set of its convex hull.
#[derive(Debug, Clone)]
pub struct PoreHull {
    /// Dense pore id (equal to the pore's index in the snapshot).
    pub id: usize,
    /// Hull vertices in physical coordinates. At least four non-coplanar
    /// points are expected; degenerate sets are recovered as zero-volume
    /// pores during extraction.
    pub vertices: Vec<Point3>,
}

impl PoreHull {
    /// Mean of the hull vertices.
    #[must_use]
    pub fn centroid(&self) -> Point3 {
        centroid(&self.vertices)
    }
}

/// A throat of the tessellation: the shared facet between two adjacent
/// pores, described by its (coplanar) vertex set.
#[derive(Debug, Clone)]
pub struct ThroatFacet {
    /// Dense throat id (equal to the throat's index in the snapshot).
    pub id: usize,
    /// Facet vertices in physical coordinates, in no particular order.
    pub vertices: Vec<Point3>,
    /// Ids of the two pores this throat connects.
    pub pores: (usize, usize),
}

impl ThroatFacet {
    /// Mean of the facet vertices.
    #[must_use]
    pub fn centroid(&self) -> Point3 {
        centroid(&self.vertices)
    }

    /// Orders the facet vertices into a closed convex polygon using the 2D
    /// hull of their dominant-plane projection (the axis with the smallest
    /// spread is dropped). Returns `None` when fewer than three hull corners
    /// exist, i.e. the facet is collinear or too small.
    #[must_use]
    pub fn hull_ordered_vertices(&self) -> Option<Vec<Point3>> {
        let projected = project_dominant_plane(&self.vertices);
        let order = convex_hull_indices(&projected);
        if order.len() < 3 {
            return None;
        }
        Some(order.into_iter().map(|i| self.vertices[i]).collect())
    }

    /// Unit normal of the facet plane, from the cross product of two edges
    /// of the hull-ordered polygon.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` for collinear or too-small
    /// facets.
    pub fn normal(&self) -> Result<Vector3, GeometryError> {
        let ordered = self.hull_ordered_vertices().ok_or_else(|| {
            GeometryError::Degenerate(format!("throat {} facet is not a polygon", self.id))
        })?;
        let v1 = ordered[ordered.len() - 1] - ordered[0];
        let v2 = ordered[1] - ordered[0];
        let normal = v1.cross(&v2);
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector);
        }
        Ok(normal / len)
    }
}

/// Immutable tessellation snapshot consumed from the adapter boundary.
///
/// Holds everything one extraction pass reads: per-pore hull vertex sets,
/// per-throat facet vertex sets with pore adjacency, and the two global
/// scalars (fiber radius and voxel resolution). Nothing here is mutated
/// during extraction, so per-entity work can run in parallel against it.
#[derive(Debug, Clone)]
pub struct Tessellation {
    pores: Vec<PoreHull>,
    throats: Vec<ThroatFacet>,
    fiber_radius: f64,
    resolution: f64,
}

impl Tessellation {
    /// Validates and wraps the adapter's output.
    ///
    /// # Errors
    ///
    /// Returns an [`InputError`] when a scalar is not positive, ids are not
    /// dense (`id == index`), or a throat references an unknown pore.
    pub fn new(
        pores: Vec<PoreHull>,
        throats: Vec<ThroatFacet>,
        fiber_radius: f64,
        resolution: f64,
    ) -> Result<Self, InputError> {
        if !(fiber_radius > 0.0) {
            return Err(InputError::NonPositiveScalar {
                name: "fiber_radius",
                value: fiber_radius,
            });
        }
        if !(resolution > 0.0) {
            return Err(InputError::NonPositiveScalar {
                name: "resolution",
                value: resolution,
            });
        }
        if pores.is_empty() {
            return Err(InputError::Empty);
        }
        for (index, pore) in pores.iter().enumerate() {
            if pore.id != index {
                return Err(InputError::NonDenseId { id: pore.id, index });
            }
        }
        for (index, throat) in throats.iter().enumerate() {
            if throat.id != index {
                return Err(InputError::NonDenseId { id: throat.id, index });
            }
            for pore in [throat.pores.0, throat.pores.1] {
                if pore >= pores.len() {
                    return Err(InputError::UnknownPore {
                        throat: throat.id,
                        pore,
                    });
                }
            }
        }
        Ok(Self {
            pores,
            throats,
            fiber_radius,
            resolution,
        })
    }

    /// The pores of the snapshot.
    #[must_use]
    pub fn pores(&self) -> &[PoreHull] {
        &self.pores
    }

    /// The throats of the snapshot.
    #[must_use]
    pub fn throats(&self) -> &[ThroatFacet] {
        &self.throats
    }

    /// Physical half-thickness of the fibers occupying the Voronoi edges.
    #[must_use]
    pub fn fiber_radius(&self) -> f64 {
        self.fiber_radius
    }

    /// Physical edge length of one voxel.
    #[must_use]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Iterates over every pore hull vertex (for domain bounds).
    pub(crate) fn hull_vertices(&self) -> impl Iterator<Item = &Point3> {
        self.pores.iter().flat_map(|p| p.vertices.iter())
    }
}

fn centroid(vertices: &[Point3]) -> Point3 {
    let sum = vertices
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / vertices.len() as f64)
}

/// Projects 3D points onto the coordinate plane that preserves the most
/// spread: the axis with the smallest standard deviation is dropped and the
/// remaining two are kept in axis order.
pub(crate) fn project_dominant_plane(vertices: &[Point3]) -> Vec<(f64, f64)> {
    let spread = axis_spread(vertices);
    let drop = if spread[0] < spread[1] && spread[0] < spread[2] {
        0
    } else if spread[1] < spread[0] && spread[1] < spread[2] {
        1
    } else {
        2
    };
    vertices
        .iter()
        .map(|p| match drop {
            0 => (p.y, p.z),
            1 => (p.x, p.z),
            _ => (p.x, p.y),
        })
        .collect()
}

fn axis_spread(vertices: &[Point3]) -> [f64; 3] {
    let n = vertices.len() as f64;
    let mean = centroid(vertices);
    let mut var = [0.0; 3];
    for p in vertices {
        let d = p - mean;
        var[0] += d.x * d.x;
        var[1] += d.y * d.y;
        var[2] += d.z * d.z;
    }
    [var[0] / n, var[1] / n, var[2] / n]
}
