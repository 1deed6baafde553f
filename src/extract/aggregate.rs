use std::f64::consts::PI;

use crate::grid::{GridBounds, VoxelGrid};
use crate::math::{Point3, Vector3};
use crate::tessellation::Tessellation;

use super::facets::FacetMetrics;
use super::fibers::{FiberSpace, PORE};
use super::hulls::UNLABELED;

/// Decomposition of a pore-to-pore conduit into the pore-body, fiber
/// crossing and opposite pore-body contributions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConduitLengths {
    /// Throat centroid to first pore centroid, less the fiber radius.
    pub pore1: f64,
    /// The fiber crossing: twice the fiber radius.
    pub throat: f64,
    /// Throat centroid to second pore centroid, less the fiber radius.
    pub pore2: f64,
}

impl ConduitLengths {
    /// Total centroid-to-centroid length of the conduit.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.pore1 + self.throat + self.pore2
    }
}

/// Derived attributes of one pore.
#[derive(Debug, Clone)]
pub struct PoreGeometry {
    pub id: usize,
    /// Pore-phase voxel volume of the hull, in physical units cubed.
    pub volume: f64,
    /// Diameter of the volume-equivalent sphere.
    pub diameter: f64,
    /// Diameter of the largest sphere inscribed in the pore's fiber-free
    /// space.
    pub indiameter: f64,
    /// Mean of the hull vertices.
    pub centroid: Point3,
    /// Position of the inscribed-sphere center; `None` when the hull
    /// claimed no voxels.
    pub incenter: Option<Point3>,
}

/// Derived attributes of one throat.
#[derive(Debug, Clone)]
pub struct ThroatGeometry {
    pub id: usize,
    /// Ids of the two pores the throat connects.
    pub pores: (usize, usize),
    /// Unit normal of the facet plane; `None` for degenerate facets.
    pub normal: Option<Vector3>,
    /// Fiber-eroded cross-sectional area.
    pub cross_sectional_area: f64,
    /// Boundary perimeter of the eroded cross-section.
    pub perimeter: f64,
    /// Diameter of the area-equivalent circle.
    pub diameter: f64,
    /// Diameter of the largest inscribed circle.
    pub indiameter: f64,
    /// Centroid of the eroded cross-section; `None` when occluded.
    pub centroid: Option<Point3>,
    /// Center of the largest inscribed circle; `None` when occluded.
    pub incenter: Option<Point3>,
    /// The eroded (offset) polygon vertices; empty when occluded.
    pub offset_vertices: Vec<Point3>,
    /// Conduit-length decomposition; `None` when the throat centroid is
    /// undefined.
    pub conduit_lengths: Option<ConduitLengths>,
}

/// Voxel totals of the two phases over the whole domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseCounts {
    pub fiber: u64,
    pub pore: u64,
}

impl PhaseCounts {
    /// Fraction of the domain that is open pore space.
    #[must_use]
    pub fn porosity(&self) -> f64 {
        let total = self.fiber + self.pore;
        if total == 0 {
            return 0.0;
        }
        self.pore as f64 / total as f64
    }
}

/// Merges the label volume, the fiber-space volumes and the per-throat
/// facet metrics into the final pore and throat attribute sets.
pub(crate) fn aggregate(
    tess: &Tessellation,
    bounds: &GridBounds,
    labels: &VoxelGrid<u32>,
    fiber: &FiberSpace,
    normals: Vec<Option<Vector3>>,
    metrics: Vec<FacetMetrics>,
) -> (Vec<PoreGeometry>, Vec<ThroatGeometry>, PhaseCounts) {
    let shape = bounds.shape();
    let resolution = bounds.resolution();
    let pore_count = tess.pores().len();

    // One sweep over the volumes: per-pore pore-phase voxel counts, the
    // per-pore distance-field maximum, and the global phase totals.
    let mut pore_voxels = vec![0u64; pore_count];
    let mut max_distance = vec![0.0f64; pore_count];
    let mut max_index: Vec<Option<usize>> = vec![None; pore_count];
    let mut counts = PhaseCounts::default();
    for (i, &label) in labels.data().iter().enumerate() {
        let phase = fiber.phase.data()[i];
        if phase == PORE {
            counts.pore += 1;
        } else {
            counts.fiber += 1;
        }
        if label == UNLABELED {
            continue;
        }
        let pore = label as usize;
        if phase == PORE {
            pore_voxels[pore] += 1;
        }
        let d = fiber.distance.data()[i];
        if max_index[pore].is_none() || d > max_distance[pore] {
            max_distance[pore] = d;
            max_index[pore] = Some(i);
        }
    }

    let pores: Vec<PoreGeometry> = tess
        .pores()
        .iter()
        .map(|pore| {
            let volume = pore_voxels[pore.id] as f64 * resolution.powi(3);
            let (indiameter, incenter) = match max_index[pore.id] {
                Some(i) => {
                    let (x, y, z) = shape.coords(i);
                    (
                        2.0 * max_distance[pore.id] * resolution,
                        Some(bounds.to_physical(x, y, z)),
                    )
                }
                None => (0.0, None),
            };
            PoreGeometry {
                id: pore.id,
                volume,
                diameter: (6.0 * volume / PI).cbrt(),
                indiameter,
                centroid: pore.centroid(),
                incenter,
            }
        })
        .collect();

    let fiber_radius = tess.fiber_radius();
    let throats: Vec<ThroatGeometry> = tess
        .throats()
        .iter()
        .zip(normals)
        .zip(metrics)
        .map(|((throat, normal), m)| {
            let conduit_lengths = m.centroid.map(|tc| {
                let c1 = tess.pores()[throat.pores.0].centroid();
                let c2 = tess.pores()[throat.pores.1].centroid();
                ConduitLengths {
                    pore1: (tc - c1).norm() - fiber_radius,
                    throat: 2.0 * fiber_radius,
                    pore2: (tc - c2).norm() - fiber_radius,
                }
            });
            ThroatGeometry {
                id: throat.id,
                pores: throat.pores,
                normal,
                cross_sectional_area: m.area,
                perimeter: m.perimeter,
                diameter: m.equiv_diameter,
                indiameter: 2.0 * m.inradius,
                centroid: m.centroid,
                incenter: m.incenter,
                offset_vertices: m.offset_vertices,
                conduit_lengths,
            }
        })
        .collect();

    (pores, throats, counts)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn conduit_total_sums_components() {
        let lengths = ConduitLengths {
            pore1: 0.4,
            throat: 0.2,
            pore2: 0.3,
        };
        assert_relative_eq!(lengths.total(), 0.9);
    }

    #[test]
    fn porosity_is_pore_fraction() {
        let counts = PhaseCounts { fiber: 25, pore: 75 };
        assert_relative_eq!(counts.porosity(), 0.75);
        assert_relative_eq!(PhaseCounts::default().porosity(), 0.0);
    }
}
