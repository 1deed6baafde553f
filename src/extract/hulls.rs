use rayon::prelude::*;
use tracing::debug;

use crate::conditions::{Condition, ConditionLog};
use crate::grid::{GridBounds, VoxelGrid};
use crate::math::hull3d::HullFacets;
use crate::math::{Point3, HALF_SPACE_TOLERANCE};
use crate::tessellation::Tessellation;

use super::ExtractConfig;

/// Label for voxels not claimed by any pore hull.
pub(crate) const UNLABELED: u32 = u32::MAX;

/// Rasterizes every pore's convex hull into a shared label volume.
///
/// Pores are voxelized in parallel, each testing only its local bounding
/// box with the inward-normal half-space test; cell lists are merged
/// sequentially in ascending pore id, so the rare overlap between adjacent
/// hulls resolves deterministically to the higher id. Gaps left between
/// hulls by rounding are closed afterwards by a label dilation pass.
pub(crate) fn voxelize(
    tess: &Tessellation,
    bounds: &GridBounds,
    config: &ExtractConfig,
    log: &ConditionLog,
) -> VoxelGrid<u32> {
    let shape = bounds.shape();

    let per_pore: Vec<Vec<usize>> = tess
        .pores()
        .par_iter()
        .map(|pore| {
            let vertices: Vec<Point3> = dedup_rounded(&pore.vertices)
                .iter()
                .map(|p| bounds.to_voxel_frame(p))
                .collect();
            let hull = match HullFacets::from_points(&vertices) {
                Ok(hull) => hull,
                Err(err) => {
                    debug!(pore = pore.id, %err, "pore hull is degenerate");
                    log.record(Condition::DegenerateFacet {
                        throat: None,
                        pore: Some(pore.id),
                    });
                    return Vec::new();
                }
            };

            let x0 = hull.min().x.floor().max(0.0) as usize;
            let y0 = hull.min().y.floor().max(0.0) as usize;
            let z0 = hull.min().z.floor().max(0.0) as usize;
            let x1 = (hull.max().x.ceil() as usize).min(shape.nx.saturating_sub(1));
            let y1 = (hull.max().y.ceil() as usize).min(shape.ny.saturating_sub(1));
            let z1 = (hull.max().z.ceil() as usize).min(shape.nz.saturating_sub(1));

            let mut cells = Vec::new();
            for x in x0..=x1 {
                for y in y0..=y1 {
                    for z in z0..=z1 {
                        let p = Point3::new(x as f64, y as f64, z as f64);
                        if hull.contains(&p, HALF_SPACE_TOLERANCE) {
                            cells.push(shape.index(x, y, z));
                        }
                    }
                }
            }
            cells
        })
        .collect();

    let mut labels = VoxelGrid::filled(shape, UNLABELED);
    for (pore, cells) in per_pore.iter().enumerate() {
        for &i in cells {
            labels.data_mut()[i] = pore as u32;
        }
    }

    fill_unassigned(&mut labels, config.max_fill_passes, log);
    labels
}

/// Deduplicates vertices after rounding to six decimals, preserving first
/// occurrences (near-identical Voronoi vertices collapse to one).
fn dedup_rounded(vertices: &[Point3]) -> Vec<Point3> {
    let round6 = |v: f64| (v * 1e6).round() / 1e6;
    let mut out: Vec<Point3> = Vec::with_capacity(vertices.len());
    for p in vertices {
        let rounded = Point3::new(round6(p.x), round6(p.y), round6(p.z));
        if !out.contains(&rounded) {
            out.push(rounded);
        }
    }
    out
}

/// Closes numerical gaps between adjacent hulls: each unassigned cell takes
/// the maximum label found in its 2-cell Chebyshev neighborhood.
///
/// The pass is double-buffered (results do not depend on scan order) and
/// repeats up to `max_passes` times, stopping early once stable. Cells that
/// stay unlabeled are reported as a condition rather than silently kept.
fn fill_unassigned(labels: &mut VoxelGrid<u32>, max_passes: usize, log: &ConditionLog) {
    let shape = labels.shape();
    for _ in 0..max_passes {
        if !labels.data().contains(&UNLABELED) {
            break;
        }
        let old = labels.data().to_vec();
        let blocks: Vec<Vec<u32>> = (0..shape.nx)
            .into_par_iter()
            .map(|x| {
                let mut block = Vec::with_capacity(shape.ny * shape.nz);
                for y in 0..shape.ny {
                    for z in 0..shape.nz {
                        let current = old[shape.index(x, y, z)];
                        if current != UNLABELED {
                            block.push(current);
                            continue;
                        }
                        let mut best: Option<u32> = None;
                        for nx in x.saturating_sub(2)..(x + 3).min(shape.nx) {
                            for ny in y.saturating_sub(2)..(y + 3).min(shape.ny) {
                                for nz in z.saturating_sub(2)..(z + 3).min(shape.nz) {
                                    let label = old[shape.index(nx, ny, nz)];
                                    if label != UNLABELED && best.is_none_or(|b| label > b) {
                                        best = Some(label);
                                    }
                                }
                            }
                        }
                        block.push(best.unwrap_or(UNLABELED));
                    }
                }
                block
            })
            .collect();

        let mut changed = 0usize;
        let data = labels.data_mut();
        for (x, block) in blocks.iter().enumerate() {
            for (j, &label) in block.iter().enumerate() {
                let i = x * shape.ny * shape.nz + j;
                if data[i] != label {
                    data[i] = label;
                    changed += 1;
                }
            }
        }
        if changed == 0 {
            break;
        }
    }

    let remaining = labels.data().iter().filter(|&&l| l == UNLABELED).count();
    if remaining > 0 {
        log.record(Condition::UnassignedVoxels { count: remaining });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::grid::GridShape;

    use super::*;

    #[test]
    fn dedup_collapses_near_identical_vertices() {
        let verts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1e-9, -1e-9, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        assert_eq!(dedup_rounded(&verts).len(), 2);
    }

    #[test]
    fn fill_closes_a_one_voxel_gap() {
        let shape = GridShape { nx: 5, ny: 1, nz: 1 };
        let mut labels = VoxelGrid::filled(shape, UNLABELED);
        labels.set(0, 0, 0, 3);
        labels.set(1, 0, 0, 3);
        labels.set(3, 0, 0, 7);
        labels.set(4, 0, 0, 7);
        let log = ConditionLog::new();
        fill_unassigned(&mut labels, 1, &log);
        assert_eq!(*labels.get(2, 0, 0), 7);
        assert!(log.into_entries().is_empty());
    }

    #[test]
    fn isolated_gap_is_reported() {
        let shape = GridShape { nx: 9, ny: 1, nz: 1 };
        let mut labels = VoxelGrid::filled(shape, UNLABELED);
        labels.set(0, 0, 0, 1);
        let log = ConditionLog::new();
        fill_unassigned(&mut labels, 1, &log);
        // Cells 1 and 2 pick up the label; the rest stay out of reach.
        assert_eq!(*labels.get(2, 0, 0), 1);
        assert_eq!(*labels.get(3, 0, 0), UNLABELED);
        assert_eq!(
            log.into_entries(),
            vec![Condition::UnassignedVoxels { count: 6 }]
        );
    }

    #[test]
    fn extra_passes_extend_the_fill() {
        let shape = GridShape { nx: 9, ny: 1, nz: 1 };
        let mut labels = VoxelGrid::filled(shape, UNLABELED);
        labels.set(0, 0, 0, 1);
        let log = ConditionLog::new();
        fill_unassigned(&mut labels, 4, &log);
        assert!(!labels.data().contains(&UNLABELED));
        assert!(log.into_entries().is_empty());
    }
}
