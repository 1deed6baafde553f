use std::f64::consts::PI;

use crate::conditions::{Condition, ConditionLog};
use crate::grid::distance::{seed_value, squared_edt_2d};
use crate::grid::raster::convex_mask;
use crate::grid::regions::label_regions;
use crate::math::hull2d::convex_hull_indices;
use crate::math::rotation::align_to_axis;
use crate::math::{Point3, Vector3, TOLERANCE};

/// Cross-section measurements for one throat, in physical units and the
/// original 3D frame.
///
/// The default value is the occluded/degenerate zero result: zero area,
/// perimeter and inradius, undefined centroid and incenter, no offset
/// polygon.
#[derive(Debug, Clone, Default)]
pub(crate) struct FacetMetrics {
    pub area: f64,
    pub perimeter: f64,
    pub equiv_diameter: f64,
    pub inradius: f64,
    pub centroid: Option<Point3>,
    pub incenter: Option<Point3>,
    pub offset_vertices: Vec<Point3>,
}

/// Measures a throat facet: plane-aligns it, rasterizes it at a fixed
/// raster size, erodes by the scaled fiber radius via a distance transform,
/// measures the surviving region, and maps everything back to 3D.
pub(crate) fn analyze(
    throat: usize,
    vertices: &[Point3],
    normal: &Vector3,
    fiber_radius: f64,
    raster_size: usize,
    log: &ConditionLog,
) -> FacetMetrics {
    if vertices.len() < 3 {
        log.record(Condition::DegenerateFacet {
            throat: Some(throat),
            pore: None,
        });
        return FacetMetrics::default();
    }

    // Boundary facets are often already axis-aligned; skip the rotation then.
    let rotation = align_to_axis(normal, &Vector3::z());
    let facet: Vec<Point3> = match &rotation {
        Some(rot) => vertices.iter().map(|p| rot * p).collect(),
        None => vertices.to_vec(),
    };

    let tx = facet.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let ty = facet.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let pts: Vec<(f64, f64)> = facet.iter().map(|p| (p.x - tx, p.y - ty)).collect();
    let max_extent = pts.iter().map(|&(x, y)| x.max(y)).fold(0.0, f64::max);
    if max_extent < TOLERANCE {
        log.record(Condition::DegenerateFacet {
            throat: Some(throat),
            pore: None,
        });
        return FacetMetrics::default();
    }

    // Significant digits of the facet extent, used to collapse the
    // near-planar spread of the rotated z values.
    let decimals = (-max_extent.log10()).ceil() as i32 + 1;
    let z_plane = plane_z(&facet, decimals, throat, log);

    // Scale so the larger extent spans the raster; the same factor applies
    // to the fiber radius.
    let raster = raster_size as f64;
    let scale = raster / max_extent;
    let r = scale * fiber_radius;
    if r > raster / 2.0 {
        log.record(Condition::Occluded { throat });
        return FacetMetrics::default();
    }

    let int_pts: Vec<(i64, i64)> = pts
        .iter()
        .map(|&(x, y)| ((x * scale).round() as i64, (y * scale).round() as i64))
        .collect();
    let max_sx = pts.iter().map(|p| p.0 * scale).fold(0.0, f64::max);
    let max_sy = pts.iter().map(|p| p.1 * scale).fold(0.0, f64::max);
    // One-pixel pad on every side so hull fill and erosion see a border.
    let width = max_sx.ceil() as usize + 3;
    let height = max_sy.ceil() as usize + 3;
    let padded: Vec<(f64, f64)> = int_pts
        .iter()
        .map(|&(x, y)| ((x + 1) as f64, (y + 1) as f64))
        .collect();
    if convex_hull_indices(&padded).len() < 3 {
        log.record(Condition::DegenerateFacet {
            throat: Some(throat),
            pore: None,
        });
        return FacetMetrics::default();
    }
    let mask = convex_mask(&padded, width, height);

    // One distance transform serves as both the erosion (cheaper than a
    // morphological erosion with a disk) and, below, the inradius source.
    let mut field: Vec<f64> = mask.iter().map(|&inside| seed_value(!inside)).collect();
    squared_edt_2d(&mut field, width, height);
    let r2 = r * r;
    let eroded: Vec<bool> = field.iter().map(|&d2| d2 > r2).collect();
    if eroded.iter().filter(|&&e| e).count() < 3 {
        log.record(Condition::Occluded { throat });
        return FacetMetrics::default();
    }

    let regions = label_regions(&eroded, width, height);
    if regions.len() > 1 {
        // Split channels are unsupported; degrade to the zero-area result.
        log.record(Condition::MultiRegionThroat {
            throat,
            regions: regions.len(),
        });
        return FacetMetrics::default();
    }
    let region = &regions[0];

    // Second transform, over the eroded region, locates the incircle.
    let mut inner: Vec<f64> = eroded.iter().map(|&inside| seed_value(!inside)).collect();
    squared_edt_2d(&mut inner, width, height);
    let (mut best_d2, mut best_idx) = (0.0f64, 0usize);
    for (i, &d2) in inner.iter().enumerate() {
        if d2 > best_d2 {
            best_d2 = d2;
            best_idx = i;
        }
    }

    // Offset vertices: the surviving pixels nearest each original vertex.
    let coords: Vec<(f64, f64)> = region
        .coords
        .iter()
        .map(|&(x, y)| (x as f64 - 1.0, y as f64 - 1.0))
        .collect();
    let mut offset_idx: Vec<usize> = Vec::new();
    for &(px, py) in &int_pts {
        let mut nearest = (f64::INFINITY, 0usize);
        for (ci, &(cx, cy)) in coords.iter().enumerate() {
            let dx = cx - px as f64;
            let dy = cy - py as f64;
            let d2 = dx * dx + dy * dy;
            if d2 < nearest.0 {
                nearest = (d2, ci);
            }
        }
        if !offset_idx.contains(&nearest.1) {
            offset_idx.push(nearest.1);
        }
    }
    if offset_idx.len() < 3 {
        // Too few distinct offset vertices to bound a nonzero area.
        log.record(Condition::Occluded { throat });
        return FacetMetrics::default();
    }

    // Undo scaling, translation and rotation.
    let unrotate = rotation.as_ref().map(nalgebra::Rotation3::inverse);
    let to_world = |x: f64, y: f64| -> Point3 {
        let p = Point3::new(x / scale + tx, y / scale + ty, z_plane);
        match &unrotate {
            Some(rot) => rot * p,
            None => p,
        }
    };
    let centroid = to_world(region.centroid.0 - 1.0, region.centroid.1 - 1.0);
    let incenter = to_world(
        (best_idx / height) as f64 - 1.0,
        (best_idx % height) as f64 - 1.0,
    );
    let offset_vertices = offset_idx
        .iter()
        .map(|&i| to_world(coords[i].0, coords[i].1))
        .collect();
    let area = region.area as f64 / (scale * scale);

    FacetMetrics {
        area,
        perimeter: region.perimeter / scale,
        equiv_diameter: 2.0 * (area / PI).sqrt(),
        inradius: best_d2.sqrt() / scale,
        centroid: Some(centroid),
        incenter: Some(incenter),
        offset_vertices,
    }
}

/// Collapses the rotated facet's z values onto a single plane coordinate.
/// The values are rounded to the facet's significant digits; a spread wider
/// than that is a rotation failure and falls back to the mean.
fn plane_z(facet: &[Point3], decimals: i32, throat: usize, log: &ConditionLog) -> f64 {
    let quantum = 10f64.powi(decimals);
    let mut rounded: Vec<f64> = facet.iter().map(|p| (p.z * quantum).round() / quantum).collect();
    rounded.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    rounded.dedup();
    if rounded.len() > 1 {
        log.record(Condition::RotationFailure { throat });
        rounded.iter().sum::<f64>() / rounded.len() as f64
    } else {
        rounded[0]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;

    fn unit_square_facet() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(1.0, 0.0, 2.0),
            Point3::new(1.0, 1.0, 2.0),
            Point3::new(0.0, 1.0, 2.0),
        ]
    }

    #[test]
    fn square_facet_erodes_to_inner_square() {
        let log = ConditionLog::new();
        let m = analyze(0, &unit_square_facet(), &Vector3::z(), 0.1, 200, &log);
        assert_abs_diff_eq!(m.area, 0.64, epsilon = 0.03);
        assert_abs_diff_eq!(m.inradius, 0.4, epsilon = 0.02);
        assert_eq!(m.offset_vertices.len(), 4);
        let c = m.centroid.unwrap();
        assert_abs_diff_eq!(c.x, 0.5, epsilon = 0.02);
        assert_abs_diff_eq!(c.y, 0.5, epsilon = 0.02);
        assert_relative_eq!(c.z, 2.0, epsilon = 1e-9);
        let ic = m.incenter.unwrap();
        assert_abs_diff_eq!(ic.x, 0.5, epsilon = 0.02);
        assert_abs_diff_eq!(ic.y, 0.5, epsilon = 0.02);
    }

    #[test]
    fn thick_fiber_occludes_the_throat() {
        let log = ConditionLog::new();
        let m = analyze(7, &unit_square_facet(), &Vector3::z(), 0.6, 200, &log);
        assert_eq!(m.area, 0.0);
        assert!(m.offset_vertices.is_empty());
        assert!(m.centroid.is_none());
        assert!(log
            .into_entries()
            .contains(&Condition::Occluded { throat: 7 }));
    }

    #[test]
    fn tilted_facet_round_trips_through_rotation() {
        // The unit square tilted out of the xy plane around the x axis.
        let angle: f64 = 0.5;
        let (sin, cos) = angle.sin_cos();
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, cos, sin),
            Point3::new(0.0, cos, sin),
        ];
        let normal = Vector3::new(0.0, -sin, cos);
        let log = ConditionLog::new();
        let m = analyze(0, &vertices, &normal, 0.1, 200, &log);
        assert_abs_diff_eq!(m.area, 0.64, epsilon = 0.03);
        // The measured centroid must land back on the tilted plane.
        let c = m.centroid.unwrap();
        assert_abs_diff_eq!(c.coords.dot(&normal), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.x, 0.5, epsilon = 0.02);
    }

    #[test]
    fn degenerate_facet_yields_zero_result() {
        let log = ConditionLog::new();
        let collinear = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.5, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let m = analyze(1, &collinear, &Vector3::z(), 0.1, 200, &log);
        assert_eq!(m.area, 0.0);
        assert!(log.into_entries().contains(&Condition::DegenerateFacet {
            throat: Some(1),
            pore: None,
        }));
    }
}
