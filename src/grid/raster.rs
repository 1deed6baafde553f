use crate::math::hull2d::{hull_polygon, point_in_convex_polygon};

/// Rasterizes the convex hull of a 2D point set into a solid binary image of
/// shape `(width, height)` in C order (`y` fastest): a pixel is set when its
/// center lies inside or on the hull polygon.
///
/// When the points are collinear (no hull polygon exists) only the rounded
/// points themselves are marked, leaving a one-pixel trace.
#[must_use]
pub fn convex_mask(points: &[(f64, f64)], width: usize, height: usize) -> Vec<bool> {
    let mut mask = vec![false; width * height];
    let polygon = hull_polygon(points);
    if polygon.len() < 3 {
        for &(px, py) in points {
            let (x, y) = (px.round() as i64, py.round() as i64);
            if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height {
                mask[x as usize * height + y as usize] = true;
            }
        }
        return mask;
    }

    for x in 0..width {
        for y in 0..height {
            if point_in_convex_polygon(x as f64, y as f64, &polygon, 1e-9) {
                mask[x * height + y] = true;
            }
        }
    }
    mask
}
