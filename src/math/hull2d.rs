use super::TOLERANCE;

/// Computes the 2D convex hull of a point set via the monotone chain
/// algorithm, returning indices into `points` in counter-clockwise order.
///
/// Collinear points on the hull boundary are dropped, so the result traces
/// only the hull corners. Duplicate input points are tolerated. Returns all
/// distinct indices (at most two) when the set is degenerate.
#[must_use]
pub fn convex_hull_indices(points: &[(f64, f64)]) -> Vec<usize> {
    let n = points.len();
    if n < 3 {
        return (0..n).collect();
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        points[a]
            .partial_cmp(&points[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.dedup_by(|&mut a, &mut b| {
        (points[a].0 - points[b].0).abs() < TOLERANCE
            && (points[a].1 - points[b].1).abs() < TOLERANCE
    });
    if order.len() < 3 {
        return order;
    }

    let mut hull: Vec<usize> = Vec::with_capacity(order.len() * 2);
    // Lower chain.
    for &idx in &order {
        push_chain(&mut hull, points, idx, 0);
    }
    hull.pop();
    // Upper chain over the reversed sweep.
    let start = hull.len();
    for &idx in order.iter().rev() {
        push_chain(&mut hull, points, idx, start);
    }
    hull.pop();
    hull
}

/// Appends `idx` to a hull chain, popping entries that would make the chain
/// turn clockwise or go collinear.
fn push_chain(hull: &mut Vec<usize>, points: &[(f64, f64)], idx: usize, start: usize) {
    while hull.len() >= start + 2 {
        let a = points[hull[hull.len() - 2]];
        let b = points[hull[hull.len() - 1]];
        if cross(a, b, points[idx]) > TOLERANCE {
            break;
        }
        hull.pop();
    }
    hull.push(idx);
}

/// Orders a point set into its convex hull polygon, returning the hull
/// corner coordinates in counter-clockwise order.
#[must_use]
pub fn hull_polygon(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    convex_hull_indices(points)
        .into_iter()
        .map(|i| points[i])
        .collect()
}

/// 2D cross product of `(b - a)` and `(c - a)`.
fn cross(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

/// Tests whether `(x, y)` lies inside or on the boundary of a convex polygon
/// given in counter-clockwise order.
#[must_use]
pub fn point_in_convex_polygon(x: f64, y: f64, polygon: &[(f64, f64)], tol: f64) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let n = polygon.len();
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        if cross(a, b, (x, y)) < -tol {
            return false;
        }
    }
    true
}
