//! Polygon simplification
use crate::{Point, Polygon, Scalar};

/// Simplify closed polygon with Douglas-Peucker algorithm
///
/// Polygons with absolute area below `min_area` are discarded, both before and after
/// simplification. Every removed point lies within `tolerance` of the segment that
/// replaced it. The polygon is split into two chains at the point farthest from the
/// first one, so the first point always survives and applying simplification to its
/// own output changes nothing. Returns `None` if the polygon is discarded, which also
/// happens when simplification collapses it below three points or flips its orientation.
pub fn simplify(polygon: &Polygon, tolerance: Scalar, min_area: Scalar) -> Option<Polygon> {
    let points = polygon.points();
    let area = polygon.area();
    if points.len() < 3 || area.abs() < min_area || area == 0.0 {
        return None;
    }
    let tolerance = tolerance.max(0.0);

    let first = points[0];
    let (split, split_dist) = points
        .iter()
        .enumerate()
        .skip(1)
        .map(|(index, point)| (index, first.dist(*point)))
        .fold((0, 0.0), |best, item| if item.1 > best.1 { item } else { best });
    if split_dist == 0.0 {
        return None;
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[split] = true;
    douglas_peucker(points, 0, split, tolerance, &mut keep);
    douglas_peucker(points, split, points.len(), tolerance, &mut keep);

    let result: Polygon = points
        .iter()
        .zip(keep)
        .filter_map(|(point, keep)| keep.then_some(*point))
        .collect();
    let result_area = result.area();
    if result.len() < 3 || result_area.abs() < min_area || result_area.signum() != area.signum() {
        return None;
    }
    Some(result)
}

/// Mark points of the chain `start..=end` that must be kept, `end` equal to the
/// number of points refers to the first point (closing chain)
fn douglas_peucker(points: &[Point], start: usize, end: usize, tolerance: Scalar, keep: &mut [bool]) {
    let at = |index: usize| points[index % points.len()];
    let mut stack = vec![(start, end)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let (a, b) = (at(start), at(end));
        let (index, dist) = (start + 1..end)
            .map(|index| (index, at(index).line_dist(a, b)))
            .fold((start, 0.0), |best, item| if item.1 > best.1 { item } else { best });
        if dist > tolerance {
            keep[index] = true;
            stack.push((index, end));
            stack.push((start, index));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    fn polygon(values: &[(Scalar, Scalar)]) -> Polygon {
        values.iter().map(|(x, y)| Point::new(*x, *y)).collect()
    }

    /// Rectangle outline with a point at every integer step and slightly jittered edges
    fn staircase() -> Polygon {
        let mut points = Vec::new();
        for x in 0..10 {
            points.push(Point::new(x as Scalar, if x % 2 == 0 { 0.0 } else { 0.3 }));
        }
        for y in 0..6 {
            points.push(Point::new(10.0, y as Scalar));
        }
        for x in (1..=10).rev() {
            points.push(Point::new(x as Scalar, 6.0));
        }
        for y in (1..=6).rev() {
            points.push(Point::new(0.0, y as Scalar));
        }
        Polygon::new(points)
    }

    #[test]
    fn test_simplify_rect() {
        let source = staircase();
        let result = simplify(&source, 0.5, 0.0).unwrap();
        assert_eq!(
            result,
            polygon(&[(0.0, 0.0), (10.0, 0.0), (10.0, 6.0), (0.0, 6.0)])
        );
        assert!((result.area() - source.area()).abs() <= 0.5 * source.perimeter());

        // smaller tolerance keeps the jitter
        let result = simplify(&source, 0.1, 0.0).unwrap();
        assert!(result.len() > 4);
        assert!(result.len() < source.len());
    }

    #[test]
    fn test_idempotent() {
        let source = staircase();
        for tolerance in [0.0, 0.1, 0.29, 0.5, 2.0] {
            let once = simplify(&source, tolerance, 1.0).unwrap();
            let twice = simplify(&once, tolerance, 1.0).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_min_area() {
        let square = polygon(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        assert!(simplify(&square, 0.0, 4.5).is_none());
        let result = simplify(&square, 0.0, 4.0).unwrap();
        assert_approx_eq!(result.area(), 4.0);

        // holes are discarded by their absolute area
        let hole: Polygon = square.points().iter().rev().copied().collect();
        assert!(simplify(&hole, 1.0, 5.0).is_none());
        assert_approx_eq!(simplify(&hole, 1.0, 3.0).unwrap().area(), -4.0);
    }

    #[test]
    fn test_degenerate() {
        assert!(simplify(&polygon(&[(0.0, 0.0), (1.0, 1.0)]), 0.0, 0.0).is_none());
        // collinear points have no area
        let line = polygon(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert!(simplify(&line, 0.0, 0.0).is_none());
        // thin triangle collapses
        let thin = polygon(&[(0.0, 0.0), (10.0, 0.0), (5.0, 0.2)]);
        assert!(simplify(&thin, 1.0, 0.0).is_none());
    }
}
