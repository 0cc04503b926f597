//! Anti-aliased coverage rasterization of line segments
//!
//! Every line adds a signed area difference to the cells it crosses, a running sum
//! along each row turns differences into a winding number, which the fill rule
//! maps into coverage.
use crate::{Curve, EPSILON, FillRule, ImageOwned, Line, Point, Scalar, Shape, Size};

/// Spans narrower than this are treated as vertical
const MIN_SPAN: Scalar = 1e-6;

/// Integral of `clamp(u, 0, 1)`
fn ramp_integral(u: Scalar) -> Scalar {
    if u <= 0.0 {
        0.0
    } else if u < 1.0 {
        0.5 * u * u
    } else {
        u - 0.5
    }
}

/// Signed area differences of a row, `width + 2` cells wide
///
/// Lines are clipped horizontally to `0.0..=width`: parts on the left become vertical
/// lines at `x = 0` and keep contributing winding, parts on the right are projected
/// onto `x = width` and land in the extra columns which are never resolved.
struct Accumulator {
    width: usize,
    height: usize,
    stride: usize,
    cells: Vec<Scalar>,
}

impl Accumulator {
    fn new(size: Size) -> Self {
        let stride = size.width + 2;
        Self {
            width: size.width,
            height: size.height,
            stride,
            cells: vec![0.0; stride * size.height],
        }
    }

    fn add_line(&mut self, line: Line) {
        let Line([p0, p1]) = line;
        if !(p0.x().is_finite() && p0.y().is_finite() && p1.x().is_finite() && p1.y().is_finite())
        {
            return;
        }
        // parameters where the line crosses clipping boundaries
        let width = self.width as Scalar;
        let mut splits = [0.0, 1.0, 1.0, 1.0];
        let mut count = 1;
        let dx = p1.x() - p0.x();
        if dx.abs() > EPSILON {
            for bound in [0.0, width] {
                let t = (bound - p0.x()) / dx;
                if t > 0.0 && t < 1.0 {
                    splits[count] = t;
                    count += 1;
                }
            }
        }
        splits[count] = 1.0;
        splits[..=count].sort_by(|a, b| a.total_cmp(b));

        let mut start = p0;
        for &t in &splits[1..=count] {
            let end = if t >= 1.0 { p1 } else { line.at(t) };
            self.add_clipped(clip_point(start, width), clip_point(end, width));
            start = end;
        }
    }

    /// Accumulate line with both ends inside `0.0..=width` horizontally
    fn add_clipped(&mut self, p0: Point, p1: Point) {
        if (p0.y() - p1.y()).abs() < EPSILON {
            return;
        }
        let (sign, top, bottom) = if p0.y() < p1.y() {
            (1.0, p0, p1)
        } else {
            (-1.0, p1, p0)
        };
        let dxdy = (bottom.x() - top.x()) / (bottom.y() - top.y());
        let x_at = |y: Scalar| top.x() + (y - top.y()) * dxdy;

        let row_first = top.y().max(0.0).floor() as usize;
        let row_last = (bottom.y().ceil().max(0.0) as usize).min(self.height);
        for row in row_first..row_last {
            let y0 = (row as Scalar).max(top.y());
            let y1 = ((row + 1) as Scalar).min(bottom.y());
            if y1 <= y0 {
                continue;
            }
            let (xa, xb) = (x_at(y0), x_at(y1));
            self.add_span(row, xa.min(xb), xa.max(xb), sign * (y1 - y0));
        }
    }

    /// Distribute signed height `dy` of a line crossing a single row from `x0` to `x1`
    ///
    /// Running sum of the differences at cell `c` equals the part of the cell
    /// to the right of the line, averaged over the row slice.
    fn add_span(&mut self, row: usize, x0: Scalar, x1: Scalar, dy: Scalar) {
        let base = x0.floor();
        let (u0, u1) = (x0 - base, x1 - base);
        let span = u1 - u0;
        let covered = |k: Scalar| {
            if span < MIN_SPAN {
                (k + 1.0 - 0.5 * (u0 + u1)).clamp(0.0, 1.0)
            } else {
                (ramp_integral(k + 1.0 - u0) - ramp_integral(k + 1.0 - u1)) / span
            }
        };

        let offset = row * self.stride + base as usize;
        let last = (u1.ceil() as usize).min(self.stride - 1 - base as usize);
        let mut prev = 0.0;
        for k in 0..=last {
            let current = covered(k as Scalar);
            self.cells[offset + k] += dy * (current - prev);
            prev = current;
        }
    }

    /// Resolve accumulated differences into a coverage mask
    fn into_mask(self, fill_rule: FillRule) -> ImageOwned<Scalar> {
        let mut mask = Vec::with_capacity(self.width * self.height);
        for row in self.cells.chunks(self.stride.max(1)).take(self.height) {
            let mut winding = 0.0;
            mask.extend(row[..self.width].iter().map(|diff| {
                winding += diff;
                coverage(winding, fill_rule)
            }));
        }
        ImageOwned::new(Shape::new(self.height, self.width), mask)
    }
}

fn clip_point(p: Point, width: Scalar) -> Point {
    Point::new(p.x().clamp(0.0, width), p.y())
}

/// Map fractional winding number into coverage
fn coverage(winding: Scalar, fill_rule: FillRule) -> Scalar {
    match fill_rule {
        FillRule::NonZero => {
            let value = winding.abs();
            if value < 1e-6 { 0.0 } else { value.min(1.0) }
        }
        FillRule::EvenOdd => {
            let value = winding.abs() % 2.0;
            if value > 1.0 { 2.0 - value } else { value }
        }
    }
}

/// Rasterize closed set of lines into a coverage mask of the provided size
///
/// Lines are expected to form closed contours, coverage outside of the mask is discarded.
pub fn rasterize_lines(
    lines: impl IntoIterator<Item = Line>,
    size: Size,
    fill_rule: FillRule,
) -> ImageOwned<Scalar> {
    let mut acc = Accumulator::new(size);
    if !size.is_empty() {
        for line in lines {
            acc.add_line(line);
        }
    }
    acc.into_mask(fill_rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Image, PathData, Transform, assert_approx_eq};

    fn cells_of(lines: &[Line], size: Size) -> Accumulator {
        let mut acc = Accumulator::new(size);
        for line in lines {
            acc.add_line(*line);
        }
        acc
    }

    #[test]
    fn test_add_line() {
        let size = Size::new(5, 2);

        // single pixel covered
        let acc = cells_of(&[Line::new((0.1, 0.1), (0.9, 0.9))], size);
        assert_approx_eq!(acc.cells[0], 0.4, 1e-9);
        assert_approx_eq!(acc.cells[1], 0.4, 1e-9);

        // two pixels covered
        let acc = cells_of(&[Line::new((0.1, 0.1), (1.9, 0.9))], size);
        assert_approx_eq!(acc.cells[0], 0.18, 1e-9);
        assert_approx_eq!(acc.cells[1], 0.44, 1e-9);
        assert_approx_eq!(acc.cells[2], 0.18, 1e-9);

        // vertical line over two rows, upward direction is negative
        let acc = cells_of(&[Line::new((0.5, 1.75), (0.5, 0.5))], size);
        assert_approx_eq!(acc.cells[0], -0.25, 1e-9);
        assert_approx_eq!(acc.cells[1], -0.25, 1e-9);
        assert_approx_eq!(acc.cells[acc.stride], -0.375, 1e-9);
        assert_approx_eq!(acc.cells[acc.stride + 1], -0.375, 1e-9);

        // part left of the mask becomes a vertical line at `x = 0`
        let acc = cells_of(&[Line::new((-1.0, 0.0), (1.0, 1.0))], size);
        assert_approx_eq!(acc.cells[0], 0.75, 1e-9);
        assert_approx_eq!(acc.cells[1], 0.25, 1e-9);

        // every row receives exactly its height
        let acc = cells_of(&[Line::new((-3.0, -0.5), (7.0, 1.5))], size);
        assert_approx_eq!(acc.cells[..acc.stride].iter().sum::<Scalar>(), 1.0, 1e-9);
        assert_approx_eq!(acc.cells[acc.stride..].iter().sum::<Scalar>(), 0.5, 1e-9);

        // non-finite lines are ignored
        let acc = cells_of(&[Line::new((Scalar::NAN, 0.0), (1.0, 1.0))], size);
        assert!(acc.cells.iter().all(|cell| *cell == 0.0));
    }

    fn mask_of(path: &str, size: Size, fill_rule: FillRule) -> ImageOwned<Scalar> {
        let path: PathData = path.parse().unwrap();
        let lines = path
            .flatten(Transform::identity(), crate::DEFAULT_FLATNESS)
            .into_iter()
            .flat_map(|polyline| polyline.lines().collect::<Vec<_>>());
        rasterize_lines(lines, size, fill_rule)
    }

    #[test]
    fn test_fill_rule() {
        // star, box with a same direction inner box, box with an opposite inner box
        let path = r#"
            M50,0 21,90 98,35 2,35 79,90z
            M110,0 h90 v90 h-90z
            M130,20 h50 v50 h-50 z
            M210,0  h90 v90 h-90 z
            M230,20 v50 h50 v-50 z
        "#;
        let size = Size::new(310, 100);
        let row = 50;

        let mask = mask_of(path, size, FillRule::EvenOdd);
        assert_eq!(mask.shape(), Shape::new(100, 310));
        for col in [50, 150, 250] {
            assert_approx_eq!(*mask.get(row, col).unwrap(), 0.0);
        }
        assert_approx_eq!(mask.iter().sum::<Scalar>(), 13130.0, 1.0);

        let mask = mask_of(path, size, FillRule::NonZero);
        assert_approx_eq!(*mask.get(row, 50).unwrap(), 1.0);
        assert_approx_eq!(*mask.get(row, 150).unwrap(), 1.0);
        assert_approx_eq!(*mask.get(row, 250).unwrap(), 0.0);
        assert_approx_eq!(mask.iter().sum::<Scalar>(), 16492.5, 1.0);
    }

    #[test]
    fn test_clipped() {
        // square sticking out of the mask on every side
        let mask = mask_of("M-5,-5 H15 V15 H-5 Z", Size::new(10, 10), FillRule::NonZero);
        assert!(mask.iter().all(|v| (v - 1.0).abs() < 1e-9));

        // right half is outside
        let mask = mask_of("M5,2 H25 V8 H5 Z", Size::new(10, 10), FillRule::NonZero);
        assert_approx_eq!(*mask.get(4, 9).unwrap(), 1.0, 1e-9);
        assert_approx_eq!(*mask.get(4, 4).unwrap(), 0.0, 1e-9);
        assert_approx_eq!(mask.iter().sum::<Scalar>(), 30.0, 1e-6);

        // half pixel offset gives half coverage on the edges
        let mask = mask_of("M1.5,1 H3.5 V3 H1.5 Z", Size::new(5, 5), FillRule::EvenOdd);
        assert_approx_eq!(*mask.get(1, 1).unwrap(), 0.5, 1e-9);
        assert_approx_eq!(*mask.get(1, 2).unwrap(), 1.0, 1e-9);
        assert_approx_eq!(*mask.get(2, 3).unwrap(), 0.5, 1e-9);
    }

    #[test]
    fn test_empty() {
        let line = Line::new((0.0, 0.0), (1.0, 1.0));
        let mask = rasterize_lines([line], Size::new(0, 4), FillRule::NonZero);
        assert_eq!(mask.iter().count(), 0);
    }
}
