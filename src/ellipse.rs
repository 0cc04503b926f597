//! Elliptic arcs of the `A`/`a` path command
use crate::{Cubic, EPSILON, PI, Point, Scalar, Transform};

/// Largest angle covered by a single cubic approximating the arc
const MAX_SEGMENT_ANGLE: Scalar = PI / 2.0;

/// Elliptic arc in center parametrization
///
/// Arcs never survive parsing, they are immediately replaced with cubic curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipArc {
    center: Point,
    radii: Point,
    /// rotation of the x-axis of the ellipse in radians
    rotation: Scalar,
    start_angle: Scalar,
    /// signed angle covered by the arc, positive when sweep flag is set
    sweep_angle: Scalar,
    /// exact end point of the arc as it was specified
    end: Point,
}

impl EllipArc {
    /// Arc from the endpoint parametrization used by path data
    ///
    /// Follows "conversion from endpoint to center parameterization" from the SVG
    /// implementation notes, radii that are too small to reach `dst` are scaled up.
    /// Returns `None` for degenerate arcs, which are drawn as straight lines.
    pub fn from_endpoints(
        src: Point,
        dst: Point,
        radii: Point,
        rotation_deg: Scalar,
        large_arc: bool,
        sweep: bool,
    ) -> Option<Self> {
        let (mut rx, mut ry) = (radii.x().abs(), radii.y().abs());
        if rx < EPSILON || ry < EPSILON || src.is_close_to(dst) {
            return None;
        }
        let rotation = rotation_deg.to_radians();

        // midpoint in the coordinate system of the ellipse axes
        let Point([x1, y1]) = Transform::new_rotate(-rotation).apply(0.5 * (src - dst));
        let lambda = (x1 / rx).powi(2) + (y1 / ry).powi(2);
        if lambda > 1.0 {
            rx *= lambda.sqrt();
            ry *= lambda.sqrt();
        }

        let num = (rx * ry).powi(2) - (rx * y1).powi(2) - (ry * x1).powi(2);
        let den = (rx * y1).powi(2) + (ry * x1).powi(2);
        let mut coef = (num / den).max(0.0).sqrt();
        if large_arc == sweep {
            coef = -coef;
        }
        let center_local = Point::new(coef * rx * y1 / ry, -coef * ry * x1 / rx);
        let center = Transform::new_rotate(rotation).apply(center_local) + 0.5 * (src + dst);

        let Point([cx, cy]) = center_local;
        let start = Point::new((x1 - cx) / rx, (y1 - cy) / ry);
        let end = Point::new((-x1 - cx) / rx, (-y1 - cy) / ry);
        let start_angle = Point::new(1.0, 0.0).angle_between(start)?;
        let mut sweep_angle = start.angle_between(end)?.rem_euclid(2.0 * PI);
        if !sweep && sweep_angle > 0.0 {
            sweep_angle -= 2.0 * PI;
        }

        Some(Self {
            center,
            radii: Point::new(rx, ry),
            rotation,
            start_angle,
            sweep_angle,
            end: dst,
        })
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radii(&self) -> Point {
        self.radii
    }

    /// Point on the arc at parameter `t` in `0.0..=1.0`
    pub fn at(&self, t: Scalar) -> Point {
        self.point_and_tangent(self.start_angle + t * self.sweep_angle).0
    }

    /// Point and derivative of the ellipse at the given angle
    fn point_and_tangent(&self, angle: Scalar) -> (Point, Point) {
        let (sin, cos) = angle.sin_cos();
        let Point([rx, ry]) = self.radii;
        let rotate = Transform::new_rotate(self.rotation);
        let point = rotate.apply(Point::new(rx * cos, ry * sin)) + self.center;
        let tangent = rotate.apply(Point::new(-rx * sin, ry * cos));
        (point, tangent)
    }

    /// Approximate arc with cubic curves, each covering at most a quarter turn
    ///
    /// Control points are placed along the tangents at distance
    /// `sin(d) * (sqrt(4 + 3 * tan(d / 2)^2) - 1) / 3` where `d` is the angle covered
    /// by the cubic (L. Maisonobe, "Drawing an elliptical arc using polylines,
    /// quadratic or cubic Bezier curves"). The last cubic ends exactly at the end
    /// point of the arc.
    pub fn to_cubics(&self) -> Vec<Cubic> {
        let count = (self.sweep_angle.abs() / MAX_SEGMENT_ANGLE).ceil().max(1.0) as usize;
        let delta = self.sweep_angle / count as Scalar;
        let tan = (delta / 2.0).tan();
        let alpha = delta.sin() * ((4.0 + 3.0 * tan * tan).sqrt() - 1.0) / 3.0;

        let mut cubics = Vec::with_capacity(count);
        let (mut p0, mut d0) = self.point_and_tangent(self.start_angle);
        for index in 1..=count {
            let (p3, d3) = self.point_and_tangent(self.start_angle + delta * index as Scalar);
            let p3 = if index == count { self.end } else { p3 };
            cubics.push(Cubic::new(p0, p0 + alpha * d0, p3 - alpha * d3, p3));
            (p0, d0) = (p3, d3);
        }
        cubics
    }
}
