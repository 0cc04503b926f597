//! Line and bezier segments of path data
use crate::{Point, Scalar, Transform};

/// Subdivision depth limit, `2^16` lines per curve is more than any target needs
const MAX_FLATTEN_DEPTH: u8 = 16;

/// Operations shared by all segments
pub trait Curve: Copy {
    /// Apply affine transformation to all control points
    fn transform(&self, tr: Transform) -> Self;

    fn start(&self) -> Point;

    fn end(&self) -> Point;

    /// Evaluate segment at parameter `t` in `0.0..=1.0`
    fn at(&self, t: Scalar) -> Point;

    /// Split segment in halves at `t = 0.5`
    fn split(&self) -> (Self, Self);

    /// Upper bound of the squared distance between the segment and its chord
    /// multiplied by 16
    fn deviation(&self) -> Scalar;

    /// Append end points of a polyline approximating transformed segment to `out`
    ///
    /// Start point is not appended, so consecutive segments can share one buffer.
    /// Segment is split until its deviation from the chord is below `flatness`.
    fn flatten_into(&self, tr: Transform, flatness: Scalar, out: &mut Vec<Point>) {
        let limit = 16.0 * flatness * flatness;
        let mut stack = vec![(self.transform(tr), 0u8)];
        while let Some((curve, depth)) = stack.pop() {
            // NaN deviation stops at depth limit as well
            if depth >= MAX_FLATTEN_DEPTH || !(curve.deviation() > limit) {
                out.push(curve.end());
                continue;
            }
            let (c0, c1) = curve.split();
            stack.push((c1, depth + 1));
            stack.push((c0, depth + 1));
        }
    }
}

/// Line segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line(pub [Point; 2]);

impl Line {
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        Self([p0.into(), p1.into()])
    }

    pub fn points(&self) -> [Point; 2] {
        self.0
    }
}

impl Curve for Line {
    fn transform(&self, tr: Transform) -> Self {
        Self(self.0.map(|p| tr.apply(p)))
    }

    fn start(&self) -> Point {
        self.0[0]
    }

    fn end(&self) -> Point {
        self.0[1]
    }

    fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1]) = *self;
        p0 + t * (p1 - p0)
    }

    fn split(&self) -> (Self, Self) {
        let mid = self.at(0.5);
        (Self([self.0[0], mid]), Self([mid, self.0[1]]))
    }

    fn deviation(&self) -> Scalar {
        0.0
    }
}

/// Quadratic bezier curve `(1 - t)^2 p0 + 2 (1 - t) t p1 + t^2 p2`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad(pub [Point; 3]);

impl Quad {
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>, p2: impl Into<Point>) -> Self {
        Self([p0.into(), p1.into(), p2.into()])
    }

    pub fn points(&self) -> [Point; 3] {
        self.0
    }
}

impl Curve for Quad {
    fn transform(&self, tr: Transform) -> Self {
        Self(self.0.map(|p| tr.apply(p)))
    }

    fn start(&self) -> Point {
        self.0[0]
    }

    fn end(&self) -> Point {
        self.0[2]
    }

    fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1, p2]) = *self;
        let s = 1.0 - t;
        (s * s) * p0 + (2.0 * s * t) * p1 + (t * t) * p2
    }

    /// de Casteljau subdivision
    fn split(&self) -> (Self, Self) {
        let Self([p0, p1, p2]) = *self;
        let (q0, q1) = (0.5 * (p0 + p1), 0.5 * (p1 + p2));
        let mid = 0.5 * (q0 + q1);
        (Self([p0, q0, mid]), Self([mid, q1, p2]))
    }

    /// Distance between curve and chord at the same `t` is `(1 - t) t |2 p1 - p0 - p2|`,
    /// its maximum is reached at `t = 0.5`
    fn deviation(&self) -> Scalar {
        let Self([p0, p1, p2]) = *self;
        let d = 2.0 * p1 - p0 - p2;
        d.dot(d)
    }
}

/// Cubic bezier curve `(1 - t)^3 p0 + 3 (1 - t)^2 t p1 + 3 (1 - t) t^2 p2 + t^3 p3`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cubic(pub [Point; 4]);

impl Cubic {
    pub fn new(
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> Self {
        Self([p0.into(), p1.into(), p2.into(), p3.into()])
    }

    pub fn points(&self) -> [Point; 4] {
        self.0
    }

    /// Cubic with the same shape as a quadratic curve
    pub fn from_quad(quad: Quad) -> Self {
        let Quad([p0, p1, p2]) = quad;
        Self([p0, p0 + (2.0 / 3.0) * (p1 - p0), p2 + (2.0 / 3.0) * (p1 - p2), p2])
    }
}

impl Curve for Cubic {
    fn transform(&self, tr: Transform) -> Self {
        Self(self.0.map(|p| tr.apply(p)))
    }

    fn start(&self) -> Point {
        self.0[0]
    }

    fn end(&self) -> Point {
        self.0[3]
    }

    fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1, p2, p3]) = *self;
        let s = 1.0 - t;
        (s * s * s) * p0 + (3.0 * s * s * t) * p1 + (3.0 * s * t * t) * p2 + (t * t * t) * p3
    }

    /// de Casteljau subdivision
    fn split(&self) -> (Self, Self) {
        let Self([p0, p1, p2, p3]) = *self;
        let (q0, q1, q2) = (0.5 * (p0 + p1), 0.5 * (p1 + p2), 0.5 * (p2 + p3));
        let (r0, r1) = (0.5 * (q0 + q1), 0.5 * (q1 + q2));
        let mid = 0.5 * (r0 + r1);
        (Self([p0, q0, r0, mid]), Self([mid, r1, q2, p3]))
    }

    /// Bound from "Piecewise Linear Approximation of Bezier Curves" (R. Willcocks):
    /// `16 f^2 <= max(ux^2, vx^2) + max(uy^2, vy^2)` with
    /// `u = 3 p1 - 2 p0 - p3` and `v = 3 p2 - p0 - 2 p3`
    fn deviation(&self) -> Scalar {
        let Self([p0, p1, p2, p3]) = *self;
        let u = 3.0 * p1 - 2.0 * p0 - p3;
        let v = 3.0 * p2 - p0 - 2.0 * p3;
        (u.x() * u.x()).max(v.x() * v.x()) + (u.y() * u.y()).max(v.y() * v.y())
    }
}

/// Any drawable segment of a path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line(Line),
    Quad(Quad),
    Cubic(Cubic),
}

macro_rules! segment_dispatch {
    ($self:expr, $curve:ident => $body:expr) => {
        match $self {
            Segment::Line($curve) => $body,
            Segment::Quad($curve) => $body,
            Segment::Cubic($curve) => $body,
        }
    };
}

impl Curve for Segment {
    fn transform(&self, tr: Transform) -> Self {
        segment_dispatch!(self, curve => curve.transform(tr).into())
    }

    fn start(&self) -> Point {
        segment_dispatch!(self, curve => curve.start())
    }

    fn end(&self) -> Point {
        segment_dispatch!(self, curve => curve.end())
    }

    fn at(&self, t: Scalar) -> Point {
        segment_dispatch!(self, curve => curve.at(t))
    }

    fn split(&self) -> (Self, Self) {
        segment_dispatch!(self, curve => {
            let (c0, c1) = curve.split();
            (c0.into(), c1.into())
        })
    }

    fn deviation(&self) -> Scalar {
        segment_dispatch!(self, curve => curve.deviation())
    }

    fn flatten_into(&self, tr: Transform, flatness: Scalar, out: &mut Vec<Point>) {
        segment_dispatch!(self, curve => curve.flatten_into(tr, flatness, out))
    }
}

impl From<Line> for Segment {
    fn from(line: Line) -> Self {
        Self::Line(line)
    }
}

impl From<Quad> for Segment {
    fn from(quad: Quad) -> Self {
        Self::Quad(quad)
    }
}

impl From<Cubic> for Segment {
    fn from(cubic: Cubic) -> Self {
        Self::Cubic(cubic)
    }
}
