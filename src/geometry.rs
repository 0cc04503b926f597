use crate::utils::clamp;
use std::{
    fmt,
    ops::{Add, Div, Mul, Sub},
};

pub type Scalar = f64;
pub const EPSILON: f64 = f64::EPSILON;
pub const EPSILON_SQRT: f64 = 1.490_116_119_384_765_6e-8;
pub const PI: f64 = std::f64::consts::PI;

/// Number of fractional decimal digits kept when scalars are serialized
pub const SCALAR_PRECISION: i32 = 3;

/// Values with at least this magnitude are formatted by hand in fixed-point notation
const FIXED_POINT_LIMIT: Scalar = 1e9;

/// Round value to `SCALAR_PRECISION` decimal digits
#[inline]
pub fn scalar_round(value: Scalar) -> Scalar {
    if value.abs() >= 1e15 {
        // no fractional digits are representable at this magnitude
        return value;
    }
    let scale = (10.0 as Scalar).powi(SCALAR_PRECISION);
    let value = (value * scale).round() / scale;
    // avoid `-0`
    if value == 0.0 { 0.0 } else { value }
}

/// Format floats in a compact and stable way suitable for path data and XML attributes
///
/// Value is rounded to `SCALAR_PRECISION` digits, integers are written without
/// fractional part, everything else uses shortest round-trip representation.
pub fn scalar_fmt(f: &mut impl fmt::Write, value: Scalar) -> fmt::Result {
    let value = scalar_round(value);
    if !value.is_finite() {
        return f.write_str("0");
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return write!(f, "{}", value as i64);
    }
    if value.abs() >= FIXED_POINT_LIMIT {
        // large magnitudes are written without exponent
        let text = format!("{:.*}", SCALAR_PRECISION as usize, value);
        return f.write_str(text.trim_end_matches('0').trim_end_matches('.'));
    }
    let mut buffer = [0u8; lexical_core::BUFFER_SIZE];
    let bytes = lexical_core::write(value, &mut buffer);
    // lexical only produces ASCII
    f.write_str(std::str::from_utf8(bytes).map_err(|_| fmt::Error)?)
}

/// Format scalar into a newly allocated string
pub fn scalar_to_string(value: Scalar) -> String {
    let mut out = String::new();
    let _ = scalar_fmt(&mut out, value);
    out
}

/// Value representing a 2D point or vector.
#[derive(Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point(pub [Scalar; 2]);

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Point([x, y]) = self;
        scalar_fmt(f, *x)?;
        write!(f, ",")?;
        scalar_fmt(f, *y)?;
        Ok(())
    }
}

impl Point {
    #[inline]
    pub const fn new(x: Scalar, y: Scalar) -> Self {
        Self([x, y])
    }

    /// Get `x` component of the point
    #[inline]
    pub fn x(self) -> Scalar {
        self.0[0]
    }

    /// Get `y` component of the point
    #[inline]
    pub fn y(self) -> Scalar {
        self.0[1]
    }

    /// Get length of the vector (distance from the origin)
    pub fn length(self) -> Scalar {
        let Self([x, y]) = self;
        x.hypot(y)
    }

    /// Distance between two points
    pub fn dist(self, other: Self) -> Scalar {
        (self - other).length()
    }

    /// Dot product between two vectors
    pub fn dot(self, other: Self) -> Scalar {
        let Self([x0, y0]) = self;
        let Self([x1, y1]) = other;
        x0 * x1 + y0 * y1
    }

    /// Cross product between two vectors
    pub fn cross(self, other: Self) -> Scalar {
        let Self([x0, y0]) = self;
        let Self([x1, y1]) = other;
        x0 * y1 - y0 * x1
    }

    /// Get vector normal (not a unit sized)
    pub fn normal(self) -> Point {
        let Self([x, y]) = self;
        Self([y, -x])
    }

    /// Convert vector to a unit size vector, if length is not zero
    pub fn normalize(self) -> Option<Point> {
        let Self([x, y]) = self;
        let length = self.length();
        if length < EPSILON {
            None
        } else {
            Some(Self([x / length, y / length]))
        }
    }

    /// Calculate angle (from self to the other) between two vectors
    pub fn angle_between(self, other: Self) -> Option<Scalar> {
        let angle = clamp(self.cos_between(other)?, -1.0, 1.0).acos();
        if self.cross(other) < 0.0 {
            Some(-angle)
        } else {
            Some(angle)
        }
    }

    /// Cosine of the angle (from self to the other) between to vectors
    pub fn cos_between(self, other: Self) -> Option<Scalar> {
        let lengths = self.length() * other.length();
        if lengths < EPSILON {
            None
        } else {
            Some(self.dot(other) / lengths)
        }
    }

    /// Distance from the point to the line passing through `a` and `b`
    ///
    /// Falls back to distance to `a` if `a` and `b` coincide.
    pub fn line_dist(self, a: Point, b: Point) -> Scalar {
        let dir = b - a;
        let length = dir.length();
        if length < EPSILON {
            self.dist(a)
        } else {
            dir.cross(self - a).abs() / length
        }
    }

    /// Determine if self is close to the other within the margin of error (EPSILON)
    pub fn is_close_to(self, other: Point) -> bool {
        let Self([x0, y0]) = self;
        let Self([x1, y1]) = other;
        (x0 - x1).abs() < EPSILON && (y0 - y1).abs() < EPSILON
    }
}

impl From<(Scalar, Scalar)> for Point {
    #[inline]
    fn from(xy: (Scalar, Scalar)) -> Self {
        Self([xy.0, xy.1])
    }
}

impl From<[Scalar; 2]> for Point {
    #[inline]
    fn from(xy: [Scalar; 2]) -> Self {
        Self(xy)
    }
}

impl Mul<&Point> for Scalar {
    type Output = Point;

    #[inline]
    fn mul(self, other: &Point) -> Self::Output {
        let Point([x, y]) = other;
        Point([self * x, self * y])
    }
}

impl Mul<Point> for Scalar {
    type Output = Point;

    #[inline]
    fn mul(self, other: Point) -> Self::Output {
        let Point([x, y]) = other;
        Point([self * x, self * y])
    }
}

impl Div<Scalar> for Point {
    type Output = Point;

    #[inline]
    fn div(self, rhs: Scalar) -> Self::Output {
        let Point([x, y]) = self;
        Point([x / rhs, y / rhs])
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, other: Point) -> Self::Output {
        let Point([x0, y0]) = self;
        let Point([x1, y1]) = other;
        Point([x0 + x1, y0 + y1])
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, other: Point) -> Self::Output {
        let Point([x0, y0]) = self;
        let Point([x1, y1]) = other;
        Point([x0 - x1, y0 - y1])
    }
}

impl Mul for Point {
    type Output = Point;

    #[inline]
    fn mul(self, other: Point) -> Self::Output {
        let Point([x0, y0]) = self;
        let Point([x1, y1]) = other;
        Point([x0 * x1, y0 * y1])
    }
}

/// Size of an image or a drawing surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Size {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Whether size covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Canonical decomposition of a group transform
///
/// Equivalent to `translate(tx, ty) * translate(px, py) * rotate(r) * scale(sx, sy) * translate(-px, -py)`
/// where rotation is expressed in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransformParams {
    pub rotation: Scalar,
    pub pivot: Point,
    pub scale: Point,
    pub translate: Point,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            pivot: Point::new(0.0, 0.0),
            scale: Point::new(1.0, 1.0),
            translate: Point::new(0.0, 0.0),
        }
    }
}

impl TransformParams {
    /// Whether parameters describe identity transformation
    pub fn is_identity(&self) -> bool {
        self.to_transform().is_identity()
    }

    /// Build affine transformation described by parameters
    pub fn to_transform(&self) -> Transform {
        let Point([px, py]) = self.pivot;
        let Point([sx, sy]) = self.scale;
        let Point([tx, ty]) = self.translate;
        Transform::new_translate(tx + px, ty + py)
            .pre_rotate(self.rotation.to_radians())
            .pre_scale(sx, sy)
            .pre_translate(-px, -py)
    }
}

/// 2D affine transformation
///
/// Stored as an array [m00, m01, m02, m10, m11, m12] but semantically corresponds to
/// a matrix:
/// ┌             ┐
/// │ m00 m01 m02 │
/// │ m10 m11 m12 │
/// │   0   0   1 │
/// └             ┘
#[derive(Clone, Copy, PartialEq)]
pub struct Transform([Scalar; 6]);

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self([m00, m01, m02, m10, m11, m12]) = self;
        write!(f, "matrix(")?;
        for (index, value) in [m00, m10, m01, m11, m02, m12].into_iter().enumerate() {
            if index != 0 {
                write!(f, " ")?;
            }
            scalar_fmt(f, *value)?;
        }
        write!(f, ")")
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self([1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
    }
}

impl Transform {
    pub fn new(
        m00: Scalar,
        m01: Scalar,
        m02: Scalar,
        m10: Scalar,
        m11: Scalar,
        m12: Scalar,
    ) -> Self {
        Self([m00, m01, m02, m10, m11, m12])
    }

    pub fn identity() -> Self {
        Self::default()
    }

    pub fn new_translate(tx: Scalar, ty: Scalar) -> Self {
        Self([1.0, 0.0, tx, 0.0, 1.0, ty])
    }

    pub fn new_scale(sx: Scalar, sy: Scalar) -> Self {
        Self([sx, 0.0, 0.0, 0.0, sy, 0.0])
    }

    /// Rotation by angle `a` in radians
    pub fn new_rotate(a: Scalar) -> Self {
        let (sin, cos) = a.sin_cos();
        Self([cos, -sin, 0.0, sin, cos, 0.0])
    }

    pub fn new_skew(ax: Scalar, ay: Scalar) -> Self {
        Self([1.0, ax.tan(), 0.0, ay.tan(), 1.0, 0.0])
    }

    /// Matrix coefficients in SVG `matrix(a b c d e f)` order
    pub fn to_svg_matrix(&self) -> [Scalar; 6] {
        let Self([m00, m01, m02, m10, m11, m12]) = *self;
        [m00, m10, m01, m11, m02, m12]
    }

    /// Whether transformation is identity within the margin of error
    pub fn is_identity(&self) -> bool {
        self.0
            .iter()
            .zip(Self::default().0.iter())
            .all(|(a, b)| (a - b).abs() < EPSILON_SQRT)
    }

    /// Apply this transformation to a point
    pub fn apply(&self, point: Point) -> Point {
        let Self([m00, m01, m02, m10, m11, m12]) = self;
        let Point([x, y]) = point;
        Point([x * m00 + y * m01 + m02, x * m10 + y * m11 + m12])
    }

    /// Find the inverse transformation
    pub fn invert(&self) -> Option<Self> {
        // inv([[M, v], [0, 1]]) = [[inv(M), - inv(M) * v], [0, 1]]
        let Self([m00, m01, m02, m10, m11, m12]) = self;
        let det = m00 * m11 - m10 * m01;
        if det.abs() <= EPSILON {
            return None;
        }
        let o00 = m11 / det;
        let o01 = -m01 / det;
        let o10 = -m10 / det;
        let o11 = m00 / det;
        let o02 = -o00 * m02 - o01 * m12;
        let o12 = -o10 * m02 - o11 * m12;
        Some(Self([o00, o01, o02, o10, o11, o12]))
    }

    /// Apply translation by `[tx, ty]` before self
    pub fn pre_translate(&self, tx: Scalar, ty: Scalar) -> Self {
        self.pre_concat(Self::new_translate(tx, ty))
    }

    /// Apply scale transformation by `[sx, sy]` before self
    pub fn pre_scale(&self, sx: Scalar, sy: Scalar) -> Self {
        self.pre_concat(Self::new_scale(sx, sy))
    }

    /// Apply rotation by `a` angle (radians) around the origin before self
    pub fn pre_rotate(&self, a: Scalar) -> Self {
        self.pre_concat(Self::new_rotate(a))
    }

    /// Apply rotation around point `p` by angle `a` before self
    pub fn pre_rotate_around(&self, a: Scalar, p: impl Into<Point>) -> Self {
        let p = p.into();
        self.pre_translate(p.x(), p.y())
            .pre_rotate(a)
            .pre_translate(-p.x(), -p.y())
    }

    /// Apply `other` transformation before self (`self * other` in matrix form)
    pub fn pre_concat(&self, other: Self) -> Self {
        *self * other
    }

    /// Determinant of the linear part
    pub fn det(&self) -> Scalar {
        let Self([m00, m01, _, m10, m11, _]) = self;
        m00 * m11 - m01 * m10
    }

    /// Decompose into `translate * rotate * scale` parameters (pivot is always at origin)
    ///
    /// Exact for any composition of translation, rotation and non-uniform scale.
    /// Skew has no representation in the parameters and is lost, result is the
    /// nearest rotate-scale-translate which preserves the first basis vector.
    pub fn decompose(&self) -> TransformParams {
        let Self([a, c, e, b, d, f]) = *self;
        let sx = a.hypot(b);
        let det = a * d - b * c;
        let (rotation, sx, sy) = if sx > EPSILON {
            (b.atan2(a), sx, det / sx)
        } else {
            // first column collapsed, recover rotation from the second one
            (-(c.atan2(d)), 0.0, c.hypot(d))
        };
        let rotation = rotation.to_degrees();
        TransformParams {
            rotation: if rotation.abs() < EPSILON_SQRT { 0.0 } else { rotation },
            pivot: Point::new(0.0, 0.0),
            scale: Point::new(sx, sy),
            translate: Point::new(e, f),
        }
    }
}

impl Mul<Transform> for Transform {
    type Output = Transform;

    fn mul(self, other: Transform) -> Self::Output {
        let Self([s00, s01, s02, s10, s11, s12]) = self;
        let Self([o00, o01, o02, o10, o11, o12]) = other;

        // s00, s01, s02 | o00, o01, o02
        // s10, s11, s12 | o10, o11, o12
        // 0  , 0  , 1   | 0  , 0  , 1
        Self([
            s00 * o00 + s01 * o10,
            s00 * o01 + s01 * o11,
            s00 * o02 + s01 * o12 + s02,
            s10 * o00 + s11 * o10,
            s10 * o01 + s11 * o11,
            s10 * o02 + s11 * o12 + s12,
        ])
    }
}

/// Bounding box with sides directed along the axes
#[derive(Clone, Copy, PartialEq)]
pub struct BBox {
    /// Point with minimal x and y values
    min: Point,
    /// Point with maximum x and y values
    max: Point,
}

impl BBox {
    /// Construct bounding box which includes points `p0` and `p1`
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        let Point([x0, y0]) = p0.into();
        let Point([x1, y1]) = p1.into();
        let (x0, x1) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        let (y0, y1) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        Self {
            min: Point([x0, y0]),
            max: Point([x1, y1]),
        }
    }

    #[inline]
    pub fn min(&self) -> Point {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Point {
        self.max
    }

    #[inline]
    pub fn x(&self) -> Scalar {
        self.min.x()
    }

    #[inline]
    pub fn y(&self) -> Scalar {
        self.min.y()
    }

    #[inline]
    pub fn width(&self) -> Scalar {
        self.max.x() - self.min.x()
    }

    #[inline]
    pub fn height(&self) -> Scalar {
        self.max.y() - self.min.y()
    }

    /// Extend bounding box so it would contain provided point
    pub fn extend(&self, point: Point) -> Self {
        let Point([x, y]) = point;
        Self {
            min: Point([self.min.x().min(x), self.min.y().min(y)]),
            max: Point([self.max.x().max(x), self.max.y().max(y)]),
        }
    }

    /// Find bounding box of the intersection of two bounding boxes
    pub fn intersect(&self, other: BBox) -> Option<BBox> {
        let (x_min, x_max) =
            range_intersect(self.min.x(), self.max.x(), other.min.x(), other.max.x())?;
        let (y_min, y_max) =
            range_intersect(self.min.y(), self.max.y(), other.min.y(), other.max.y())?;
        Some(BBox::new(
            Point::new(x_min, y_min),
            Point::new(x_max, y_max),
        ))
    }
}

/// Find intersection of two ranges
fn range_intersect(
    r0_min: Scalar,
    r0_max: Scalar,
    r1_min: Scalar,
    r1_max: Scalar,
) -> Option<(Scalar, Scalar)> {
    if r0_min > r1_max || r1_min > r0_max {
        None
    } else {
        Some((r0_min.max(r1_min), r0_max.min(r1_max)))
    }
}

impl fmt::Debug for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox x=")?;
        scalar_fmt(f, self.x())?;
        write!(f, ", y=")?;
        scalar_fmt(f, self.y())?;
        write!(f, ", w=")?;
        scalar_fmt(f, self.width())?;
        write!(f, ", h=")?;
        scalar_fmt(f, self.height())
    }
}
