//! Path data mini-language codec
//!
//! Parser accepts the full SVG path grammar (`M L H V C S Q T A Z` in absolute and
//! relative forms) and normalizes it into absolute move/line/quad/cubic/close
//! commands. Serialization emits only absolute `M L Q C Z`.
use crate::{
    BBox, Cubic, Curve, EPSILON, EllipArc, Line, Point, Quad, Scalar, Transform, scalar_fmt,
};
use std::{fmt, str::FromStr};

/// flatness of 0.05px gives good accuracy tradeoff
pub const DEFAULT_FLATNESS: Scalar = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// Single absolute path command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubicTo(Point, Point, Point),
    Close,
}

impl PathCmd {
    /// Command letter used in serialized form
    pub fn letter(&self) -> char {
        match self {
            PathCmd::MoveTo(_) => 'M',
            PathCmd::LineTo(_) => 'L',
            PathCmd::QuadTo(..) => 'Q',
            PathCmd::CubicTo(..) => 'C',
            PathCmd::Close => 'Z',
        }
    }

    /// Control and end points of the command
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        let (points, count) = match *self {
            PathCmd::MoveTo(p) | PathCmd::LineTo(p) => ([p, p, p], 1),
            PathCmd::QuadTo(p1, p2) => ([p1, p2, p2], 2),
            PathCmd::CubicTo(p1, p2, p3) => ([p1, p2, p3], 3),
            PathCmd::Close => ([Point::default(); 3], 0),
        };
        points.into_iter().take(count)
    }
}

/// Parsed path data, a sequence of absolute commands
#[derive(Clone, PartialEq, Default)]
pub struct PathData {
    cmds: Vec<PathCmd>,
}

impl fmt::Debug for PathData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cmds.is_empty() {
            write!(f, "Empty")
        } else {
            write!(f, "{}", self)
        }
    }
}

impl PathData {
    pub fn new(cmds: Vec<PathCmd>) -> Self {
        Self { cmds }
    }

    pub fn builder() -> PathBuilder {
        PathBuilder::new()
    }

    pub fn cmds(&self) -> &[PathCmd] {
        &self.cmds
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    /// Append all commands of the other path
    pub fn extend(&mut self, other: PathData) {
        self.cmds.extend(other.cmds);
    }

    /// Apply transformation to all points of the path
    pub fn transform(&self, tr: Transform) -> Self {
        let cmds = self
            .cmds
            .iter()
            .map(|cmd| match *cmd {
                PathCmd::MoveTo(p) => PathCmd::MoveTo(tr.apply(p)),
                PathCmd::LineTo(p) => PathCmd::LineTo(tr.apply(p)),
                PathCmd::QuadTo(p1, p2) => PathCmd::QuadTo(tr.apply(p1), tr.apply(p2)),
                PathCmd::CubicTo(p1, p2, p3) => {
                    PathCmd::CubicTo(tr.apply(p1), tr.apply(p2), tr.apply(p3))
                }
                PathCmd::Close => PathCmd::Close,
            })
            .collect();
        Self { cmds }
    }

    /// Bounding box of all control points after applying transformation
    pub fn bbox(&self, tr: Transform) -> Option<BBox> {
        let mut bbox: Option<BBox> = None;
        for point in self.cmds.iter().flat_map(PathCmd::points) {
            let point = tr.apply(point);
            bbox = Some(match bbox {
                None => BBox::new(point, point),
                Some(bbox) => bbox.extend(point),
            });
        }
        bbox
    }

    /// Convert path into polylines, curves are flattened with provided `flatness`.
    ///
    /// Contours with less then two points are skipped.
    pub fn flatten(&self, tr: Transform, flatness: Scalar) -> Vec<Polyline> {
        let flatness = flatness.max(EPSILON);
        let mut result = Vec::new();
        let mut current: Vec<Point> = Vec::new();
        let mut position = Point::new(0.0, 0.0);
        let mut start = position;

        fn finish(result: &mut Vec<Polyline>, current: &mut Vec<Point>, closed: bool) {
            let points = std::mem::take(current);
            if points.len() >= 2 {
                result.push(Polyline { points, closed });
            }
        }

        for cmd in self.cmds.iter() {
            if current.is_empty() && !matches!(cmd, PathCmd::MoveTo(_) | PathCmd::Close) {
                current.push(tr.apply(position));
            }
            match *cmd {
                PathCmd::MoveTo(p) => {
                    finish(&mut result, &mut current, false);
                    current.push(tr.apply(p));
                    position = p;
                    start = p;
                }
                PathCmd::LineTo(p) => {
                    current.push(tr.apply(p));
                    position = p;
                }
                PathCmd::QuadTo(p1, p2) => {
                    Quad::new(position, p1, p2).flatten_into(tr, flatness, &mut current);
                    position = p2;
                }
                PathCmd::CubicTo(p1, p2, p3) => {
                    Cubic::new(position, p1, p2, p3).flatten_into(tr, flatness, &mut current);
                    position = p3;
                }
                PathCmd::Close => {
                    finish(&mut result, &mut current, true);
                    position = start;
                }
            }
        }
        finish(&mut result, &mut current, false);
        result
    }
}

impl fmt::Display for PathData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, cmd) in self.cmds.iter().enumerate() {
            if index != 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", cmd.letter())?;
            for (index, point) in cmd.points().enumerate() {
                if index != 0 {
                    f.write_str(" ")?;
                }
                scalar_fmt(f, point.x())?;
                f.write_str(",")?;
                scalar_fmt(f, point.y())?;
            }
        }
        Ok(())
    }
}

impl FromStr for PathData {
    type Err = PathDataError;

    fn from_str(text: &str) -> Result<PathData, Self::Err> {
        let mut builder = PathBuilder::new();
        PathParser::new(text.as_bytes()).parse(&mut builder)?;
        Ok(builder.build())
    }
}

/// Flattened contour of a path
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Polyline {
    /// Iterate over line segments, including closing segment for closed polylines
    pub fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        let closing = match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(first), Some(last)) if !first.is_close_to(*last) => {
                Some(Line::new(*last, *first))
            }
            _ => None,
        };
        self.points
            .windows(2)
            .map(|pair| Line::new(pair[0], pair[1]))
            .chain(closing)
    }
}

/// Incremental construction of path data
#[derive(Debug, Clone)]
pub struct PathBuilder {
    cmds: Vec<PathCmd>,
    position: Point,
    start: Point,
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathBuilder {
    pub fn new() -> Self {
        Self {
            cmds: Vec::new(),
            position: Point::new(0.0, 0.0),
            start: Point::new(0.0, 0.0),
        }
    }

    /// Build path
    pub fn build(&mut self) -> PathData {
        let PathBuilder { cmds, .. } = std::mem::take(self);
        PathData { cmds }
    }

    /// Extend path from string in the path data format
    pub fn append_path_data(&mut self, text: impl AsRef<[u8]>) -> Result<&mut Self, PathDataError> {
        PathParser::new(text.as_ref()).parse(self)?;
        Ok(self)
    }

    /// Move current position, starting a new contour
    pub fn move_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let p = p.into();
        self.cmds.push(PathCmd::MoveTo(p));
        self.position = p;
        self.start = p;
        self
    }

    /// Close current contour
    pub fn close(&mut self) -> &mut Self {
        self.cmds.push(PathCmd::Close);
        self.position = self.start;
        self
    }

    /// Add line from the current position to the specified point
    pub fn line_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let p = p.into();
        self.cmds.push(PathCmd::LineTo(p));
        self.position = p;
        self
    }

    /// Add quadratic bezier curve
    pub fn quad_to(&mut self, p1: impl Into<Point>, p2: impl Into<Point>) -> &mut Self {
        let p2 = p2.into();
        self.cmds.push(PathCmd::QuadTo(p1.into(), p2));
        self.position = p2;
        self
    }

    /// Add smooth quadratic bezier curve
    pub fn quad_smooth_to(&mut self, p2: impl Into<Point>) -> &mut Self {
        let p1 = match self.cmds.last() {
            Some(PathCmd::QuadTo(p1, p2)) => 2.0 * *p2 - *p1,
            _ => self.position,
        };
        self.quad_to(p1, p2)
    }

    /// Add cubic bezier curve
    pub fn cubic_to(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> &mut Self {
        let p3 = p3.into();
        self.cmds.push(PathCmd::CubicTo(p1.into(), p2.into(), p3));
        self.position = p3;
        self
    }

    /// Add smooth cubic bezier curve
    pub fn cubic_smooth_to(&mut self, p2: impl Into<Point>, p3: impl Into<Point>) -> &mut Self {
        let p1 = match self.cmds.last() {
            Some(PathCmd::CubicTo(_, p2, p3)) => 2.0 * *p3 - *p2,
            _ => self.position,
        };
        self.cubic_to(p1, p2, p3)
    }

    /// Add elliptic arc segment, approximated with cubic curves
    pub fn arc_to(
        &mut self,
        radii: impl Into<Point>,
        x_axis_rot: Scalar,
        large: bool,
        sweep: bool,
        p: impl Into<Point>,
    ) -> &mut Self {
        let radii: Point = radii.into();
        let p = p.into();
        match EllipArc::from_endpoints(self.position, p, radii, x_axis_rot, large, sweep) {
            None => self.line_to(p),
            Some(arc) => {
                for Cubic([_, p1, p2, p3]) in arc.to_cubics() {
                    self.cmds.push(PathCmd::CubicTo(p1, p2, p3));
                }
                self.position = p;
                self
            }
        }
    }

    /// Add closed ellipse with provided center and radii
    ///
    /// Current position is not changed after invocation.
    pub fn ellipse(&mut self, center: impl Into<Point>, rx: Scalar, ry: Scalar) -> &mut Self {
        // (4/3)*tan(pi/8) = 4*(sqrt(2)-1)/3 = 0.5522847498307935
        let position = self.position;
        let center = center.into();
        let x_offset = Point::new(0.5522847498307935 * rx, 0.0);
        let y_offset = Point::new(0.0, 0.5522847498307935 * ry);
        let p0 = center - Point::new(rx, 0.0);
        let p1 = center - Point::new(0.0, ry);
        let p2 = center + Point::new(rx, 0.0);
        let p3 = center + Point::new(0.0, ry);

        self.move_to(p0)
            .cubic_to(p0 - y_offset, p1 - x_offset, p1)
            .cubic_to(p1 + x_offset, p2 - y_offset, p2)
            .cubic_to(p2 + y_offset, p3 + x_offset, p3)
            .cubic_to(p3 - x_offset, p0 + y_offset, p0)
            .close();
        self.position = position;
        self
    }

    /// Add box with rounded corners, `pos` is low-x and low-y corner
    pub fn rbox(
        &mut self,
        pos: impl Into<Point>,
        size: impl Into<Point>,
        radii: impl Into<Point>,
    ) -> &mut Self {
        let Point([rx, ry]) = radii.into();
        let Point([lx, ly]) = pos.into();
        let size = size.into();
        let hx = lx + size.x().abs();
        let hy = ly + size.y().abs();
        let rx = rx.abs().min((hx - lx) / 2.0);
        let ry = ry.abs().min((hy - ly) / 2.0);
        let radii = Point::new(rx, ry);
        let rounded = rx > EPSILON && ry > EPSILON;

        self.move_to((lx + rx, ly)).line_to((hx - rx, ly));
        if rounded {
            self.arc_to(radii, 0.0, false, true, (hx, ly + ry));
        }
        self.line_to((hx, hy - ry));
        if rounded {
            self.arc_to(radii, 0.0, false, true, (hx - rx, hy));
        }
        self.line_to((lx + rx, hy));
        if rounded {
            self.arc_to(radii, 0.0, false, true, (lx, hy - ry));
        }
        self.line_to((lx, ly + ry));
        if rounded {
            self.arc_to(radii, 0.0, false, true, (lx + rx, ly));
        }
        self.close()
    }

    /// Add closed polygon (or open polyline) through provided points
    pub fn polygon(&mut self, points: &[Point], closed: bool) -> &mut Self {
        let mut points = points.iter();
        if let Some(first) = points.next() {
            self.move_to(*first);
            for point in points {
                self.line_to(*point);
            }
            if closed {
                self.close();
            }
        }
        self
    }

    /// Current position of the builder
    pub fn position(&self) -> Point {
        self.position
    }
}

/// Error produced by path data parser
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathDataError {
    /// Byte offset in the input at which error was detected
    pub offset: usize,
    pub reason: String,
}

impl fmt::Display for PathDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.reason, self.offset)
    }
}

impl std::error::Error for PathDataError {}

#[derive(Debug)]
struct PathParser<'a> {
    // text containing unparsed path
    text: &'a [u8],
    // current offset in the text
    offset: usize,
    // previous command
    prev_cmd: Option<u8>,
    // current position from which next curve will start
    position: Point,
}

impl<'a> PathParser<'a> {
    fn new(text: &'a [u8]) -> PathParser<'a> {
        Self {
            text,
            offset: 0,
            prev_cmd: None,
            position: Point::new(0.0, 0.0),
        }
    }

    /// Error construction helper
    fn error<S: Into<String>>(&self, reason: S) -> PathDataError {
        PathDataError {
            offset: self.offset,
            reason: reason.into(),
        }
    }

    /// Byte at the current position
    fn current(&self) -> Result<u8, PathDataError> {
        match self.text.get(self.offset) {
            Some(byte) => Ok(*byte),
            None => Err(self.error("unexpected end of input")),
        }
    }

    /// Advance current position by `count` bytes
    fn advance(&mut self, count: usize) {
        self.offset += count;
    }

    /// Check if end of file is reached
    fn is_eof(&self) -> bool {
        self.offset >= self.text.len()
    }

    /// Consume insignificant separators
    fn parse_separators(&mut self) {
        while let Some(b' ' | b'\t' | b'\r' | b'\n' | b',') = self.text.get(self.offset) {
            self.offset += 1;
        }
    }

    /// Consume digits, returns `true` if at least one digit was found
    fn parse_digits(&mut self) -> bool {
        let mut found = false;
        while let Some(b'0'..=b'9') = self.text.get(self.offset) {
            self.advance(1);
            found = true;
        }
        found
    }

    /// Consume `+|-` sign
    fn parse_sign(&mut self) {
        if let Some(b'-' | b'+') = self.text.get(self.offset) {
            self.advance(1);
        }
    }

    /// Parse single scalar
    fn parse_scalar(&mut self) -> Result<Scalar, PathDataError> {
        self.parse_separators();
        if self.is_eof() {
            return Err(self.error("missing argument"));
        }
        let start = self.offset;
        self.parse_sign();
        let whole = self.parse_digits();
        let fraction = match self.text.get(self.offset) {
            Some(b'.') => {
                self.advance(1);
                self.parse_digits()
            }
            _ => false,
        };
        if !whole && !fraction {
            self.offset = start;
            return Err(self.error("failed to parse scalar"));
        }
        if let Some(b'e' | b'E') = self.text.get(self.offset) {
            self.advance(1);
            self.parse_sign();
            if !self.parse_digits() {
                return Err(self.error("failed to parse scalar exponent"));
            }
        }
        std::str::from_utf8(&self.text[start..self.offset])
            .ok()
            .and_then(|scalar| Scalar::from_str(scalar).ok())
            .ok_or_else(|| self.error("failed to parse scalar"))
    }

    /// Parse pair of scalars and convert it to a point
    fn parse_point(&mut self) -> Result<Point, PathDataError> {
        let x = self.parse_scalar()?;
        let y = self.parse_scalar()?;
        if self.is_relative() {
            Ok(Point([x, y]) + self.position)
        } else {
            Ok(Point([x, y]))
        }
    }

    fn is_relative(&self) -> bool {
        match self.prev_cmd {
            Some(cmd) => cmd.is_ascii_lowercase(),
            None => false,
        }
    }

    /// Parse flag `0|1` used by elliptic arc command
    fn parse_flag(&mut self) -> Result<bool, PathDataError> {
        self.parse_separators();
        match self.current()? {
            b'0' => {
                self.advance(1);
                Ok(false)
            }
            b'1' => {
                self.advance(1);
                Ok(true)
            }
            _ => Err(self.error("failed to parse flag")),
        }
    }

    /// Parse command letter, or reuse previous command if arguments continue
    fn parse_cmd(&mut self) -> Result<u8, PathDataError> {
        let cmd = self.current()?;
        match cmd {
            b'M' | b'm' | b'L' | b'l' | b'V' | b'v' | b'H' | b'h' | b'C' | b'c' | b'S' | b's'
            | b'Q' | b'q' | b'T' | b't' | b'A' | b'a' | b'Z' | b'z' => {
                self.advance(1);
                self.prev_cmd = if cmd == b'm' {
                    Some(b'l')
                } else if cmd == b'M' {
                    Some(b'L')
                } else if cmd == b'Z' || cmd == b'z' {
                    None
                } else {
                    Some(cmd)
                };
                Ok(cmd)
            }
            _ if cmd.is_ascii_alphabetic() => {
                Err(self.error(format!("unknown command '{}'", cmd as char)))
            }
            _ => match self.prev_cmd {
                Some(cmd) => Ok(cmd),
                None => Err(self.error("expected command")),
            },
        }
    }

    /// Parse path data and apply changes to the path builder.
    fn parse(mut self, builder: &mut PathBuilder) -> Result<(), PathDataError> {
        loop {
            self.parse_separators();
            if self.is_eof() {
                break;
            }
            self.position = builder.position();
            let cmd = self.parse_cmd()?;
            match cmd {
                b'M' | b'm' => {
                    // `prev_cmd` is already switched to line-to, use the letter itself
                    let p = Point([self.parse_scalar()?, self.parse_scalar()?]);
                    let p = if cmd == b'm' { p + self.position } else { p };
                    builder.move_to(p);
                }
                b'L' | b'l' => {
                    builder.line_to(self.parse_point()?);
                }
                b'V' | b'v' => {
                    let y = self.parse_scalar()?;
                    let p0 = builder.position();
                    let p1 = if cmd == b'v' {
                        Point::new(p0.x(), p0.y() + y)
                    } else {
                        Point::new(p0.x(), y)
                    };
                    builder.line_to(p1);
                }
                b'H' | b'h' => {
                    let x = self.parse_scalar()?;
                    let p0 = builder.position();
                    let p1 = if cmd == b'h' {
                        Point::new(p0.x() + x, p0.y())
                    } else {
                        Point::new(x, p0.y())
                    };
                    builder.line_to(p1);
                }
                b'Q' | b'q' => {
                    builder.quad_to(self.parse_point()?, self.parse_point()?);
                }
                b'T' | b't' => {
                    builder.quad_smooth_to(self.parse_point()?);
                }
                b'C' | b'c' => {
                    builder.cubic_to(
                        self.parse_point()?,
                        self.parse_point()?,
                        self.parse_point()?,
                    );
                }
                b'S' | b's' => {
                    builder.cubic_smooth_to(self.parse_point()?, self.parse_point()?);
                }
                b'A' | b'a' => {
                    let rx = self.parse_scalar()?;
                    let ry = self.parse_scalar()?;
                    let x_axis_rot = self.parse_scalar()?;
                    let large_flag = self.parse_flag()?;
                    let sweep_flag = self.parse_flag()?;
                    let dst = self.parse_point()?;
                    builder.arc_to((rx, ry), x_axis_rot, large_flag, sweep_flag, dst);
                }
                b'Z' | b'z' => {
                    builder.close();
                }
                _ => return Err(self.error("unexpected command")),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    fn assert_path_eq(p0: &PathData, p1: &PathData, tolerance: Scalar) {
        assert_eq!(p0.len(), p1.len(), "{:?} != {:?}", p0, p1);
        for (c0, c1) in p0.cmds().iter().zip(p1.cmds()) {
            assert_eq!(c0.letter(), c1.letter(), "{:?} != {:?}", c0, c1);
            for (a, b) in c0.points().zip(c1.points()) {
                assert_approx_eq!(a.x(), b.x(), tolerance);
                assert_approx_eq!(a.y(), b.y(), tolerance);
            }
        }
    }

    const SQUIRREL: &str = r#"
    M12 1C9.79 1 8 2.31 8 3.92c0 1.94.5 3.03 0 6.08 0-4.5-2.77-6.34-4-6.34.05-.5-.48
    -.66-.48-.66s-.22.11-.3.34c-.27-.31-.56-.27-.56-.27l-.13.58S.7 4.29 .68 6.87c.2.33
    1.53.6 2.47.43.89.05.67.79.47.99C2.78 9.13 2 8 1 8S0 9 1 9s1 1 3 1c-3.09 1.2 0 4 0 4
    H3c-1 0-1 1-1 1h6c3 0 5-1 5-3.47 0-.85-.43-1.79 -1-2.53-1.11-1.46.23-2.68 1-2
    .77.68 3 1 3-2 0-2.21-1.79-4-4-4zM2.5 6 c-.28 0-.5-.22-.5-.5s.22-.5.5-.5.5.22.5.5
    -.22.5-.5.5z
    "#;

    #[test]
    fn test_path_parse() -> Result<(), PathDataError> {
        let path: PathData = SQUIRREL.parse()?;
        let reference = PathData::builder()
            .move_to((12.0, 1.0))
            .cubic_to((9.79, 1.0), (8.0, 2.31), (8.0, 3.92))
            .cubic_to((8.0, 5.86), (8.5, 6.95), (8.0, 10.0))
            .cubic_to((8.0, 5.5), (5.23, 3.66), (4.0, 3.66))
            .cubic_to((4.05, 3.16), (3.52, 3.0), (3.52, 3.0))
            .cubic_to((3.52, 3.0), (3.3, 3.11), (3.22, 3.34))
            .cubic_to((2.95, 3.03), (2.66, 3.07), (2.66, 3.07))
            .line_to((2.53, 3.65))
            .cubic_to((2.53, 3.65), (0.7, 4.29), (0.68, 6.87))
            .cubic_to((0.88, 7.2), (2.21, 7.47), (3.15, 7.3))
            .cubic_to((4.04, 7.35), (3.82, 8.09), (3.62, 8.29))
            .cubic_to((2.78, 9.13), (2.0, 8.0), (1.0, 8.0))
            .cubic_to((0.0, 8.0), (0.0, 9.0), (1.0, 9.0))
            .cubic_to((2.0, 9.0), (2.0, 10.0), (4.0, 10.0))
            .cubic_to((0.91, 11.2), (4.0, 14.0), (4.0, 14.0))
            .line_to((3.0, 14.0))
            .cubic_to((2.0, 14.0), (2.0, 15.0), (2.0, 15.0))
            .line_to((8.0, 15.0))
            .cubic_to((11.0, 15.0), (13.0, 14.0), (13.0, 11.53))
            .cubic_to((13.0, 10.68), (12.57, 9.74), (12.0, 9.0))
            .cubic_to((10.89, 7.54), (12.23, 6.32), (13.0, 7.0))
            .cubic_to((13.77, 7.68), (16.0, 8.0), (16.0, 5.0))
            .cubic_to((16.0, 2.79), (14.21, 1.0), (12.0, 1.0))
            .close()
            .move_to((2.5, 6.0))
            .cubic_to((2.22, 6.0), (2.0, 5.78), (2.0, 5.5))
            .cubic_to((2.0, 5.22), (2.22, 5.0), (2.5, 5.0))
            .cubic_to((2.78, 5.0), (3.0, 5.22), (3.0, 5.5))
            .cubic_to((3.0, 5.78), (2.78, 6.0), (2.5, 6.0))
            .close()
            .build();
        assert_path_eq(&path, &reference, 1e-9);

        // implicit repetition and position reset after close
        let path: PathData = " M0,0L1-1L1,0ZL0,1 l1,0Z ".parse()?;
        let reference = PathData::new(vec![
            PathCmd::MoveTo(Point::new(0.0, 0.0)),
            PathCmd::LineTo(Point::new(1.0, -1.0)),
            PathCmd::LineTo(Point::new(1.0, 0.0)),
            PathCmd::Close,
            PathCmd::LineTo(Point::new(0.0, 1.0)),
            PathCmd::LineTo(Point::new(1.0, 1.0)),
            PathCmd::Close,
        ]);
        assert_path_eq(&path, &reference, 1e-9);

        // relative move-to followed by implicit relative line-to
        let path: PathData = "m1 1 2 0 0 2z".parse()?;
        let reference = PathData::new(vec![
            PathCmd::MoveTo(Point::new(1.0, 1.0)),
            PathCmd::LineTo(Point::new(3.0, 1.0)),
            PathCmd::LineTo(Point::new(3.0, 3.0)),
            PathCmd::Close,
        ]);
        assert_path_eq(&path, &reference, 1e-9);
        Ok(())
    }

    #[test]
    fn test_parse_errors() {
        let err = "M0 0 X 1 2".parse::<PathData>().unwrap_err();
        assert_eq!(err.offset, 5);
        assert!(err.reason.contains("unknown command"));

        // cubic requires six arguments
        let err = "M0 0 C1 1 2 2 3".parse::<PathData>().unwrap_err();
        assert_eq!(err.reason, "missing argument");

        // dangling argument after close
        assert!("M0 0 L1 1 Z 5".parse::<PathData>().is_err());
        assert!("M0 0 L1".parse::<PathData>().is_err());
        assert!("M 0 0 L . 1".parse::<PathData>().is_err());
        assert!("".parse::<PathData>().unwrap().is_empty());
    }

    #[test]
    fn test_serialize_round_trip() -> Result<(), PathDataError> {
        let path: PathData = SQUIRREL.parse()?;
        let text = path.to_string();
        assert!(text.starts_with("M12,1 C9.79,1 8,2.31 8,3.92"));
        assert!(text.chars().all(|c| !"HVSTAhvstamlcqz".contains(c)));
        let restored: PathData = text.parse()?;
        assert_path_eq(&path, &restored, 1e-3);

        let path = PathData::builder()
            .move_to((0.12345, -7.0))
            .quad_to((1.0, 2.0), (3.5, 4.25))
            .line_to((-0.0004, 10.0))
            .close()
            .build();
        assert_eq!(path.to_string(), "M0.123,-7 Q1,2 3.5,4.25 L0,10 Z");
        let restored: PathData = path.to_string().parse()?;
        assert_path_eq(&path, &restored, 1e-3);
        Ok(())
    }

    #[test]
    fn test_shorthands() -> Result<(), PathDataError> {
        let path: PathData = "M0 0 H10 V10 h-10 v-10".parse()?;
        let reference = PathData::builder()
            .move_to((0.0, 0.0))
            .line_to((10.0, 0.0))
            .line_to((10.0, 10.0))
            .line_to((0.0, 10.0))
            .line_to((0.0, 0.0))
            .build();
        assert_path_eq(&path, &reference, 1e-9);

        let path: PathData = "M0 0 Q5 5 10 0 T20 0".parse()?;
        match path.cmds()[2] {
            PathCmd::QuadTo(p1, p2) => {
                assert_approx_eq!(p1.x(), 15.0);
                assert_approx_eq!(p1.y(), -5.0);
                assert_approx_eq!(p2.x(), 20.0);
            }
            cmd => panic!("unexpected command {:?}", cmd),
        }

        let path: PathData = "M0 0 C0 5 5 5 5 0 S10 -5 10 0".parse()?;
        match path.cmds()[2] {
            PathCmd::CubicTo(p1, _, _) => {
                assert_approx_eq!(p1.x(), 5.0);
                assert_approx_eq!(p1.y(), -5.0);
            }
            cmd => panic!("unexpected command {:?}", cmd),
        }

        let path: PathData = "M0 10 A10 10 0 0 1 20 10".parse()?;
        assert!(path.len() >= 3);
        assert!(path.cmds()[1..].iter().all(|c| matches!(c, PathCmd::CubicTo(..))));
        match path.cmds().last() {
            Some(PathCmd::CubicTo(_, _, end)) => assert!(end.is_close_to(Point::new(20.0, 10.0))),
            cmd => panic!("unexpected command {:?}", cmd),
        }
        Ok(())
    }

    #[test]
    fn test_flatten() -> Result<(), PathDataError> {
        let path: PathData = SQUIRREL.parse()?;
        let tr = Transform::new_rotate(1.0).pre_translate(-10.0, -20.0);
        let lines = path.flatten(tr, DEFAULT_FLATNESS);
        assert_eq!(lines.len(), 2);
        for polyline in lines.iter() {
            assert!(polyline.closed);
            let segments: Vec<_> = polyline.lines().collect();
            for pair in segments.windows(2) {
                assert!(pair[0].end().is_close_to(pair[1].start()));
            }
        }

        let path: PathData = "M0 0 L10 0 L10 10 M20 20".parse()?;
        let lines = path.flatten(Transform::identity(), DEFAULT_FLATNESS);
        assert_eq!(lines.len(), 1);
        assert!(!lines[0].closed);
        assert_eq!(lines[0].lines().count(), 2);
        Ok(())
    }

    #[test]
    fn test_bbox() -> Result<(), PathDataError> {
        let path: PathData = "M1 2 L5 -3 Q7 7 0 0 Z".parse()?;
        let bbox = path.bbox(Transform::identity()).unwrap();
        assert_approx_eq!(bbox.x(), 0.0);
        assert_approx_eq!(bbox.y(), -3.0);
        assert_approx_eq!(bbox.width(), 7.0);
        assert_approx_eq!(bbox.height(), 10.0);
        assert!(PathData::default().bbox(Transform::identity()).is_none());
        Ok(())
    }
}
