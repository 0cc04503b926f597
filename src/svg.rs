//! SVG codec
//!
//! Import accepts a practical subset: `<svg>` root, `<g>` groups, `<path>` and
//! basic shapes with solid color paint. Group transforms are decomposed into
//! rotation, scale and translation, skew has no representation there and is lost.
//! Transforms of individual paths and shapes are baked into their path data.
use crate::{
    Document, Error, Extent, FillRule, PathBuilder, PathData, Point, RGBA, Scalar, Transform,
    VectorGroup, VectorPath, scalar_fmt,
    utils::{read_head, xml_escape, xml_parse, xml_root_name},
};
use std::{fmt, fmt::Write, path::Path, str::FromStr};

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Check whether data looks like SVG, only root element is inspected
pub fn is_svg_data(data: &[u8]) -> bool {
    xml_root_name(data) == Some("svg")
}

/// Check whether file looks like SVG, reads only the head of the file
pub fn is_svg_at(path: impl AsRef<Path>) -> bool {
    read_head(path, 4096).is_ok_and(|head| is_svg_data(&head))
}

/// Parse SVG document
pub fn parse_svg(text: &str) -> Result<Document, Error> {
    let _span = tracing::debug_span!("[parse]", format = "svg").entered();
    let xml = xml_parse(text)?;
    let root = xml.root_element();
    if !is_svg_node(root) || root.tag_name().name() != "svg" {
        return Err(Error::UnsupportedElement(format!(
            "root element <{}>, expected <svg>",
            root.tag_name().name()
        )));
    }

    let view_box = match root.attribute("viewBox") {
        None => None,
        Some(value) => Some(parse_view_box(value)?),
    };
    let width = length(root, "width")?;
    let height = length(root, "height")?;
    let viewport = match (view_box, width, height) {
        (Some([_, _, w, h]), _, _) => Extent::new(w, h),
        (None, Some(w), Some(h)) => Extent::new(w, h),
        _ => {
            return Err(Error::InvalidDocument(
                "<svg> requires either viewBox or both width and height".to_owned(),
            ));
        }
    };
    // missing dimension keeps viewport aspect ratio
    let output_size = match (width, height) {
        (Some(w), Some(h)) => Extent::new(w, h),
        (Some(w), None) => Extent::new(w, w * viewport.height / viewport.width),
        (None, Some(h)) => Extent::new(h * viewport.width / viewport.height, h),
        (None, None) => viewport,
    };
    let mut doc = Document::new(viewport, output_size)?
        .with_alpha(opacity(root, "opacity")?.unwrap_or(1.0));

    let mut style = Style::default();
    style.update(root)?;
    // root opacity is already applied as document alpha
    style.opacity = 1.0;

    let mut content = VectorGroup::new();
    let mut count = 0;
    parse_children(root, &style, &mut content, &mut count)?;
    match view_box {
        Some([x, y, _, _]) if x != 0.0 || y != 0.0 => {
            let params = Transform::new_translate(-x, -y).decompose();
            doc.push_group(content.with_params(params));
        }
        _ => {
            while let Some(path) = content.take_path(0) {
                doc.push_path(path);
            }
            while let Some(group) = content.take_group(0) {
                doc.push_group(group);
            }
        }
    }
    tracing::debug!(paths = count, "svg parsed");
    Ok(doc)
}

/// Parse SVG document from UTF-8 bytes
pub fn parse_svg_data(data: &[u8]) -> Result<Document, Error> {
    let text = std::str::from_utf8(data)
        .map_err(|error| Error::InvalidXml(format!("input is not UTF-8: {}", error)))?;
    parse_svg(text)
}

/// Read and parse SVG file
pub fn parse_svg_at(path: impl AsRef<Path>) -> Result<Document, Error> {
    parse_svg_data(&std::fs::read(path)?)
}

/// Elements without namespace are treated as SVG elements
fn is_svg_node(node: roxmltree::Node<'_, '_>) -> bool {
    matches!(node.tag_name().namespace(), None | Some(SVG_NS))
}

fn parse_children(
    node: roxmltree::Node<'_, '_>,
    style: &Style,
    group: &mut VectorGroup,
    count: &mut usize,
) -> Result<(), Error> {
    for child in node.children().filter(|node| node.is_element()) {
        if !is_svg_node(child) {
            // editor specific metadata (inkscape, sodipodi, ...)
            continue;
        }
        let name = child.tag_name().name();
        match name {
            "title" | "desc" | "metadata" | "defs" => continue,
            "g" => {
                let mut style = style.clone();
                style.update(child)?;
                let mut inner = VectorGroup::new();
                if let Some(id) = child.attribute("id") {
                    inner = inner.with_name(id);
                }
                if let Some(transform) = child.attribute("transform") {
                    inner = inner.with_params(transform_attr(child, transform)?.decompose());
                }
                parse_children(child, &style, &mut inner, count)?;
                group.push_group(inner);
            }
            "path" | "rect" | "circle" | "ellipse" | "line" | "polyline" | "polygon" => {
                let mut style = style.clone();
                style.update(child)?;
                let mut path = shape_path(child)?;
                if let Some(transform) = child.attribute("transform") {
                    path = path.transform(transform_attr(child, transform)?);
                }
                let mut vector = style.apply(VectorPath::from_path(&path));
                if let Some(id) = child.attribute("id") {
                    vector = vector.with_name(id);
                }
                group.push_path(vector);
                *count += 1;
            }
            _ => {
                let line = child.document().text_pos_at(child.range().start).row;
                return Err(Error::UnsupportedElement(format!("<{}> at line {}", name, line)));
            }
        }
    }
    Ok(())
}

/// Convert path or basic shape element into path data
fn shape_path(node: roxmltree::Node<'_, '_>) -> Result<PathData, Error> {
    let name = node.tag_name().name();
    let num = |attr: &str| -> Result<Scalar, Error> { Ok(length(node, attr)?.unwrap_or(0.0)) };
    let mut builder = PathBuilder::new();
    match name {
        "path" => {
            let data = node.attribute("d").unwrap_or_default();
            let context = match node.attribute("id") {
                Some(id) => format!("<path id=\"{}\">", id),
                None => "<path>".to_owned(),
            };
            builder
                .append_path_data(data)
                .map_err(|error| Error::path_data(context, error))?;
        }
        "rect" => {
            let (width, height) = (num("width")?, num("height")?);
            if width > 0.0 && height > 0.0 {
                // missing radius takes the value of the other one
                let rx = length(node, "rx")?;
                let ry = length(node, "ry")?;
                let (rx, ry) = match (rx, ry) {
                    (Some(rx), Some(ry)) => (rx, ry),
                    (Some(r), None) | (None, Some(r)) => (r, r),
                    (None, None) => (0.0, 0.0),
                };
                builder.rbox((num("x")?, num("y")?), (width, height), (rx, ry));
            }
        }
        "circle" => {
            let r = num("r")?;
            if r > 0.0 {
                builder.ellipse((num("cx")?, num("cy")?), r, r);
            }
        }
        "ellipse" => {
            let (rx, ry) = (num("rx")?, num("ry")?);
            if rx > 0.0 && ry > 0.0 {
                builder.ellipse((num("cx")?, num("cy")?), rx, ry);
            }
        }
        "line" => {
            builder
                .move_to((num("x1")?, num("y1")?))
                .line_to((num("x2")?, num("y2")?));
        }
        _ => {
            let points = parse_points(node.attribute("points").unwrap_or_default())
                .ok_or_else(|| invalid_attribute(node, "points"))?;
            builder.polygon(&points, name == "polygon");
        }
    }
    Ok(builder.build())
}

/// Parse `points` attribute, odd trailing coordinate is ignored
fn parse_points(text: &str) -> Option<Vec<Point>> {
    let values = text
        .split(|c: char| c.is_ascii_whitespace() || c == ',')
        .filter(|value| !value.is_empty())
        .map(|value| value.parse::<Scalar>().ok())
        .collect::<Option<Vec<_>>>()?;
    Some(
        values
            .chunks_exact(2)
            .map(|pair| Point::new(pair[0], pair[1]))
            .collect(),
    )
}

fn parse_view_box(text: &str) -> Result<[Scalar; 4], Error> {
    let invalid = || Error::InvalidDocument(format!("invalid viewBox=\"{}\"", text));
    let values = text
        .split(|c: char| c.is_ascii_whitespace() || c == ',')
        .filter(|value| !value.is_empty())
        .map(|value| value.parse::<Scalar>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(invalid)?;
    match values.as_slice() {
        [x, y, w, h] if *w > 0.0 && *h > 0.0 => Ok([*x, *y, *w, *h]),
        _ => Err(invalid()),
    }
}

/// Length in user units, percentages are not resolved and treated as missing
fn length(node: roxmltree::Node<'_, '_>, name: &str) -> Result<Option<Scalar>, Error> {
    let Some(value) = node.attribute(name) else {
        return Ok(None);
    };
    parse_length(value).map_err(|_| invalid_attribute(node, name))
}

fn parse_length(value: &str) -> Result<Option<Scalar>, ()> {
    let value = value.trim();
    if value.ends_with('%') {
        return Ok(None);
    }
    let split = value
        .find(|c: char| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let scale = match unit {
        "" | "px" => 1.0,
        "pt" => 4.0 / 3.0,
        "pc" => 16.0,
        "in" => 96.0,
        "cm" => 96.0 / 2.54,
        "mm" => 96.0 / 25.4,
        _ => return Err(()),
    };
    let number: Scalar = number.trim().parse().map_err(|_| ())?;
    if !number.is_finite() {
        return Err(());
    }
    Ok(Some(number * scale))
}

/// Opacity as number or percentage, clamped to `[0, 1]`
fn opacity(node: roxmltree::Node<'_, '_>, name: &str) -> Result<Option<Scalar>, Error> {
    match node.attribute(name) {
        None => Ok(None),
        Some(value) => parse_opacity(value)
            .map(Some)
            .ok_or_else(|| invalid_attribute(node, name)),
    }
}

fn parse_opacity(value: &str) -> Option<Scalar> {
    let value = value.trim();
    let opacity = match value.strip_suffix('%') {
        Some(percent) => percent.trim().parse::<Scalar>().ok()? / 100.0,
        None => value.parse::<Scalar>().ok()?,
    };
    opacity.is_finite().then(|| opacity.clamp(0.0, 1.0))
}

fn transform_attr(node: roxmltree::Node<'_, '_>, value: &str) -> Result<Transform, Error> {
    Transform::from_str(value).map_err(|error| {
        Error::InvalidDocument(format!(
            "<{}> has invalid transform=\"{}\": {}",
            node.tag_name().name(),
            value,
            error
        ))
    })
}

fn invalid_attribute(node: roxmltree::Node<'_, '_>, name: &str) -> Error {
    Error::InvalidDocument(format!(
        "<{}> has invalid {}=\"{}\"",
        node.tag_name().name(),
        name,
        node.attribute(name).unwrap_or_default()
    ))
}

/// Inherited presentation properties
#[derive(Debug, Clone)]
struct Style {
    fill: Option<RGBA>,
    stroke: Option<RGBA>,
    stroke_width: Scalar,
    fill_opacity: Scalar,
    stroke_opacity: Scalar,
    fill_rule: FillRule,
    color: RGBA,
    /// Product of `opacity` of the element and its ancestors
    opacity: Scalar,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Some(RGBA::BLACK),
            stroke: None,
            stroke_width: 1.0,
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
            fill_rule: FillRule::NonZero,
            color: RGBA::BLACK,
            opacity: 1.0,
        }
    }
}

impl Style {
    /// Update style with element presentation attributes, `style` attribute wins
    fn update(&mut self, node: roxmltree::Node<'_, '_>) -> Result<(), Error> {
        let mut props: Vec<(&str, &str)> = Vec::new();
        for name in [
            "color",
            "fill",
            "stroke",
            "stroke-width",
            "fill-opacity",
            "stroke-opacity",
            "fill-rule",
            "opacity",
        ] {
            if let Some(value) = node.attribute(name) {
                props.push((name, value));
            }
        }
        if let Some(style) = node.attribute("style") {
            props.extend(
                style
                    .split(';')
                    .filter_map(|decl| decl.split_once(':'))
                    .map(|(name, value)| (name.trim(), value.trim())),
            );
        }
        // `color` has to be resolved before `currentColor` references
        props.sort_by_key(|(name, _)| *name != "color");
        for (name, value) in props {
            self.set(node, name, value)?;
        }
        Ok(())
    }

    fn set(&mut self, node: roxmltree::Node<'_, '_>, name: &str, value: &str) -> Result<(), Error> {
        let invalid = || {
            Error::InvalidDocument(format!(
                "<{}> has invalid {}: {}",
                node.tag_name().name(),
                name,
                value
            ))
        };
        if value == "inherit" {
            return Ok(());
        }
        match name {
            "color" => self.color = self.paint(value).map_err(|_| invalid())?.unwrap_or(self.color),
            "fill" => self.fill = self.paint(value).map_err(|error| error.unwrap_or_else(invalid))?,
            "stroke" => {
                self.stroke = self.paint(value).map_err(|error| error.unwrap_or_else(invalid))?
            }
            "stroke-width" => {
                self.stroke_width = parse_length(value)
                    .map_err(|_| invalid())?
                    .unwrap_or(self.stroke_width)
                    .max(0.0)
            }
            "fill-opacity" => self.fill_opacity = parse_opacity(value).ok_or_else(invalid)?,
            "stroke-opacity" => self.stroke_opacity = parse_opacity(value).ok_or_else(invalid)?,
            "opacity" => self.opacity *= parse_opacity(value).ok_or_else(invalid)?,
            "fill-rule" => {
                self.fill_rule = match value {
                    "nonzero" => FillRule::NonZero,
                    "evenodd" => FillRule::EvenOdd,
                    _ => return Err(invalid()),
                }
            }
            // other properties (stroke-linecap, font-*, ...) have no effect on the document
            _ => {}
        }
        Ok(())
    }

    /// Parse solid color paint, error contains specific error for paint servers
    fn paint(&self, value: &str) -> Result<Option<RGBA>, Option<Error>> {
        if value.starts_with("url(") {
            return Err(Some(Error::UnsupportedElement(format!(
                "paint server {}",
                value
            ))));
        }
        if value == "currentColor" {
            return Ok(Some(self.color));
        }
        RGBA::from_svg_paint(value).map_err(|_| None)
    }

    fn apply(&self, path: VectorPath) -> VectorPath {
        let mut path = path.with_fill_rule(self.fill_rule);
        if let Some(fill) = self.fill {
            path = path
                .with_fill(fill)
                .with_fill_alpha(self.fill_opacity * self.opacity);
        }
        if let Some(stroke) = self.stroke {
            path = path
                .with_stroke(stroke, self.stroke_width)
                .with_stroke_alpha(self.stroke_opacity * self.opacity);
        }
        path
    }
}

/// Serialize document as SVG
///
/// Document tint is baked into path colors, group transformations are written
/// as `matrix(..)`.
pub fn export_svg(doc: &Document) -> String {
    let mut out = String::new();
    // writing into a string never fails
    let _ = write_svg(&mut out, doc);
    out
}

/// Serialize document as SVG UTF-8 bytes
pub fn export_svg_data(doc: &Document) -> Vec<u8> {
    export_svg(doc).into_bytes()
}

fn write_scalar_attr(out: &mut impl Write, name: &str, value: Scalar) -> fmt::Result {
    write!(out, " {}=\"", name)?;
    scalar_fmt(out, value)?;
    out.write_char('"')
}

fn write_svg(out: &mut impl Write, doc: &Document) -> fmt::Result {
    writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    write!(out, "<svg xmlns=\"{}\"", SVG_NS)?;
    write_scalar_attr(out, "width", doc.output_size().width)?;
    write_scalar_attr(out, "height", doc.output_size().height)?;
    out.write_str(" viewBox=\"0 0 ")?;
    scalar_fmt(out, doc.viewport().width)?;
    out.write_char(' ')?;
    scalar_fmt(out, doc.viewport().height)?;
    out.write_char('"')?;
    if doc.alpha() != 1.0 {
        write_scalar_attr(out, "opacity", doc.alpha())?;
    }
    out.write_str(">\n")?;
    for path in doc.paths() {
        write_path(out, doc, path, 2)?;
    }
    for group in doc.groups() {
        write_group(out, doc, group, 2)?;
    }
    out.write_str("</svg>\n")
}

fn write_group(
    out: &mut impl Write,
    doc: &Document,
    group: &VectorGroup,
    indent: usize,
) -> fmt::Result {
    write!(out, "{:indent$}<g", "", indent = indent)?;
    if let Some(name) = group.name() {
        write!(out, " id=\"{}\"", xml_escape(name))?;
    }
    let tr = group.transform();
    if !tr.is_identity() {
        out.write_str(" transform=\"matrix(")?;
        for (index, value) in tr.to_svg_matrix().into_iter().enumerate() {
            if index != 0 {
                out.write_char(' ')?;
            }
            scalar_fmt(out, value)?;
        }
        out.write_str(")\"")?;
    }
    if group.paths().is_empty() && group.groups().is_empty() {
        return out.write_str("/>\n");
    }
    out.write_str(">\n")?;
    for path in group.paths() {
        write_path(out, doc, path, indent + 2)?;
    }
    for child in group.groups() {
        write_group(out, doc, child, indent + 2)?;
    }
    writeln!(out, "{:indent$}</g>", "", indent = indent)
}

fn write_path(out: &mut impl Write, doc: &Document, path: &VectorPath, indent: usize) -> fmt::Result {
    write!(out, "{:indent$}<path", "", indent = indent)?;
    if let Some(name) = path.name() {
        write!(out, " id=\"{}\"", xml_escape(name))?;
    }
    write!(out, " d=\"{}\"", xml_escape(path.path_data()))?;
    match path.fill_color() {
        None => out.write_str(" fill=\"none\"")?,
        Some(fill) => {
            let fill = doc.resolve_color(fill);
            write!(out, " fill=\"{}\"", fill.to_rgb_hex())?;
            let alpha = fill.alpha_scalar() * path.fill_alpha();
            if alpha != 1.0 {
                write_scalar_attr(out, "fill-opacity", alpha)?;
            }
        }
    }
    if path.fill_rule() == FillRule::EvenOdd {
        out.write_str(" fill-rule=\"evenodd\"")?;
    }
    if let Some(stroke) = path.stroke_color() {
        let stroke = doc.resolve_color(stroke);
        write!(out, " stroke=\"{}\"", stroke.to_rgb_hex())?;
        write_scalar_attr(out, "stroke-width", path.stroke_width())?;
        let alpha = stroke.alpha_scalar() * path.stroke_alpha();
        if alpha != 1.0 {
            write_scalar_attr(out, "stroke-opacity", alpha)?;
        }
    }
    out.write_str("/>\n")
}

/// Error produced by SVG transform attribute parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SvgTransformError {
    /// Unknown transform function
    InvalidOp { offset: usize },
    /// Failed to parse numeric argument
    InvalidScalar { offset: usize },
    /// Unknown angle or length units
    InvalidUnits { offset: usize },
    /// Opening or closing bracket is missing
    BracketExpected { offset: usize },
}

impl fmt::Display for SvgTransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidOp { offset } => write!(f, "invalid transform operation at {}", offset),
            Self::InvalidScalar { offset } => write!(f, "invalid number at {}", offset),
            Self::InvalidUnits { offset } => write!(f, "invalid units at {}", offset),
            Self::BracketExpected { offset } => write!(f, "bracket expected at {}", offset),
        }
    }
}

impl std::error::Error for SvgTransformError {}

struct SvgTransformParser<'a> {
    text: &'a [u8],
    offset: usize,
}

impl<'a> SvgTransformParser<'a> {
    fn new(text: &'a [u8]) -> Self {
        Self { text, offset: 0 }
    }

    fn parse_separators(&mut self) {
        while let Some(b' ' | b'\t' | b'\r' | b'\n' | b',') = self.text.get(self.offset) {
            self.offset += 1;
        }
    }

    fn parse_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.offset;
        while self.text.get(self.offset).is_some_and(|b| pred(*b)) {
            self.offset += 1;
        }
        &self.text[start..self.offset]
    }

    fn parse_ident(&mut self) -> &'a [u8] {
        self.parse_while(|b| b.is_ascii_alphabetic())
    }

    fn parse_byte(&mut self, byte: u8) -> Result<(), SvgTransformError> {
        self.parse_separators();
        if self.text.get(self.offset) == Some(&byte) {
            self.offset += 1;
            Ok(())
        } else {
            Err(SvgTransformError::BracketExpected {
                offset: self.offset,
            })
        }
    }

    /// Parse number, on failure offset is left at the start of the number
    fn parse_scalar(&mut self) -> Result<Scalar, SvgTransformError> {
        self.parse_separators();
        let start = self.offset;
        if let Some(b'-' | b'+') = self.text.get(self.offset) {
            self.offset += 1;
        }
        let mut digits = self.parse_while(|b| b.is_ascii_digit()).len();
        if self.text.get(self.offset) == Some(&b'.') {
            self.offset += 1;
            digits += self.parse_while(|b| b.is_ascii_digit()).len();
        }
        if digits > 0 {
            if let Some(b'e' | b'E') = self.text.get(self.offset) {
                let mantissa_end = self.offset;
                self.offset += 1;
                if let Some(b'-' | b'+') = self.text.get(self.offset) {
                    self.offset += 1;
                }
                if self.parse_while(|b| b.is_ascii_digit()).is_empty() {
                    // `e` belongs to units
                    self.offset = mantissa_end;
                }
            }
        }
        let value = std::str::from_utf8(&self.text[start..self.offset])
            .ok()
            .filter(|_| digits > 0)
            .and_then(|text| text.parse::<Scalar>().ok());
        match value {
            Some(value) => Ok(value),
            None => {
                self.offset = start;
                Err(SvgTransformError::InvalidScalar { offset: start })
            }
        }
    }

    /// Parse angle in radians
    fn parse_angle(&mut self) -> Result<Scalar, SvgTransformError> {
        let value = self.parse_scalar()?;
        let offset = self.offset;
        match self.parse_ident() {
            b"" | b"deg" => Ok(value.to_radians()),
            b"rad" => Ok(value),
            b"grad" => Ok(value * crate::PI / 200.0),
            b"turn" => Ok(value * 2.0 * crate::PI),
            _ => Err(SvgTransformError::InvalidUnits { offset }),
        }
    }

    fn parse_length(&mut self) -> Result<Scalar, SvgTransformError> {
        let value = self.parse_scalar()?;
        let offset = self.offset;
        match self.parse_ident() {
            b"" | b"px" => Ok(value),
            _ => Err(SvgTransformError::InvalidUnits { offset }),
        }
    }

    fn parse_transform(&mut self) -> Result<Option<Transform>, SvgTransformError> {
        self.parse_separators();
        if self.offset >= self.text.len() {
            return Ok(None);
        }
        let offset = self.offset;
        let op = self.parse_ident();
        self.parse_byte(b'(')?;
        let tr = match op {
            b"matrix" => {
                let mut m = [0.0; 6];
                for value in m.iter_mut() {
                    *value = self.parse_scalar()?;
                }
                let [a, b, c, d, e, f] = m;
                Transform::new(a, c, e, b, d, f)
            }
            b"translate" => {
                let tx = self.parse_length()?;
                let ty = self.parse_length().unwrap_or(0.0);
                Transform::new_translate(tx, ty)
            }
            b"scale" => {
                let sx = self.parse_scalar()?;
                let sy = self.parse_scalar().unwrap_or(sx);
                Transform::new_scale(sx, sy)
            }
            b"rotate" => {
                let angle = self.parse_angle()?;
                match self.parse_length() {
                    Ok(cx) => {
                        let cy = self.parse_length()?;
                        Transform::identity().pre_rotate_around(angle, (cx, cy))
                    }
                    Err(_) => Transform::new_rotate(angle),
                }
            }
            b"skewX" => Transform::new_skew(self.parse_angle()?, 0.0),
            b"skewY" => Transform::new_skew(0.0, self.parse_angle()?),
            _ => return Err(SvgTransformError::InvalidOp { offset }),
        };
        self.parse_byte(b')')?;
        Ok(Some(tr))
    }
}

impl FromStr for Transform {
    type Err = SvgTransformError;

    /// Parse SVG `transform` attribute
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut tr = Transform::identity();
        let mut parser = SvgTransformParser::new(text.as_bytes());
        while let Some(tr_next) = parser.parse_transform()? {
            tr = tr * tr_next;
        }
        Ok(tr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TransformParams, assert_approx_eq, parse_vector_drawable};

    fn assert_transform_eq(t0: Transform, t1: Transform) {
        for (v0, v1) in t0.to_svg_matrix().into_iter().zip(t1.to_svg_matrix()) {
            assert_approx_eq!(v0, v1, 1e-2);
        }
    }

    #[test]
    fn test_parse_transform() -> Result<(), SvgTransformError> {
        let tr_str = r#"
            translate(1 2)
            skewX(30deg)
            matrix(1  2 3 4 -3-7)
            scale(2,1)
            rotate(10 1 2)
            rotate(1rad)
        "#;
        let tr_fmt = "matrix(6.561 5.234 -1.926 -2.146 -5.24 -4.123)";
        let tr = Transform::from_str(tr_str)?;
        assert_eq!(format!("{tr:?}"), tr_fmt);
        let tr = Transform::from_str(tr_fmt)?;
        assert_eq!(format!("{tr:?}"), tr_fmt);

        assert_eq!(Transform::from_str("")?, Transform::identity());
        assert_eq!(
            Transform::from_str("translate(1"),
            Err(SvgTransformError::BracketExpected { offset: 11 })
        );
        assert_eq!(
            Transform::from_str("shear(1)"),
            Err(SvgTransformError::InvalidOp { offset: 0 })
        );
        assert_eq!(
            Transform::from_str("rotate(1foo)"),
            Err(SvgTransformError::InvalidUnits { offset: 8 })
        );
        Ok(())
    }

    #[test]
    fn test_decompose_translate() -> Result<(), Error> {
        let params = Transform::from_str("matrix(1,0,0,1,10,20)")?.decompose();
        assert_eq!(params.translate, Point::new(10.0, 20.0));
        assert_approx_eq!(params.rotation, 0.0);
        assert_eq!(params.scale, Point::new(1.0, 1.0));

        let doc = parse_svg(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
                <g transform="matrix(1,0,0,1,10,20)"><path d="M0,0 L1,1"/></g>
            </svg>"#,
        )?;
        assert_eq!(doc.groups()[0].params().translate, Point::new(10.0, 20.0));
        Ok(())
    }

    #[test]
    fn test_parse_svg() -> Result<(), Error> {
        let doc = parse_svg(
            r##"<?xml version="1.0"?>
            <!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
            <svg xmlns="http://www.w3.org/2000/svg"
                 xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape"
                 width="200" height="100" viewBox="0 0 20 10" opacity="0.5">
              <title>sample</title>
              <inkscape:grid/>
              <defs><linearGradient id="unused"/></defs>
              <rect id="bg" width="20" height="10" fill="#ff0000" fill-opacity="50%"/>
              <g id="layer" fill="blue" stroke="#00ff00" stroke-width="0.5" transform="translate(2 3) scale(2)">
                <circle cx="1" cy="1" r="1" style="fill: none; stroke-opacity: .25"/>
                <polygon points="0,0 2,0 2,2" fill-rule="evenodd" transform="translate(1,1)"/>
                <g opacity="0.5"><line x1="0" y1="0" x2="1" y2="0"/></g>
              </g>
            </svg>"##,
        )?;
        assert_eq!(doc.viewport(), Extent::new(20.0, 10.0));
        assert_eq!(doc.output_size(), Extent::new(200.0, 100.0));
        assert_approx_eq!(doc.alpha(), 0.5);

        let bg = &doc.paths()[0];
        assert_eq!(bg.name(), Some("bg"));
        assert_eq!(bg.fill_color(), Some(RGBA::new(255, 0, 0, 255)));
        assert_approx_eq!(bg.fill_alpha(), 0.5);
        assert_eq!(bg.stroke_color(), None);
        let bbox = bg.parse_path_data()?.bbox(Transform::identity()).unwrap();
        assert_eq!(bbox.max(), Point::new(20.0, 10.0));

        let layer = &doc.groups()[0];
        assert_eq!(layer.name(), Some("layer"));
        assert_eq!(
            *layer.params(),
            TransformParams {
                translate: Point::new(2.0, 3.0),
                scale: Point::new(2.0, 2.0),
                ..Default::default()
            }
        );
        let circle = &layer.paths()[0];
        assert_eq!(circle.fill_color(), None);
        assert_eq!(circle.stroke_color(), Some(RGBA::new(0, 255, 0, 255)));
        assert_approx_eq!(circle.stroke_width(), 0.5);
        assert_approx_eq!(circle.stroke_alpha(), 0.25);

        let polygon = &layer.paths()[1];
        assert_eq!(polygon.fill_color(), Some(RGBA::new(0, 0, 255, 255)));
        assert_eq!(polygon.fill_rule(), FillRule::EvenOdd);
        assert_eq!(polygon.path_data(), "M1,1 L3,1 L3,3 Z");

        let line = &layer.groups()[0].paths()[0];
        assert_eq!(line.path_data(), "M0,0 L1,0");
        assert_approx_eq!(line.stroke_alpha(), 0.5);
        Ok(())
    }

    #[test]
    fn test_view_box_origin() -> Result<(), Error> {
        let doc = parse_svg(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" viewBox="5 5 20 10">
                <path d="M5,5 h20 v10 h-20 z"/>
            </svg>"#,
        )?;
        assert_eq!(doc.output_size(), Extent::new(10.0, 5.0));
        assert!(doc.paths().is_empty());
        let group = &doc.groups()[0];
        assert_eq!(group.params().translate, Point::new(-5.0, -5.0));
        let bbox = group.paths()[0]
            .parse_path_data()?
            .bbox(group.transform())
            .unwrap();
        assert_eq!(bbox.min(), Point::new(0.0, 0.0));
        assert_eq!(bbox.max(), Point::new(20.0, 10.0));
        Ok(())
    }

    #[test]
    fn test_errors() {
        let result = parse_svg("<svg");
        assert!(matches!(result, Err(Error::InvalidXml(_))));

        let result = parse_svg(r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#);
        assert!(matches!(result, Err(Error::InvalidDocument(_))));

        let result = parse_svg(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 1 1"><text>hi</text></svg>"#,
        );
        assert!(matches!(result, Err(Error::UnsupportedElement(ref name)) if name.contains("text")));

        let result = parse_svg(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 1 1"><path d="M0,0" fill="url(#g)"/></svg>"#,
        );
        assert!(matches!(result, Err(Error::UnsupportedElement(_))));

        let result = parse_svg(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 1 1"><path id="p" d="M0,0 Y"/></svg>"#,
        );
        assert!(matches!(
            result,
            Err(Error::InvalidPathData { ref context, .. }) if context.contains("\"p\"")
        ));

        let result = parse_svg(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 1 1"><g transform="shear(2)"/></svg>"#,
        );
        assert!(matches!(result, Err(Error::InvalidDocument(_))));

        let result = parse_svg(r#"<vector viewportWidth="1" viewportHeight="1"/>"#);
        assert!(matches!(result, Err(Error::UnsupportedElement(_))));
    }

    #[test]
    fn test_round_trip() -> Result<(), Error> {
        let doc = parse_vector_drawable(
            r##"<vector xmlns:android="http://schemas.android.com/apk/res/android"
                android:width="48dp" android:height="32dp"
                android:viewportWidth="24" android:viewportHeight="16" android:alpha="0.75">
                <path android:name="body" android:pathData="M0,0 L24,0 L24,16 Z"
                    android:fillColor="#336699" android:fillAlpha="0.5"/>
                <group android:name="rotated" android:rotation="30" android:pivotX="12"
                    android:pivotY="8" android:scaleX="2" android:translateX="1">
                    <path android:pathData="M0,0 Q4,4 8,0 C8,2 4,4 0,0 Z"
                        android:strokeColor="#FF0000" android:strokeWidth="1.5"
                        android:fillType="evenOdd"/>
                    <group/>
                </group>
            </vector>"##,
        )?;
        let exported = export_svg(&doc);
        assert!(is_svg_data(exported.as_bytes()));
        let reparsed = parse_svg(&exported)?;
        assert_eq!(reparsed.viewport(), doc.viewport());
        assert_eq!(reparsed.output_size(), doc.output_size());
        assert_approx_eq!(reparsed.alpha(), doc.alpha());

        let (p0, p1) = (&doc.paths()[0], &reparsed.paths()[0]);
        assert_eq!(p1.name(), p0.name());
        assert_eq!(p1.fill_color(), p0.fill_color());
        assert_approx_eq!(p1.fill_alpha(), p0.fill_alpha());
        assert_eq!(p1.path_data(), p0.path_data());

        let (g0, g1) = (&doc.groups()[0], &reparsed.groups()[0]);
        assert_eq!(g1.name(), g0.name());
        assert_transform_eq(g1.transform(), g0.transform());
        let (p0, p1) = (&g0.paths()[0], &g1.paths()[0]);
        assert_eq!(p1.fill_color(), None);
        assert_eq!(p1.stroke_color(), p0.stroke_color());
        assert_approx_eq!(p1.stroke_width(), p0.stroke_width());
        assert_eq!(p1.fill_rule(), FillRule::EvenOdd);
        assert_eq!(p1.path_data(), p0.path_data());
        assert_eq!(g1.groups().len(), 1);
        Ok(())
    }

    #[test]
    fn test_export_tint() -> Result<(), Error> {
        let mut doc = Document::new(Extent::new(1.0, 1.0), Extent::new(1.0, 1.0))?
            .with_tint(Some(RGBA::new(0, 0, 255, 255)));
        doc.push_path(VectorPath::new("M0,0 L1,1").with_fill(RGBA::new(255, 0, 0, 255)));
        let exported = export_svg(&doc);
        assert!(exported.contains("fill=\"#0000ff\""));
        assert!(!exported.contains("fill-opacity"));
        Ok(())
    }
}
