//! Android vector drawable codec
//!
//! Supported vocabulary is `<vector>`, `<group>` and `<path>`. Anything else,
//! including `<clip-path>` and inline `aapt:attr` resources, is rejected with
//! [`Error::UnsupportedElement`].
use crate::{
    Document, Error, Extent, FillRule, PathData, Point, RGBA, Scalar, TransformParams,
    VectorGroup, VectorPath, scalar_fmt,
    utils::{read_head, xml_escape, xml_parse, xml_root_name},
};
use std::{fmt::Write, path::Path};

pub const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";

/// Check whether data looks like vector drawable, only root element is inspected
pub fn is_vector_drawable_data(data: &[u8]) -> bool {
    xml_root_name(data) == Some("vector")
}

/// Check whether file looks like vector drawable, reads only the head of the file
pub fn is_vector_drawable_at(path: impl AsRef<Path>) -> bool {
    read_head(path, 4096).is_ok_and(|head| is_vector_drawable_data(&head))
}

/// Parse vector drawable XML
pub fn parse_vector_drawable(text: &str) -> Result<Document, Error> {
    let _span = tracing::debug_span!("[parse]", format = "vector-drawable").entered();
    let xml = xml_parse(text)?;
    let root = xml.root_element();
    if root.tag_name().name() != "vector" {
        return Err(Error::UnsupportedElement(format!(
            "root element <{}>, expected <vector>",
            root.tag_name().name()
        )));
    }

    let viewport = Extent::new(
        required(root, "viewportWidth")?,
        required(root, "viewportHeight")?,
    );
    let output_size = Extent::new(
        dimension(root, "width")?.unwrap_or(viewport.width),
        dimension(root, "height")?.unwrap_or(viewport.height),
    );
    let mut doc = Document::new(viewport, output_size)?
        .with_tint(color(root, "tint")?)
        .with_alpha(number(root, "alpha")?.unwrap_or(1.0));

    let mut count = 0;
    for child in root.children().filter(|node| node.is_element()) {
        match child.tag_name().name() {
            "path" => {
                doc.push_path(parse_path(child)?);
                count += 1;
            }
            "group" => {
                doc.push_group(parse_group(child, &mut count)?);
            }
            _ => return Err(unsupported(child)),
        }
    }
    tracing::debug!(paths = count, "vector drawable parsed");
    Ok(doc)
}

/// Parse vector drawable from UTF-8 bytes
pub fn parse_vector_drawable_data(data: &[u8]) -> Result<Document, Error> {
    let text = std::str::from_utf8(data)
        .map_err(|error| Error::InvalidXml(format!("input is not UTF-8: {}", error)))?;
    parse_vector_drawable(text)
}

/// Read and parse vector drawable file
pub fn parse_vector_drawable_at(path: impl AsRef<Path>) -> Result<Document, Error> {
    parse_vector_drawable_data(&std::fs::read(path)?)
}

fn parse_group(node: roxmltree::Node<'_, '_>, count: &mut usize) -> Result<VectorGroup, Error> {
    let mut group = VectorGroup::new().with_params(TransformParams {
        rotation: number(node, "rotation")?.unwrap_or(0.0),
        pivot: Point::new(
            number(node, "pivotX")?.unwrap_or(0.0),
            number(node, "pivotY")?.unwrap_or(0.0),
        ),
        scale: Point::new(
            number(node, "scaleX")?.unwrap_or(1.0),
            number(node, "scaleY")?.unwrap_or(1.0),
        ),
        translate: Point::new(
            number(node, "translateX")?.unwrap_or(0.0),
            number(node, "translateY")?.unwrap_or(0.0),
        ),
    });
    if let Some(name) = attribute(node, "name") {
        group = group.with_name(name);
    }
    for child in node.children().filter(|node| node.is_element()) {
        match child.tag_name().name() {
            "path" => {
                group.push_path(parse_path(child)?);
                *count += 1;
            }
            "group" => {
                group.push_group(parse_group(child, count)?);
            }
            _ => return Err(unsupported(child)),
        }
    }
    Ok(group)
}

fn parse_path(node: roxmltree::Node<'_, '_>) -> Result<VectorPath, Error> {
    if let Some(child) = node.children().find(|node| node.is_element()) {
        return Err(unsupported(child));
    }
    let name = attribute(node, "name");
    let path_data = attribute(node, "pathData").unwrap_or_default().trim();
    let context = match name {
        Some(name) => format!("<path android:name=\"{}\">", name),
        None => "<path>".to_owned(),
    };
    path_data
        .parse::<PathData>()
        .map_err(|error| Error::path_data(context, error))?;

    let mut path = VectorPath::new(path_data)
        .with_stroke_width(number(node, "strokeWidth")?.unwrap_or(0.0))
        .with_fill_alpha(number(node, "fillAlpha")?.unwrap_or(1.0))
        .with_stroke_alpha(number(node, "strokeAlpha")?.unwrap_or(1.0));
    if let Some(name) = name {
        path = path.with_name(name);
    }
    if let Some(fill) = color(node, "fillColor")? {
        path = path.with_fill(fill);
    }
    if let Some(stroke) = color(node, "strokeColor")? {
        let width = path.stroke_width();
        path = path.with_stroke(stroke, width);
    }
    match attribute(node, "fillType") {
        None | Some("nonZero") => {}
        Some("evenOdd") => path = path.with_fill_rule(FillRule::EvenOdd),
        Some(value) => {
            return Err(Error::InvalidDocument(format!(
                "android:fillType has invalid value '{}'",
                value
            )));
        }
    }
    Ok(path)
}

fn unsupported(node: roxmltree::Node<'_, '_>) -> Error {
    let tag = node.tag_name();
    let name = match node.lookup_prefix(tag.namespace().unwrap_or_default()) {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, tag.name()),
        _ => tag.name().to_owned(),
    };
    let line = node.document().text_pos_at(node.range().start).row;
    Error::UnsupportedElement(format!("<{}> at line {}", name, line))
}

/// Attribute in android namespace, falls back to attribute without namespace
fn attribute<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute((ANDROID_NS, name))
        .or_else(|| node.attribute(name))
}

fn number(node: roxmltree::Node<'_, '_>, name: &str) -> Result<Option<Scalar>, Error> {
    let Some(value) = attribute(node, name) else {
        return Ok(None);
    };
    parse_scalar(value)
        .map(Some)
        .ok_or_else(|| invalid_attribute(node, name, value))
}

fn required(node: roxmltree::Node<'_, '_>, name: &str) -> Result<Scalar, Error> {
    number(node, name)?.ok_or_else(|| {
        Error::InvalidDocument(format!(
            "<{}> is missing required attribute android:{}",
            node.tag_name().name(),
            name
        ))
    })
}

/// Dimension units and their size in `dp`, physical units assume the 160 dpi baseline
const UNITS: [(&str, Scalar); 7] = [
    ("dip", 1.0),
    ("dp", 1.0),
    ("px", 1.0),
    ("sp", 1.0),
    ("pt", 160.0 / 72.0),
    ("in", 160.0),
    ("mm", 160.0 / 25.4),
];

/// Dimension with optional unit suffix (`24dp`, `10px`, `1in`) converted to `dp`
fn dimension(node: roxmltree::Node<'_, '_>, name: &str) -> Result<Option<Scalar>, Error> {
    let Some(value) = attribute(node, name) else {
        return Ok(None);
    };
    let trimmed = value.trim();
    let (number, scale) = UNITS
        .iter()
        .find_map(|(unit, scale)| Some((trimmed.strip_suffix(unit)?, *scale)))
        .unwrap_or((trimmed, 1.0));
    parse_scalar(number)
        .map(|number| Some(number * scale))
        .ok_or_else(|| invalid_attribute(node, name, value))
}

fn color(node: roxmltree::Node<'_, '_>, name: &str) -> Result<Option<RGBA>, Error> {
    let Some(value) = attribute(node, name) else {
        return Ok(None);
    };
    let value = value.trim();
    if value.starts_with('@') || value.starts_with('?') {
        return Err(Error::InvalidDocument(format!(
            "android:{} references resource '{}', only color literals are supported",
            name, value
        )));
    }
    RGBA::from_argb_hex(value)
        .map(Some)
        .map_err(|_| invalid_attribute(node, name, value))
}

fn parse_scalar(value: &str) -> Option<Scalar> {
    value.trim().parse::<Scalar>().ok().filter(|v| v.is_finite())
}

fn invalid_attribute(node: roxmltree::Node<'_, '_>, name: &str, value: &str) -> Error {
    Error::InvalidDocument(format!(
        "<{}> has invalid android:{}=\"{}\"",
        node.tag_name().name(),
        name,
        value
    ))
}

/// Serialize document as vector drawable XML
pub fn export_vector_drawable(doc: &Document) -> String {
    let mut out = String::new();
    // writing into a string never fails
    let _ = write_document(&mut out, doc);
    out
}

/// Serialize document as vector drawable UTF-8 bytes
pub fn export_vector_drawable_data(doc: &Document) -> Vec<u8> {
    export_vector_drawable(doc).into_bytes()
}

/// Builder of a single element with attributes placed on separate lines
struct ElementWriter<'a, W> {
    out: &'a mut W,
    indent: usize,
}

impl<'a, W: Write> ElementWriter<'a, W> {
    fn open(out: &'a mut W, indent: usize, tag: &str) -> Result<Self, std::fmt::Error> {
        write!(out, "{:indent$}<{}", "", tag, indent = indent)?;
        Ok(Self { out, indent })
    }

    fn attr(&mut self, name: &str, value: &str) -> std::fmt::Result {
        write!(
            self.out,
            "\n{:indent$}android:{}=\"{}\"",
            "",
            name,
            xml_escape(value),
            indent = self.indent + 4
        )
    }

    fn scalar(&mut self, name: &str, value: Scalar) -> std::fmt::Result {
        write!(
            self.out,
            "\n{:indent$}android:{}=\"",
            "",
            name,
            indent = self.indent + 4
        )?;
        scalar_fmt(&mut *self.out, value)?;
        self.out.write_char('"')
    }

    fn scalar_unless(&mut self, name: &str, value: Scalar, default: Scalar) -> std::fmt::Result {
        if value == default {
            return Ok(());
        }
        self.scalar(name, value)
    }
}

fn write_document(out: &mut impl Write, doc: &Document) -> std::fmt::Result {
    writeln!(out, "<?xml version=\"1.0\" encoding=\"utf-8\"?>")?;
    write!(out, "<vector xmlns:android=\"{}\"", ANDROID_NS)?;
    let mut root = ElementWriter {
        out: &mut *out,
        indent: 0,
    };
    write_dimension(&mut root, "width", doc.output_size().width)?;
    write_dimension(&mut root, "height", doc.output_size().height)?;
    root.scalar("viewportWidth", doc.viewport().width)?;
    root.scalar("viewportHeight", doc.viewport().height)?;
    if let Some(tint) = doc.tint() {
        root.attr("tint", &tint.to_argb_hex())?;
    }
    root.scalar_unless("alpha", doc.alpha(), 1.0)?;
    out.write_str(">\n")?;
    for path in doc.paths() {
        write_path(out, path, 4)?;
    }
    for group in doc.groups() {
        write_group(out, group, 4)?;
    }
    out.write_str("</vector>\n")
}

fn write_dimension<W: Write>(
    element: &mut ElementWriter<'_, W>,
    name: &str,
    value: Scalar,
) -> std::fmt::Result {
    let mut text = String::new();
    scalar_fmt(&mut text, value)?;
    text.push_str("dp");
    element.attr(name, &text)
}

fn write_group(out: &mut impl Write, group: &VectorGroup, indent: usize) -> std::fmt::Result {
    let mut element = ElementWriter::open(&mut *out, indent, "group")?;
    if let Some(name) = group.name() {
        element.attr("name", name)?;
    }
    let params = group.params();
    element.scalar_unless("rotation", params.rotation, 0.0)?;
    element.scalar_unless("pivotX", params.pivot.x(), 0.0)?;
    element.scalar_unless("pivotY", params.pivot.y(), 0.0)?;
    element.scalar_unless("scaleX", params.scale.x(), 1.0)?;
    element.scalar_unless("scaleY", params.scale.y(), 1.0)?;
    element.scalar_unless("translateX", params.translate.x(), 0.0)?;
    element.scalar_unless("translateY", params.translate.y(), 0.0)?;
    if group.paths().is_empty() && group.groups().is_empty() {
        return out.write_str(" />\n");
    }
    out.write_str(">\n")?;
    for path in group.paths() {
        write_path(out, path, indent + 4)?;
    }
    for child in group.groups() {
        write_group(out, child, indent + 4)?;
    }
    writeln!(out, "{:indent$}</group>", "", indent = indent)
}

fn write_path(out: &mut impl Write, path: &VectorPath, indent: usize) -> std::fmt::Result {
    let mut element = ElementWriter::open(&mut *out, indent, "path")?;
    if let Some(name) = path.name() {
        element.attr("name", name)?;
    }
    element.attr("pathData", path.path_data())?;
    if let Some(fill) = path.fill_color() {
        element.attr("fillColor", &fill.to_argb_hex())?;
    }
    element.scalar_unless("fillAlpha", path.fill_alpha(), 1.0)?;
    if path.fill_rule() == FillRule::EvenOdd {
        element.attr("fillType", "evenOdd")?;
    }
    if let Some(stroke) = path.stroke_color() {
        element.attr("strokeColor", &stroke.to_argb_hex())?;
    }
    element.scalar_unless("strokeWidth", path.stroke_width(), 0.0)?;
    element.scalar_unless("strokeAlpha", path.stroke_alpha(), 1.0)?;
    out.write_str(" />\n")
}
