//! Utility functions and types used across the library
use std::{borrow::Cow, io::Read, path::Path};

/// Restrict value to a certain interval
#[inline]
pub fn clamp<T>(val: T, min: T, max: T) -> T
where
    T: PartialOrd,
{
    if val < min {
        min
    } else if val > max {
        max
    } else {
        val
    }
}

/// Signed area of a polygon described by its vertices
///
/// Positive value of the signed area corresponds to the clockwise orientation in
/// the coordinate system with `y` axis pointing down.
pub fn signed_area(points: &[crate::Point]) -> crate::Scalar {
    if points.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    let mut prev = points[points.len() - 1];
    for point in points {
        area += prev.cross(*point);
        prev = *point;
    }
    area / 2.0
}

/// Escape text for use inside of XML attribute value
pub(crate) fn xml_escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Parse XML document, DTD is allowed since SVG files often carry one
pub(crate) fn xml_parse(text: &str) -> Result<roxmltree::Document<'_>, crate::Error> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    Ok(roxmltree::Document::parse_with_options(text, options)?)
}

/// Local name of the root element of XML document, without parsing the document
///
/// Skips byte order mark, XML declaration, processing instructions, comments and
/// document type declaration. Returns `None` if data does not look like XML.
pub(crate) fn xml_root_name(data: &[u8]) -> Option<&str> {
    let mut data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    loop {
        data = data.trim_ascii_start();
        if data.starts_with(b"<?") {
            data = skip_past(data, b"?>")?;
        } else if data.starts_with(b"<!--") {
            data = skip_past(data, b"-->")?;
        } else if data.starts_with(b"<!") {
            // internal subset of the doctype may contain `>`
            let close = data.iter().position(|b| *b == b'>')?;
            data = match data[..close].contains(&b'[') {
                true => skip_past(data, b"]>")?,
                false => &data[close + 1..],
            };
        } else if let Some(rest) = data.strip_prefix(b"<") {
            let end = rest
                .iter()
                .position(|b| b.is_ascii_whitespace() || *b == b'>' || *b == b'/')
                .unwrap_or(rest.len());
            let name = std::str::from_utf8(&rest[..end]).ok()?;
            let local = name.rsplit(':').next().unwrap_or(name);
            return (!local.is_empty()).then_some(local);
        } else {
            return None;
        }
    }
}

fn skip_past<'a>(data: &'a [u8], pattern: &[u8]) -> Option<&'a [u8]> {
    let index = data
        .windows(pattern.len())
        .position(|window| window == pattern)?;
    Some(&data[index + pattern.len()..])
}

/// Read at most `limit` bytes from the beginning of a file
pub(crate) fn read_head(path: impl AsRef<Path>, limit: u64) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::new();
    std::fs::File::open(path)?.take(limit).read_to_end(&mut head)?;
    Ok(head)
}
