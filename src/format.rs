//! Supported vector document formats
use crate::{
    Document, Error, export_svg, export_vector_drawable, parse_svg, parse_svg_data,
    parse_vector_drawable, parse_vector_drawable_data,
    utils::{read_head, xml_root_name},
};
use std::{fmt, path::Path, str::FromStr};

/// Number of bytes read from a file to detect its format
const SNIFF_LIMIT: u64 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    /// Android vector drawable XML
    VectorDrawable,
    /// Scalable vector graphics
    Svg,
}

impl Format {
    pub const ALL: [Format; 2] = [Format::VectorDrawable, Format::Svg];

    /// Detect format by the root element of the document
    pub fn sniff(data: &[u8]) -> Option<Format> {
        match xml_root_name(data)? {
            "vector" => Some(Format::VectorDrawable),
            "svg" => Some(Format::Svg),
            _ => None,
        }
    }

    /// Detect format of a file, only the beginning of the file is read
    pub fn sniff_at(path: impl AsRef<Path>) -> Option<Format> {
        let head = read_head(path, SNIFF_LIMIT).ok()?;
        Self::sniff(&head)
    }

    /// Conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Format::VectorDrawable => "xml",
            Format::Svg => "svg",
        }
    }

    pub fn parse(&self, text: &str) -> Result<Document, Error> {
        match self {
            Format::VectorDrawable => parse_vector_drawable(text),
            Format::Svg => parse_svg(text),
        }
    }

    pub fn parse_data(&self, data: &[u8]) -> Result<Document, Error> {
        match self {
            Format::VectorDrawable => parse_vector_drawable_data(data),
            Format::Svg => parse_svg_data(data),
        }
    }

    /// Read and parse file, format is detected from the content
    pub fn parse_at(path: impl AsRef<Path>) -> Result<(Format, Document), Error> {
        let data = std::fs::read(path.as_ref())?;
        let format = Self::sniff(&data).ok_or_else(|| {
            Error::UnsupportedElement(format!(
                "unknown document format: {}",
                path.as_ref().display()
            ))
        })?;
        Ok((format, format.parse_data(&data)?))
    }

    pub fn export(&self, doc: &Document) -> String {
        match self {
            Format::VectorDrawable => export_vector_drawable(doc),
            Format::Svg => export_svg(doc),
        }
    }

    pub fn export_data(&self, doc: &Document) -> Vec<u8> {
        self.export(doc).into_bytes()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::VectorDrawable => f.write_str("vector-drawable"),
            Format::Svg => f.write_str("svg"),
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "vector-drawable" | "vector" | "xml" => Ok(Format::VectorDrawable),
            "svg" => Ok(Format::Svg),
            _ => Err(Error::UnsupportedElement(format!(
                "unknown document format: {}",
                name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Extent, VectorPath, RGBA};

    fn document() -> Result<Document, Error> {
        let mut doc = Document::new(Extent::new(24.0, 24.0), Extent::new(48.0, 48.0))?;
        doc.push_path(VectorPath::new("M2,2 L22,2 L22,22 Z").with_fill(RGBA::new(0, 128, 0, 255)));
        Ok(doc)
    }

    #[test]
    fn test_sniff() {
        assert_eq!(
            Format::sniff(b"<?xml version=\"1.0\"?><vector xmlns:android=\"x\"/>"),
            Some(Format::VectorDrawable)
        );
        assert_eq!(
            Format::sniff(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>"),
            Some(Format::Svg)
        );
        assert_eq!(Format::sniff(b"<html></html>"), None);
        assert_eq!(Format::sniff(b"\x89PNG\r\n\x1a\n"), None);
        assert_eq!(Format::sniff_at("/nonexistent/file.svg"), None);
    }

    #[test]
    fn test_round_trip() -> Result<(), Error> {
        let doc = document()?;
        for format in Format::ALL {
            let text = format.export(&doc);
            assert_eq!(Format::sniff(text.as_bytes()), Some(format));
            let parsed = format.parse(&text)?;
            assert_eq!(parsed.all_paths().len(), 1);
            assert_eq!(parsed.viewport(), doc.viewport());
            assert_eq!(parsed.output_size(), doc.output_size());
            assert_eq!(
                parsed.all_paths()[0].fill_color(),
                Some(RGBA::new(0, 128, 0, 255))
            );
            assert_eq!(format.parse_data(&format.export_data(&doc))?, parsed);
        }
        Ok(())
    }

    #[test]
    fn test_parse_at() -> Result<(), Error> {
        let doc = document()?;
        let path = std::env::temp_dir().join(format!("vectrace-format-{}.svg", std::process::id()));
        std::fs::write(&path, Format::Svg.export_data(&doc))?;
        let result = Format::parse_at(&path);
        let sniffed = Format::sniff_at(&path);
        std::fs::remove_file(&path)?;
        let (format, parsed) = result?;
        assert_eq!(format, Format::Svg);
        assert_eq!(sniffed, Some(Format::Svg));
        assert_eq!(parsed.viewport(), doc.viewport());
        Ok(())
    }

    #[test]
    fn test_names() -> Result<(), Error> {
        for format in Format::ALL {
            assert_eq!(format.to_string().parse::<Format>()?, format);
        }
        assert_eq!("XML".parse::<Format>()?, Format::VectorDrawable);
        assert!("png".parse::<Format>().is_err());
        Ok(())
    }
}
