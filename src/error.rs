use crate::{ColorError, PathDataError, SvgTransformError};
use std::fmt;

/// Errors produced by the tracing pipeline, codecs and renderer
///
/// Every operation either fully succeeds or fails with one of these, partially
/// constructed documents are never returned.
#[derive(Debug)]
pub enum Error {
    /// Source image is empty or malformed
    InvalidImage(String),
    QuantizationFailed(String),
    TracingFailed(String),
    /// Input is not a well-formed XML document
    InvalidXml(String),
    InvalidPathData {
        /// Element or attribute containing path data, empty if not known
        context: String,
        error: PathDataError,
    },
    UnsupportedElement(String),
    /// Structurally invalid document (missing or malformed required attribute)
    InvalidDocument(String),
    RenderingFailed(String),
    Io(std::io::Error),
    Png(String),
    #[cfg(feature = "serde")]
    Json(serde_json::Error),
}

impl Error {
    /// Attach element/attribute name to path data error
    pub(crate) fn path_data(context: impl Into<String>, error: PathDataError) -> Self {
        Error::InvalidPathData {
            context: context.into(),
            error,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidImage(msg) => write!(f, "invalid image: {}", msg),
            Error::QuantizationFailed(msg) => write!(f, "quantization failed: {}", msg),
            Error::TracingFailed(msg) => write!(f, "tracing failed: {}", msg),
            Error::InvalidXml(msg) => write!(f, "invalid xml: {}", msg),
            Error::InvalidPathData { context, error } if context.is_empty() => {
                write!(f, "invalid path data: {}", error)
            }
            Error::InvalidPathData { context, error } => {
                write!(f, "invalid path data in {}: {}", context, error)
            }
            Error::UnsupportedElement(name) => write!(f, "unsupported element: {}", name),
            Error::InvalidDocument(msg) => write!(f, "invalid document: {}", msg),
            Error::RenderingFailed(msg) => write!(f, "rendering failed: {}", msg),
            Error::Io(error) => write!(f, "io error: {}", error),
            Error::Png(msg) => write!(f, "png error: {}", msg),
            #[cfg(feature = "serde")]
            Error::Json(error) => write!(f, "json error: {}", error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidPathData { error, .. } => Some(error),
            Error::Io(error) => Some(error),
            #[cfg(feature = "serde")]
            Error::Json(error) => Some(error),
            _ => None,
        }
    }
}

impl From<PathDataError> for Error {
    fn from(error: PathDataError) -> Self {
        Error::path_data("", error)
    }
}

impl From<ColorError> for Error {
    fn from(error: ColorError) -> Self {
        Error::InvalidDocument(error.to_string())
    }
}

impl From<SvgTransformError> for Error {
    fn from(error: SvgTransformError) -> Self {
        Error::InvalidDocument(error.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io(error)
    }
}

impl From<roxmltree::Error> for Error {
    fn from(error: roxmltree::Error) -> Self {
        Error::InvalidXml(error.to_string())
    }
}

#[cfg(feature = "png")]
impl From<png::EncodingError> for Error {
    fn from(error: png::EncodingError) -> Self {
        Error::Png(error.to_string())
    }
}

#[cfg(feature = "png")]
impl From<png::DecodingError> for Error {
    fn from(error: png::DecodingError) -> Self {
        Error::Png(error.to_string())
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json(error)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
