//! Raster image tracing and a small toolkit around vector documents.
//!
//! Main features:
//!  - Tracing of raster images into vector documents (quantization, contour tracing, simplification)
//!  - Android vector drawable and SVG import/export
//!  - Path data parsing and generation
//!  - Anti-aliased rendering of vector documents
//!
#![deny(warnings)]

mod color;
mod contour;
mod curve;
mod document;
mod drawable;
mod ellipse;
mod error;
mod format;
mod geometry;
mod image;
mod path;
mod quantize;
mod rasterize;
mod render;
mod simplify;
mod svg;
mod trace;
mod utils;

pub use color::{Color, ColorError, LinColor, RGBA, linear_to_srgb, srgb_to_linear};
pub use contour::{Polygon, Region, trace_regions};
pub use curve::{Cubic, Curve, Line, Quad, Segment};
pub use document::{Document, Extent, VectorGroup, VectorPath};
pub use drawable::{
    ANDROID_NS, export_vector_drawable, export_vector_drawable_data, is_vector_drawable_at,
    is_vector_drawable_data, parse_vector_drawable, parse_vector_drawable_at,
    parse_vector_drawable_data,
};
pub use ellipse::EllipArc;
pub use error::{Error, Result};
pub use format::Format;
pub use geometry::{
    BBox, EPSILON, EPSILON_SQRT, PI, Point, Scalar, Size, Transform, TransformParams, scalar_fmt,
    scalar_round, scalar_to_string,
};
pub use image::{Image, ImageIter, ImageMut, ImageOwned, PixelBuffer, Shape};
pub use path::{
    DEFAULT_FLATNESS, FillRule, PathBuilder, PathCmd, PathData, PathDataError, Polyline,
};
pub use quantize::{
    IndexMap, MAX_COLORS, MIN_COLORS, Palette, Quantized, TRANSPARENT_INDEX,
    TRANSPARENT_THRESHOLD, quantize,
};
pub use rasterize::rasterize_lines;
#[cfg(feature = "png")]
pub use render::render_png;
pub use render::{MAX_RENDER_PIXELS, RenderOptions, render};
pub use simplify::simplify;
pub use svg::{
    SVG_NS, SvgTransformError, export_svg, export_svg_data, is_svg_at, is_svg_data, parse_svg,
    parse_svg_at, parse_svg_data,
};
pub use trace::{MAX_TOLERANCE, TracerConfig, quantize_colors, trace_image, trace_image_with_size};
