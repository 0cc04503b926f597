//! Raster to vector tracing pipeline
//!
//! Image is quantized once, after that every palette color is traced and
//! simplified independently. All regions of one color end up in a single path
//! where each outer contour is followed by its holes, the path is filled with
//! non-zero rule which works since holes have opposite winding.
use crate::{
    Document, Error, Extent, FillRule, Image, IndexMap, PathData, Polygon, RGBA, Region, Scalar,
    Size, VectorPath,
    quantize::{MAX_COLORS, MIN_COLORS, quantize},
    simplify, trace_regions,
    utils::clamp,
};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Maximum allowed simplification tolerance in pixels
pub const MAX_TOLERANCE: Scalar = 5.0;

/// Parameters of the tracing pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TracerConfig {
    /// Number of palette colors
    pub color_count: usize,
    /// Maximum distance in pixels between traced contour and simplified one
    pub tolerance: Scalar,
    /// Regions with smaller area in square pixels are discarded
    pub min_area: Scalar,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            color_count: 8,
            tolerance: 1.0,
            min_area: 4.0,
        }
    }
}

impl TracerConfig {
    pub fn with_color_count(self, color_count: usize) -> Self {
        Self {
            color_count: clamp(color_count, MIN_COLORS, MAX_COLORS),
            ..self
        }
    }

    pub fn with_tolerance(self, tolerance: Scalar) -> Self {
        let tolerance = if tolerance.is_nan() { 0.0 } else { tolerance };
        Self {
            tolerance: clamp(tolerance, 0.0, MAX_TOLERANCE),
            ..self
        }
    }

    pub fn with_min_area(self, min_area: Scalar) -> Self {
        Self {
            min_area: if min_area.is_nan() { 0.0 } else { min_area.max(0.0) },
            ..self
        }
    }

    /// Same configuration with all values moved into their valid ranges
    pub fn normalize(self) -> Self {
        self.with_color_count(self.color_count)
            .with_tolerance(self.tolerance)
            .with_min_area(self.min_area)
    }
}

/// Trace image into a document with the same output size as the image
pub fn trace_image(
    image: &(impl Image<Pixel = RGBA> + Sync),
    config: &TracerConfig,
) -> Result<Document, Error> {
    trace_image_with_size(image, image.size(), config)
}

/// Trace image into a document with the specified output size
///
/// Viewport of the resulting document always matches the image size, so the
/// coordinates of the paths are in source pixels.
pub fn trace_image_with_size(
    image: &(impl Image<Pixel = RGBA> + Sync),
    output_size: Size,
    config: &TracerConfig,
) -> Result<Document, Error> {
    let size = image.size();
    if size.is_empty() {
        return Err(Error::InvalidImage(format!(
            "empty image {}x{}",
            size.width, size.height
        )));
    }
    if output_size.is_empty() {
        return Err(Error::InvalidImage(format!(
            "empty output size {}x{}",
            output_size.width, output_size.height
        )));
    }
    let config = config.normalize();

    let quantized = tracing::debug_span!("[quantize]", colors = config.color_count)
        .in_scope(|| quantize(image, config.color_count))?;
    let colors = quantized.palette.colors();
    let index_map = &quantized.index_map;

    #[cfg(feature = "rayon")]
    let traced: Vec<Option<PathData>> = (0..colors.len())
        .into_par_iter()
        .map(|index| trace_color(index_map, index as u8, &config))
        .collect::<Result<_, _>>()?;
    #[cfg(not(feature = "rayon"))]
    let traced: Vec<Option<PathData>> = (0..colors.len())
        .map(|index| trace_color(index_map, index as u8, &config))
        .collect::<Result<_, _>>()?;

    let mut doc = Document::new(Extent::from(size), Extent::from(output_size))?;
    for (color, path) in colors.iter().zip(traced) {
        let Some(path) = path else {
            continue;
        };
        doc.push_path(
            VectorPath::from_path(&path)
                .with_fill(color.with_alpha_u8(255))
                .with_fill_alpha(color.alpha_scalar())
                .with_fill_rule(FillRule::NonZero),
        );
    }
    tracing::debug!(paths = doc.paths().len(), "traced");
    Ok(doc)
}

/// Palette that would be used to trace the image
pub fn quantize_colors(image: &impl Image<Pixel = RGBA>, color_count: usize) -> Result<Vec<RGBA>, Error> {
    if image.size().is_empty() {
        return Err(Error::InvalidImage("empty image".to_owned()));
    }
    let color_count = clamp(color_count, MIN_COLORS, MAX_COLORS);
    let quantized = quantize(image, color_count)?;
    Ok(quantized.palette.colors().to_vec())
}

/// Trace and simplify all regions of one palette color, `None` if nothing is left
fn trace_color(
    index_map: &IndexMap,
    index: u8,
    config: &TracerConfig,
) -> Result<Option<PathData>, Error> {
    let regions = tracing::debug_span!("[contour]", index)
        .in_scope(|| trace_regions(index_map, index))?;
    let polygons = tracing::debug_span!("[simplify]", index).in_scope(|| {
        let mut before = 0;
        let mut after = 0;
        let mut polygons = Vec::new();
        for Region { outer, holes } in regions {
            before += outer.len() + holes.iter().map(Polygon::len).sum::<usize>();
            // holes of the discarded outer contour are discarded too
            let Some(outer) = simplify(&outer, config.tolerance, config.min_area) else {
                continue;
            };
            after += outer.len();
            polygons.push(outer);
            for hole in holes {
                if let Some(hole) = simplify(&hole, config.tolerance, config.min_area) {
                    after += hole.len();
                    polygons.push(hole);
                }
            }
        }
        tracing::debug!(before, after, polygons = polygons.len(), "points");
        polygons
    });
    if polygons.is_empty() {
        return Ok(None);
    }
    let mut builder = PathData::builder();
    for polygon in &polygons {
        builder.polygon(polygon.points(), true);
    }
    Ok(Some(builder.build()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, ImageOwned, RenderOptions, assert_approx_eq, render};

    const RED: RGBA = RGBA::new(255, 0, 0, 255);
    const BLUE: RGBA = RGBA::new(0, 0, 255, 255);

    fn squares(size: usize, inner: std::ops::Range<usize>) -> ImageOwned<RGBA> {
        ImageOwned::new_with(size, size, |row, col| {
            if inner.contains(&row) && inner.contains(&col) {
                BLUE
            } else {
                RED
            }
        })
    }

    fn contours(path: &VectorPath) -> Result<Vec<Scalar>, Error> {
        let data = path.parse_path_data()?;
        Ok(data
            .flatten(crate::Transform::identity(), 0.1)
            .iter()
            .map(|polyline| crate::utils::signed_area(&polyline.points))
            .collect())
    }

    #[test]
    fn test_config() {
        let config = TracerConfig::default();
        assert_eq!(config.color_count, 8);
        assert_approx_eq!(config.tolerance, 1.0);
        assert_approx_eq!(config.min_area, 4.0);

        let config = config
            .with_color_count(1)
            .with_tolerance(10.0)
            .with_min_area(-1.0);
        assert_eq!(config.color_count, 2);
        assert_approx_eq!(config.tolerance, 5.0);
        assert_approx_eq!(config.min_area, 0.0);
        assert_eq!(config.with_color_count(100).color_count, 16);
    }

    #[test]
    fn test_solid_rect() -> Result<(), Error> {
        let image = ImageOwned::new_with(6, 10, |_, _| RED);
        let config = TracerConfig::default().with_color_count(1);
        let doc = trace_image(&image, &config)?;
        assert_approx_eq!(doc.viewport().width, 10.0);
        assert_approx_eq!(doc.viewport().height, 6.0);
        assert_eq!(doc.paths().len(), 1);

        let path = &doc.paths()[0];
        assert_eq!(path.fill_color(), Some(RED));
        assert_eq!(path.fill_rule(), FillRule::NonZero);
        assert_eq!(path.path_data(), "M0,0 L10,0 L10,6 L0,6 Z");
        Ok(())
    }

    #[test]
    fn test_hole() -> Result<(), Error> {
        let image = squares(10, 3..7);
        let doc = trace_image(&image, &TracerConfig::default().with_color_count(2))?;
        // red covers more pixels and goes first
        assert_eq!(doc.paths().len(), 2);
        assert_eq!(doc.paths()[0].fill_color(), Some(RED));
        assert_eq!(doc.paths()[1].fill_color(), Some(BLUE));

        let outer = contours(&doc.paths()[0])?;
        assert_eq!(outer.len(), 2);
        assert_approx_eq!(outer[0], 100.0);
        assert_approx_eq!(outer[1], -16.0);

        let inner = contours(&doc.paths()[1])?;
        assert_eq!(inner.len(), 1);
        assert_approx_eq!(inner[0], 16.0);
        Ok(())
    }

    #[test]
    fn test_min_area() -> Result<(), Error> {
        // single blue pixel is dropped together with the hole it makes
        let image = squares(8, 4..5);
        let doc = trace_image(&image, &TracerConfig::default())?;
        assert_eq!(doc.paths().len(), 1);
        assert_eq!(contours(&doc.paths()[0])?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_transparent() -> Result<(), Error> {
        let image = ImageOwned::new_with(8, 8, |row, _| {
            if row < 4 { RED } else { RGBA::new(0, 0, 0, 0) }
        });
        let doc = trace_image(&image, &TracerConfig::default())?;
        assert_eq!(doc.paths().len(), 1);
        assert_eq!(doc.paths()[0].path_data(), "M0,0 L8,0 L8,4 L0,4 Z");

        let translucent = ImageOwned::new_with(4, 4, |_, _| RGBA::new(0, 255, 0, 128));
        let doc = trace_image(&translucent, &TracerConfig::default())?;
        let path = &doc.paths()[0];
        assert_eq!(path.fill_color(), Some(RGBA::new(0, 255, 0, 255)));
        assert_approx_eq!(path.fill_alpha(), 128.0 / 255.0, 1e-3);
        Ok(())
    }

    #[test]
    fn test_output_size() -> Result<(), Error> {
        let image = squares(10, 3..7);
        let doc = trace_image_with_size(&image, Size::new(40, 20), &TracerConfig::default())?;
        assert_approx_eq!(doc.viewport().width, 10.0);
        assert_approx_eq!(doc.output_size().width, 40.0);
        assert_approx_eq!(doc.output_size().height, 20.0);
        Ok(())
    }

    #[test]
    fn test_render_fidelity() -> Result<(), Error> {
        let image = ImageOwned::new_with(32, 32, |row, col| {
            let (x, y) = (col as Scalar - 15.5, row as Scalar - 15.5);
            if x * x + y * y < 100.0 {
                BLUE
            } else if row < 8 {
                RGBA::new(0, 200, 0, 255)
            } else {
                RED
            }
        });
        let doc = trace_image(&image, &TracerConfig::default())?;
        let rendered = render(&doc, &RenderOptions::default())?;
        assert_eq!(rendered.size(), image.size());

        let mut error = 0.0;
        for (src, dst) in image.iter().zip(rendered.iter()) {
            for (c0, c1) in src.to_rgba().into_iter().zip(dst.to_rgba()) {
                error += (c0 as Scalar - c1 as Scalar).abs();
            }
        }
        let mae = error / (image.data().len() * 4) as Scalar;
        assert!(mae < 12.0, "mean absolute error {}", mae);
        Ok(())
    }

    #[test]
    fn test_deterministic() -> Result<(), Error> {
        let image = ImageOwned::new_with(24, 24, |row, col| {
            RGBA::new((row * 10) as u8, (col * 10) as u8, ((row + col) * 5) as u8, 255)
        });
        let config = TracerConfig::default().with_color_count(6);
        let first = trace_image(&image, &config)?;
        let second = trace_image(&image, &config)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_quantize_colors() -> Result<(), Error> {
        let image = squares(10, 3..7);
        assert_eq!(quantize_colors(&image, 8)?, vec![RED, BLUE]);
        assert_eq!(quantize_colors(&image, 0)?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_empty() {
        let image = ImageOwned::<RGBA>::new_default(0, 10);
        assert!(matches!(
            trace_image(&image, &TracerConfig::default()),
            Err(Error::InvalidImage(_))
        ));
        assert!(matches!(
            quantize_colors(&image, 4),
            Err(Error::InvalidImage(_))
        ));
    }
}
