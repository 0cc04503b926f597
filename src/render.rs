//! Rasterizing renderer of vector documents
use crate::{
    BBox, Color, Curve, DEFAULT_FLATNESS, Document, Error, FillRule, Image, ImageMut, ImageOwned,
    LinColor, Line, PI, PathData, PixelBuffer, Point, Polyline, RGBA, Scalar, Shape, Size,
    Transform, VectorGroup, VectorPath, rasterize::rasterize_lines, utils::signed_area,
};

/// Largest number of pixels a single render may allocate
pub const MAX_RENDER_PIXELS: usize = 1 << 28;

/// Rendering parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Target size in pixels before scaling, document output size is used if not set
    pub size: Option<Size>,
    /// Device scale factor applied to the target size
    pub scale: Scalar,
    /// Color used to fill the canvas before rendering
    pub background: Option<RGBA>,
    /// Curve flattening tolerance in pixels
    pub flatness: Scalar,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            size: None,
            scale: 1.0,
            background: None,
            flatness: DEFAULT_FLATNESS,
        }
    }
}

impl RenderOptions {
    /// Pixel size of the rendered image
    pub fn pixel_size(&self, doc: &Document) -> Result<Size, Error> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(Error::RenderingFailed(format!(
                "invalid scale factor {}",
                self.scale
            )));
        }
        let (width, height) = match self.size {
            Some(size) => (size.width as Scalar, size.height as Scalar),
            None => (doc.output_size().width, doc.output_size().height),
        };
        let (width, height) = ((width * self.scale).round(), (height * self.scale).round());
        let limit = MAX_RENDER_PIXELS as Scalar;
        if !(width.is_finite() && height.is_finite()) || width > limit || height > limit {
            return Err(Error::RenderingFailed(format!(
                "invalid target size {}x{}",
                width, height
            )));
        }
        let size = Size::new(width.max(0.0) as usize, height.max(0.0) as usize);
        if size.is_empty() {
            return Err(Error::RenderingFailed(format!(
                "empty target size {}x{}",
                size.width, size.height
            )));
        }
        let pixels = size
            .width
            .checked_mul(size.height)
            .filter(|pixels| pixels.checked_mul(4).is_some() && *pixels <= MAX_RENDER_PIXELS);
        if pixels.is_none() {
            return Err(Error::RenderingFailed(format!(
                "target size {}x{} is too large",
                size.width, size.height
            )));
        }
        Ok(size)
    }
}

/// Render document into a pixel buffer
///
/// Document is walked in painter's order (paths of a group before its child groups)
/// with group transforms composed from parent to child. Fill is painted before
/// stroke. Document tint replaces path colors and its alpha, document alpha and path
/// alpha multiply each other.
pub fn render(doc: &Document, options: &RenderOptions) -> Result<PixelBuffer, Error> {
    let size = options.pixel_size(doc)?;
    let viewport = doc.viewport();
    if !viewport.is_valid() {
        return Err(Error::RenderingFailed(format!(
            "invalid viewport {}x{}",
            viewport.width, viewport.height
        )));
    }
    tracing::debug_span!("[render]", width = size.width, height = size.height).in_scope(|| {
        let background = options.background.map_or_else(LinColor::default, LinColor::from);
        let mut canvas = Canvas {
            doc,
            image: ImageOwned::new_with(size.height, size.width, |_, _| background),
            flatness: options.flatness.max(1e-3),
        };
        let tr = Transform::new_scale(
            size.width as Scalar / viewport.width,
            size.height as Scalar / viewport.height,
        );
        canvas.draw_paths(doc.paths(), tr)?;
        canvas.draw_groups(doc.groups(), tr)?;
        let data = canvas.image.iter().map(|color| RGBA::from(*color)).collect();
        Ok(PixelBuffer::new(Shape::new(size.height, size.width), data))
    })
}

/// Render document and encode result as PNG
#[cfg(feature = "png")]
pub fn render_png(doc: &Document, size: Option<Size>, scale: Scalar) -> Result<Vec<u8>, Error> {
    let options = RenderOptions {
        size,
        scale,
        ..RenderOptions::default()
    };
    let image = render(doc, &options)?;
    let mut output = Vec::new();
    image.write_png(&mut output)?;
    Ok(output)
}

struct Canvas<'a> {
    doc: &'a Document,
    image: ImageOwned<LinColor>,
    flatness: Scalar,
}

impl Canvas<'_> {
    fn draw_groups(&mut self, groups: &[VectorGroup], tr: Transform) -> Result<(), Error> {
        for group in groups {
            let tr = tr * group.transform();
            self.draw_paths(group.paths(), tr)?;
            self.draw_groups(group.groups(), tr)?;
        }
        Ok(())
    }

    fn draw_paths(&mut self, paths: &[VectorPath], tr: Transform) -> Result<(), Error> {
        for path in paths {
            if !path.is_visible() {
                continue;
            }
            let data = path.parse_path_data()?;
            self.draw_path(path, &data, tr);
        }
        Ok(())
    }

    fn draw_path(&mut self, path: &VectorPath, data: &PathData, tr: Transform) {
        let polylines = data.flatten(tr, self.flatness);
        let alpha = self.doc.alpha();
        if let Some(fill) = path.fill_color() {
            let color = LinColor::from(self.doc.resolve_color(fill))
                .with_alpha(path.fill_alpha() * alpha);
            let lines: Vec<Line> = polylines
                .iter()
                .flat_map(|polyline| {
                    // open contours are filled as if they were closed
                    Polyline {
                        points: polyline.points.clone(),
                        closed: true,
                    }
                    .lines()
                    .collect::<Vec<_>>()
                })
                .collect();
            self.fill(&lines, path.fill_rule(), color);
        }
        if let Some(stroke) = path.stroke_color() {
            let width = path.stroke_width() * tr.det().abs().sqrt();
            if width > 0.0 {
                let color = LinColor::from(self.doc.resolve_color(stroke))
                    .with_alpha(path.stroke_alpha() * alpha);
                let lines = stroke_outline(&polylines, width, self.flatness);
                self.fill(&lines, FillRule::NonZero, color);
            }
        }
    }

    /// Fill area enclosed by lines, only bounding box of the lines is rasterized
    fn fill(&mut self, lines: &[Line], fill_rule: FillRule, color: LinColor) {
        if color.alpha() <= 0.0 {
            return;
        }
        let mut points = lines.iter().flat_map(|line| line.points());
        let Some(first) = points.next() else {
            return;
        };
        let bbox = points.fold(BBox::new(first, first), |bbox, point| bbox.extend(point));
        let (width, height) = (self.image.width(), self.image.height());
        let canvas_box = BBox::new((0.0, 0.0), (width as Scalar, height as Scalar));
        let Some(bbox) = bbox.intersect(canvas_box) else {
            return;
        };
        let x0 = bbox.x().floor().max(0.0) as usize;
        let y0 = bbox.y().floor().max(0.0) as usize;
        let x1 = (bbox.max().x().ceil() as usize).min(width);
        let y1 = (bbox.max().y().ceil() as usize).min(height);
        if x1 <= x0 || y1 <= y0 {
            return;
        }
        let offset = Transform::new_translate(-(x0 as Scalar), -(y0 as Scalar));
        let mask = rasterize_lines(
            lines.iter().map(|line| line.transform(offset)),
            Size::new(x1 - x0, y1 - y0),
            fill_rule,
        );
        for row in 0..mask.height() {
            for col in 0..mask.width() {
                let coverage = mask.get(row, col).copied().unwrap_or(0.0);
                if coverage <= 0.0 {
                    continue;
                }
                if let Some(dst) = self.image.get_mut(y0 + row, x0 + col) {
                    *dst = dst.blend_over(color.with_alpha(coverage));
                }
            }
        }
    }
}

/// Outline of the stroke as a set of positively oriented polygons
///
/// Every segment is expanded into a rectangle and every vertex into a regular
/// polygon approximating a circle, which gives round joins and caps once the
/// union is filled with non-zero rule.
fn stroke_outline(polylines: &[Polyline], width: Scalar, flatness: Scalar) -> Vec<Line> {
    let radius = width / 2.0;
    // sides of the polygon such that it deviates from the circle by at most flatness
    let sides = if radius > flatness {
        (PI / (1.0 - flatness / radius).acos()).ceil().clamp(8.0, 128.0) as usize
    } else {
        8
    };
    let mut lines = Vec::new();
    let mut push_polygon = |mut polygon: Vec<Point>| {
        if signed_area(&polygon) < 0.0 {
            polygon.reverse();
        }
        let Some(last) = polygon.last().copied() else {
            return;
        };
        let mut prev = last;
        for point in polygon {
            lines.push(Line::new(prev, point));
            prev = point;
        }
    };
    for polyline in polylines {
        for segment in polyline.lines() {
            let Line([p0, p1]) = segment;
            let Some(normal) = (p1 - p0).normal().normalize() else {
                continue;
            };
            let offset = radius * normal;
            push_polygon(vec![p0 + offset, p1 + offset, p1 - offset, p0 - offset]);
        }
        for point in polyline.points.iter() {
            let polygon = (0..sides)
                .map(|index| {
                    let angle = 2.0 * PI * index as Scalar / sides as Scalar;
                    *point + radius * Point::new(angle.cos(), angle.sin())
                })
                .collect();
            push_polygon(polygon);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Extent, TransformParams, assert_approx_eq};

    fn document(size: Scalar) -> Result<Document, Error> {
        Document::new(Extent::new(size, size), Extent::new(size, size))
    }

    fn alpha_sum(image: &PixelBuffer) -> Scalar {
        image.iter().map(|px| px.alpha_scalar()).sum()
    }

    #[test]
    fn test_fill() -> Result<(), Error> {
        let mut doc = document(10.0)?;
        doc.push_path(VectorPath::new("M2,2 H8 V8 H2 Z").with_fill(RGBA::new(255, 0, 0, 255)));
        let image = render(&doc, &RenderOptions::default())?;
        assert_eq!(image.size(), Size::new(10, 10));
        assert_eq!(image.get(5, 5), Some(&RGBA::new(255, 0, 0, 255)));
        assert_eq!(image.get(0, 0), Some(&RGBA::TRANSPARENT));
        assert_eq!(image.get(1, 5), Some(&RGBA::TRANSPARENT));
        assert_eq!(image.get(7, 7), Some(&RGBA::new(255, 0, 0, 255)));
        assert_approx_eq!(alpha_sum(&image), 36.0, 1e-6);

        // background and device scale
        let options = RenderOptions {
            scale: 2.0,
            background: Some(RGBA::WHITE),
            ..Default::default()
        };
        let image = render(&doc, &options)?;
        assert_eq!(image.size(), Size::new(20, 20));
        assert_eq!(image.get(0, 0), Some(&RGBA::WHITE));
        assert_eq!(image.get(10, 10), Some(&RGBA::new(255, 0, 0, 255)));
        Ok(())
    }

    #[test]
    fn test_fill_rule() -> Result<(), Error> {
        let data = "M0,0 H10 V10 H0 Z M2,2 H8 V8 H2 Z";
        let mut doc = document(10.0)?;
        doc.push_path(VectorPath::new(data).with_fill(RGBA::BLACK));
        let image = render(&doc, &RenderOptions::default())?;
        assert_approx_eq!(alpha_sum(&image), 100.0, 1e-6);

        let mut doc = document(10.0)?;
        doc.push_path(
            VectorPath::new(data)
                .with_fill(RGBA::BLACK)
                .with_fill_rule(FillRule::EvenOdd),
        );
        let image = render(&doc, &RenderOptions::default())?;
        assert_approx_eq!(alpha_sum(&image), 64.0, 1e-6);
        assert_eq!(image.get(5, 5), Some(&RGBA::TRANSPARENT));
        Ok(())
    }

    #[test]
    fn test_group_transform() -> Result<(), Error> {
        let mut doc = document(10.0)?;
        let mut group = VectorGroup::new().with_params(TransformParams {
            translate: Point::new(5.0, 0.0),
            scale: Point::new(2.0, 2.0),
            ..Default::default()
        });
        group.push_path(VectorPath::new("M0,0 H2 V2 H0 Z").with_fill(RGBA::BLACK));
        doc.push_group(group);
        let image = render(&doc, &RenderOptions::default())?;
        assert_approx_eq!(alpha_sum(&image), 16.0, 1e-6);
        assert_eq!(image.get(1, 6), Some(&RGBA::BLACK));
        assert_eq!(image.get(1, 4), Some(&RGBA::TRANSPARENT));

        // output size differs from the viewport
        let options = RenderOptions {
            size: Some(Size::new(20, 20)),
            ..Default::default()
        };
        let image = render(&doc, &options)?;
        assert_approx_eq!(alpha_sum(&image), 64.0, 1e-6);
        Ok(())
    }

    #[test]
    fn test_tint_and_alpha() -> Result<(), Error> {
        let mut doc = document(4.0)?
            .with_tint(Some(RGBA::new(0, 0, 255, 255)))
            .with_alpha(0.5);
        doc.push_path(
            VectorPath::new("M0,0 H4 V4 H0 Z")
                .with_fill(RGBA::new(255, 0, 0, 255))
                .with_fill_alpha(0.5),
        );
        let image = render(&doc, &RenderOptions::default())?;
        let px = *image.get(2, 2).unwrap();
        assert_eq!([px.red(), px.green(), px.blue()], [0, 0, 255]);
        assert!((px.alpha() as i32 - 64).abs() <= 1);
        Ok(())
    }

    #[test]
    fn test_stroke() -> Result<(), Error> {
        let mut doc = document(20.0)?;
        doc.push_path(VectorPath::new("M5,10 H15").with_stroke(RGBA::BLACK, 2.0));
        let image = render(&doc, &RenderOptions::default())?;
        assert_eq!(image.get(9, 10), Some(&RGBA::BLACK));
        assert_eq!(image.get(10, 10), Some(&RGBA::BLACK));
        assert_eq!(image.get(12, 10), Some(&RGBA::TRANSPARENT));
        // body of the stroke plus round caps
        let expected = 20.0 + PI;
        assert!((alpha_sum(&image) - expected).abs() < 0.5);

        // stroke width follows the transformation
        let options = RenderOptions {
            scale: 2.0,
            ..Default::default()
        };
        let image = render(&doc, &options)?;
        assert!((alpha_sum(&image) - 4.0 * expected).abs() < 2.0);
        Ok(())
    }

    #[test]
    fn test_errors() -> Result<(), Error> {
        let mut doc = document(10.0)?;
        let options = RenderOptions {
            size: Some(Size::new(0, 10)),
            ..Default::default()
        };
        assert!(matches!(render(&doc, &options), Err(Error::RenderingFailed(_))));
        let options = RenderOptions {
            scale: 0.0,
            ..Default::default()
        };
        assert!(matches!(render(&doc, &options), Err(Error::RenderingFailed(_))));

        // huge but valid documents are rejected instead of allocated
        let huge = crate::parse_svg(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="1e10" height="1e10" viewBox="0 0 1 1"/>"#,
        )?;
        assert!(matches!(
            render(&huge, &RenderOptions::default()),
            Err(Error::RenderingFailed(_))
        ));
        let options = RenderOptions {
            size: Some(Size::new(usize::MAX / 2, 3)),
            ..Default::default()
        };
        assert!(matches!(render(&doc, &options), Err(Error::RenderingFailed(_))));
        let options = RenderOptions {
            size: Some(Size::new(1 << 15, 1 << 14)),
            ..Default::default()
        };
        assert!(matches!(render(&doc, &options), Err(Error::RenderingFailed(_))));

        doc.push_path(VectorPath::new("M0,0 L").with_fill(RGBA::BLACK));
        assert!(matches!(
            render(&doc, &RenderOptions::default()),
            Err(Error::InvalidPathData { .. })
        ));
        Ok(())
    }

    #[cfg(feature = "png")]
    #[test]
    fn test_render_png() -> Result<(), Error> {
        let mut doc = document(8.0)?;
        doc.push_path(VectorPath::new("M0,0 H8 V8 Z").with_fill(RGBA::BLACK));
        let png = render_png(&doc, None, 1.0)?;
        let image = PixelBuffer::read_png(std::io::Cursor::new(png))?;
        assert_eq!(image.size(), Size::new(8, 8));
        assert_eq!(image.get(0, 7), Some(&RGBA::BLACK));
        Ok(())
    }
}
