//! Vector document model
//!
//! Document exclusively owns its tree of groups and paths. Children are appended by
//! value, so a node can only have one parent and moving it to another parent requires
//! taking it out of the current one first.
use crate::{Error, FillRule, PathData, RGBA, Scalar, Size, Transform, TransformParams};

/// Size in document units
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extent {
    pub width: Scalar,
    pub height: Scalar,
}

impl Extent {
    pub const fn new(width: Scalar, height: Scalar) -> Self {
        Self { width, height }
    }

    /// Both dimensions are finite and positive
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl From<Size> for Extent {
    fn from(size: Size) -> Self {
        Self::new(size.width as Scalar, size.height as Scalar)
    }
}

/// Styled path
///
/// Path is visible only if it has fill or stroke color, a path with neither is
/// legal and renders nothing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VectorPath {
    name: Option<String>,
    path_data: String,
    fill_color: Option<RGBA>,
    stroke_color: Option<RGBA>,
    stroke_width: Scalar,
    fill_alpha: Scalar,
    stroke_alpha: Scalar,
    fill_rule: FillRule,
}

impl VectorPath {
    /// Create unstyled path from path data string
    ///
    /// Path data is not validated here, use [`VectorPath::parse_path_data`] or one
    /// of the codecs which validate it on import.
    pub fn new(path_data: impl Into<String>) -> Self {
        Self {
            name: None,
            path_data: path_data.into(),
            fill_color: None,
            stroke_color: None,
            stroke_width: 0.0,
            fill_alpha: 1.0,
            stroke_alpha: 1.0,
            fill_rule: FillRule::default(),
        }
    }

    pub fn from_path(path: &PathData) -> Self {
        Self::new(path.to_string())
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    pub fn with_fill(self, color: RGBA) -> Self {
        Self {
            fill_color: Some(color),
            ..self
        }
    }

    pub fn with_stroke(self, color: RGBA, width: Scalar) -> Self {
        Self {
            stroke_color: Some(color),
            stroke_width: sanitize_width(width),
            ..self
        }
    }

    pub fn with_stroke_width(self, width: Scalar) -> Self {
        Self {
            stroke_width: sanitize_width(width),
            ..self
        }
    }

    /// Fill alpha, clamped to `[0, 1]`
    pub fn with_fill_alpha(self, alpha: Scalar) -> Self {
        Self {
            fill_alpha: sanitize_alpha(alpha),
            ..self
        }
    }

    /// Stroke alpha, clamped to `[0, 1]`
    pub fn with_stroke_alpha(self, alpha: Scalar) -> Self {
        Self {
            stroke_alpha: sanitize_alpha(alpha),
            ..self
        }
    }

    pub fn with_fill_rule(self, fill_rule: FillRule) -> Self {
        Self { fill_rule, ..self }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn path_data(&self) -> &str {
        &self.path_data
    }

    pub fn fill_color(&self) -> Option<RGBA> {
        self.fill_color
    }

    pub fn stroke_color(&self) -> Option<RGBA> {
        self.stroke_color
    }

    pub fn stroke_width(&self) -> Scalar {
        self.stroke_width
    }

    pub fn fill_alpha(&self) -> Scalar {
        self.fill_alpha
    }

    pub fn stroke_alpha(&self) -> Scalar {
        self.stroke_alpha
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    /// Whether path produces any pixels when rendered
    pub fn is_visible(&self) -> bool {
        self.fill_color.is_some() || (self.stroke_color.is_some() && self.stroke_width > 0.0)
    }

    /// Parse path data, error mentions path name if it is available
    pub fn parse_path_data(&self) -> Result<PathData, Error> {
        self.path_data.parse().map_err(|error| {
            let context = match &self.name {
                Some(name) => format!("path '{}'", name),
                None => "path".to_owned(),
            };
            Error::path_data(context, error)
        })
    }
}

fn sanitize_alpha(alpha: Scalar) -> Scalar {
    if alpha.is_nan() {
        1.0
    } else {
        alpha.clamp(0.0, 1.0)
    }
}

fn sanitize_width(width: Scalar) -> Scalar {
    if width.is_finite() { width.max(0.0) } else { 0.0 }
}

/// Group of paths and nested groups sharing a transformation
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VectorGroup {
    name: Option<String>,
    params: TransformParams,
    paths: Vec<VectorPath>,
    groups: Vec<VectorGroup>,
}

impl VectorGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    pub fn with_params(self, params: TransformParams) -> Self {
        Self { params, ..self }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn params(&self) -> &TransformParams {
        &self.params
    }

    /// Transformation from group local coordinates to parent coordinates
    pub fn transform(&self) -> Transform {
        self.params.to_transform()
    }

    pub fn paths(&self) -> &[VectorPath] {
        &self.paths
    }

    pub fn groups(&self) -> &[VectorGroup] {
        &self.groups
    }

    pub fn push_path(&mut self, path: VectorPath) -> &mut Self {
        self.paths.push(path);
        self
    }

    pub fn push_group(&mut self, group: VectorGroup) -> &mut Self {
        self.groups.push(group);
        self
    }

    /// Detach path at `index` so it can be appended elsewhere
    pub fn take_path(&mut self, index: usize) -> Option<VectorPath> {
        (index < self.paths.len()).then(|| self.paths.remove(index))
    }

    /// Detach child group at `index` together with its subtree
    pub fn take_group(&mut self, index: usize) -> Option<VectorGroup> {
        (index < self.groups.len()).then(|| self.groups.remove(index))
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a VectorPath>) {
        out.extend(self.paths.iter());
        for group in self.groups.iter() {
            group.collect_paths(out);
        }
    }
}

/// Format agnostic vector document
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    viewport: Extent,
    output_size: Extent,
    tint: Option<RGBA>,
    alpha: Scalar,
    paths: Vec<VectorPath>,
    groups: Vec<VectorGroup>,
}

impl Document {
    /// Create empty document
    ///
    /// `viewport` is the authoring coordinate space and `output_size` is the size
    /// document is rendered at by default.
    pub fn new(viewport: Extent, output_size: Extent) -> Result<Self, Error> {
        if !viewport.is_valid() {
            return Err(Error::InvalidDocument(format!(
                "viewport must be positive: {}x{}",
                viewport.width, viewport.height
            )));
        }
        if !output_size.is_valid() {
            return Err(Error::InvalidDocument(format!(
                "output size must be positive: {}x{}",
                output_size.width, output_size.height
            )));
        }
        Ok(Self {
            viewport,
            output_size,
            tint: None,
            alpha: 1.0,
            paths: Vec::new(),
            groups: Vec::new(),
        })
    }

    pub fn with_tint(self, tint: Option<RGBA>) -> Self {
        Self { tint, ..self }
    }

    /// Global alpha, clamped to `[0, 1]`
    pub fn with_alpha(self, alpha: Scalar) -> Self {
        Self {
            alpha: sanitize_alpha(alpha),
            ..self
        }
    }

    pub fn viewport(&self) -> Extent {
        self.viewport
    }

    pub fn output_size(&self) -> Extent {
        self.output_size
    }

    pub fn tint(&self) -> Option<RGBA> {
        self.tint
    }

    pub fn alpha(&self) -> Scalar {
        self.alpha
    }

    /// Apply document tint to a path color
    ///
    /// Tint replaces color channels and its alpha multiplies alpha of the color.
    pub fn resolve_color(&self, color: RGBA) -> RGBA {
        match self.tint {
            None => color,
            Some(tint) => {
                let alpha = (color.alpha() as u32 * tint.alpha() as u32 + 127) / 255;
                tint.with_alpha_u8(alpha as u8)
            }
        }
    }

    pub fn paths(&self) -> &[VectorPath] {
        &self.paths
    }

    pub fn groups(&self) -> &[VectorGroup] {
        &self.groups
    }

    pub fn push_path(&mut self, path: VectorPath) -> &mut Self {
        self.paths.push(path);
        self
    }

    pub fn push_group(&mut self, group: VectorGroup) -> &mut Self {
        self.groups.push(group);
        self
    }

    pub fn take_path(&mut self, index: usize) -> Option<VectorPath> {
        (index < self.paths.len()).then(|| self.paths.remove(index))
    }

    pub fn take_group(&mut self, index: usize) -> Option<VectorGroup> {
        (index < self.groups.len()).then(|| self.groups.remove(index))
    }

    /// All paths of the document in pre-order
    ///
    /// Top-level paths go first, then every group contributes its own paths
    /// followed by paths of its child groups.
    pub fn all_paths(&self) -> Vec<&VectorPath> {
        let mut out = Vec::new();
        out.extend(self.paths.iter());
        for group in self.groups.iter() {
            group.collect_paths(&mut out);
        }
        out
    }

    /// Serialize document as JSON
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize document from JSON produced by [`Document::to_json`]
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let doc: Document = serde_json::from_str(json)?;
        // re-run validation performed by the constructor
        Document::new(doc.viewport, doc.output_size)?;
        let alpha = doc.alpha;
        Ok(doc.with_alpha(alpha))
    }
}
