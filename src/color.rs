use crate::Scalar;
use std::{
    fmt,
    ops::{Add, Mul},
    str::FromStr,
};

/// Common interface to all color representations
pub trait Color: Copy {
    /// Blend other color on top of this color
    fn blend_over(self, other: Self) -> Self;

    /// Multiply alpha component of the color
    fn with_alpha(self, alpha: Scalar) -> Self;

    /// Convert color to sRGBA list
    fn to_rgba(self) -> [u8; 4];

    /// Convert color to sRGB list (alpha is discarded)
    fn to_rgb(self) -> [u8; 3] {
        let [r, g, b, _] = self.to_rgba();
        [r, g, b]
    }
}

/// ABGR color packed as u32 value (most of the platforms are little-endian)
///
/// Memory layout is identical to `[r, g, b, a]` bytes on little-endian targets,
/// which is what pixel buffers are exchanged in.
#[repr(transparent)]
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, bytemuck::Pod, bytemuck::Zeroable,
)]
pub struct RGBA(u32);

impl RGBA {
    pub const TRANSPARENT: RGBA = RGBA::new(0, 0, 0, 0);
    pub const BLACK: RGBA = RGBA::new(0, 0, 0, 255);
    pub const WHITE: RGBA = RGBA::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((a as u32) << 24) | ((b as u32) << 16) | ((g as u32) << 8) | (r as u32))
    }

    pub const fn from_bytes([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }

    pub const fn alpha(self) -> u8 {
        ((self.0 >> 24) & 0xff) as u8
    }

    pub const fn blue(self) -> u8 {
        ((self.0 >> 16) & 0xff) as u8
    }

    pub const fn green(self) -> u8 {
        ((self.0 >> 8) & 0xff) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    /// Replace alpha channel
    pub const fn with_alpha_u8(self, alpha: u8) -> Self {
        Self::new(self.red(), self.green(), self.blue(), alpha)
    }

    /// Alpha channel as a value in `0.0..=1.0`
    pub fn alpha_scalar(self) -> Scalar {
        self.alpha() as Scalar / 255.0
    }

    /// Parse Android color literal `#RGB`, `#ARGB`, `#RRGGBB` or `#AARRGGBB`
    pub fn from_argb_hex(color: &str) -> Result<Self, ColorError> {
        let error = || ColorError::HexExpected(color.to_owned());
        let hex = color.trim().strip_prefix('#').ok_or_else(error)?;
        let digits = hex
            .bytes()
            .map(hex_digit)
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(error)?;
        let [a, r, g, b] = match digits.as_slice() {
            [r, g, b] => [255, r * 17, g * 17, b * 17],
            [a, r, g, b] => [a * 17, r * 17, g * 17, b * 17],
            [r1, r0, g1, g0, b1, b0] => [255, r1 << 4 | r0, g1 << 4 | g0, b1 << 4 | b0],
            [a1, a0, r1, r0, g1, g0, b1, b0] => {
                [a1 << 4 | a0, r1 << 4 | r0, g1 << 4 | g0, b1 << 4 | b0]
            }
            _ => return Err(error()),
        };
        Ok(RGBA::new(r, g, b, a))
    }

    /// Format as Android color literal, `#RRGGBB` for opaque and `#AARRGGBB` otherwise
    pub fn to_argb_hex(self) -> String {
        let [r, g, b, a] = self.to_rgba();
        if a == 255 {
            format!("#{:02X}{:02X}{:02X}", r, g, b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", a, r, g, b)
        }
    }

    /// Format color as `#rrggbb` ignoring alpha channel
    pub fn to_rgb_hex(self) -> String {
        let [r, g, b] = self.to_rgb();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    /// Parse SVG paint, `none` and `transparent` produce `None`
    pub fn from_svg_paint(paint: &str) -> Result<Option<Self>, ColorError> {
        let paint = paint.trim();
        if paint.eq_ignore_ascii_case("none") || paint.eq_ignore_ascii_case("transparent") {
            return Ok(None);
        }
        paint.parse().map(Some)
    }

    /// Squared euclidean distance in RGB space, alpha is ignored
    pub fn distance_sq(self, other: Self) -> u32 {
        let dr = self.red() as i32 - other.red() as i32;
        let dg = self.green() as i32 - other.green() as i32;
        let db = self.blue() as i32 - other.blue() as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'0'..=b'9' => Some(byte - b'0'),
        _ => None,
    }
}

impl Color for RGBA {
    fn to_rgba(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    fn blend_over(self, other: Self) -> Self {
        LinColor::from(self)
            .blend_over(LinColor::from(other))
            .into()
    }

    fn with_alpha(self, alpha: Scalar) -> Self {
        let alpha = (self.alpha() as Scalar * alpha.clamp(0.0, 1.0)).round() as u8;
        self.with_alpha_u8(alpha)
    }
}

impl From<LinColor> for RGBA {
    fn from(lin: LinColor) -> Self {
        let [r, g, b, a]: [f32; 4] = lin.into();
        if a <= f32::EPSILON {
            return RGBA::default();
        }
        let a = a.min(1.0);
        let r = (linear_to_srgb((r / a).clamp(0.0, 1.0)) * 255.0 + 0.5) as u8;
        let g = (linear_to_srgb((g / a).clamp(0.0, 1.0)) * 255.0 + 0.5) as u8;
        let b = (linear_to_srgb((b / a).clamp(0.0, 1.0)) * 255.0 + 0.5) as u8;
        let a = (a * 255.0 + 0.5) as u8;
        RGBA::new(r, g, b, a)
    }
}

impl fmt::Debug for RGBA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGBA({})", self)
    }
}

impl fmt::Display for RGBA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_rgba();
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)?;
        if a != 255 {
            write!(f, "{:02x}", a)?;
        }
        Ok(())
    }
}

impl FromStr for RGBA {
    type Err = ColorError;

    /// Parse CSS style color: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)`
    /// or one of the basic named colors.
    fn from_str(color: &str) -> Result<Self, Self::Err> {
        let color = color.trim();
        if let Some(hex) = color.strip_prefix('#') {
            let digits = hex
                .bytes()
                .map(hex_digit)
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(|| ColorError::HexExpected(color.to_owned()))?;
            return match digits.as_slice() {
                [r, g, b] => Ok(RGBA::new(r * 17, g * 17, b * 17, 255)),
                [r1, r0, g1, g0, b1, b0] => Ok(RGBA::new(r1 << 4 | r0, g1 << 4 | g0, b1 << 4 | b0, 255)),
                [r1, r0, g1, g0, b1, b0, a1, a0] => Ok(RGBA::new(
                    r1 << 4 | r0,
                    g1 << 4 | g0,
                    b1 << 4 | b0,
                    a1 << 4 | a0,
                )),
                _ => Err(ColorError::HexExpected(color.to_owned())),
            };
        }
        let lower = color.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_rgb_func(args).ok_or_else(|| ColorError::Unknown(color.to_owned()));
        }
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, color)| *color)
            .ok_or_else(|| ColorError::Unknown(color.to_owned()))
    }
}

/// Arguments of the `rgb(r, g, b)` or `rgba(r, g, b, a)` functional notation
fn parse_rgb_func(args: &str) -> Option<RGBA> {
    let args: Vec<&str> = args
        .split([',', ' ', '/'])
        .filter(|arg| !arg.is_empty())
        .collect();
    let channel = |arg: &str| -> Option<u8> {
        let value = match arg.strip_suffix('%') {
            Some(percent) => percent.parse::<Scalar>().ok()? * 2.55,
            None => arg.parse::<Scalar>().ok()?,
        };
        Some(value.round().clamp(0.0, 255.0) as u8)
    };
    let (r, g, b) = match args.as_slice() {
        [r, g, b] | [r, g, b, _] => (channel(r)?, channel(g)?, channel(b)?),
        _ => return None,
    };
    let a = match args.get(3) {
        None => 255,
        Some(arg) => {
            let alpha = match arg.strip_suffix('%') {
                Some(percent) => percent.parse::<Scalar>().ok()? / 100.0,
                None => arg.parse::<Scalar>().ok()?,
            };
            (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
        }
    };
    Some(RGBA::new(r, g, b, a))
}

const NAMED_COLORS: &[(&str, RGBA)] = &[
    ("black", RGBA::new(0, 0, 0, 255)),
    ("white", RGBA::new(255, 255, 255, 255)),
    ("red", RGBA::new(255, 0, 0, 255)),
    ("lime", RGBA::new(0, 255, 0, 255)),
    ("green", RGBA::new(0, 128, 0, 255)),
    ("blue", RGBA::new(0, 0, 255, 255)),
    ("yellow", RGBA::new(255, 255, 0, 255)),
    ("cyan", RGBA::new(0, 255, 255, 255)),
    ("aqua", RGBA::new(0, 255, 255, 255)),
    ("magenta", RGBA::new(255, 0, 255, 255)),
    ("fuchsia", RGBA::new(255, 0, 255, 255)),
    ("gray", RGBA::new(128, 128, 128, 255)),
    ("grey", RGBA::new(128, 128, 128, 255)),
    ("silver", RGBA::new(192, 192, 192, 255)),
    ("maroon", RGBA::new(128, 0, 0, 255)),
    ("olive", RGBA::new(128, 128, 0, 255)),
    ("navy", RGBA::new(0, 0, 128, 255)),
    ("purple", RGBA::new(128, 0, 128, 255)),
    ("teal", RGBA::new(0, 128, 128, 255)),
    ("orange", RGBA::new(255, 165, 0, 255)),
    ("transparent", RGBA::new(0, 0, 0, 0)),
];

#[cfg(feature = "serde")]
impl serde::Serialize for RGBA {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RGBA {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let color = std::borrow::Cow::<'de, str>::deserialize(deserializer)?;
        RGBA::from_str(color.as_ref()).map_err(serde::de::Error::custom)
    }
}

/// Alpha premultiplied RGBA color in the linear color space (no gamma correction)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinColor([f32; 4]);

impl LinColor {
    #[inline(always)]
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        LinColor([r, g, b, a])
    }

    #[inline(always)]
    pub fn red(self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn green(self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn blue(self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn alpha(self) -> f32 {
        self.0[3]
    }
}

impl Color for LinColor {
    #[inline(always)]
    fn to_rgba(self) -> [u8; 4] {
        RGBA::from(self).to_rgba()
    }

    #[inline(always)]
    fn blend_over(self, other: Self) -> Self {
        other + self * (1.0 - other.alpha())
    }

    #[inline(always)]
    fn with_alpha(self, alpha: Scalar) -> Self {
        self * (alpha as f32)
    }
}

impl Add<Self> for LinColor {
    type Output = Self;

    #[inline(always)]
    fn add(self, other: Self) -> Self::Output {
        let Self([r0, g0, b0, a0]) = self;
        let Self([r1, g1, b1, a1]) = other;
        Self([r0 + r1, g0 + g1, b0 + b1, a0 + a1])
    }
}

impl Mul<f32> for LinColor {
    type Output = Self;

    #[inline(always)]
    fn mul(self, scale: f32) -> Self::Output {
        let Self([r, g, b, a]) = self;
        Self([r * scale, g * scale, b * scale, a * scale])
    }
}

impl From<RGBA> for LinColor {
    fn from(color: RGBA) -> Self {
        let a = color.alpha() as f32 / 255.0;
        let r = srgb_to_linear(color.red() as f32 / 255.0) * a;
        let g = srgb_to_linear(color.green() as f32 / 255.0) * a;
        let b = srgb_to_linear(color.blue() as f32 / 255.0) * a;
        LinColor::new(r, g, b, a)
    }
}

impl From<LinColor> for [f32; 4] {
    fn from(color: LinColor) -> Self {
        color.0
    }
}

impl fmt::Display for LinColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        RGBA::from(*self).fmt(f)
    }
}

/// Convert Linear RGB color component into a SRGB color component.
#[inline]
pub fn linear_to_srgb(value: f32) -> f32 {
    if value <= 0.0031308 {
        value * 12.92
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

#[inline]
pub fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    HexExpected(String),
    Unknown(String),
}

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorError::HexExpected(color) => {
                write!(f, "color expected to be in hexadecimal format: {:?}", color)
            }
            ColorError::Unknown(color) => write!(f, "unrecognized color: {:?}", color),
        }
    }
}

impl std::error::Error for ColorError {}
