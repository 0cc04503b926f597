//! Median-cut color quantization
use crate::{Error, Image, ImageOwned, RGBA, Shape};
use std::collections::HashMap;

/// Pixels with alpha below this value are treated as background
pub const TRANSPARENT_THRESHOLD: u8 = 16;

/// Index assigned to background (transparent) pixels in the index map
pub const TRANSPARENT_INDEX: u8 = u8::MAX;

/// Supported range of the palette size
pub const MIN_COLORS: usize = 2;
pub const MAX_COLORS: usize = 16;

/// Per-pixel palette indices, `TRANSPARENT_INDEX` marks background pixels
pub type IndexMap = ImageOwned<u8>;

/// Ordered set of representative colors
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    colors: Vec<RGBA>,
}

impl Palette {
    pub fn new(colors: Vec<RGBA>) -> Self {
        Self { colors }
    }

    pub fn colors(&self) -> &[RGBA] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: u8) -> Option<RGBA> {
        self.colors.get(index as usize).copied()
    }

    /// Index of the nearest palette color, ties resolved in favor of the smallest index
    pub fn nearest(&self, color: RGBA) -> Option<u8> {
        self.colors
            .iter()
            .enumerate()
            .min_by_key(|(index, entry)| (entry.distance_sq(color), *index))
            .map(|(index, _)| index as u8)
    }
}

/// Result of the quantization: palette and per-pixel index map of the same size as source
#[derive(Debug, Clone)]
pub struct Quantized {
    pub palette: Palette,
    pub index_map: IndexMap,
}

/// Distinct opaque color with the number of pixels it covers
#[derive(Debug, Clone, Copy)]
struct ColorCount {
    color: RGBA,
    count: usize,
}

/// Group of colors that is going to be represented by a single palette entry
#[derive(Debug, Clone)]
struct ColorBox {
    colors: Vec<ColorCount>,
}

impl ColorBox {
    fn channel(color: RGBA, channel: usize) -> u8 {
        match channel {
            0 => color.red(),
            1 => color.green(),
            _ => color.blue(),
        }
    }

    /// Channel with the widest range and the range itself
    fn widest_channel(&self) -> (usize, u8) {
        (0..3)
            .map(|channel| {
                let (min, max) = self.colors.iter().fold((u8::MAX, u8::MIN), |(lo, hi), c| {
                    let value = Self::channel(c.color, channel);
                    (lo.min(value), hi.max(value))
                });
                (channel, max.saturating_sub(min))
            })
            // prefer the first channel on ties
            .fold((0, 0), |best, item| if item.1 > best.1 { item } else { best })
    }

    /// Split box at the weighted median of the widest channel
    fn split(mut self) -> (ColorBox, ColorBox) {
        let (channel, _) = self.widest_channel();
        self.colors.sort_by_key(|c| (Self::channel(c.color, channel), c.color));
        let total: usize = self.colors.iter().map(|c| c.count).sum();
        let mut acc = 0;
        let mut at = self.colors.len() - 1;
        for (index, c) in self.colors.iter().enumerate() {
            acc += c.count;
            if 2 * acc >= total {
                at = index + 1;
                break;
            }
        }
        // both halves must be non-empty
        let at = at.clamp(1, self.colors.len() - 1);
        let rest = self.colors.split_off(at);
        (self, ColorBox { colors: rest })
    }

    /// Weighted average color of the box
    fn average(&self) -> RGBA {
        let mut sum = [0u64; 4];
        let mut total = 0u64;
        for c in self.colors.iter() {
            let count = c.count as u64;
            sum[0] += c.color.red() as u64 * count;
            sum[1] += c.color.green() as u64 * count;
            sum[2] += c.color.blue() as u64 * count;
            sum[3] += c.color.alpha() as u64 * count;
            total += count;
        }
        let total = total.max(1);
        let avg = |value: u64| ((value + total / 2) / total) as u8;
        RGBA::new(avg(sum[0]), avg(sum[1]), avg(sum[2]), avg(sum[3]))
    }

    fn count(&self) -> usize {
        self.colors.iter().map(|c| c.count).sum()
    }
}

/// Reduce image to at most `color_count` colors
///
/// Palette is ordered by the number of pixels each entry represents (largest first,
/// ties resolved by color value), so the dominant color gets index zero. Pixels with
/// alpha below `TRANSPARENT_THRESHOLD` do not participate and are marked with
/// `TRANSPARENT_INDEX`. Result is a pure function of the input.
pub fn quantize(image: &impl Image<Pixel = RGBA>, color_count: usize) -> Result<Quantized, Error> {
    let shape = image.shape();
    if shape.width == 0 || shape.height == 0 {
        return Err(Error::QuantizationFailed(format!(
            "empty image {}x{}",
            shape.width, shape.height
        )));
    }
    if color_count < MIN_COLORS {
        return Err(Error::QuantizationFailed(format!(
            "color count must be at least {}, got {}",
            MIN_COLORS, color_count
        )));
    }
    let color_count = color_count.min(MAX_COLORS);

    // histogram of opaque colors
    let mut histogram: HashMap<RGBA, usize> = HashMap::new();
    for pixel in image.iter() {
        if pixel.alpha() >= TRANSPARENT_THRESHOLD {
            *histogram.entry(*pixel).or_default() += 1;
        }
    }
    let mut colors: Vec<ColorCount> = histogram
        .into_iter()
        .map(|(color, count)| ColorCount { color, count })
        .collect();
    colors.sort_by_key(|c| c.color);

    let palette = median_cut(colors, color_count);
    tracing::debug!(colors = palette.len(), "palette");

    // assign palette indices
    let mut cache: HashMap<RGBA, u8> = HashMap::new();
    let mut data = Vec::with_capacity(shape.width * shape.height);
    for pixel in image.iter() {
        let index = if pixel.alpha() < TRANSPARENT_THRESHOLD {
            TRANSPARENT_INDEX
        } else {
            match cache.get(pixel) {
                Some(index) => *index,
                None => {
                    let index = palette.nearest(*pixel).ok_or_else(|| {
                        Error::QuantizationFailed("palette is empty".to_owned())
                    })?;
                    cache.insert(*pixel, index);
                    index
                }
            }
        };
        data.push(index);
    }
    let index_map = ImageOwned::new(Shape::new(shape.height, shape.width), data);
    Ok(Quantized { palette, index_map })
}

fn median_cut(colors: Vec<ColorCount>, color_count: usize) -> Palette {
    if colors.is_empty() {
        return Palette::default();
    }
    let mut boxes = vec![ColorBox { colors }];
    while boxes.len() < color_count {
        // split the box with the widest channel range, first one on ties
        let candidate = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.colors.len() > 1)
            .map(|(index, b)| (index, b.widest_channel().1))
            .fold(None, |best: Option<(usize, u8)>, item| match best {
                Some(best) if best.1 >= item.1 => Some(best),
                _ => Some(item),
            });
        let Some((index, _)) = candidate else {
            break;
        };
        let (b0, b1) = boxes.swap_remove(index).split();
        boxes.push(b0);
        boxes.push(b1);
    }

    let mut entries: Vec<(RGBA, usize)> = boxes.iter().map(|b| (b.average(), b.count())).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    // averages of different boxes may coincide
    let mut palette: Vec<RGBA> = Vec::with_capacity(entries.len());
    for (color, _) in entries {
        if !palette.contains(&color) {
            palette.push(color);
        }
    }
    Palette::new(palette)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PixelBuffer;

    fn stripes(colors: &[RGBA], width: usize, height: usize) -> PixelBuffer {
        PixelBuffer::new_with(height, width, |_, col| colors[col * colors.len() / width])
    }

    #[test]
    fn test_exact_colors() -> Result<(), Error> {
        let colors = [
            RGBA::new(255, 0, 0, 255),
            RGBA::new(0, 255, 0, 255),
            RGBA::new(0, 0, 255, 255),
        ];
        // red covers most of the pixels
        let img = PixelBuffer::new_with(4, 10, |_, col| match col {
            0..=5 => colors[0],
            6..=7 => colors[1],
            _ => colors[2],
        });
        let q = quantize(&img, 8)?;
        assert_eq!(q.palette.len(), 3);
        assert_eq!(q.palette.get(0), Some(colors[0]));
        for row in 0..4 {
            for col in 0..10 {
                let index = *q.index_map.get(row, col).unwrap();
                assert_eq!(q.palette.get(index), img.get(row, col).copied());
            }
        }
        Ok(())
    }

    #[test]
    fn test_palette_bound() -> Result<(), Error> {
        let img = PixelBuffer::new_with(16, 16, |row, col| {
            RGBA::new((row * 16) as u8, (col * 16) as u8, ((row + col) * 8) as u8, 255)
        });
        for count in [2, 3, 5, 8, 16, 40] {
            let q = quantize(&img, count)?;
            assert!(q.palette.len() <= count.min(MAX_COLORS));
            assert!(q.palette.len() >= 2);
            assert!(q.index_map.iter().all(|i| (*i as usize) < q.palette.len()));
            // deterministic
            let again = quantize(&img, count)?;
            assert_eq!(q.palette, again.palette);
            assert_eq!(q.index_map, again.index_map);
        }
        Ok(())
    }

    #[test]
    fn test_transparent() -> Result<(), Error> {
        let img = stripes(
            &[RGBA::new(10, 20, 30, 255), RGBA::new(200, 0, 0, 5)],
            8,
            2,
        );
        let q = quantize(&img, 4)?;
        assert_eq!(q.palette.len(), 1);
        assert_eq!(*q.index_map.get(0, 0).unwrap(), 0);
        assert_eq!(*q.index_map.get(0, 7).unwrap(), TRANSPARENT_INDEX);

        let img = stripes(&[RGBA::TRANSPARENT], 4, 4);
        let q = quantize(&img, 4)?;
        assert!(q.palette.is_empty());
        assert!(q.index_map.iter().all(|i| *i == TRANSPARENT_INDEX));
        Ok(())
    }

    #[test]
    fn test_invalid_input() {
        let img = PixelBuffer::new_default(0, 5);
        assert!(matches!(quantize(&img, 4), Err(Error::QuantizationFailed(_))));
        let img = stripes(&[RGBA::BLACK], 4, 4);
        assert!(matches!(quantize(&img, 1), Err(Error::QuantizationFailed(_))));
    }
}
