//! Images and pixel buffers
use crate::{Error, RGBA, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    /// Width of the image
    pub width: usize,
    /// Height of the image
    pub height: usize,
    /// How many elements we need to skip to get to the next row.
    pub row_stride: usize,
    /// How many elements we need to skip to get to the next column.
    pub col_stride: usize,
}

impl Shape {
    /// Shape of a densely packed row-major image
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            width,
            height,
            row_stride: width,
            col_stride: 1,
        }
    }

    #[inline]
    pub fn offset(&self, row: usize, col: usize) -> usize {
        row * self.row_stride + col * self.col_stride
    }

    #[inline]
    pub fn nth(&self, n: usize) -> Option<(usize, usize)> {
        if self.width == 0 {
            return None;
        }
        let row = n / self.width;
        let col = n - row * self.width;
        (row < self.height).then_some((row, col))
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }
}

pub trait Image {
    type Pixel;

    fn data(&self) -> &[Self::Pixel];

    fn shape(&self) -> Shape;

    fn width(&self) -> usize {
        self.shape().width
    }

    fn height(&self) -> usize {
        self.shape().height
    }

    fn size(&self) -> Size {
        self.shape().size()
    }

    fn get(&self, row: usize, col: usize) -> Option<&Self::Pixel> {
        let shape = self.shape();
        if row >= shape.height || col >= shape.width {
            return None;
        }
        self.data().get(shape.offset(row, col))
    }

    /// Iterate over pixels in row-major order
    fn iter(&self) -> ImageIter<'_, Self::Pixel> {
        ImageIter {
            index: 0,
            shape: self.shape(),
            data: self.data(),
        }
    }
}

pub struct ImageIter<'a, P> {
    index: usize,
    shape: Shape,
    data: &'a [P],
}

impl<'a, P> Iterator for ImageIter<'a, P> {
    type Item = &'a P;

    fn next(&mut self) -> Option<Self::Item> {
        let (row, col) = self.shape.nth(self.index)?;
        self.index += 1;
        self.data.get(self.shape.offset(row, col))
    }
}

pub trait ImageMut: Image {
    fn data_mut(&mut self) -> &mut [Self::Pixel];

    fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Self::Pixel> {
        let shape = self.shape();
        if row >= shape.height || col >= shape.width {
            return None;
        }
        self.data_mut().get_mut(shape.offset(row, col))
    }

    fn fill(&mut self, value: Self::Pixel)
    where
        Self::Pixel: Copy,
    {
        let shape = self.shape();
        let data = self.data_mut();
        for row in 0..shape.height {
            for col in 0..shape.width {
                data[shape.offset(row, col)] = value;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageOwned<P> {
    shape: Shape,
    data: Vec<P>,
}

impl<P> ImageOwned<P> {
    pub fn new(shape: Shape, data: Vec<P>) -> Self {
        Self { shape, data }
    }

    pub fn new_default(height: usize, width: usize) -> Self
    where
        P: Default,
    {
        Self::new_with(height, width, |_, _| Default::default())
    }

    pub fn new_with<F>(height: usize, width: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> P,
    {
        let mut data = Vec::with_capacity(height * width);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col))
            }
        }
        Self {
            shape: Shape::new(height, width),
            data,
        }
    }

    pub fn to_vec(self) -> Vec<P> {
        self.data
    }
}

impl<P> Image for ImageOwned<P> {
    type Pixel = P;

    fn shape(&self) -> Shape {
        self.shape
    }

    fn data(&self) -> &[Self::Pixel] {
        &self.data
    }
}

impl<P> ImageMut for ImageOwned<P> {
    fn data_mut(&mut self) -> &mut [Self::Pixel] {
        &mut self.data
    }
}

impl<'a, I> Image for &'a I
where
    I: Image + ?Sized,
{
    type Pixel = I::Pixel;

    fn shape(&self) -> Shape {
        (*self).shape()
    }

    fn data(&self) -> &[Self::Pixel] {
        (*self).data()
    }
}

/// Densely packed sRGB image with straight (not premultiplied) alpha
pub type PixelBuffer = ImageOwned<RGBA>;

impl ImageOwned<RGBA> {
    /// Create pixel buffer from RGBA8 bytes in row-major order
    pub fn from_rgba8(width: usize, height: usize, bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != width * height * 4 {
            return Err(Error::InvalidImage(format!(
                "expected {} bytes for {}x{} image, got {}",
                width * height * 4,
                width,
                height,
                bytes.len()
            )));
        }
        let data = bytes
            .chunks_exact(4)
            .map(|px| RGBA::new(px[0], px[1], px[2], px[3]))
            .collect();
        Ok(Self::new(Shape::new(height, width), data))
    }

    /// Raw RGBA8 bytes in row-major order (pixels are stored as `[r, g, b, a]` on
    /// little-endian targets)
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.data())
    }

    /// Write image in PNG format
    #[cfg(feature = "png")]
    pub fn write_png<W: std::io::Write>(&self, w: W) -> Result<(), Error> {
        let dimension = |value: usize| {
            u32::try_from(value)
                .map_err(|_| Error::Png(format!("image dimension {} does not fit into u32", value)))
        };
        let (width, height) = (dimension(self.width())?, dimension(self.height())?);
        let mut encoder = png::Encoder::new(w, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        let bytes: Vec<u8> = self.iter().flat_map(|px| crate::Color::to_rgba(*px)).collect();
        writer.write_image_data(&bytes)?;
        writer.finish()?;
        Ok(())
    }

    /// Read PNG image, any color type and bit depth is converted to RGBA8
    #[cfg(feature = "png")]
    pub fn read_png<R: std::io::Read>(r: R) -> Result<Self, Error> {
        let mut decoder = png::Decoder::new(r);
        decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let mut reader = decoder.read_info()?;
        let mut buf = vec![0u8; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf)?;
        let bytes = &buf[..info.buffer_size()];
        let (width, height) = (info.width as usize, info.height as usize);
        let data: Vec<RGBA> = match info.color_type {
            png::ColorType::Rgba => bytes
                .chunks_exact(4)
                .map(|px| RGBA::new(px[0], px[1], px[2], px[3]))
                .collect(),
            png::ColorType::Rgb => bytes
                .chunks_exact(3)
                .map(|px| RGBA::new(px[0], px[1], px[2], 255))
                .collect(),
            png::ColorType::GrayscaleAlpha => bytes
                .chunks_exact(2)
                .map(|px| RGBA::new(px[0], px[0], px[0], px[1]))
                .collect(),
            png::ColorType::Grayscale => bytes
                .iter()
                .map(|px| RGBA::new(*px, *px, *px, 255))
                .collect(),
            png::ColorType::Indexed => {
                return Err(Error::InvalidImage("unexpanded indexed png".to_owned()));
            }
        };
        if data.len() != width * height {
            return Err(Error::InvalidImage("truncated png data".to_owned()));
        }
        Ok(Self::new(Shape::new(height, width), data))
    }
}
