use ndarray::{ArrayView3, ArrayViewMut3};

/// Pixel layout of a [`Frame`]'s byte buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Blue, green, red, straight alpha. The interchange format for
    /// everything captured from a camera.
    Bgra8,
    Rgb8,
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgra8 => 4,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// A single captured frame: contiguous pixel bytes in row-major order.
///
/// Camera adapters convert to [`PixelFormat::Bgra8`] at the device boundary;
/// the rest of the crate only converts when a consumer needs another layout
/// (the detector wants luma, thumbnails want RGBA).
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * format.bytes_per_pixel(),
            "data length must equal width * height * bytes per pixel"
        );
        Self {
            data,
            width,
            height,
            format,
            index,
        }
    }

    /// Builds a BGRA8 frame from an RGBA image decoded by the `image` crate.
    pub fn from_rgba_image(image: &image::RgbaImage, index: usize) -> Self {
        let mut data = image.as_raw().clone();
        for px in data.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
        Self::new(data, image.width(), image.height(), PixelFormat::Bgra8, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn channels(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        let shape = self.shape();
        ArrayViewMut3::from_shape(shape, &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Returns the frame in the BGRA8 interchange format, opaque alpha for
    /// sources without an alpha channel.
    pub fn to_bgra8(&self) -> Frame {
        let data = match self.format {
            PixelFormat::Bgra8 => self.data.clone(),
            PixelFormat::Rgb8 => self
                .data
                .chunks_exact(3)
                .flat_map(|p| [p[2], p[1], p[0], 255])
                .collect(),
            PixelFormat::Gray8 => self.data.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        };
        Frame::new(data, self.width, self.height, PixelFormat::Bgra8, self.index)
    }

    /// Luma plane using BT.601 integer weights.
    pub fn to_gray8(&self) -> Frame {
        let data = match self.format {
            PixelFormat::Gray8 => self.data.clone(),
            PixelFormat::Bgra8 => self
                .data
                .chunks_exact(4)
                .map(|p| luma(p[2], p[1], p[0]))
                .collect(),
            PixelFormat::Rgb8 => self
                .data
                .chunks_exact(3)
                .map(|p| luma(p[0], p[1], p[2]))
                .collect(),
        };
        Frame::new(data, self.width, self.height, PixelFormat::Gray8, self.index)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels(),
        )
    }
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32) >> 8) as u8
}
