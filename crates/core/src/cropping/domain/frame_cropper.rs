use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgba};
use ndarray::s;
use thiserror::Error;

use crate::shared::face_box::FaceBox;
use crate::shared::frame::{Frame, PixelFormat};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CropError {
    #[error("crop region is empty")]
    Empty,
    #[error("invalid scale factor {0}")]
    InvalidScale(f64),
    #[error(
        "crop {crop_width}x{crop_height} does not fit in scaled image {scaled_width}x{scaled_height}"
    )]
    TooLarge {
        crop_width: u32,
        crop_height: u32,
        scaled_width: u32,
        scaled_height: u32,
    },
}

/// Cuts the face rectangle out of `frame` as BGRA8 pixels.
///
/// The result is exactly `face.width() × face.height()`; a box hanging over
/// the frame edge is shifted back inside rather than truncated.
pub fn crop(frame: &Frame, face: &FaceBox) -> Result<Frame, CropError> {
    if face.is_empty() {
        return Err(CropError::Empty);
    }
    crop_scaled(
        frame,
        (face.left.max(0) as u32, face.top.max(0) as u32),
        (face.width() as u32, face.height() as u32),
        1.0,
    )
}

/// Scales the whole frame by `scale`, then extracts the region at `start`
/// of `size`, both given in unscaled coordinates.
///
/// Scaled dimensions, the start offset and the crop size are all
/// `floor(value × scale)`. The start offset is pulled back when
/// `start + size` would run past the scaled image, so the region always
/// fits; a crop larger than the scaled image is an error. A NaN or infinite
/// scale means no scaling. Alpha is copied straight and no reorientation is
/// applied.
pub fn crop_scaled(
    frame: &Frame,
    start: (u32, u32),
    size: (u32, u32),
    scale: f64,
) -> Result<Frame, CropError> {
    let scale = if scale.is_finite() { scale } else { 1.0 };
    if scale <= 0.0 {
        return Err(CropError::InvalidScale(scale));
    }
    let scaled = |value: u32| (value as f64 * scale).floor() as u32;

    let (crop_width, crop_height) = (scaled(size.0), scaled(size.1));
    if crop_width == 0 || crop_height == 0 {
        return Err(CropError::Empty);
    }

    let (scaled_width, scaled_height) = (scaled(frame.width()), scaled(frame.height()));
    if crop_width > scaled_width || crop_height > scaled_height {
        return Err(CropError::TooLarge {
            crop_width,
            crop_height,
            scaled_width,
            scaled_height,
        });
    }

    let x = clamp_start(scaled(start.0), crop_width, scaled_width);
    let y = clamp_start(scaled(start.1), crop_height, scaled_height);

    let source: Cow<'_, Frame> = match frame.format() {
        PixelFormat::Bgra8 => Cow::Borrowed(frame),
        _ => Cow::Owned(frame.to_bgra8()),
    };

    if scaled_width == frame.width() && scaled_height == frame.height() {
        return Ok(copy_region(&source, x, y, crop_width, crop_height));
    }

    // Channel order does not matter to the resampler, so BGRA rides in an
    // RGBA buffer unchanged.
    let buffer: ImageBuffer<Rgba<u8>, &[u8]> =
        ImageBuffer::from_raw(source.width(), source.height(), source.data())
            .ok_or(CropError::Empty)?;
    let resized = imageops::resize(&buffer, scaled_width, scaled_height, FilterType::Triangle);
    let cropped = imageops::crop_imm(&resized, x, y, crop_width, crop_height).to_image();

    Ok(Frame::new(
        cropped.into_raw(),
        crop_width,
        crop_height,
        PixelFormat::Bgra8,
        frame.index(),
    ))
}

fn clamp_start(start: u32, size: u32, bound: u32) -> u32 {
    if start.saturating_add(size) > bound {
        bound - size
    } else {
        start
    }
}

fn copy_region(frame: &Frame, x: u32, y: u32, width: u32, height: u32) -> Frame {
    let (x, y) = (x as usize, y as usize);
    let (w, h) = (width as usize, height as usize);
    let view = frame.as_ndarray();
    let data: Vec<u8> = view.slice(s![y..y + h, x..x + w, ..]).iter().copied().collect();
    Frame::new(data, width, height, PixelFormat::Bgra8, frame.index())
}
