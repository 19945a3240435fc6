use std::path::Path;

use crate::cropping::domain::thumbnail_writer::ThumbnailWriter;
use crate::shared::frame::Frame;

/// Writes BGRA crops to disk as RGBA images using the `image` crate.
///
/// The output format follows the path extension; PNG keeps the alpha
/// channel intact.
pub struct PngThumbnailWriter;

impl PngThumbnailWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PngThumbnailWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ThumbnailWriter for PngThumbnailWriter {
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<(u32, u32)>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut rgba = frame.to_bgra8().into_data();
        for px in rgba.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
        let img = image::RgbaImage::from_raw(frame.width(), frame.height(), rgba)
            .ok_or("Failed to create image from frame data")?;

        let img = match size {
            Some((w, h)) if (w, h) != img.dimensions() => {
                image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle)
            }
            _ => img,
        };

        img.save(path)?;
        log::debug!("Wrote thumbnail {}", path.display());
        Ok(())
    }
}
