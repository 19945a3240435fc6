use std::path::Path;

use crate::shared::frame::Frame;

/// Persists a cropped face so a front end can show it in a thumbnail slot.
pub trait ThumbnailWriter: Send {
    /// Writes `frame` to `path`, resizing to `size` when given.
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<(u32, u32)>,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
