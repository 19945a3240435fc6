use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Domain interface for face detection on a single captured frame.
///
/// Implementations may keep scratch state between calls, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>>;
}
