use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

const MIN_FACE_SIZE: u32 = 40;
const SCORE_THRESHOLD: f64 = 2.0;
const PYRAMID_SCALE_FACTOR: f32 = 0.8;
const WINDOW_STEP: u32 = 4;

/// Frontal face detector backed by the SeetaFace cascade in `rustface`.
///
/// The model is loaded once; a fresh detector is built per frame because
/// `rustface` detectors are not `Send`.
pub struct RustfaceDetector {
    model: rustface::Model,
    min_face_size: u32,
}

impl RustfaceDetector {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let file = File::open(model_path)
            .map_err(|e| format!("Failed to open detector model {}: {e}", model_path.display()))?;
        let model = rustface::read_model(BufReader::new(file))?;
        log::info!("Loaded face detector model from {}", model_path.display());
        Ok(Self {
            model,
            min_face_size: MIN_FACE_SIZE,
        })
    }

    pub fn with_min_face_size(mut self, size: u32) -> Self {
        self.min_face_size = size;
        self
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        let gray = frame.to_gray8();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(SCORE_THRESHOLD);
        detector.set_pyramid_scale_factor(PYRAMID_SCALE_FACTOR);
        detector.set_slide_window_step(WINDOW_STEP, WINDOW_STEP);

        let image = rustface::ImageData::new(gray.data(), gray.width(), gray.height());
        let faces = detector
            .detect(&image)
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBox::from_xywh(bbox.x(), bbox.y(), bbox.width() as i32, bbox.height() as i32)
                    .clamp_to(frame.width(), frame.height())
            })
            .filter(|b| !b.is_empty())
            .collect();
        Ok(faces)
    }
}
