use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// One accepted capture: the full frame and the single face found in it.
#[derive(Clone, Debug)]
pub struct FaceSample {
    pub frame: Frame,
    pub face: FaceBox,
}

impl FaceSample {
    pub fn new(frame: Frame, face: FaceBox) -> Self {
        Self { frame, face }
    }
}
