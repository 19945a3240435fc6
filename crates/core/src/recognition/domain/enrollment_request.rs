use serde::{Deserialize, Serialize};

use crate::recognition::domain::error_record::{EngineFailure, ErrorCode, ErrorRecord};
use crate::shared::face_sample::FaceSample;
use crate::shared::frame::Frame;

/// Everything the engine needs to register one person: a display name, the
/// accepted samples in capture order, and a copy of the first frame as the
/// representative image.
#[derive(Clone, Debug)]
pub struct EnrollmentRequest {
    user_name: String,
    samples: Vec<FaceSample>,
    representative: Frame,
}

impl EnrollmentRequest {
    pub fn new(user_name: impl Into<String>, samples: Vec<FaceSample>) -> Result<Self, EngineFailure> {
        let user_name = user_name.into().trim().to_string();
        if user_name.is_empty() {
            return Err(invalid("user name must not be empty"));
        }
        let representative = samples
            .first()
            .map(|s| s.frame.clone())
            .ok_or_else(|| invalid("at least one face sample is required"))?;
        Ok(Self {
            user_name,
            samples,
            representative,
        })
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn samples(&self) -> &[FaceSample] {
        &self.samples
    }

    pub fn representative(&self) -> &Frame {
        &self.representative
    }
}

fn invalid(message: &str) -> EngineFailure {
    EngineFailure::from_record(ErrorRecord::new(
        ErrorCode::InvalidArgument,
        "EnrollmentRequest",
        "new",
        message,
    ))
}

/// What the engine reports back for a registered face.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceInfo {
    pub face_id: u32,
    pub user_name: String,
    pub sample_count: usize,
}
