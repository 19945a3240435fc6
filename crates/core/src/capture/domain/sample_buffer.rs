use crate::recognition::domain::enrollment_request::EnrollmentRequest;
use crate::recognition::domain::error_record::EngineFailure;
use crate::shared::face_sample::FaceSample;

/// Accepted samples in capture order, bounded by the target count.
#[derive(Debug)]
pub struct SampleBuffer {
    target: usize,
    samples: Vec<FaceSample>,
}

impl SampleBuffer {
    pub fn new(target: usize) -> Self {
        Self {
            target,
            samples: Vec::with_capacity(target),
        }
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.target
    }

    pub fn samples(&self) -> &[FaceSample] {
        &self.samples
    }

    /// Appends a sample and returns its slot, or hands it back when full.
    pub fn push(&mut self, sample: FaceSample) -> Result<usize, FaceSample> {
        if self.is_full() {
            return Err(sample);
        }
        self.samples.push(sample);
        Ok(self.samples.len() - 1)
    }

    /// Consumes the buffer into an enrollment request.
    pub fn into_request(self, user_name: &str) -> Result<EnrollmentRequest, EngineFailure> {
        EnrollmentRequest::new(user_name, self.samples)
    }
}
