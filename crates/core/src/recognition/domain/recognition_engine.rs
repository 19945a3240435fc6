use crate::recognition::domain::engine_config::EngineConfiguration;
use crate::recognition::domain::enrollment_request::{EnrollmentRequest, FaceInfo};
use crate::recognition::domain::error_record::{EngineFailure, ErrorRecord};

/// Sink for the free-form diagnostic lines an engine emits while it works.
pub type EngineLogger = Box<dyn Fn(&str) + Send>;

/// Brings an engine up from a configuration.
///
/// The configuration is only borrowed for the call; an engine keeps its own
/// copy and never observes later changes.
pub trait EngineFactory: Send + Sync {
    fn initialize(
        &self,
        config: &EngineConfiguration,
    ) -> Result<Box<dyn RecognitionEngine>, EngineFailure>;
}

/// An initialized face-recognition engine.
///
/// Callers go through [`EngineSession`](crate::recognition::engine_session::EngineSession),
/// which enforces call ordering and guarantees `terminate`.
pub trait RecognitionEngine: Send {
    /// Installs the sink for diagnostic lines. Default: the engine has none
    /// to offer and drops the logger.
    fn set_logger(&mut self, _logger: EngineLogger) {}

    /// Registers the samples of one person (the engine's `CreateFace`).
    fn create_face(&mut self, request: &EnrollmentRequest) -> Result<FaceInfo, EngineFailure>;

    /// Retrains the classifier over every registered face.
    fn train(&mut self) -> Result<(), EngineFailure>;

    /// Releases engine resources. Returns any records produced on the way
    /// down; an empty list means success.
    fn terminate(&mut self) -> Vec<ErrorRecord>;
}
