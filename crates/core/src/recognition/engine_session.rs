use crate::recognition::domain::engine_config::EngineConfiguration;
use crate::recognition::domain::enrollment_request::{EnrollmentRequest, FaceInfo};
use crate::recognition::domain::error_record::{EngineFailure, ErrorCode, ErrorRecord};
use crate::recognition::domain::recognition_engine::{
    EngineFactory, EngineLogger, RecognitionEngine,
};

/// Owned handle to an initialized engine for the length of one enrollment.
///
/// `train` is refused unless the most recent `enroll` succeeded, and
/// `terminate` runs exactly once: through [`close`](Self::close), or on drop
/// when the session is abandoned on an error path.
pub struct EngineSession {
    engine: Option<Box<dyn RecognitionEngine>>,
    enrolled: bool,
}

impl EngineSession {
    /// Initializes the engine with its diagnostic lines routed to the `log`
    /// facade at debug level.
    pub fn initialize(
        factory: &dyn EngineFactory,
        config: &EngineConfiguration,
    ) -> Result<Self, EngineFailure> {
        Self::initialize_with_logger(
            factory,
            config,
            Box::new(|message: &str| log::debug!("Engine: {message}")),
        )
    }

    pub fn initialize_with_logger(
        factory: &dyn EngineFactory,
        config: &EngineConfiguration,
        logger: EngineLogger,
    ) -> Result<Self, EngineFailure> {
        let mut engine = factory.initialize(config)?;
        engine.set_logger(logger);
        log::info!("Recognition engine initialized");
        Ok(Self {
            engine: Some(engine),
            enrolled: false,
        })
    }

    pub fn enroll(&mut self, request: &EnrollmentRequest) -> Result<FaceInfo, EngineFailure> {
        let engine = self.engine_mut("enroll")?;
        let result = engine.create_face(request);
        self.enrolled = result.is_ok();
        if let Ok(info) = &result {
            log::info!(
                "Enrolled {} as face {} from {} samples",
                info.user_name,
                info.face_id,
                info.sample_count
            );
        }
        result
    }

    pub fn train(&mut self) -> Result<(), EngineFailure> {
        if !self.enrolled {
            return Err(state_failure("train", "train requires a successful enroll"));
        }
        self.engine_mut("train")?.train()
    }

    pub fn is_open(&self) -> bool {
        self.engine.is_some()
    }

    /// Terminates the engine and returns whatever it reported on the way down.
    pub fn close(mut self) -> Vec<ErrorRecord> {
        self.shutdown()
    }

    fn engine_mut(
        &mut self,
        function: &str,
    ) -> Result<&mut Box<dyn RecognitionEngine>, EngineFailure> {
        self.engine
            .as_mut()
            .ok_or_else(|| state_failure(function, "engine is not initialized"))
    }

    fn shutdown(&mut self) -> Vec<ErrorRecord> {
        let Some(mut engine) = self.engine.take() else {
            return Vec::new();
        };
        let records = engine.terminate();
        for record in &records {
            log::warn!("Engine terminate reported {record}");
        }
        records
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn state_failure(function: &str, message: &str) -> EngineFailure {
    EngineFailure::from_record(ErrorRecord::new(
        ErrorCode::InvalidState,
        "EngineSession",
        function,
        message,
    ))
}
