use std::sync::Arc;

use crate::camera::domain::device_error::ResponseCode;
use crate::camera::session_manager::CameraSessionManager;
use crate::capture::capture_flow::{CaptureError, CaptureFlowController};
use crate::pipeline::enrollment_observer::{EnrollmentObserver, EnrollmentStatus};
use crate::recognition::domain::engine_config::EngineConfiguration;
use crate::recognition::domain::enrollment_request::FaceInfo;
use crate::recognition::domain::error_record::EngineFailure;
use crate::recognition::domain::recognition_engine::EngineFactory;
use crate::recognition::engine_session::EngineSession;
use crate::shared::cancel_token::CancelToken;

/// How an enrollment session ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    Registered(FaceInfo),
    EngineFailed(EngineFailure),
    /// A camera failure; carries the code for the error view.
    Aborted(ResponseCode),
    Incomplete { collected: usize, target: usize },
    Failed(String),
    Cancelled,
}

impl EnrollmentOutcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, EnrollmentOutcome::Registered(_))
    }

    /// The terminal status reported for this outcome.
    pub fn status(&self) -> EnrollmentStatus {
        match self {
            EnrollmentOutcome::Registered(info) => EnrollmentStatus::Registered(info.clone()),
            EnrollmentOutcome::EngineFailed(failure) => {
                EnrollmentStatus::EngineFailed(failure.status_text())
            }
            EnrollmentOutcome::Aborted(code) => EnrollmentStatus::Aborted(*code),
            EnrollmentOutcome::Incomplete { collected, target } => EnrollmentStatus::Incomplete {
                collected: *collected,
                target: *target,
            },
            EnrollmentOutcome::Failed(message) => EnrollmentStatus::Failed(message.clone()),
            EnrollmentOutcome::Cancelled => EnrollmentStatus::Cancelled,
        }
    }
}

impl From<CaptureError> for EnrollmentOutcome {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::Device(e) => EnrollmentOutcome::Aborted(e.response_code()),
            CaptureError::Cancelled => EnrollmentOutcome::Cancelled,
            other => EnrollmentOutcome::Failed(other.to_string()),
        }
    }
}

/// One enrollment session: camera → capture → engine.
///
/// The camera is released before the engine is touched. Once the engine has
/// initialized, it is terminated on every exit path, and `train` only runs
/// after a successful enroll.
pub struct EnrollFaceUseCase {
    camera: Arc<CameraSessionManager>,
    capture: CaptureFlowController,
    engine_factory: Box<dyn EngineFactory>,
    engine_config: EngineConfiguration,
    observers: Vec<Box<dyn EnrollmentObserver>>,
    cancel: CancelToken,
}

impl EnrollFaceUseCase {
    /// `cancel` must be the token `capture` was built with.
    pub fn new(
        camera: Arc<CameraSessionManager>,
        capture: CaptureFlowController,
        engine_factory: Box<dyn EngineFactory>,
        engine_config: EngineConfiguration,
        cancel: CancelToken,
    ) -> Self {
        Self {
            camera,
            capture,
            engine_factory,
            engine_config,
            observers: Vec::new(),
            cancel,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn EnrollmentObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn camera(&self) -> &Arc<CameraSessionManager> {
        &self.camera
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Runs the session to completion and reports its terminal status.
    pub fn execute(&mut self, user_name: &str) -> EnrollmentOutcome {
        let outcome = self.run(user_name);
        self.release_camera();
        notify(&mut self.observers, &outcome.status());
        outcome
    }

    fn run(&mut self, user_name: &str) -> EnrollmentOutcome {
        if self.cancel.is_cancelled() {
            return EnrollmentOutcome::Cancelled;
        }

        notify(&mut self.observers, &EnrollmentStatus::CameraStarting);
        if let Err(e) = self.camera.set_active(true) {
            log::warn!("Camera setup failed: {e}");
            return EnrollmentOutcome::Aborted(e.response_code());
        }

        let observers = &mut self.observers;
        let collected = match self
            .capture
            .capture_until_complete(&mut |s| {
                notify(observers.as_mut_slice(), &EnrollmentStatus::Capture(s.clone()))
            })
        {
            Ok(collected) => collected,
            Err(e) => return e.into(),
        };
        let target = self.capture.target();
        if collected < target {
            return EnrollmentOutcome::Incomplete { collected, target };
        }

        self.release_camera();
        if self.cancel.is_cancelled() {
            return EnrollmentOutcome::Cancelled;
        }

        let request = match self.capture.take_request(user_name) {
            Ok(request) => request,
            Err(failure) => return EnrollmentOutcome::EngineFailed(failure),
        };

        notify(
            &mut self.observers,
            &EnrollmentStatus::Submitting {
                samples: request.samples().len(),
            },
        );
        let mut session = match EngineSession::initialize(
            self.engine_factory.as_ref(),
            &self.engine_config,
        ) {
            Ok(session) => session,
            Err(failure) => return EnrollmentOutcome::EngineFailed(failure),
        };

        let outcome = match session.enroll(&request) {
            Ok(info) => {
                notify(&mut self.observers, &EnrollmentStatus::Training);
                match session.train() {
                    Ok(()) => EnrollmentOutcome::Registered(info),
                    Err(failure) => EnrollmentOutcome::EngineFailed(failure),
                }
            }
            Err(failure) => EnrollmentOutcome::EngineFailed(failure),
        };

        for record in session.close() {
            for observer in self.observers.iter_mut() {
                observer.info(&format!("Engine shutdown: {record}"));
            }
        }
        outcome
    }

    fn release_camera(&self) {
        if let Err(e) = self.camera.set_active(false) {
            log::warn!("Camera release failed: {e}");
        }
    }
}

fn notify(observers: &mut [Box<dyn EnrollmentObserver>], status: &EnrollmentStatus) {
    for observer in observers.iter_mut() {
        observer.status(status);
    }
}
