use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::camera::session_manager::CameraSessionManager;
use crate::pipeline::enroll_face_use_case::{EnrollFaceUseCase, EnrollmentOutcome};
use crate::pipeline::enrollment_observer::{EnrollmentObserver, EnrollmentStatus};
use crate::shared::cancel_token::CancelToken;

pub enum EnrollmentMessage {
    Status(EnrollmentStatus),
    Finished(EnrollmentOutcome),
}

/// Forwards statuses to the owner of an [`EnrollmentTask`].
struct ChannelObserver {
    tx: Sender<EnrollmentMessage>,
}

impl EnrollmentObserver for ChannelObserver {
    fn status(&mut self, status: &EnrollmentStatus) {
        let _ = self.tx.send(EnrollmentMessage::Status(status.clone()));
    }
}

/// Handle to an enrollment session running on its own thread.
///
/// Dropping the handle does not stop the session; call [`cancel`](Self::cancel)
/// and then [`wait`](Self::wait) to end it deterministically.
pub struct EnrollmentTask {
    messages: Receiver<EnrollmentMessage>,
    cancel: CancelToken,
    camera: Arc<CameraSessionManager>,
    handle: JoinHandle<EnrollmentOutcome>,
}

impl EnrollmentTask {
    pub fn messages(&self) -> &Receiver<EnrollmentMessage> {
        &self.messages
    }

    /// Stops the session at its next checkpoint and releases the camera
    /// before returning.
    pub fn cancel(&self) {
        self.cancel.cancel();
        if let Err(e) = self.camera.set_active(false) {
            log::warn!("Camera release on cancel failed: {e}");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the session ends and returns its outcome.
    pub fn wait(self) -> EnrollmentOutcome {
        self.handle.join().unwrap_or_else(|_| {
            log::error!("Enrollment worker panicked");
            EnrollmentOutcome::Failed("enrollment worker panicked".into())
        })
    }
}

/// Runs `use_case` for `user_name` on a new thread.
pub fn spawn(use_case: EnrollFaceUseCase, user_name: impl Into<String>) -> EnrollmentTask {
    let (tx, rx) = crossbeam_channel::unbounded::<EnrollmentMessage>();
    let cancel = use_case.cancel_token().clone();
    let camera = use_case.camera().clone();
    let user_name = user_name.into();

    let mut use_case = use_case.with_observer(Box::new(ChannelObserver { tx: tx.clone() }));
    let handle = thread::spawn(move || {
        let outcome = use_case.execute(&user_name);
        let _ = tx.send(EnrollmentMessage::Finished(outcome.clone()));
        outcome
    });

    EnrollmentTask {
        messages: rx,
        cancel,
        camera,
        handle,
    }
}
