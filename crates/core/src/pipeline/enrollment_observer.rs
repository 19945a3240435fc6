use std::fmt;

use crate::camera::domain::device_error::ResponseCode;
use crate::capture::domain::capture_status::CaptureStatus;
use crate::recognition::domain::enrollment_request::FaceInfo;

/// Everything an enrollment session reports to whoever is watching it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnrollmentStatus {
    CameraStarting,
    Capture(CaptureStatus),
    Submitting { samples: usize },
    Training,
    Registered(FaceInfo),
    /// Status text of the engine's authoritative error record.
    EngineFailed(String),
    Aborted(ResponseCode),
    Incomplete { collected: usize, target: usize },
    Failed(String),
    Cancelled,
}

impl EnrollmentStatus {
    /// Whether the session ends with this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EnrollmentStatus::Registered(_)
                | EnrollmentStatus::EngineFailed(_)
                | EnrollmentStatus::Aborted(_)
                | EnrollmentStatus::Incomplete { .. }
                | EnrollmentStatus::Failed(_)
                | EnrollmentStatus::Cancelled
        )
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollmentStatus::CameraStarting => f.write_str("Starting camera"),
            EnrollmentStatus::Capture(status) => write!(f, "{status}"),
            EnrollmentStatus::Submitting { samples } => {
                write!(f, "Registering {samples} samples")
            }
            EnrollmentStatus::Training => f.write_str("Training classifier"),
            EnrollmentStatus::Registered(info) => write!(
                f,
                "Registered {} as face {}",
                info.user_name, info.face_id
            ),
            EnrollmentStatus::EngineFailed(text) => write!(f, "Registration failed: {text}"),
            EnrollmentStatus::Aborted(code) => write!(f, "{} ({code})", code.message()),
            EnrollmentStatus::Incomplete { collected, target } => {
                write!(f, "Only {collected} of {target} samples were captured")
            }
            EnrollmentStatus::Failed(message) => write!(f, "Enrollment failed: {message}"),
            EnrollmentStatus::Cancelled => f.write_str("Enrollment cancelled"),
        }
    }
}

/// Receives session progress.
///
/// Keeps the use case independent of how progress is shown: the CLI logs
/// it, the worker forwards it over a channel, tests record it.
pub trait EnrollmentObserver: Send {
    fn status(&mut self, status: &EnrollmentStatus);

    /// Free-form diagnostic message. Default: ignored.
    fn info(&mut self, _message: &str) {}
}

/// Discards everything.
pub struct NullEnrollmentObserver;

impl EnrollmentObserver for NullEnrollmentObserver {
    fn status(&mut self, _status: &EnrollmentStatus) {}
}

/// Writes progress to the `log` facade and counts rejected frames.
#[derive(Default)]
pub struct LogEnrollmentObserver {
    no_face: usize,
    multiple_faces: usize,
}

impl LogEnrollmentObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the rejected-frame summary, or `None` if nothing was rejected.
    pub fn summary_string(&self) -> Option<String> {
        if self.no_face == 0 && self.multiple_faces == 0 {
            return None;
        }
        Some(format!(
            "Rejected frames: {} without a face, {} with several faces",
            self.no_face, self.multiple_faces
        ))
    }
}

impl EnrollmentObserver for LogEnrollmentObserver {
    fn status(&mut self, status: &EnrollmentStatus) {
        match status {
            EnrollmentStatus::Capture(CaptureStatus::NoFace) => self.no_face += 1,
            EnrollmentStatus::Capture(CaptureStatus::MultipleFaces(_)) => {
                self.multiple_faces += 1
            }
            _ => {}
        }

        match status {
            EnrollmentStatus::Capture(CaptureStatus::Countdown(_)) => log::debug!("{status}"),
            EnrollmentStatus::EngineFailed(_)
            | EnrollmentStatus::Aborted(_)
            | EnrollmentStatus::Incomplete { .. }
            | EnrollmentStatus::Failed(_) => log::warn!("{status}"),
            _ => log::info!("{status}"),
        }

        if status.is_terminal() {
            if let Some(summary) = self.summary_string() {
                log::info!("{summary}");
            }
        }
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }
}
