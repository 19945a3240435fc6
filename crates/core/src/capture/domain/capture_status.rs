use std::fmt;

/// Where a capture session stands between user actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Countdown(u8),
    CaptureWindow,
    /// At least one sample accepted, more needed.
    Accumulating,
    ReadyToSubmit,
}

/// Progress reported to the user during a capture action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureStatus {
    Countdown(u8),
    NoFace,
    MultipleFaces(usize),
    Accepted {
        slot: usize,
        collected: usize,
        target: usize,
    },
    Complete {
        collected: usize,
    },
}

impl CaptureStatus {
    pub fn is_accepted(&self) -> bool {
        matches!(self, CaptureStatus::Accepted { .. })
    }
}

impl fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureStatus::Countdown(n) => write!(f, "{n}"),
            CaptureStatus::NoFace => f.write_str("No face detected, please face the camera"),
            CaptureStatus::MultipleFaces(n) => {
                write!(f, "{n} faces detected, only one person may be in view")
            }
            CaptureStatus::Accepted {
                collected, target, ..
            } => write!(f, "Captured {collected} of {target}"),
            CaptureStatus::Complete { collected } => {
                write!(f, "All {collected} samples captured")
            }
        }
    }
}
