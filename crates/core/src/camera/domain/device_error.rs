use std::fmt;

use thiserror::Error;

/// `E_ACCESSDENIED`: the user or policy blocked camera access.
pub const STATUS_ACCESS_DENIED: u32 = 0x8007_0005;
/// `MF_E_HW_MFT_FAILED_START_STREAMING`: another process holds the camera.
pub const STATUS_DEVICE_IN_USE: u32 = 0xC00D_3704;
/// `MF_E_VIDEO_RECORDING_DEVICE_INVALIDATED`: the device went away.
pub const STATUS_DEVICE_INVALIDATED: u32 = 0xC00D_ABE4;
/// `MF_E_VIDEO_RECORDING_DEVICE_PREEMPTED`: a higher-priority capture took over.
pub const STATUS_DEVICE_PREEMPTED: u32 = 0xC00D_ABE5;

/// Raw failure as reported by the capture platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlatformFault {
    /// Numeric status code (HRESULT-style).
    Status(u32),
    /// The platform raised an access-denied exception without a code.
    AccessDenied,
    Other(String),
}

impl fmt::Display for PlatformFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformFault::Status(code) => write!(f, "status 0x{code:08X}"),
            PlatformFault::AccessDenied => write!(f, "access denied"),
            PlatformFault::Other(message) => write!(f, "{message}"),
        }
    }
}

/// Closed classification of camera failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceErrorKind {
    NoError,
    /// Generic hardware or driver failure.
    DeviceError,
    DeviceAccessError,
    /// The device is held exclusively by another process.
    DeviceNotPossess,
    DevicePreempted,
}

impl DeviceErrorKind {
    pub fn classify(fault: &PlatformFault) -> Self {
        match fault {
            PlatformFault::Status(0) => DeviceErrorKind::NoError,
            PlatformFault::Status(STATUS_ACCESS_DENIED) | PlatformFault::AccessDenied => {
                DeviceErrorKind::DeviceAccessError
            }
            PlatformFault::Status(STATUS_DEVICE_IN_USE) => DeviceErrorKind::DeviceNotPossess,
            PlatformFault::Status(STATUS_DEVICE_PREEMPTED) => DeviceErrorKind::DevicePreempted,
            PlatformFault::Status(_) | PlatformFault::Other(_) => DeviceErrorKind::DeviceError,
        }
    }

    /// User-facing code for this failure; `None` for [`DeviceErrorKind::NoError`].
    pub fn response_code(self) -> Option<ResponseCode> {
        match self {
            DeviceErrorKind::NoError => None,
            DeviceErrorKind::DeviceError => Some(ResponseCode::CameraFailure),
            DeviceErrorKind::DeviceAccessError => Some(ResponseCode::CameraAccessDenied),
            DeviceErrorKind::DeviceNotPossess => Some(ResponseCode::CameraInUse),
            DeviceErrorKind::DevicePreempted => Some(ResponseCode::CameraPreempted),
        }
    }
}

/// Identifier carried to the error view when a session aborts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    NoCameraDetected,
    CameraFailure,
    CameraAccessDenied,
    CameraInUse,
    CameraPreempted,
}

impl ResponseCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseCode::NoCameraDetected => "MY_PICTURES_PHOTOGRAPHY_FAILURE_NOCAMERA",
            ResponseCode::CameraFailure => "MY_PICTURES_PHOTOGRAPHY_FAILURE_CAMERA_DEVICE",
            ResponseCode::CameraAccessDenied => "MY_PICTURES_PHOTOGRAPHY_FAILURE_CAMERA_ACCESS",
            ResponseCode::CameraInUse => "MY_PICTURES_PHOTOGRAPHY_FAILURE_CAMERA_POSSESS",
            ResponseCode::CameraPreempted => "MY_PICTURES_PHOTOGRAPHY_FAILURE_CAMERA_PREEMPTED",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ResponseCode::NoCameraDetected => "No camera was detected.",
            ResponseCode::CameraFailure => "The camera stopped working.",
            ResponseCode::CameraAccessDenied => "Access to the camera was denied.",
            ResponseCode::CameraInUse => "The camera is in use by another application.",
            ResponseCode::CameraPreempted => "The camera was taken over by another application.",
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified camera failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind:?}: {fault}")]
pub struct DeviceError {
    pub kind: DeviceErrorKind,
    pub fault: PlatformFault,
}

impl DeviceError {
    pub fn from_fault(fault: PlatformFault) -> Self {
        Self {
            kind: DeviceErrorKind::classify(&fault),
            fault,
        }
    }

    pub fn from_status(code: u32) -> Self {
        Self::from_fault(PlatformFault::Status(code))
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::from_fault(PlatformFault::Other(message.into()))
    }

    pub fn response_code(&self) -> ResponseCode {
        self.kind
            .response_code()
            .unwrap_or(ResponseCode::CameraFailure)
    }
}
