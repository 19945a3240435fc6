use crossbeam_channel::Sender;

use crate::camera::domain::device_error::{DeviceError, PlatformFault};
use crate::camera::domain::device_policy::CameraDescriptor;
use crate::camera::domain::stream_descriptor::{StreamDescriptor, StreamKind};
use crate::shared::frame::Frame;

/// Asynchronous notifications from an open device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The capture pipeline reported a failure.
    Failed(PlatformFault),
    /// The device was unplugged or disabled.
    Removed,
    /// Informational state change (e.g. streaming paused by the platform).
    StateChanged(String),
}

/// Enumerates and opens video-capture devices.
pub trait CameraBackend: Send + Sync {
    fn list_devices(&self) -> Result<Vec<CameraDescriptor>, DeviceError>;

    fn open(&self, device_id: &str) -> Result<Box<dyn CameraDevice>, DeviceError>;
}

/// An opened camera. Dropping it disposes the platform handle.
pub trait CameraDevice: Send {
    fn available_streams(&self, kind: StreamKind) -> Vec<StreamDescriptor>;

    fn set_stream(&mut self, kind: StreamKind, stream: &StreamDescriptor)
        -> Result<(), DeviceError>;

    fn start_preview(&mut self) -> Result<(), DeviceError>;

    fn stop_preview(&mut self) -> Result<(), DeviceError>;

    /// Grabs the current preview frame in BGRA8.
    fn capture_frame(&mut self) -> Result<Frame, DeviceError>;

    /// Starts forwarding failure/state events to `events`.
    fn subscribe(&mut self, events: Sender<DeviceEvent>);

    fn unsubscribe(&mut self);
}

/// Keeps the display awake while the preview is on screen.
pub trait DisplayRequest: Send {
    fn request_active(&mut self);

    fn request_release(&mut self);
}

/// Display request for hosts without a screen-saver to suppress.
pub struct NoopDisplayRequest;

impl DisplayRequest for NoopDisplayRequest {
    fn request_active(&mut self) {}
    fn request_release(&mut self) {}
}
